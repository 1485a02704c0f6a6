//! # LowpanSniff Core Library
//!
//! A viewer library for 6LoWPAN sensor-network traffic captured by a serial
//! packet sniffer:
//! - Decodes sniffer bridge output lines into packet records
//! - Groups packets by the sensor node that sent or received them
//! - Derives compact display identifiers from node addresses
//! - Replays recorded capture logs for offline analysis
//!
//! ## Example
//!
//! ```rust,no_run
//! use lowpansniff_core::{CaptureSession, SerialPacketSource, SerialSourceConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = SerialSourceConfig::new("/dev/ttyUSB0", 115200);
//!     let source = SerialPacketSource::open(config)?;
//!     let session = CaptureSession::start("field capture", Box::new(source));
//!
//!     let mut rx = session.subscribe();
//!     while let Ok(event) = rx.recv().await {
//!         if let lowpansniff_core::CaptureEvent::PacketCaptured(packet) = event {
//!             println!("{}", packet.summary());
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod core;

// Re-exports for convenience
pub use crate::config::{ConfigError, DisplayConfig, SnifferConfig};
pub use crate::core::node::{Node, NodeError, NodeSummary, IDENTIFIER_LEN};
pub use crate::core::packet::{Packet, PacketMetadata, SharedPacket};
pub use crate::core::registry::{NodeRegistry, RegistryError};
pub use crate::core::session::{CaptureEvent, CaptureSession, CaptureState};
pub use crate::core::source::{
    list_ports, FileSource, PacketSource, SerialPacketSource, SerialParity, SerialSourceConfig,
    SourceError,
};
pub use crate::core::wire::{decode_line, DecodeError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
