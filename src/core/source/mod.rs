//! Packet sources
//!
//! A packet source delivers decoded packet records to the capture session,
//! one at a time. The live implementation reads the sniffer bridge over a
//! serial port; the file implementation replays a recorded capture log.

mod file;
mod serial;

pub use file::FileSource;
pub use serial::{list_ports, SerialPacketSource, SerialParity, SerialSourceConfig};

use crate::core::packet::Packet;
use async_trait::async_trait;
use thiserror::Error;

/// Packet source errors
#[derive(Error, Debug)]
pub enum SourceError {
    /// The requested serial port does not exist
    #[error("port not found: {0}")]
    PortNotFound(String),

    /// The serial port exists but could not be opened
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Opening the source failed for another reason
    #[error("failed to open source: {0}")]
    OpenFailed(String),

    /// A framing problem that cannot be recovered by skipping the line
    #[error("framing error: {0}")]
    Framing(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A producer of decoded packet records.
#[async_trait]
pub trait PacketSource: Send {
    /// Wait for the next decodable packet.
    ///
    /// Returns `Ok(None)` when the source is exhausted (end of a capture
    /// file; a live serial source never finishes on its own). Lines that do
    /// not decode are skipped internally, so every returned packet is valid.
    async fn next_packet(&mut self) -> Result<Option<Packet>, SourceError>;

    /// Human-readable description of where packets come from.
    fn source_info(&self) -> String;
}
