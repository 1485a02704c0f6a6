//! Live serial packet source
//!
//! Reads the sniffer bridge over a serial port, splits the byte stream into
//! lines and decodes each line into a packet record. Undecodable lines are
//! logged and skipped; the sniffer resyncing mid-frame is normal.

use super::{PacketSource, SourceError};
use crate::core::packet::Packet;
use crate::core::wire;
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio_serial::{DataBits, Parity, SerialPortBuilderExt, SerialStream, StopBits};
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};

/// Longest line the bridge is expected to emit; anything beyond this is a
/// desynced stream, not a frame.
const MAX_LINE_LEN: usize = 8192;

/// Serial parity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SerialParity {
    /// No parity
    #[default]
    None,
    /// Odd parity
    Odd,
    /// Even parity
    Even,
}

impl std::str::FromStr for SerialParity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "odd" | "o" => Ok(Self::Odd),
            "even" | "e" => Ok(Self::Even),
            _ => Ok(Self::None),
        }
    }
}

/// Serial source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialSourceConfig {
    /// Port name (e.g., COM3, /dev/ttyUSB0)
    pub port: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Data bits (5, 6, 7, 8)
    pub data_bits: u8,
    /// Stop bits (1, 2)
    pub stop_bits: u8,
    /// Parity
    pub parity: SerialParity,
}

impl SerialSourceConfig {
    /// Create a configuration with 8N1 defaults.
    pub fn new(port: &str, baud_rate: u32) -> Self {
        Self {
            port: port.to_string(),
            baud_rate,
            data_bits: 8,
            stop_bits: 1,
            parity: SerialParity::None,
        }
    }

    /// Set data bits.
    #[must_use]
    pub fn data_bits(mut self, bits: u8) -> Self {
        self.data_bits = bits;
        self
    }

    /// Set stop bits.
    #[must_use]
    pub fn stop_bits(mut self, bits: u8) -> Self {
        self.stop_bits = bits;
        self
    }

    /// Set parity.
    #[must_use]
    pub fn parity(mut self, parity: SerialParity) -> Self {
        self.parity = parity;
        self
    }
}

impl Default for SerialSourceConfig {
    fn default() -> Self {
        Self::new("/dev/ttyUSB0", 115200)
    }
}

/// Packet source backed by a live serial port.
pub struct SerialPacketSource {
    config: SerialSourceConfig,
    reader: FramedRead<SerialStream, LinesCodec>,
}

impl SerialPacketSource {
    /// Open the configured serial port.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::PortNotFound`] or
    /// [`SourceError::PermissionDenied`] for the usual open failures, and
    /// [`SourceError::OpenFailed`] otherwise.
    pub fn open(config: SerialSourceConfig) -> Result<Self, SourceError> {
        let data_bits = match config.data_bits {
            5 => DataBits::Five,
            6 => DataBits::Six,
            7 => DataBits::Seven,
            _ => DataBits::Eight,
        };

        let stop_bits = match config.stop_bits {
            2 => StopBits::Two,
            _ => StopBits::One,
        };

        let parity = match config.parity {
            SerialParity::Odd => Parity::Odd,
            SerialParity::Even => Parity::Even,
            SerialParity::None => Parity::None,
        };

        let stream = tokio_serial::new(&config.port, config.baud_rate)
            .data_bits(data_bits)
            .stop_bits(stop_bits)
            .parity(parity)
            .open_native_async()
            .map_err(|e| match e.kind() {
                tokio_serial::ErrorKind::NoDevice => SourceError::PortNotFound(config.port.clone()),
                tokio_serial::ErrorKind::Io(std::io::ErrorKind::PermissionDenied) => {
                    SourceError::PermissionDenied(config.port.clone())
                }
                _ => SourceError::OpenFailed(e.to_string()),
            })?;

        tracing::info!(port = %config.port, baud = config.baud_rate, "serial source opened");

        Ok(Self {
            config,
            reader: FramedRead::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LEN)),
        })
    }
}

#[async_trait]
impl PacketSource for SerialPacketSource {
    async fn next_packet(&mut self) -> Result<Option<Packet>, SourceError> {
        loop {
            match self.reader.next().await {
                None => return Ok(None),
                Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                    return Err(SourceError::Framing(format!(
                        "line exceeds {MAX_LINE_LEN} bytes, stream desynced"
                    )));
                }
                Some(Err(LinesCodecError::Io(e))) => return Err(SourceError::Io(e)),
                Some(Ok(line)) => match wire::decode_line(&line) {
                    Ok(packet) => return Ok(Some(packet)),
                    Err(e) => {
                        tracing::debug!(error = %e, "skipping undecodable line");
                    }
                },
            }
        }
    }

    fn source_info(&self) -> String {
        format!("{} @ {} baud", self.config.port, self.config.baud_rate)
    }
}

/// List serial ports that could be feeding a sniffer bridge.
///
/// # Errors
///
/// Propagates the platform enumeration failure as [`SourceError::Io`].
pub fn list_ports() -> Result<Vec<serialport::SerialPortInfo>, SourceError> {
    serialport::available_ports().map_err(|e| SourceError::Io(e.into()))
}
