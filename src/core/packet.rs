//! Captured packet records
//!
//! A [`Packet`] is one decoded capture frame delivered by a packet source.
//! The registry files the same packet under both the sender's and the
//! receiver's history, so packets are shared through [`SharedPacket`].

use bytes::Bytes;
use chrono::{DateTime, Local};
use std::sync::Arc;
use uuid::Uuid;

/// Shared, read-only handle to a captured packet.
///
/// Multiple node histories may reference the same packet; nothing mutates a
/// packet after it has been handed to the registry.
pub type SharedPacket = Arc<Packet>;

/// Capture metadata the viewer carries but never interprets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PacketMetadata {
    /// Transport protocol hint taken from the IPv6 next-header field
    pub protocol: Option<String>,
    /// Received signal strength reported by the sniffer bridge, in dBm
    pub rssi: Option<i8>,
    /// Link quality indicator reported by the sniffer bridge
    pub lqi: Option<u8>,
    /// Free-form annotations
    pub notes: Vec<String>,
}

/// A single packet captured off the air by the sniffer.
#[derive(Debug, Clone)]
pub struct Packet {
    /// Unique packet ID
    pub id: Uuid,
    /// Capture sequence number, assigned by the session in arrival order
    pub seq: u64,
    /// Time the viewer decoded the packet
    pub timestamp: DateTime<Local>,
    /// Network address of the sending node
    pub sender: String,
    /// Network address of the receiving node; `None` for multicast and
    /// broadcast traffic that has no single receiver
    pub receiver: Option<String>,
    /// The raw frame, opaque to the viewer
    pub payload: Bytes,
    /// Capture metadata
    pub metadata: PacketMetadata,
}

impl Packet {
    /// Create a new packet record.
    pub fn new(sender: impl Into<String>, receiver: Option<String>, payload: Bytes) -> Self {
        Self {
            id: Uuid::new_v4(),
            seq: 0,
            timestamp: Local::now(),
            sender: sender.into(),
            receiver,
            payload,
            metadata: PacketMetadata::default(),
        }
    }

    /// Set the protocol hint.
    #[must_use]
    pub fn with_protocol(mut self, protocol: &str) -> Self {
        self.metadata.protocol = Some(protocol.to_string());
        self
    }

    /// Set the reported signal strength.
    #[must_use]
    pub fn with_rssi(mut self, rssi: i8) -> Self {
        self.metadata.rssi = Some(rssi);
        self
    }

    /// Set the reported link quality.
    #[must_use]
    pub fn with_lqi(mut self, lqi: u8) -> Self {
        self.metadata.lqi = Some(lqi);
        self
    }

    /// Add a note.
    pub fn add_note(&mut self, note: &str) {
        self.metadata.notes.push(note.to_string());
    }

    /// Raw frame as a hex string.
    pub fn hex(&self) -> String {
        hex::encode(&self.payload)
    }

    /// Frame length in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Check if the frame is empty.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// One-line summary for the live feed.
    pub fn summary(&self) -> String {
        let receiver = self.receiver.as_deref().unwrap_or("(multicast)");
        match &self.metadata.protocol {
            Some(proto) => {
                format!("{} -> {} {} {} bytes", self.sender, receiver, proto, self.len())
            }
            None => format!("{} -> {} {} bytes", self.sender, receiver, self.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_creation() {
        let packet = Packet::new(
            "2001:db8::1",
            Some("2001:db8::2".to_string()),
            Bytes::from_static(&[0x01, 0x02, 0x03]),
        )
        .with_protocol("UDP")
        .with_rssi(-70);

        assert_eq!(packet.sender, "2001:db8::1");
        assert_eq!(packet.receiver.as_deref(), Some("2001:db8::2"));
        assert_eq!(packet.len(), 3);
        assert_eq!(packet.hex(), "010203");
        assert_eq!(packet.metadata.rssi, Some(-70));
    }

    #[test]
    fn test_packet_summary_multicast() {
        let packet = Packet::new("2001:db8::1", None, Bytes::from_static(&[0u8; 8]));
        assert!(packet.summary().contains("(multicast)"));
        assert!(packet.summary().contains("8 bytes"));
    }
}
