//! Node model
//!
//! A [`Node`] is one sensor device, identified by its full network address,
//! together with every packet it has sent or received during the capture
//! session. Nodes are passive records; only the registry mutates them.

use crate::core::packet::SharedPacket;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of address tail characters used as the display identifier.
pub const IDENTIFIER_LEN: usize = 4;

/// Node errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// The address is too short to derive a tail identifier from
    #[error("address `{address}` is shorter than {IDENTIFIER_LEN} characters")]
    IdentifierOutOfRange {
        /// The offending address
        address: String,
    },
}

/// A sensor node observed on the network.
#[derive(Debug, Clone)]
pub struct Node {
    address: String,
    packets: Vec<SharedPacket>,
}

impl Node {
    /// Create a node with an empty history.
    ///
    /// Only the registry constructs nodes; it guarantees the address is
    /// non-empty before calling this.
    pub(crate) fn new(address: impl Into<String>) -> Self {
        let address = address.into();
        debug_assert!(!address.is_empty());
        Self {
            address,
            packets: Vec::new(),
        }
    }

    /// Full network address of the node. Never empty, never changes.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Short display identifier: the last [`IDENTIFIER_LEN`] characters of
    /// the address.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::IdentifierOutOfRange`] when the address has fewer
    /// than [`IDENTIFIER_LEN`] characters. Addresses that short only show up
    /// in malformed captures, but e.g. the unspecified address `::` decodes
    /// to two characters, so the condition is reachable.
    pub fn identifier(&self) -> Result<&str, NodeError> {
        match self.address.char_indices().rev().nth(IDENTIFIER_LEN - 1) {
            Some((idx, _)) => Ok(&self.address[idx..]),
            None => Err(NodeError::IdentifierOutOfRange {
                address: self.address.clone(),
            }),
        }
    }

    /// Display identifier with fallback: the address tail, or the full
    /// address when it is too short to have one.
    ///
    /// This is the accessor the display layer uses, so a malformed capture
    /// degrades to an odd-looking label instead of an error.
    pub fn display_identifier(&self) -> &str {
        self.identifier().unwrap_or(&self.address)
    }

    /// Append a packet to the history. Arrival order, no deduplication.
    pub(crate) fn add_packet(&mut self, packet: SharedPacket) {
        self.packets.push(packet);
    }

    /// Read-only view of the packet history, in arrival order.
    pub fn packets(&self) -> &[SharedPacket] {
        &self.packets
    }

    /// Number of packets sent or received by this node.
    pub fn packet_count(&self) -> usize {
        self.packets.len()
    }

    /// Cloned summary for display and serialization.
    pub fn summary(&self) -> NodeSummary {
        NodeSummary {
            address: self.address.clone(),
            identifier: self.display_identifier().to_string(),
            packet_count: self.packets.len(),
            first_seen: self.packets.first().map(|p| p.timestamp),
            last_seen: self.packets.last().map(|p| p.timestamp),
        }
    }
}

/// Point-in-time snapshot of a node, detached from the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSummary {
    /// Full network address
    pub address: String,
    /// Display identifier (with the short-address fallback applied)
    pub identifier: String,
    /// Number of packets sent or received
    pub packet_count: usize,
    /// Timestamp of the first packet seen for this node
    pub first_seen: Option<DateTime<Local>>,
    /// Timestamp of the most recent packet seen for this node
    pub last_seen: Option<DateTime<Local>>,
}
