//! Node registry
//!
//! The single authoritative mapping from network address to [`Node`] for one
//! capture session. All mutation goes through the registry: nodes are created
//! lazily on first sight and every ingested packet is appended to the history
//! of each node it references. Nodes are never evicted.
//!
//! The registry is an explicitly constructed value owned by the capture
//! session and handed around by reference. There is no ambient global.

use crate::core::node::{Node, NodeSummary};
use crate::core::packet::SharedPacket;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use thiserror::Error;

/// Registry errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A packet referenced an empty network address
    #[error("empty node address")]
    InvalidAddress,
}

/// Address-to-node mapping for one capture session.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: HashMap<String, Node>,
    /// Addresses in discovery order, for deterministic iteration
    order: Vec<String>,
}

impl NodeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the node for `address`, creating it if this is the first time
    /// the address has been seen.
    ///
    /// Idempotent: there is no "already exists" failure, the same address
    /// always resolves to the same node.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidAddress`] when `address` is empty.
    pub fn resolve_or_create(&mut self, address: &str) -> Result<&mut Node, RegistryError> {
        if address.is_empty() {
            return Err(RegistryError::InvalidAddress);
        }

        match self.nodes.entry(address.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                tracing::debug!(address, "new node discovered");
                self.order.push(address.to_string());
                Ok(entry.insert(Node::new(address)))
            }
        }
    }

    /// Ingest one captured packet: append it to the sender's history and, if
    /// the packet has a receiver, to the receiver's history.
    ///
    /// When sender and receiver are the same address the packet is appended
    /// to that node's history once, not twice.
    ///
    /// Returns the addresses of any nodes created by this call, in creation
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidAddress`] when the sender or receiver
    /// address is empty. Addresses are validated before anything is mutated,
    /// so a rejected packet leaves no trace in any history.
    pub fn ingest(&mut self, packet: SharedPacket) -> Result<Vec<String>, RegistryError> {
        if packet.sender.is_empty() {
            return Err(RegistryError::InvalidAddress);
        }
        if packet.receiver.as_deref() == Some("") {
            return Err(RegistryError::InvalidAddress);
        }

        let mut discovered = Vec::new();

        let sender = packet.sender.clone();
        if !self.contains(&sender) {
            discovered.push(sender.clone());
        }
        self.resolve_or_create(&sender)?.add_packet(packet.clone());

        if let Some(receiver) = packet.receiver.clone() {
            if receiver != sender {
                if !self.contains(&receiver) {
                    discovered.push(receiver.clone());
                }
                self.resolve_or_create(&receiver)?.add_packet(packet);
            }
        }

        Ok(discovered)
    }

    /// Look up a node without creating it.
    pub fn get(&self, address: &str) -> Option<&Node> {
        self.nodes.get(address)
    }

    /// Check whether an address has been seen.
    pub fn contains(&self, address: &str) -> bool {
        self.nodes.contains_key(address)
    }

    /// All known nodes, in discovery order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.order.iter().filter_map(|address| self.nodes.get(address))
    }

    /// Cloned snapshots of all known nodes, in discovery order.
    ///
    /// This is what the display layer consumes; it stays valid after the
    /// registry moves on.
    pub fn summaries(&self) -> Vec<NodeSummary> {
        self.nodes().map(Node::summary).collect()
    }

    /// Number of known nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if no nodes have been seen yet.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::packet::Packet;
    use bytes::Bytes;
    use std::sync::Arc;

    fn packet(sender: &str, receiver: Option<&str>) -> SharedPacket {
        Arc::new(Packet::new(
            sender,
            receiver.map(str::to_string),
            Bytes::from_static(&[0xde, 0xad]),
        ))
    }

    #[test]
    fn test_resolve_is_identity_stable() {
        let mut registry = NodeRegistry::new();

        registry.resolve_or_create("2001:db8::1").unwrap();
        assert_eq!(registry.len(), 1);

        registry.resolve_or_create("2001:db8::1").unwrap();
        assert_eq!(registry.len(), 1);

        registry.resolve_or_create("2001:db8::2").unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_resolve_rejects_empty_address() {
        let mut registry = NodeRegistry::new();
        assert_eq!(
            registry.resolve_or_create("").unwrap_err(),
            RegistryError::InvalidAddress
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_ingest_files_packet_under_both_roles() {
        let mut registry = NodeRegistry::new();
        let p = packet("2001:db8::1", Some("2001:db8::2"));

        let discovered = registry.ingest(p.clone()).unwrap();
        assert_eq!(discovered, vec!["2001:db8::1", "2001:db8::2"]);

        let sender = registry.get("2001:db8::1").unwrap();
        let receiver = registry.get("2001:db8::2").unwrap();
        assert_eq!(sender.packet_count(), 1);
        assert_eq!(receiver.packet_count(), 1);
        assert_eq!(sender.packets()[0].id, p.id);
        assert_eq!(receiver.packets()[0].id, p.id);
    }

    #[test]
    fn test_ingest_self_traffic_appends_once() {
        let mut registry = NodeRegistry::new();
        let p = packet("2001:db8::1", Some("2001:db8::1"));

        registry.ingest(p).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("2001:db8::1").unwrap().packet_count(), 1);
    }

    #[test]
    fn test_ingest_multicast_touches_only_sender() {
        let mut registry = NodeRegistry::new();
        registry.ingest(packet("2001:db8::1", None)).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("2001:db8::1").unwrap().packet_count(), 1);
    }

    #[test]
    fn test_ingest_rejects_invalid_address_without_side_effects() {
        let mut registry = NodeRegistry::new();

        let err = registry.ingest(packet("", Some("2001:db8::2"))).unwrap_err();
        assert_eq!(err, RegistryError::InvalidAddress);
        assert!(registry.is_empty());

        let err = registry.ingest(packet("2001:db8::1", Some(""))).unwrap_err();
        assert_eq!(err, RegistryError::InvalidAddress);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_ingest_reports_only_new_nodes() {
        let mut registry = NodeRegistry::new();

        let first = registry.ingest(packet("a::1", Some("a::2"))).unwrap();
        assert_eq!(first.len(), 2);

        let second = registry.ingest(packet("a::1", Some("a::3"))).unwrap();
        assert_eq!(second, vec!["a::3"]);

        let third = registry.ingest(packet("a::2", Some("a::1"))).unwrap();
        assert!(third.is_empty());
    }

    #[test]
    fn test_nodes_iterate_in_discovery_order() {
        let mut registry = NodeRegistry::new();
        registry.ingest(packet("a::3", Some("a::1"))).unwrap();
        registry.ingest(packet("a::2", Some("a::3"))).unwrap();

        let addresses: Vec<_> = registry.nodes().map(Node::address).collect();
        assert_eq!(addresses, vec!["a::3", "a::1", "a::2"]);
    }

    #[test]
    fn test_no_duplicate_addresses() {
        let mut registry = NodeRegistry::new();
        for _ in 0..10 {
            registry.ingest(packet("a::1", Some("a::2"))).unwrap();
            registry.ingest(packet("a::2", Some("a::1"))).unwrap();
        }

        let mut addresses: Vec<_> = registry.nodes().map(Node::address).collect();
        addresses.sort_unstable();
        addresses.dedup();
        assert_eq!(addresses.len(), registry.len());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_history_order_across_ingests() {
        let mut registry = NodeRegistry::new();
        let p1 = packet("a::1", Some("a::2"));
        let p2 = packet("a::2", Some("a::1"));
        let p3 = packet("a::1", None);
        registry.ingest(p1.clone()).unwrap();
        registry.ingest(p2.clone()).unwrap();
        registry.ingest(p3.clone()).unwrap();

        let history: Vec<_> = registry
            .get("a::1")
            .unwrap()
            .packets()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(history, vec![p1.id, p2.id, p3.id]);
    }
}
