//! Core module containing the sniffer viewer's data model and plumbing
//!
//! This module provides:
//! - Packet records shared between node histories
//! - The node model with derived display identifiers
//! - The node registry (address-to-node mapping, sole mutation point)
//! - Sniffer bridge line decoding
//! - Packet sources (live serial, capture log replay)
//! - Capture session management with event broadcasting

pub mod node;
pub mod packet;
pub mod registry;
pub mod session;
pub mod source;
pub mod wire;
