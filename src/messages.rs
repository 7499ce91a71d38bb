//! Routing protocol messages
//!
//! A closed enum covers everything a node can receive; handlers dispatch
//! with one exhaustive match. Handlers never transmit directly: they
//! return [`Transmission`] envelopes and the external medium decides which
//! ones actually arrive (messages out of range are silently dropped).

use crate::route_table::RouteInfo;
use crate::types::{NodeId, MAX_PATH_NODES, MAX_TRANSMISSIONS};
use heapless::Vec;
use serde::{Deserialize, Serialize};

/// In-flight route discovery probe.
///
/// Accumulates the traversed path and a partial cost while being relayed
/// toward `dest`. `visited` is append-only and doubles as the loop check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryMessage {
    /// Originating node
    pub source: NodeId,
    /// Target destination
    pub dest: NodeId,
    /// Path history, hop order, source first
    pub visited: Vec<NodeId, MAX_PATH_NODES>,
    /// Partial cost along the traversed prefix, non-decreasing
    pub accumulated_fitness: f32,
}

impl DiscoveryMessage {
    /// Create a fresh probe at the originating node
    pub fn originate(source: NodeId, dest: NodeId) -> Self {
        let mut visited = Vec::new();
        // Capacity MAX_PATH_NODES >= 1
        let _ = visited.push(source);
        Self {
            source,
            dest,
            visited,
            accumulated_fitness: 0.0,
        }
    }

    /// Whether `id` already appears on the traversed path
    pub fn has_visited(&self, id: NodeId) -> bool {
        self.visited.iter().any(|n| *n == id)
    }
}

/// Route established notification, relayed hop-by-hop back to the origin.
///
/// Created at the destination of a successful discovery. `hop_index` is
/// the position in `route.path` of the node the reply is currently
/// addressed to; the origin (index 0) installs the route into its own
/// table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteReply {
    /// The discovered route, path ordered origin to destination
    pub route: RouteInfo,
    /// Index into the path of the current addressee
    pub hop_index: usize,
}

impl RouteReply {
    /// The node that requested the route
    pub fn origin(&self) -> Option<NodeId> {
        self.route.path.first().copied()
    }
}

/// Application payload awaiting a route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPacket {
    /// Sending node
    pub source: NodeId,
    /// Final destination
    pub dest: NodeId,
    /// Cursor into `route_path`
    pub current_hop: usize,
    /// Snapshot of the selected route's path, empty until forwarding
    pub route_path: Vec<NodeId, MAX_PATH_NODES>,
}

impl DataPacket {
    /// Create an unrouted packet
    pub fn new(source: NodeId, dest: NodeId) -> Self {
        Self {
            source,
            dest,
            current_hop: 0,
            route_path: Vec::new(),
        }
    }
}

/// Everything a routing node can receive
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RoutingMessage {
    /// Route discovery probe
    Discovery(DiscoveryMessage),
    /// Route established reply
    RouteReply(RouteReply),
    /// Application data
    Data(DataPacket),
}

/// Delivery scope of an outbound transmission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every node currently in radio range of the sender
    Broadcast,
    /// One specific node (still subject to range and loss)
    Unicast(NodeId),
}

/// Outbound envelope handed to the transport medium
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transmission {
    /// Who should receive it
    pub to: Recipient,
    /// The message itself
    pub message: RoutingMessage,
}

/// Transmissions produced by one handler invocation
pub type Transmissions = Vec<Transmission, MAX_TRANSMISSIONS>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_originate_contains_only_source() {
        let msg = DiscoveryMessage::originate(NodeId::new(1), NodeId::new(5));
        assert_eq!(msg.visited.len(), 1);
        assert!(msg.has_visited(NodeId::new(1)));
        assert!(!msg.has_visited(NodeId::new(5)));
        assert_eq!(msg.accumulated_fitness, 0.0);
    }

    #[test]
    fn test_reply_origin() {
        let mut path = Vec::new();
        path.push(NodeId::new(3)).unwrap();
        path.push(NodeId::new(7)).unwrap();
        let reply = RouteReply {
            route: crate::route_table::RouteInfo::from_path(path, 1.0, 0),
            hop_index: 0,
        };
        assert_eq!(reply.origin(), Some(NodeId::new(3)));
    }

    #[test]
    fn test_data_packet_starts_unrouted() {
        let pkt = DataPacket::new(NodeId::new(0), NodeId::new(9));
        assert!(pkt.route_path.is_empty());
        assert_eq!(pkt.current_hop, 0);
    }
}
