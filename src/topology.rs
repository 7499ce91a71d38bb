//! Topology and position oracle
//!
//! The routing core never talks to a radio or a mobility model directly;
//! it asks a [`TopologyOracle`] for node positions, velocities and
//! in-range neighbors. [`StaticTopology`] is the in-memory implementation
//! used by simulations and tests; a deployment backs the trait with its
//! own positioning source.

use crate::types::{NodeId, Position, Result, RoutingError, Velocity, MAX_NEIGHBORS, MAX_SWARM_NODES};
use heapless::{FnvIndexMap, Vec};

/// Read-only view of swarm topology
pub trait TopologyOracle {
    /// Current position of a node, or `None` if unknown
    fn position(&self, id: NodeId) -> Option<Position>;

    /// Current velocity of a node, or `None` if unknown
    fn velocity(&self, id: NodeId) -> Option<Velocity>;

    /// All node identifiers in the swarm, in a stable order
    fn node_ids(&self) -> Vec<NodeId, MAX_SWARM_NODES>;

    /// Nodes within `range` meters of `id`, excluding `id` itself.
    /// Nodes with unknown positions are never neighbors.
    fn neighbors_within_range(&self, id: NodeId, range: f32) -> Vec<NodeId, MAX_NEIGHBORS> {
        let mut neighbors = Vec::new();
        let own = match self.position(id) {
            Some(p) => p,
            None => return neighbors,
        };
        for other in self.node_ids() {
            if other == id {
                continue;
            }
            if let Some(pos) = self.position(other) {
                if own.distance_to(&pos) < range {
                    if neighbors.push(other).is_err() {
                        break;
                    }
                }
            }
        }
        neighbors
    }
}

/// Per-node kinematic state tracked by [`StaticTopology`]
#[derive(Debug, Clone, Copy)]
struct NodeKinematics {
    position: Position,
    velocity: Option<Velocity>,
}

/// In-memory topology for simulations and tests.
///
/// The mobility model (external) pushes position updates in; the routing
/// cores read them out through the [`TopologyOracle`] trait.
#[derive(Debug, Clone, Default)]
pub struct StaticTopology {
    nodes: FnvIndexMap<u32, NodeKinematics, MAX_SWARM_NODES>,
}

impl StaticTopology {
    /// Create an empty topology
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update a node's position
    pub fn set_position(&mut self, id: NodeId, position: Position) -> Result<()> {
        if let Some(state) = self.nodes.get_mut(&id.as_u32()) {
            state.position = position;
            return Ok(());
        }
        self.nodes
            .insert(
                id.as_u32(),
                NodeKinematics {
                    position,
                    velocity: None,
                },
            )
            .map_err(|_| RoutingError::BufferFull)?;
        Ok(())
    }

    /// Update a node's velocity (node must already have a position)
    pub fn set_velocity(&mut self, id: NodeId, velocity: Velocity) {
        if let Some(state) = self.nodes.get_mut(&id.as_u32()) {
            state.velocity = Some(velocity);
        }
    }

    /// Remove a node entirely (crashed or out of the scenario)
    pub fn remove_node(&mut self, id: NodeId) {
        self.nodes.remove(&id.as_u32());
    }

    /// Number of known nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl TopologyOracle for StaticTopology {
    fn position(&self, id: NodeId) -> Option<Position> {
        self.nodes.get(&id.as_u32()).map(|s| s.position)
    }

    fn velocity(&self, id: NodeId) -> Option<Velocity> {
        self.nodes.get(&id.as_u32()).and_then(|s| s.velocity)
    }

    fn node_ids(&self) -> Vec<NodeId, MAX_SWARM_NODES> {
        let mut ids = Vec::new();
        for id in self.nodes.keys() {
            if ids.push(NodeId::new(*id)).is_err() {
                break;
            }
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_roundtrip() {
        let mut topo = StaticTopology::new();
        topo.set_position(NodeId::new(1), Position::new(1.0, 2.0, 3.0))
            .unwrap();

        let pos = topo.position(NodeId::new(1)).unwrap();
        assert_eq!(pos.x, 1.0);
        assert!(topo.position(NodeId::new(2)).is_none());
    }

    #[test]
    fn test_velocity_requires_position() {
        let mut topo = StaticTopology::new();
        topo.set_velocity(NodeId::new(1), Velocity::new(1.0, 0.0, 0.0));
        assert!(topo.velocity(NodeId::new(1)).is_none());

        topo.set_position(NodeId::new(1), Position::new(0.0, 0.0, 0.0))
            .unwrap();
        topo.set_velocity(NodeId::new(1), Velocity::new(1.0, 0.0, 0.0));
        assert!(topo.velocity(NodeId::new(1)).is_some());
    }

    #[test]
    fn test_neighbors_within_range() {
        let mut topo = StaticTopology::new();
        topo.set_position(NodeId::new(0), Position::new(0.0, 0.0, 0.0))
            .unwrap();
        topo.set_position(NodeId::new(1), Position::new(100.0, 0.0, 0.0))
            .unwrap();
        topo.set_position(NodeId::new(2), Position::new(300.0, 0.0, 0.0))
            .unwrap();

        let neighbors = topo.neighbors_within_range(NodeId::new(0), 250.0);
        assert_eq!(neighbors.len(), 1);
        assert_eq!(neighbors[0], NodeId::new(1));
    }

    #[test]
    fn test_unknown_position_has_no_neighbors() {
        let mut topo = StaticTopology::new();
        topo.set_position(NodeId::new(1), Position::new(0.0, 0.0, 0.0))
            .unwrap();

        let neighbors = topo.neighbors_within_range(NodeId::new(9), 250.0);
        assert!(neighbors.is_empty());
    }

    #[test]
    fn test_remove_node() {
        let mut topo = StaticTopology::new();
        topo.set_position(NodeId::new(1), Position::new(0.0, 0.0, 0.0))
            .unwrap();
        topo.remove_node(NodeId::new(1));
        assert_eq!(topo.node_count(), 0);
    }
}
