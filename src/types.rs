//! Core type definitions for the bat routing protocol

use core::fmt;
use serde::{Deserialize, Serialize};

/// Maximum nodes in the swarm (destination enumeration bound)
pub const MAX_SWARM_NODES: usize = 64;

/// Maximum direct neighbors tracked per node (power of 2 for FnvIndexMap)
pub const MAX_NEIGHBORS: usize = 32;

/// Maximum nodes on a route, source and destination inclusive.
/// Doubles as the discovery hop ceiling: a probe that has already visited
/// this many nodes is never relayed further.
pub const MAX_PATH_NODES: usize = 10;

/// Capacity bound for alternative routes per destination.
/// The configured `max_routes_per_destination` must not exceed this.
pub const MAX_ROUTES_PER_DEST: usize = 8;

/// Maximum destinations in a route table (power of 2 for FnvIndexMap)
pub const MAX_DESTINATIONS: usize = 64;

/// Maximum outbound transmissions produced by a single handler invocation
pub const MAX_TRANSMISSIONS: usize = 64;

/// Result type for routing operations
pub type Result<T> = core::result::Result<T, RoutingError>;

/// Unique identifier for a node in the swarm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a new NodeId
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the inner u32 value
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node-{}", self.0)
    }
}

/// 3D position vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate (meters)
    pub x: f32,
    /// Y coordinate (meters)
    pub y: f32,
    /// Z coordinate (altitude in meters)
    pub z: f32,
}

impl Position {
    /// Create a position from coordinates
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Calculate Euclidean distance to another position
    pub fn distance_to(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        libm::sqrtf(dx * dx + dy * dy + dz * dz)
    }
}

/// Velocity vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    /// X velocity (m/s)
    pub vx: f32,
    /// Y velocity (m/s)
    pub vy: f32,
    /// Z velocity (m/s)
    pub vz: f32,
}

impl Velocity {
    /// Create a velocity from components
    pub const fn new(vx: f32, vy: f32, vz: f32) -> Self {
        Self { vx, vy, vz }
    }

    /// Speed (velocity magnitude, m/s)
    pub fn speed(&self) -> f32 {
        libm::sqrtf(self.vx * self.vx + self.vy * self.vy + self.vz * self.vz)
    }
}

/// Error types for the routing core.
///
/// Routing-level failures (loop detected, hop ceiling reached, no route,
/// missing position data) are not errors: handlers degrade to "no
/// information" and drop the message. Errors are reserved for caller
/// mistakes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingError {
    /// Configuration value out of range
    InvalidConfig,
    /// A bounded buffer or table is full
    BufferFull,
}

impl fmt::Display for RoutingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingError::InvalidConfig => write!(f, "Configuration value out of range"),
            RoutingError::BufferFull => write!(f, "Buffer overflow"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id() {
        let id = NodeId::new(7);
        assert_eq!(id.as_u32(), 7);
    }

    #[test]
    fn test_position_distance() {
        let a = Position::new(0.0, 0.0, 0.0);
        let b = Position::new(3.0, 4.0, 0.0);
        assert_eq!(a.distance_to(&b), 5.0);
    }

    #[test]
    fn test_velocity_speed() {
        let v = Velocity::new(3.0, 0.0, 4.0);
        assert_eq!(v.speed(), 5.0);
    }
}
