//! # Bat Algorithm Swarm Routing
//!
//! Bio-inspired multi-hop routing protocol for drone swarm mesh networks
//! (FANETs), modeled on bat echolocation: frequency draws, loudness
//! adaptation and pulse rate control drive route discovery over a lossy,
//! range-limited medium.
//!
//! ## Features
//! - Periodic pulse-rate-gated route discovery with loop-safe relaying
//! - Multi-criteria route fitness (hop count, link quality, energy, mobility)
//! - Bounded, fitness-sorted per-destination route tables with expiry
//! - Route replies relayed hop-by-hop, so every node mutates only its
//!   own state
//! - Injectable randomness and timestamps for reproducible simulation
//! - `no_std` compatible, no heap allocation
//!
//! ## Architecture
//! Each node runs an independent [`bat_routing::BatRoutingNode`]. The
//! surrounding system owns time, topology and the radio medium: it feeds
//! maintenance ticks and inbound messages in simulated-time order and
//! delivers (or drops) the transmissions the node returns.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
#![deny(warnings)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)] // Intentional f32 casts for embedded targets

/// Bat algorithm parameter adaptation (loudness, pulse rate, frequency)
pub mod bat_params;
/// Per-node routing engine: discovery, relaying, data forwarding
pub mod bat_routing;
/// Protocol configuration knobs
pub mod config;
/// Link quality, mobility and route fitness estimators
pub mod fitness;
/// Routing message types and outbound transmission envelopes
pub mod messages;
/// Injectable random number generation
pub mod rng;
/// Bounded, fitness-sorted route tables
pub mod route_table;
/// Topology and position oracle
pub mod topology;
/// Core identifiers, geometry and error types
pub mod types;

pub use bat_params::BatParameters;
pub use bat_routing::{BatRoutingNode, RoutingStats};
pub use config::ProtocolConfig;
pub use messages::{DataPacket, DiscoveryMessage, Recipient, RouteReply, RoutingMessage, Transmission};
pub use route_table::{RouteInfo, RouteTable};
pub use rng::{RngSource, SplitMix64};
pub use topology::{StaticTopology, TopologyOracle};
pub use types::{NodeId, Position, Result, RoutingError, Velocity};
