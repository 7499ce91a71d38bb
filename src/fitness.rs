//! Metric estimators and the multi-criteria route fitness function
//!
//! Fitness is a cost: lower is better. It combines hop count, a link
//! quality penalty, energy cost, and the mobility of every node on the
//! path, each scaled by an operator-configured weight.

use crate::config::ProtocolConfig;
use crate::route_table::RouteInfo;
use crate::topology::TopologyOracle;
use crate::types::NodeId;

/// Additive guard in link penalty denominators. Keeps the penalty finite
/// at zero quality and bounds its maximum contribution.
pub const LINK_EPSILON: f32 = 0.1;

/// Mobility estimate used when a node's velocity is unavailable
const MOBILITY_FALLBACK: f32 = 0.1;

/// Normalized link quality between two nodes.
///
/// `1` at zero distance, linearly decaying to `0` at `range`, clamped at
/// `0` beyond it. An unknown position means no link, never an error.
pub fn link_quality<T: TopologyOracle>(oracle: &T, a: NodeId, b: NodeId, range: f32) -> f32 {
    let (pos_a, pos_b) = match (oracle.position(a), oracle.position(b)) {
        (Some(pa), Some(pb)) => (pa, pb),
        _ => return 0.0,
    };
    let dist = pos_a.distance_to(&pos_b);
    (1.0 - dist / range).max(0.0)
}

/// Penalty term for a link of the given quality
pub fn link_penalty(quality: f32) -> f32 {
    1.0 / (quality + LINK_EPSILON)
}

/// Mobility of a node, normalized to [0, 1].
///
/// Speed relative to `speed_ref`, saturating at 1. Falls back to a small
/// constant when no velocity is known.
pub fn node_mobility<T: TopologyOracle>(oracle: &T, id: NodeId, speed_ref: f32) -> f32 {
    match oracle.velocity(id) {
        Some(v) => (v.speed() / speed_ref).clamp(0.0, 1.0),
        None => MOBILITY_FALLBACK,
    }
}

/// Bottleneck link quality along a path (minimum over its hops)
pub fn path_link_quality<T: TopologyOracle>(oracle: &T, path: &[NodeId], range: f32) -> f32 {
    let mut min_quality = f32::MAX;
    for hop in path.windows(2) {
        let q = link_quality(oracle, hop[0], hop[1], range);
        if q < min_quality {
            min_quality = q;
        }
    }
    if min_quality == f32::MAX {
        0.0
    } else {
        min_quality
    }
}

/// Estimated transmission energy for a path.
///
/// Radiated power grows with the square of distance; each hop contributes
/// `(distance / range)^2`. Hops with unknown positions contribute nothing.
pub fn path_energy_cost<T: TopologyOracle>(oracle: &T, path: &[NodeId], range: f32) -> f32 {
    let mut cost = 0.0;
    for hop in path.windows(2) {
        if let (Some(a), Some(b)) = (oracle.position(hop[0]), oracle.position(hop[1])) {
            let ratio = a.distance_to(&b) / range;
            cost += ratio * ratio;
        }
    }
    cost
}

/// Multi-criteria cost of a route given current topology estimates.
///
/// `hopCount·w_hop + (1/(linkQuality+0.1))·w_lq + energy·w_e +
/// Σ mobility(n)·w_mob` over every node on the path.
pub fn route_fitness<T: TopologyOracle>(
    route: &RouteInfo,
    config: &ProtocolConfig,
    oracle: &T,
) -> f32 {
    let mut fitness = route.hop_count as f32 * config.hop_count_weight;
    fitness += link_penalty(route.link_quality) * config.link_quality_weight;
    fitness += route.energy_cost * config.energy_weight;
    for node in route.path.iter() {
        fitness += node_mobility(oracle, *node, config.mobility_speed_ref) * config.mobility_weight;
    }
    fitness
}
