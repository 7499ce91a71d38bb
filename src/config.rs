//! Protocol configuration
//!
//! All tuning knobs are flat scalars so they can be loaded from any
//! key-value scenario description.

use crate::types::{Result, RoutingError, MAX_ROUTES_PER_DEST};
use serde::{Deserialize, Serialize};

/// Configuration for one bat routing node.
///
/// Bat algorithm parameters control the exploration/exploitation balance:
/// loudness gates the relaying of other nodes' probes, pulse rate gates
/// this node's own probing. Fitness weights bias route selection toward
/// shorter paths, stronger links, lower energy or calmer relays.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Lower bound of the echolocation frequency draw (Hz)
    pub frequency_min: f32,
    /// Upper bound of the echolocation frequency draw (Hz)
    pub frequency_max: f32,
    /// Initial loudness (relay probability), in (0, 1]
    pub loudness: f32,
    /// Initial pulse rate (probe probability), in (0, 1]
    pub pulse_rate: f32,
    /// Loudness decay coefficient, in (0, 1)
    pub alpha: f32,
    /// Pulse rate growth coefficient, > 0
    pub gamma: f32,
    /// Period of the discovery/maintenance cycle (ms)
    pub routing_update_interval_ms: u64,
    /// Fitness weight: hop count
    pub hop_count_weight: f32,
    /// Fitness weight: link quality penalty
    pub link_quality_weight: f32,
    /// Fitness weight: energy cost
    pub energy_weight: f32,
    /// Fitness weight: relay mobility
    pub mobility_weight: f32,
    /// Maximum alternative routes kept per destination
    pub max_routes_per_destination: usize,
    /// Route expiry age (ms)
    pub route_timeout_ms: u64,
    /// Radio range (meters)
    pub communication_range: f32,
    /// Speed at which a node counts as fully mobile (m/s),
    /// normalizes the mobility estimate
    pub mobility_speed_ref: f32,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            frequency_min: 0.0,
            frequency_max: 2.0,
            loudness: 0.9,
            pulse_rate: 0.5,
            alpha: 0.9,
            gamma: 0.9,
            routing_update_interval_ms: 5_000,
            hop_count_weight: 1.0,
            link_quality_weight: 2.0,
            energy_weight: 0.5,
            mobility_weight: 0.5,
            max_routes_per_destination: 3,
            route_timeout_ms: 30_000,
            communication_range: 250.0,
            mobility_speed_ref: 20.0,
        }
    }
}

impl ProtocolConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.frequency_min <= self.frequency_max) {
            return Err(RoutingError::InvalidConfig);
        }
        if !(self.loudness > 0.0 && self.loudness <= 1.0) {
            return Err(RoutingError::InvalidConfig);
        }
        if !(self.pulse_rate > 0.0 && self.pulse_rate <= 1.0) {
            return Err(RoutingError::InvalidConfig);
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(RoutingError::InvalidConfig);
        }
        if !(self.gamma > 0.0) {
            return Err(RoutingError::InvalidConfig);
        }
        if self.routing_update_interval_ms == 0 || self.route_timeout_ms == 0 {
            return Err(RoutingError::InvalidConfig);
        }
        if self.hop_count_weight < 0.0
            || self.link_quality_weight < 0.0
            || self.energy_weight < 0.0
            || self.mobility_weight < 0.0
        {
            return Err(RoutingError::InvalidConfig);
        }
        if self.max_routes_per_destination == 0
            || self.max_routes_per_destination > MAX_ROUTES_PER_DEST
        {
            return Err(RoutingError::InvalidConfig);
        }
        if !(self.communication_range > 0.0) || !(self.mobility_speed_ref > 0.0) {
            return Err(RoutingError::InvalidConfig);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ProtocolConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_alpha() {
        let mut config = ProtocolConfig::default();
        config.alpha = 1.0;
        assert_eq!(config.validate(), Err(RoutingError::InvalidConfig));
        config.alpha = 0.0;
        assert_eq!(config.validate(), Err(RoutingError::InvalidConfig));
    }

    #[test]
    fn test_rejects_zero_range() {
        let mut config = ProtocolConfig::default();
        config.communication_range = 0.0;
        assert_eq!(config.validate(), Err(RoutingError::InvalidConfig));
    }

    #[test]
    fn test_rejects_oversized_route_bound() {
        let mut config = ProtocolConfig::default();
        config.max_routes_per_destination = MAX_ROUTES_PER_DEST + 1;
        assert_eq!(config.validate(), Err(RoutingError::InvalidConfig));
    }

    #[test]
    fn test_rejects_inverted_frequency_band() {
        let mut config = ProtocolConfig::default();
        config.frequency_min = 3.0;
        config.frequency_max = 2.0;
        assert_eq!(config.validate(), Err(RoutingError::InvalidConfig));
    }
}
