//! Bat algorithm parameter controller
//!
//! Each node carries an adaptive loudness and pulse rate, updated once per
//! discovery cycle. Loudness is the probability that this node relays
//! other nodes' probes (a louder echo relays more); pulse rate is the
//! probability that this node initiates a probe toward a destination in a
//! cycle. Loudness decays geometrically toward a floor, pulse rate grows
//! toward a ceiling: search intensifies over the run while some
//! exploration always remains.

use crate::config::ProtocolConfig;
use crate::rng::RngSource;
use serde::{Deserialize, Serialize};

/// Loudness never decays below this; every node keeps a nonzero
/// probability of forwarding.
pub const LOUDNESS_FLOOR: f32 = 0.1;

/// Pulse rate never reaches certainty.
pub const PULSE_RATE_CEILING: f32 = 0.95;

/// Per-node adaptive bat state
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BatParameters {
    initial_pulse_rate: f32,
    alpha: f32,
    gamma: f32,
    frequency_min: f32,
    frequency_max: f32,
    current_loudness: f32,
    current_pulse_rate: f32,
}

impl BatParameters {
    /// Initialize from configuration at node startup
    pub fn new(config: &ProtocolConfig) -> Self {
        Self {
            initial_pulse_rate: config.pulse_rate,
            alpha: config.alpha,
            gamma: config.gamma,
            frequency_min: config.frequency_min,
            frequency_max: config.frequency_max,
            current_loudness: config.loudness,
            current_pulse_rate: config.pulse_rate,
        }
    }

    /// Current relay probability
    pub fn loudness(&self) -> f32 {
        self.current_loudness
    }

    /// Current probe probability
    pub fn pulse_rate(&self) -> f32 {
        self.current_pulse_rate
    }

    /// Adapt loudness and pulse rate. Called exactly once per discovery
    /// cycle, after the cycle's probing decisions: decisions in cycle N use
    /// the pre-adaptation values.
    ///
    /// `now_ms` is simulated time since the run started, not wall clock.
    pub fn adapt(&mut self, now_ms: u64) {
        self.current_loudness = (self.alpha * self.current_loudness).max(LOUDNESS_FLOOR);

        let t_secs = now_ms as f32 / 1000.0;
        let grown = self.initial_pulse_rate * (1.0 - libm::expf(-self.gamma * t_secs));
        self.current_pulse_rate = grown.min(PULSE_RATE_CEILING);
    }

    /// Draw an echolocation frequency uniformly from the configured band.
    /// Part of the bio-inspired exploration signal; consumed per probed
    /// destination.
    pub fn draw_frequency<R: RngSource>(&self, rng: &mut R) -> f32 {
        rng.next_f32_range(self.frequency_min, self.frequency_max)
    }
}
