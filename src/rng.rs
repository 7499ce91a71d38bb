//! Injectable random number generation
//!
//! Every probabilistic decision in the protocol (probe gating, relay
//! gating, frequency draws) pulls from an [`RngSource`] owned by the node,
//! so simulations stay reproducible and tests can supply fixed sequences.

/// Source of uniform random draws
pub trait RngSource {
    /// Next uniform value in [0.0, 1.0)
    fn next_f32(&mut self) -> f32;

    /// Next uniform value in [min, max)
    fn next_f32_range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }
}

/// Deterministic generator (SplitMix64), seeded per node.
///
/// Not cryptographic; routing decisions only need statistical uniformity
/// and replayability.
#[derive(Debug, Clone)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    /// Create a generator from a seed
    pub const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Next raw 64-bit output
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

impl RngSource for SplitMix64 {
    fn next_f32(&mut self) -> f32 {
        // Upper 24 bits for the mantissa
        ((self.next_u64() >> 40) as f32) * (1.0 / 16_777_216.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_interval() {
        let mut rng = SplitMix64::new(42);
        for _ in 0..1000 {
            let v = rng.next_f32();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_custom_range() {
        let mut rng = SplitMix64::new(7);
        for _ in 0..1000 {
            let v = rng.next_f32_range(-10.0, 10.0);
            assert!((-10.0..10.0).contains(&v));
        }
    }

    #[test]
    fn test_reproducible() {
        let mut a = SplitMix64::new(123);
        let mut b = SplitMix64::new(123);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn test_seeds_diverge() {
        let mut a = SplitMix64::new(1);
        let mut b = SplitMix64::new(2);
        assert_ne!(a.next_u64(), b.next_u64());
    }
}
