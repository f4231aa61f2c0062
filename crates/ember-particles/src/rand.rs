//! Lightweight xorshift32 PRNG, seedable for reproducible effects

use std::f32::consts::TAU;

/// Seed used when a configuration does not supply one
pub const DEFAULT_SEED: u32 = 0xDEAD_BEEF;

#[derive(Debug, Clone)]
pub struct ParticleRng {
    state: u32,
}

impl ParticleRng {
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Returns a float in [0, 1)
    pub fn next_f32(&mut self) -> f32 {
        // 24 high bits keep the result strictly below 1.0 after rounding
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    /// Returns a float in [min, max)
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }

    /// Returns an index in [0, len); `len` must be non-zero
    pub fn index(&mut self, len: usize) -> usize {
        ((self.next_f32() * len as f32) as usize).min(len.saturating_sub(1))
    }

    /// Returns true with probability `p`
    pub fn chance(&mut self, p: f32) -> bool {
        self.next_f32() < p
    }

    /// Returns a uniformly distributed angle in [0, 2π)
    pub fn angle(&mut self) -> f32 {
        self.range(0.0, TAU)
    }
}

impl Default for ParticleRng {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}
