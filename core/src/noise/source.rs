// Noise mask sources — per-bit Bernoulli masks for the IRR stage
//
// The default source compares a uniform integer in [0, 2^16) against a
// threshold of round(p * 2^16), so p is honoured at a fixed 1/65536
// resolution rather than through float sampling.

use rand::rngs::OsRng;
use rand::{CryptoRng, Rng, RngCore};

use crate::MAX_BLOOM_BITS;

/// Size of the integer range each noise bit is drawn from
pub const NOISE_RESOLUTION: u32 = 1 << 16;

/// Produces masks whose bits are independently set with a given probability.
pub trait NoiseMaskSource: Send {
    /// A `width`-bit mask, each bit `1` with probability `probability`.
    fn generate_mask(&mut self, probability: f64, width: u32) -> u32;

    /// Mask applied to positions where the PRR bit is `0`.
    fn generate_p_mask(&mut self, p: f64, width: u32) -> u32 {
        self.generate_mask(p, width)
    }

    /// Mask applied to positions where the PRR bit is `1`.
    fn generate_q_mask(&mut self, q: f64, width: u32) -> u32 {
        self.generate_mask(q, width)
    }
}

impl<S: NoiseMaskSource + ?Sized> NoiseMaskSource for Box<S> {
    fn generate_mask(&mut self, probability: f64, width: u32) -> u32 {
        (**self).generate_mask(probability, width)
    }

    fn generate_p_mask(&mut self, p: f64, width: u32) -> u32 {
        (**self).generate_p_mask(p, width)
    }

    fn generate_q_mask(&mut self, q: f64, width: u32) -> u32 {
        (**self).generate_q_mask(q, width)
    }
}

/// Quantize a probability onto `[0, NOISE_RESOLUTION]`. NaN maps to 0.
fn quantized_threshold(probability: f64) -> u32 {
    if !(probability > 0.0) {
        0
    } else if probability >= 1.0 {
        NOISE_RESOLUTION
    } else {
        (probability * f64::from(NOISE_RESOLUTION)).round() as u32
    }
}

/// Default source, backed by a cryptographically secure RNG
#[derive(Debug, Clone)]
pub struct CsprngNoiseSource<R = OsRng> {
    rng: R,
}

impl CsprngNoiseSource<OsRng> {
    /// Source drawing from the operating system RNG
    pub fn new() -> Self {
        Self { rng: OsRng }
    }
}

impl Default for CsprngNoiseSource<OsRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RngCore + CryptoRng> CsprngNoiseSource<R> {
    /// Use a specific CSPRNG, e.g. a seeded `StdRng` for reproducible runs
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: RngCore + CryptoRng + Send> NoiseMaskSource for CsprngNoiseSource<R> {
    fn generate_mask(&mut self, probability: f64, width: u32) -> u32 {
        let threshold = quantized_threshold(probability);
        let mut mask = 0u32;
        for bit in 0..width.min(MAX_BLOOM_BITS) {
            let draw = self.rng.gen_range(0..NOISE_RESOLUTION);
            if draw < threshold {
                mask |= 1 << bit;
            }
        }
        mask
    }
}

/// Deterministic source cycling a fixed list of values.
///
/// Bit `i` is set iff `seeds[i % seeds.len()] < probability`. Useful for
/// tests and for replaying a known noise pattern. An empty list never sets
/// a bit.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternNoiseSource {
    seeds: Vec<f64>,
}

impl PatternNoiseSource {
    pub fn new(seeds: Vec<f64>) -> Self {
        Self { seeds }
    }
}

impl NoiseMaskSource for PatternNoiseSource {
    fn generate_mask(&mut self, probability: f64, width: u32) -> u32 {
        if self.seeds.is_empty() {
            return 0;
        }
        (0..width.min(MAX_BLOOM_BITS)).fold(0u32, |mask, bit| {
            let seed = self.seeds[bit as usize % self.seeds.len()];
            if seed < probability {
                mask | (1 << bit)
            } else {
                mask
            }
        })
    }
}
