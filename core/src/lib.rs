// Wrappor Core — RAPPOR client-side encoder
//
// value → Signal (bloom) → PRR (secret-keyed, memoized) → IRR (fresh noise)
//
// Everything here is synchronous and I/O free. Durable caching, transport
// and batch processing belong to the caller.

pub mod cache;
pub mod encoder;
pub mod encoding;
pub mod noise;
pub mod signal;

use thiserror::Error;

pub use cache::{MemoryPrrCache, PrrCache};
pub use encoder::{EncodedReport, Encoder, EncoderBuilder, EncoderConfig, ReportingMode};
pub use encoding::{bit_string, to_big_endian_bytes};
pub use noise::{
    compute_irr, compute_prr, derive_masks, CsprngNoiseSource, NoiseMaskSource,
    PatternNoiseSource, PrrMasks,
};
pub use signal::{build_bloom, compute_bloom, signal_positions, BasicSignaller};

/// Widest supported bloom filter; every mask is packed into a `u32`.
pub const MAX_BLOOM_BITS: u32 = 32;

/// Upper bound on hash positions, set by the 16-byte MD5 digest.
pub const MAX_HASHES: u32 = 16;

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EncoderError {
    /// The requested reporting mode cannot run with what was supplied.
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("{field} out of range: {value} (expected {min}..={max})")]
    Range {
        field: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },
    #[error("{field} must be a probability in [0, 1], got {value}")]
    Probability { field: &'static str, value: f64 },
}
