// Noise stages — permanent and instantaneous randomized response
//
// PRR: secret-keyed, deterministic per bloom value (HMAC-SHA256).
// IRR: fresh per report, drawn from a NoiseMaskSource.

pub mod irr;
pub mod prr;
pub mod source;

pub use irr::compute_irr;
pub use prr::{compute_prr, derive_masks, PrrMasks};
pub use source::{CsprngNoiseSource, NoiseMaskSource, PatternNoiseSource, NOISE_RESOLUTION};
