// Encoder configuration — filter geometry and flip probabilities

use serde::{Deserialize, Serialize};

use crate::{EncoderError, MAX_BLOOM_BITS, MAX_HASHES};

/// Parameters shared by every client in a collection.
///
/// Field names serialize in camelCase (`bloomBits`, `pProb`, ...) and any
/// missing field takes its default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EncoderConfig {
    /// Bloom filter width in bits (1..=32)
    pub bloom_bits: u32,
    /// Hash positions per value (1..=16)
    pub hashes: u32,
    /// Size of the cohort id space
    pub total_cohorts: u32,
    /// IRR: probability a PRR `0` bit is reported as `1`
    pub p_prob: f64,
    /// IRR: probability a PRR `1` bit is reported as `1`
    pub q_prob: f64,
    /// PRR: probability a bloom bit is replaced by a keyed coin
    pub f_prob: f64,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            bloom_bits: 16,
            hashes: 2,
            total_cohorts: 64,
            p_prob: 0.5,
            q_prob: 0.75,
            f_prob: 0.5,
        }
    }
}

impl EncoderConfig {
    /// Validate every field against its legal range
    pub fn validate(&self) -> Result<(), EncoderError> {
        check_range("bloom_bits", self.bloom_bits, 1, MAX_BLOOM_BITS)?;
        check_range("hashes", self.hashes, 1, MAX_HASHES)?;
        check_range("total_cohorts", self.total_cohorts, 1, u32::MAX)?;
        check_probability("p_prob", self.p_prob)?;
        check_probability("q_prob", self.q_prob)?;
        check_probability("f_prob", self.f_prob)?;
        Ok(())
    }

    /// Check that `cohort` lies in `[0, total_cohorts)`
    pub fn validate_cohort(&self, cohort: u32) -> Result<(), EncoderError> {
        if cohort >= self.total_cohorts {
            return Err(EncoderError::Range {
                field: "cohort",
                value: u64::from(cohort),
                min: 0,
                max: u64::from(self.total_cohorts.saturating_sub(1)),
            });
        }
        Ok(())
    }

    /// Mask covering the low `bloom_bits` bits
    pub fn bloom_mask(&self) -> u32 {
        match self.bloom_bits {
            0 => 0,
            bits if bits >= MAX_BLOOM_BITS => u32::MAX,
            bits => (1 << bits) - 1,
        }
    }
}

fn check_range(field: &'static str, value: u32, min: u32, max: u32) -> Result<(), EncoderError> {
    if value < min || value > max {
        return Err(EncoderError::Range {
            field,
            value: u64::from(value),
            min: u64::from(min),
            max: u64::from(max),
        });
    }
    Ok(())
}

fn check_probability(field: &'static str, value: f64) -> Result<(), EncoderError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(EncoderError::Probability { field, value });
    }
    Ok(())
}
