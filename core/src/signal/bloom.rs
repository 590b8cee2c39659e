//! Bloom signal — hash positions for a (cohort, value) pair
//!
//! The digest is MD5 over `be32(cohort) ‖ value`, the same framing the
//! RAPPOR analysis tools expect. MD5 is used as a fixed, non-keyed mixing
//! function here, not for collision resistance. Each of the first `hashes`
//! digest bytes selects one bit, reduced modulo `bloom_bits`.

use md5::{Digest, Md5};

use crate::encoding::framing::{to_big_endian_bytes, FRAME_WIDTH};
use crate::MAX_HASHES;

/// Bit positions to activate for `value` in `cohort`.
///
/// Positions may repeat. `hashes` is capped at the 16 digest bytes and an
/// empty filter (`bloom_bits == 0`) yields no positions.
pub fn signal_positions(
    value: impl AsRef<[u8]>,
    cohort: u32,
    hashes: u32,
    bloom_bits: u32,
) -> Vec<u32> {
    if bloom_bits == 0 {
        return Vec::new();
    }

    let mut hasher = Md5::new();
    hasher.update(to_big_endian_bytes(cohort, FRAME_WIDTH));
    hasher.update(value.as_ref());
    let digest = hasher.finalize();

    digest
        .iter()
        .take(hashes.min(MAX_HASHES) as usize)
        .map(|&byte| u32::from(byte) % bloom_bits)
        .collect()
}

/// Fold positions into a bitmask. Duplicates are harmless; positions that
/// do not fit in 32 bits are dropped.
pub fn build_bloom(positions: &[u32]) -> u32 {
    positions
        .iter()
        .fold(0u32, |bloom, &pos| bloom | 1u32.checked_shl(pos).unwrap_or(0))
}

pub fn compute_bloom(value: impl AsRef<[u8]>, cohort: u32, hashes: u32, bloom_bits: u32) -> u32 {
    build_bloom(&signal_positions(value, cohort, hashes, bloom_bits))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_positions_reference() {
        assert_eq!(signal_positions("abc", 0, 2, 16), vec![6, 13]);
    }

    #[test]
    fn test_build_bloom_reference() {
        assert_eq!(build_bloom(&[6, 13]), 8256);
    }

    #[test]
    fn test_compute_bloom_reference() {
        assert_eq!(compute_bloom("abc", 0, 2, 16), 8256);
    }

    #[test]
    fn test_build_bloom_duplicates() {
        assert_eq!(build_bloom(&[3, 3, 3]), 0b1000);
        assert_eq!(build_bloom(&[]), 0);
    }

    #[test]
    fn test_build_bloom_ignores_overflowing_positions() {
        assert_eq!(build_bloom(&[31, 32, 40]), 1 << 31);
    }

    #[test]
    fn test_max_hashes_stays_within_digest() {
        let positions = signal_positions("abc", 0, MAX_HASHES, 32);
        assert_eq!(positions.len(), 16);

        // Asking for more than the digest holds is capped, not a panic
        let capped = signal_positions("abc", 0, 64, 32);
        assert_eq!(capped, positions);
    }

    #[test]
    fn test_positions_fall_inside_filter() {
        for bits in 1..=32 {
            for pos in signal_positions("some value", 7, 16, bits) {
                assert!(pos < bits);
            }
        }
    }

    #[test]
    fn test_cohort_salts_the_hash() {
        let positions: Vec<Vec<u32>> = (0..8)
            .map(|cohort| signal_positions("abc", cohort, 8, 32))
            .collect();
        assert!(positions.iter().any(|p| p != &positions[0]));
    }

    #[test]
    fn test_single_bit_filter() {
        assert_eq!(compute_bloom("abc", 3, 4, 1), 1);
    }

    #[test]
    fn test_empty_filter_has_no_positions() {
        assert!(signal_positions("abc", 0, 2, 0).is_empty());
    }
}
