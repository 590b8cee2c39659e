// Permanent Randomized Response
//
// Masks come from HMAC-SHA256(secret, be32(bloom)). Digest byte i drives bit i:
//   bit 0 of the byte       → uniform coin
//   high 7 bits (0..=127)   → flip this position when below f * 128
// Same secret and bloom value always give the same PRR.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::encoding::framing::{to_big_endian_bytes, FRAME_WIDTH};
use crate::MAX_BLOOM_BITS;

type HmacSha256 = Hmac<Sha256>;

/// The two masks derived for one bloom value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrrMasks {
    /// Pseudo-random replacement bits
    pub uniform: u32,
    /// Positions whose true bit is replaced by the uniform bit
    pub f_mask: u32,
}

/// Derive the uniform and flip masks from an arbitrary frame.
///
/// `num_bits` is capped at the 32 bytes of an HMAC-SHA256 digest.
pub fn derive_masks(frame: &[u8], secret: &[u8], f_prob: f64, num_bits: u32) -> PrrMasks {
    // HMAC pads or hashes the key, so no length is rejected
    let mut mac =
        <HmacSha256 as Mac>::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(frame);
    let digest = mac.finalize().into_bytes();

    let threshold128 = f_prob * 128.0;
    let mut masks = PrrMasks {
        uniform: 0,
        f_mask: 0,
    };

    for (i, &byte) in digest
        .iter()
        .take(num_bits.min(MAX_BLOOM_BITS) as usize)
        .enumerate()
    {
        let uniform_bit = u32::from(byte & 0x01);
        masks.uniform |= uniform_bit << i;

        let rand128 = f64::from(byte >> 1);
        let noise_bit = u32::from(rand128 < threshold128);
        masks.f_mask |= noise_bit << i;
    }

    masks
}

/// Blend `bloom` with its secret-keyed noise: `(bloom & !f) | (uniform & f)`.
pub fn compute_prr(bloom: u32, secret: &[u8], f_prob: f64, num_bits: u32) -> u32 {
    let masks = derive_masks(
        &to_big_endian_bytes(bloom, FRAME_WIDTH),
        secret,
        f_prob,
        num_bits,
    );
    (bloom & !masks.f_mask) | (masks.uniform & masks.f_mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_masks_reference() {
        let masks = derive_masks(b"v3", b"secret", 0.5, 8);
        assert_eq!(masks.uniform, 150);
        assert_eq!(masks.f_mask, 202);
    }

    #[test]
    fn test_compute_prr_reference() {
        assert_eq!(compute_prr(8256, b"secret", 0.5, 16), 57576);
    }

    #[test]
    fn test_prr_is_deterministic() {
        let first = compute_prr(0xABCD, b"client-7", 0.25, 16);
        for _ in 0..10 {
            assert_eq!(compute_prr(0xABCD, b"client-7", 0.25, 16), first);
        }
    }

    #[test]
    fn test_secret_changes_masks() {
        let a = derive_masks(&[0, 0, 0, 1], b"alice", 0.5, 32);
        let b = derive_masks(&[0, 0, 0, 1], b"bob", 0.5, 32);
        assert_ne!(a, b);
    }

    #[test]
    fn test_zero_f_passes_bloom_through() {
        let masks = derive_masks(b"frame", b"secret", 0.0, 32);
        assert_eq!(masks.f_mask, 0);
        assert_eq!(compute_prr(8256, b"secret", 0.0, 16), 8256);
    }

    #[test]
    fn test_full_f_replaces_every_bit() {
        let masks = derive_masks(&to_big_endian_bytes(8256, 4), b"secret", 1.0, 16);
        assert_eq!(masks.f_mask, 0xFFFF);
        assert_eq!(compute_prr(8256, b"secret", 1.0, 16), masks.uniform);
    }

    #[test]
    fn test_masks_stay_within_width() {
        for bits in 1..=32u32 {
            let masks = derive_masks(b"frame", b"secret", 1.0, bits);
            let allowed = if bits == 32 { u32::MAX } else { (1 << bits) - 1 };
            assert_eq!(masks.f_mask & !allowed, 0);
            assert_eq!(masks.uniform & !allowed, 0);
        }
    }

    #[test]
    fn test_num_bits_capped_at_digest_length() {
        let full = derive_masks(b"frame", b"secret", 0.5, 32);
        let over = derive_masks(b"frame", b"secret", 0.5, 64);
        assert_eq!(full, over);
    }

    #[test]
    fn test_empty_secret_is_accepted() {
        let _ = compute_prr(1, b"", 0.5, 8);
    }
}
