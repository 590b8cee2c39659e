// Byte framing — fixed-width big-endian serialization
//
// Frames are raw bytes fed straight into digests. They are never
// interpreted as text.

use crate::MAX_BLOOM_BITS;

/// Width of the frame used for cohorts and bloom values
pub const FRAME_WIDTH: usize = 4;

/// Encode `value` into exactly `width` bytes, most-significant byte first.
///
/// Only the lowest `width * 8` bits survive: a value that does not fit is
/// truncated, never rejected. Widths above 4 are left-padded with zeros.
pub fn to_big_endian_bytes(value: u32, width: usize) -> Vec<u8> {
    (0..width)
        .map(|idx| {
            let shift = (width - 1 - idx) * 8;
            if shift < 32 {
                (value >> shift) as u8
            } else {
                0
            }
        })
        .collect()
}

/// Render the low `width` bits of `mask` as `'0'`/`'1'`, most-significant bit first.
///
/// This is the canonical text form for bloom, PRR and IRR values.
pub fn bit_string(mask: u32, width: u32) -> String {
    let width = width.min(MAX_BLOOM_BITS);
    (0..width)
        .rev()
        .map(|bit| if (mask >> bit) & 1 == 1 { '1' } else { '0' })
        .collect()
}
