// Encoding helpers — byte framing for digest inputs and bit-string output

pub mod framing;

pub use framing::{bit_string, to_big_endian_bytes};
