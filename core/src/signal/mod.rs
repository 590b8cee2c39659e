// Signal stage — turn a client value into a bloom value
//
// The built-in signal hashes (cohort, value) into a bloom filter. BASIC
// reporting modes bypass it with a caller-supplied BasicSignaller.

pub mod bloom;

pub use bloom::{build_bloom, compute_bloom, signal_positions};

/// External source of bloom values, used by the BASIC reporting modes.
///
/// The returned mask is truncated to the encoder's `bloom_bits`.
///
/// `signal` may run while the encoder's cache holds its write lock, so it
/// must not access that cache.
pub trait BasicSignaller: Send {
    fn signal(&self, value: &str) -> u32;
}

impl<F> BasicSignaller for F
where
    F: Fn(&str) -> u32 + Send,
{
    fn signal(&self, value: &str) -> u32 {
        self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_is_a_signaller() {
        let signaller = |value: &str| value.len() as u32;
        assert_eq!(signaller.signal("abcd"), 4);

        let boxed: Box<dyn BasicSignaller> = Box::new(|_: &str| 0b1010);
        assert_eq!(boxed.signal("anything"), 0b1010);
    }
}
