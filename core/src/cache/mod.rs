// PRR cache — memoization that makes the permanent response permanent
//
// A value's PRR is derived at most once per cache. Lookups return an
// explicit Option, so a legitimately all-zero PRR is still a hit.

pub mod memory;

pub use memory::MemoryPrrCache;

use std::sync::Arc;

/// Storage for previously derived PRRs, keyed by the raw client value.
///
/// Implementations may be durable or shared between encoders; the core never
/// evicts entries.
pub trait PrrCache: Send + Sync {
    fn get(&self, value: &str) -> Option<u32>;
    fn put(&self, value: &str, prr: u32);

    /// Return the cached PRR for `value`, running `derive` and storing its
    /// result on a miss.
    ///
    /// The default is a plain get-then-put. Implementations that can hold a
    /// lock across the check should override it so concurrent callers derive
    /// once.
    fn get_or_insert_with(&self, value: &str, derive: &mut dyn FnMut() -> u32) -> u32 {
        if let Some(prr) = self.get(value) {
            return prr;
        }
        let prr = derive();
        self.put(value, prr);
        prr
    }
}

impl<C: PrrCache + ?Sized> PrrCache for Arc<C> {
    fn get(&self, value: &str) -> Option<u32> {
        (**self).get(value)
    }

    fn put(&self, value: &str, prr: u32) {
        (**self).put(value, prr)
    }

    fn get_or_insert_with(&self, value: &str, derive: &mut dyn FnMut() -> u32) -> u32 {
        (**self).get_or_insert_with(value, derive)
    }
}
