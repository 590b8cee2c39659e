// In-memory PRR cache, scoped to the lifetime of the cache object

use std::collections::HashMap;

use parking_lot::RwLock;

use super::PrrCache;

/// Default cache: a map behind a read/write lock.
///
/// `get_or_insert_with` holds the write lock across check-and-set, so
/// concurrent encodes of the same value derive the PRR exactly once.
/// The derivation runs under that lock: misses on other values wait for it,
/// and a derivation that touches this cache deadlocks.
#[derive(Debug, Default)]
pub struct MemoryPrrCache {
    entries: RwLock<HashMap<String, u32>>,
}

impl MemoryPrrCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop every entry. Subsequent encodes derive fresh PRRs, which are
    /// identical for an unchanged secret.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl PrrCache for MemoryPrrCache {
    fn get(&self, value: &str) -> Option<u32> {
        self.entries.read().get(value).copied()
    }

    fn put(&self, value: &str, prr: u32) {
        self.entries.write().insert(value.to_string(), prr);
    }

    fn get_or_insert_with(&self, value: &str, derive: &mut dyn FnMut() -> u32) -> u32 {
        if let Some(prr) = self.get(value) {
            return prr;
        }

        let mut entries = self.entries.write();
        // Another writer may have filled the slot between the two locks
        if let Some(&prr) = entries.get(value) {
            return prr;
        }
        let prr = derive();
        entries.insert(value.to_string(), prr);
        prr
    }
}
