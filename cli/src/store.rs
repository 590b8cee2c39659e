// Durable PRR cache backed by sled
//
// Keeps the permanent response permanent across runs: a client that
// reports the same value tomorrow reuses today's PRR.
//
// Layout (one sled tree per database):
//   b"__config__"                         → JSON EncoderConfig the cache was built with
//   b"prr/" ‖ client ‖ 0x00 ‖ be32(cohort) ‖ value  → be32(prr)

use anyhow::{bail, Context, Result};
use std::path::Path;
use wrappor_core::{EncoderConfig, PrrCache};

const CONFIG_KEY: &[u8] = b"__config__";
const PRR_PREFIX: &[u8] = b"prr/";

/// Open (or create) a cache database bound to `config`.
///
/// PRRs depend on the encoder parameters, so reopening a database with a
/// different configuration is refused rather than serving stale entries.
pub fn open_cache_db(path: &Path, config: &EncoderConfig) -> Result<sled::Db> {
    let db = sled::open(path)
        .with_context(|| format!("Failed to open PRR cache at {}", path.display()))?;

    let encoded = serde_json::to_vec(config).context("Failed to serialize config")?;
    match db.get(CONFIG_KEY).context("Failed to read cache metadata")? {
        Some(stored) => {
            let stored: EncoderConfig = serde_json::from_slice(&stored)
                .context("Corrupt cache metadata")?;
            if &stored != config {
                bail!(
                    "PRR cache at {} was built with a different configuration ({:?})",
                    path.display(),
                    stored
                );
            }
        }
        None => {
            db.insert(CONFIG_KEY, encoded)
                .context("Failed to write cache metadata")?;
        }
    }

    Ok(db)
}

/// View of the database for one (client, cohort) pair
pub struct SledPrrCache {
    db: sled::Db,
    prefix: Vec<u8>,
}

impl SledPrrCache {
    pub fn new(db: sled::Db, client: &str, cohort: u32) -> Self {
        let mut prefix = Vec::with_capacity(PRR_PREFIX.len() + client.len() + 5);
        prefix.extend_from_slice(PRR_PREFIX);
        prefix.extend_from_slice(client.as_bytes());
        prefix.push(0x00);
        prefix.extend_from_slice(&cohort.to_be_bytes());
        Self { db, prefix }
    }

    fn key(&self, value: &str) -> Vec<u8> {
        let mut key = self.prefix.clone();
        key.extend_from_slice(value.as_bytes());
        key
    }

    /// Number of PRRs stored for this client
    #[cfg(test)]
    pub fn count(&self) -> usize {
        self.db.scan_prefix(&self.prefix).count()
    }
}

impl PrrCache for SledPrrCache {
    fn get(&self, value: &str) -> Option<u32> {
        match self.db.get(self.key(value)) {
            Ok(Some(bytes)) => match <[u8; 4]>::try_from(&bytes[..]) {
                Ok(raw) => Some(u32::from_be_bytes(raw)),
                Err(_) => {
                    tracing::warn!("Ignoring malformed PRR cache entry ({} bytes)", bytes.len());
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("PRR cache read failed: {}", e);
                None
            }
        }
    }

    fn put(&self, value: &str, prr: u32) {
        if let Err(e) = self.db.insert(self.key(value), prr.to_be_bytes().to_vec()) {
            tracing::warn!("PRR cache write failed: {}", e);
        }
    }

    fn get_or_insert_with(&self, value: &str, derive: &mut dyn FnMut() -> u32) -> u32 {
        if let Some(prr) = self.get(value) {
            return prr;
        }
        let prr = derive();
        // Only the first writer wins; later racers adopt the stored value
        match self
            .db
            .compare_and_swap(
                self.key(value),
                None as Option<&[u8]>,
                Some(prr.to_be_bytes().to_vec()),
            )
        {
            Ok(Ok(())) => prr,
            Ok(Err(conflict)) => conflict
                .current
                .and_then(|bytes| <[u8; 4]>::try_from(&bytes[..]).ok())
                .map(u32::from_be_bytes)
                .unwrap_or(prr),
            Err(e) => {
                tracing::warn!("PRR cache write failed: {}", e);
                prr
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wrappor_core::{Encoder, ReportingMode};

    #[test]
    fn test_put_get_roundtrip_with_zero() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_cache_db(dir.path(), &EncoderConfig::default()).unwrap();
        let cache = SledPrrCache::new(db, "client-1", 0);

        assert_eq!(cache.get("abc"), None);
        cache.put("abc", 0);
        assert_eq!(cache.get("abc"), Some(0));
        assert_eq!(cache.count(), 1);
    }

    #[test]
    fn test_clients_and_cohorts_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_cache_db(dir.path(), &EncoderConfig::default()).unwrap();

        let a = SledPrrCache::new(db.clone(), "alice", 0);
        let b = SledPrrCache::new(db.clone(), "bob", 0);
        let a_other_cohort = SledPrrCache::new(db, "alice", 1);

        a.put("v", 1);
        assert_eq!(b.get("v"), None);
        assert_eq!(a_other_cohort.get("v"), None);
    }

    #[test]
    fn test_get_or_insert_keeps_first_value() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_cache_db(dir.path(), &EncoderConfig::default()).unwrap();
        let cache = SledPrrCache::new(db, "c", 0);

        assert_eq!(cache.get_or_insert_with("v", &mut || 5), 5);
        assert_eq!(cache.get_or_insert_with("v", &mut || 9), 5);
    }

    #[test]
    fn test_prr_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let config = EncoderConfig::default();

        let first = {
            let db = open_cache_db(dir.path(), &config).unwrap();
            let cache = SledPrrCache::new(db.clone(), "client-9", 3);
            let mut encoder = Encoder::builder(config, 3, "client-9")
                .mode(ReportingMode::OneTime)
                .cache(cache)
                .build()
                .unwrap();
            let prr = encoder.encode("value");
            db.flush().unwrap();
            prr
        };

        let db = open_cache_db(dir.path(), &config).unwrap();
        let cache = SledPrrCache::new(db, "client-9", 3);
        assert_eq!(cache.get("value"), Some(first));
    }

    #[test]
    fn test_config_mismatch_refused() {
        let dir = tempfile::tempdir().unwrap();
        {
            let _db = open_cache_db(dir.path(), &EncoderConfig::default()).unwrap();
        }
        let other = EncoderConfig {
            f_prob: 0.25,
            ..EncoderConfig::default()
        };
        assert!(open_cache_db(dir.path(), &other).is_err());
    }
}
