use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use wrappor_core::{Encoder, EncoderConfig, MemoryPrrCache, PrrCache, ReportingMode};

/// Cache that counts writes, standing in for an external durable store
#[derive(Default)]
struct CountingCache {
    entries: Mutex<HashMap<String, u32>>,
    puts: AtomicUsize,
}

impl PrrCache for CountingCache {
    fn get(&self, value: &str) -> Option<u32> {
        self.entries.lock().get(value).copied()
    }

    fn put(&self, value: &str, prr: u32) {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.entries.lock().insert(value.to_string(), prr);
    }
}

#[test]
fn test_cache_outlives_encoder() {
    let cache = Arc::new(CountingCache::default());
    let config = EncoderConfig::default();

    let first = {
        let mut encoder = Encoder::builder(config, 1, "client-1")
            .mode(ReportingMode::OneTime)
            .shared_cache(cache.clone())
            .build()
            .unwrap();
        encoder.encode("chrome://settings")
    };
    assert_eq!(cache.puts.load(Ordering::SeqCst), 1);

    // A new encoder for the same client reuses the stored PRR
    let mut encoder = Encoder::builder(config, 1, "client-1")
        .mode(ReportingMode::OneTime)
        .shared_cache(cache.clone())
        .build()
        .unwrap();
    assert_eq!(encoder.encode("chrome://settings"), first);
    assert_eq!(cache.puts.load(Ordering::SeqCst), 1);
}

#[test]
fn test_concurrent_encoders_share_one_derivation() {
    let cache = Arc::new(MemoryPrrCache::new());
    let config = EncoderConfig::default();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = cache.clone();
            thread::spawn(move || {
                let mut encoder = Encoder::builder(config, 0, "secret")
                    .shared_cache(cache)
                    .build()
                    .unwrap();
                (0..100).for_each(|_| {
                    encoder.encode("abc");
                });
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get("abc"), Some(57576));
}

#[test]
fn test_encoder_is_send() {
    fn assert_send<T: Send>() {}
    assert_send::<Encoder>();
}
