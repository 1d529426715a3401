// src/translate/cache.rs
//! Process-wide translation cache, injected into the read path so it is
//! substitutable (e.g. with a distributed cache) and visible in tests.
//! Best-effort only: entries are created on successful translations,
//! expire after a TTL, and do not survive a restart.

use metrics::counter;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default entry lifetime: 24 hours.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Key over the *source* text pair, normalized so cosmetic whitespace or
/// casing differences share one entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    title: String,
    summary: String,
}

impl CacheKey {
    pub fn new(title: &str, summary: &str) -> Self {
        Self {
            title: normalize_key(title),
            summary: normalize_key(summary),
        }
    }
}

fn normalize_key(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// An already-translated, sanitized pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedTranslation {
    pub title: String,
    pub summary: String,
}

struct Entry {
    value: CachedTranslation,
    expires_at: Instant,
}

#[derive(Default)]
pub struct TranslationCache {
    inner: Mutex<HashMap<CacheKey, Entry>>,
}

impl TranslationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-expired hit or `None`; expired entries are dropped on read.
    pub fn get(&self, key: &CacheKey) -> Option<CachedTranslation> {
        let mut g = self.inner.lock().expect("cache lock");
        match g.get(key) {
            Some(e) if e.expires_at > Instant::now() => {
                counter!("translation_cache_hits_total").increment(1);
                Some(e.value.clone())
            }
            Some(_) => {
                g.remove(key);
                counter!("translation_cache_misses_total").increment(1);
                None
            }
            None => {
                counter!("translation_cache_misses_total").increment(1);
                None
            }
        }
    }

    /// Overwrites any previous entry for the key.
    pub fn put(&self, key: CacheKey, value: CachedTranslation, ttl: Duration) {
        let mut g = self.inner.lock().expect("cache lock");
        g.insert(
            key,
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("cache lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
