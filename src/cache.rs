//! Short-lived cache of rendered responses.
//!
//! Entries are keyed by (template, code, format) and expire lazily: an
//! expired entry reports a miss on read and is overwritten by the next
//! insert. There is no background sweeper; with a sub-second TTL and a small
//! key space the stale window is negligible.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::format::Format;

/// TTL applied uniformly to every entry.
pub const DEFAULT_TTL: Duration = Duration::from_millis(900);

/// Identity of one cacheable rendered artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Template the artifact was rendered with
    pub template: String,
    /// Concrete HTTP code
    pub code: u16,
    /// Negotiated output format
    pub format: Format,
}

impl CacheKey {
    /// Create a new cache key
    pub fn new(template: impl Into<String>, code: u16, format: Format) -> Self {
        Self {
            template: template.into(),
            code,
            format,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    bytes: Arc<[u8]>,
    expires_at: Instant,
}

/// Rendered-response cache with lazy expiry.
///
/// Values are shared as `Arc<[u8]>`, so readers hold a complete prior value
/// or see a miss; a concurrent insert can never expose partially written
/// bytes.
#[derive(Debug)]
pub struct ResponseCache {
    entries: DashMap<CacheKey, CacheEntry>,
    ttl: Duration,
}

impl ResponseCache {
    /// Create a cache where every entry lives for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Look up an entry; expired entries report a miss.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<[u8]>> {
        let entry = self.entries.get(key)?;
        if entry.expires_at <= Instant::now() {
            return None;
        }
        Some(Arc::clone(&entry.bytes))
    }

    /// Insert an entry, replacing any previous value under the same key.
    pub fn put(&self, key: CacheKey, bytes: Vec<u8>) {
        let entry = CacheEntry {
            bytes: Arc::from(bytes),
            expires_at: Instant::now() + self.ttl,
        };
        self.entries.insert(key, entry);
    }

    /// Number of stored entries, including lazily expired ones
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries at all
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
