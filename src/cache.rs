//! Bounded, TTL-aware cache for declaration lookups.
//!
//! One entry per key at any instant. Negative entries (lookups that found
//! no valid declaration) expire faster than positive ones, so a site that
//! publishes a declaration later is picked up within minutes while repeated
//! probing of a declaration-less site stays cheap. Eviction is by insertion
//! order regardless of remaining TTL: the cache only needs to bound memory
//! for a discovery signal whose TTLs are the primary staleness control.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use log::debug;

use crate::TargetDeclaration;

/// Default maximum number of cached declaration lookups
pub const CACHE_MAX_SIZE: usize = 500;
/// Default lifetime of a successful lookup
pub const POSITIVE_TTL: Duration = Duration::from_secs(300);
/// Default lifetime of a failed or empty lookup
pub const NEGATIVE_TTL: Duration = Duration::from_secs(120);

/// Cache sizing and TTL knobs, injectable for tests
#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// Entry count at which the oldest insertion gets evicted
    pub max_size: usize,
    /// Lifetime of entries holding a valid declaration
    pub positive_ttl: Duration,
    /// Lifetime of "not found / invalid" entries
    pub negative_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: CACHE_MAX_SIZE,
            positive_ttl: POSITIVE_TTL,
            negative_ttl: NEGATIVE_TTL,
        }
    }
}

/// A cached declaration lookup outcome
#[derive(Clone, Debug)]
pub struct CacheEntry {
    /// The validated declaration, or `None` for a negative entry
    pub value: Option<TargetDeclaration>,
    /// Negative entries record "not found / invalid" and expire faster
    pub negative: bool,
    inserted_at: Instant,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    /// Keys in insertion order, driving FIFO eviction
    order: VecDeque<String>,
}

/// Bounded map of declaration lookups, shared between resolutions.
///
/// Constructed once at process start and passed by reference to the
/// declaration resolver. The mutex preserves the one-entry-per-key
/// invariant under a multi-threaded runtime; no operation holds it across
/// an await point.
#[derive(Debug, Default)]
pub struct DeclarationCache {
    config: CacheConfig,
    inner: Mutex<CacheInner>,
}

impl DeclarationCache {
    /// Empty cache honoring the given limits
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        // A panic while holding the lock cannot leave entries half-written;
        // recover instead of propagating the poison
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a key, removing and missing it if its TTL has elapsed
    #[must_use]
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        let mut inner = self.lock();
        let entry = inner.entries.get(key)?.clone();

        let ttl = if entry.negative {
            self.config.negative_ttl
        } else {
            self.config.positive_ttl
        };
        if entry.inserted_at.elapsed() >= ttl {
            debug!("cache entry `{key}` expired");
            inner.entries.remove(key);
            inner.order.retain(|k| k != key);
            return None;
        }

        Some(entry)
    }

    /// Write a lookup outcome, evicting the oldest-inserted entry first if
    /// the cache is full
    pub fn set(&self, key: String, value: Option<TargetDeclaration>, negative: bool) {
        let mut inner = self.lock();

        if inner.entries.contains_key(&key) {
            // Refresh counts as a new insertion for eviction purposes
            inner.order.retain(|k| k != &key);
        } else if inner.entries.len() >= self.config.max_size {
            if let Some(oldest) = inner.order.pop_front() {
                debug!("cache full, evicting `{oldest}`");
                inner.entries.remove(&oldest);
            }
        }

        inner.entries.insert(
            key.clone(),
            CacheEntry {
                value,
                negative,
                inserted_at: Instant::now(),
            },
        );
        inner.order.push_back(key);
    }

    /// Number of live entries (expired entries may still be counted until
    /// their next lookup)
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// `true` if the cache currently holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::{CacheConfig, DeclarationCache};
    use crate::{AdapterConfig, TargetDeclaration};

    fn sample_declaration() -> TargetDeclaration {
        TargetDeclaration {
            config: AdapterConfig::GithubIssue {
                target: "coco-xyz/clawmark".to_string(),
                labels: vec!["clawmark".to_string()],
                assignees: vec![],
            },
            types: None,
            js_injection_allowed: true,
        }
    }

    #[test]
    fn test_set_then_get() {
        let cache = DeclarationCache::default();
        cache.set("yml:coco-xyz/clawmark".to_string(), Some(sample_declaration()), false);

        let entry = cache.get("yml:coco-xyz/clawmark").unwrap();
        assert_eq!(entry.value, Some(sample_declaration()));
        assert!(!entry.negative);
    }

    #[test]
    fn test_negative_entry_roundtrip() {
        let cache = DeclarationCache::default();
        cache.set("wk:https://example.com".to_string(), None, true);

        let entry = cache.get("wk:https://example.com").unwrap();
        assert_eq!(entry.value, None);
        assert!(entry.negative);
    }

    #[test]
    fn test_expired_entry_removed_on_get() {
        let cache = DeclarationCache::new(CacheConfig {
            positive_ttl: Duration::ZERO,
            ..CacheConfig::default()
        });
        cache.set("k".to_string(), Some(sample_declaration()), false);
        assert_eq!(cache.len(), 1);

        assert!(cache.get("k").is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_negative_ttl_is_separate() {
        let cache = DeclarationCache::new(CacheConfig {
            positive_ttl: Duration::from_secs(300),
            negative_ttl: Duration::ZERO,
            ..CacheConfig::default()
        });
        cache.set("pos".to_string(), Some(sample_declaration()), false);
        cache.set("neg".to_string(), None, true);

        assert!(cache.get("pos").is_some());
        assert!(cache.get("neg").is_none());
    }

    #[test]
    fn test_full_cache_evicts_oldest() {
        let cache = DeclarationCache::new(CacheConfig {
            max_size: 3,
            ..CacheConfig::default()
        });
        for key in ["a", "b", "c"] {
            cache.set(key.to_string(), None, true);
        }

        cache.set("d".to_string(), None, true);

        assert_eq!(cache.len(), 3);
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
        assert!(cache.get("c").is_some());
        assert!(cache.get("d").is_some());
    }

    #[test]
    fn test_refresh_does_not_grow_cache() {
        let cache = DeclarationCache::new(CacheConfig {
            max_size: 2,
            ..CacheConfig::default()
        });
        cache.set("a".to_string(), None, true);
        cache.set("b".to_string(), None, true);
        cache.set("a".to_string(), Some(sample_declaration()), false);

        assert_eq!(cache.len(), 2);
        // Refreshing `a` moved it to the back of the eviction queue
        cache.set("c".to_string(), None, true);
        assert!(cache.get("b").is_none());
        assert!(cache.get("a").is_some());
    }
}
