//! Process-lifetime icon cache keyed by file extension
//!
//! Only extensions whose icon is identical for every file sharing them are
//! eligible. Entries are never evicted or invalidated; an absent result is
//! cached as-is so a type with no derivable icon is not retried on every
//! menu open. Factory errors are NOT cached — nothing is inserted and the
//! error propagates, so a transient defect does not poison the key.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::Result;
use crate::icon::IconHandle;

/// Extensions whose icon can differ per file. Everything else shares one
/// icon per extension and is cached for the process lifetime.
const UNCACHED_EXTENSIONS: [&str; 4] = ["exe", "lnk", "ico", "url"];

/// Is this (lowercase, dot-free) extension eligible for the shared cache?
pub fn is_cacheable_extension(extension: &str) -> bool {
    !UNCACHED_EXTENSIONS.contains(&extension)
}

/// Concurrent extension -> icon store
pub struct IconCache {
    entries: DashMap<String, Option<IconHandle>>,
    cache_negative: bool,
}

impl Default for IconCache {
    fn default() -> Self {
        Self::new()
    }
}

impl IconCache {
    pub fn new() -> Self {
        Self::with_negative_caching(true)
    }

    /// `cache_negative = false` retries the OS fetch on every access for
    /// keys that produced no icon, instead of pinning the absent outcome.
    pub fn with_negative_caching(cache_negative: bool) -> Self {
        Self {
            entries: DashMap::new(),
            cache_negative,
        }
    }

    /// Return the cached outcome for `key`, invoking `factory` at most once
    /// across all threads if the key is missing.
    ///
    /// The vacant-entry insertion holds the map shard while the factory
    /// runs, so concurrent first-accesses of one key observe exactly one
    /// underlying OS fetch. Inserted icons are retagged cache-owned.
    pub fn get_or_create<F>(&self, key: &str, factory: F) -> Result<Option<IconHandle>>
    where
        F: FnOnce() -> Result<Option<IconHandle>>,
    {
        match self.entries.entry(key.to_ascii_lowercase()) {
            Entry::Occupied(slot) => Ok(slot.get().clone()),
            Entry::Vacant(slot) => {
                let icon = factory()?.map(IconHandle::into_cache_owned);
                if icon.is_none() && !self.cache_negative {
                    return Ok(None);
                }
                Ok(slot.insert(icon).clone())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icon::{IconSize, Ownership};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn deny_list() {
        for ext in ["exe", "lnk", "ico", "url"] {
            assert!(!is_cacheable_extension(ext));
        }
        for ext in ["txt", "pdf", "sln", "rs", ""] {
            assert!(is_cacheable_extension(ext));
        }
    }

    #[test]
    fn factory_runs_once_per_key() {
        let cache = IconCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let icon = cache
                .get_or_create("txt", || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Some(IconHandle::placeholder(IconSize::Small)))
                })
                .unwrap();
            assert_eq!(icon.unwrap().ownership(), Ownership::CacheOwned);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn absent_results_are_cached() {
        let cache = IconCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let icon = cache
                .get_or_create("xyz", || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(None)
                })
                .unwrap();
            assert!(icon.is_none());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn negative_caching_can_be_disabled() {
        let cache = IconCache::with_negative_caching(false);
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let icon = cache
                .get_or_create("xyz", || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(None)
                })
                .unwrap();
            assert!(icon.is_none());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn errors_are_not_cached() {
        let cache = IconCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let result = cache.get_or_create("bad", || {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(crate::IconError::ShellApi("boom".into()))
            });
            assert!(result.is_err());
        }

        // Retried because nothing was inserted on error.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn keys_normalize_to_lowercase() {
        let cache = IconCache::new();
        cache
            .get_or_create("TXT", || Ok(Some(IconHandle::placeholder(IconSize::Small))))
            .unwrap();
        let calls = AtomicUsize::new(0);
        cache
            .get_or_create("txt", || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            })
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn concurrent_first_access_invokes_factory_once() {
        let cache = IconCache::new();
        let calls = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    let icon = cache
                        .get_or_create("pdf", || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            // Widen the race window.
                            std::thread::sleep(std::time::Duration::from_millis(10));
                            Ok(Some(IconHandle::placeholder(IconSize::Small)))
                        })
                        .unwrap();
                    assert!(icon.is_some());
                });
            }
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
