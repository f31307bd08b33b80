use crate::{
    hook::{Hook, HookId, WeakHook},
    registry::Resolver,
    tracing::trace,
};
use core::sync::atomic::{AtomicU64, Ordering};
use std::{collections::HashMap, sync::RwLock};

/// Memoizes how each installed hook was resolved
///
/// An entry lives as long as its hook. Entries for dropped hooks are pruned
/// on the next insertion, so the cache is bounded by the number of loops
/// alive at once.
#[derive(Debug, Default)]
pub struct Cache {
    entries: RwLock<HashMap<HookId, Entry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

#[derive(Debug)]
struct Entry {
    hook: WeakHook,
    resolver: Resolver,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, id: HookId) -> Option<Resolver> {
        let resolver = self
            .entries
            .read()
            .unwrap()
            .get(&id)
            .map(|entry| entry.resolver.clone());

        if resolver.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            crate::count!("sniff.cache.hit");
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            crate::count!("sniff.cache.miss");
        }

        resolver
    }

    /// Records the resolution for `hook`
    ///
    /// The first resolution recorded for a hook wins. The stored resolver is
    /// returned so racing callers agree on the result.
    pub fn record(&self, hook: &Hook, resolver: Resolver) -> Resolver {
        let mut entries = self.entries.write().unwrap();

        let before = entries.len();
        entries.retain(|_, entry| entry.hook.is_alive());
        let pruned = before - entries.len();
        if pruned > 0 {
            trace!(pruned, "cache prune");
        }

        let id = hook.id();
        let entry = entries.entry(id).or_insert_with(|| {
            trace!(hook = %id, ?resolver, "cache record");
            Entry {
                hook: hook.downgrade(),
                resolver,
            }
        });
        entry.resolver.clone()
    }

    /// Returns the number of entries whose hook is still alive
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap()
            .values()
            .filter(|entry| entry.hook.is_alive())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> Stats {
        Stats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::Library;

    #[test]
    fn first_record_wins() {
        let cache = Cache::new();
        let hook = Hook::new("someio::run");

        assert!(cache.resolve(hook.id()).is_none());

        let stored = cache.record(&hook, Resolver::Fixed("someio".into()));
        assert_eq!(stored.fixed(), Some(&Library::from("someio")));

        let stored = cache.record(&hook, Resolver::Fixed("otherio".into()));
        assert_eq!(stored.fixed(), Some(&Library::from("someio")));

        let resolved = cache.resolve(hook.id()).unwrap();
        assert_eq!(resolved.fixed(), Some(&Library::from("someio")));

        assert_eq!(
            cache.stats(),
            Stats {
                hits: 1,
                misses: 1,
                entries: 1
            }
        );
    }

    #[test]
    fn dropped_hooks_are_evicted() {
        let cache = Cache::new();
        let live = Hook::new("someio::run");
        cache.record(&live, Resolver::Fixed("someio".into()));

        for _ in 0..1000 {
            let hook = Hook::new("someio::run");
            cache.record(&hook, Resolver::Fixed("someio".into()));
            assert_eq!(cache.len(), 2);
        }

        assert_eq!(cache.len(), 1);
        assert!(cache.resolve(live.id()).is_some());
        // pruned on insertion rather than on lookup
        assert!(cache.entries.read().unwrap().len() <= 2);

        drop(live);
        assert!(cache.is_empty());
    }

    #[test]
    fn concurrent_population() {
        let cache = std::sync::Arc::new(Cache::new());
        let hook = Hook::new("someio::run");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let hook = hook.clone();
                std::thread::spawn(move || {
                    if cache.resolve(hook.id()).is_none() {
                        cache.record(&hook, Resolver::Fixed("someio".into()));
                    }
                    cache.resolve(hook.id()).and_then(|r| r.fixed().cloned())
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap().as_deref(), Some("someio"));
        }
        assert_eq!(cache.len(), 1);
    }
}
