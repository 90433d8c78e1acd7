//! Memoization of element matrices and static-condensation blocks.
//!
//! Each distinct key is built at most once. Concurrent requests for a key that is still
//! being built wait on that key's construction lock; requests for populated keys only take
//! the map's read lock.

use log::trace;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

struct Slot<V> {
    value: OnceLock<Arc<V>>,
    building: Mutex<()>,
}

impl<V> Slot<V> {
    fn new() -> Self {
        Self {
            value: OnceLock::new(),
            building: Mutex::new(()),
        }
    }
}

pub struct MatrixCache<K, V> {
    entries: RwLock<FxHashMap<K, Arc<Slot<V>>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<K, V> Default for MatrixCache<K, V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(FxHashMap::default()),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }
}

impl<K: Clone + Eq + Hash + Debug, V> MatrixCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value for `key`, if it has been built.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let slot = self.entries.read().get(key).cloned()?;
        slot.value.get().cloned()
    }

    /// Return the value for `key`, building it with `build` on the first request.
    ///
    /// A failed build stores nothing and its error is returned to the caller that ran it.
    pub fn get_or_try_insert_with<E, F>(&self, key: &K, build: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let existing = self.entries.read().get(key).cloned();
        let slot = match existing {
            Some(slot) => {
                if let Some(value) = slot.value.get() {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Ok(Arc::clone(value));
                }
                slot
            }
            None => Arc::clone(
                self.entries
                    .write()
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(Slot::new())),
            ),
        };

        let _building = slot.building.lock();
        if let Some(value) = slot.value.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(value));
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        trace!("matrix cache miss for {:?}", key);
        let value = Arc::new(build()?);
        let _ = slot.value.set(Arc::clone(&value));
        Ok(value)
    }

    /// Number of keys with a built value.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .values()
            .filter(|slot| slot.value.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }
}

impl<K, V> Debug for MatrixCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatrixCache")
            .field("entries", &self.entries.read().len())
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish()
    }
}
