use dashmap::DashMap;
use parking_lot::Mutex;
use parking_lot::lock_api::ArcMutexGuard;
use std::hash::Hash;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Duration;

/// Why a row-lock attempt failed. The store maps these onto the typed
/// errors of whichever table was involved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockFailure {
    Missing,
    Busy,
}

/// Exclusive hold on one row. The guard owns its `Arc`, so it stays
/// valid even if the row is concurrently removed from the map; the
/// acquisition path re-checks identity so such a guard is never handed
/// out.
pub struct RowGuard<T> {
    inner: ArcMutexGuard<parking_lot::RawMutex, T>,
}

impl<T> Deref for RowGuard<T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T> DerefMut for RowGuard<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}

/// Concurrent keyed table with per-row mutexes. Readers and writers
/// both go through `lock`; a bounded wait keeps deadlocks and stampedes
/// visible as `Busy` instead of hanging callers.
pub struct Table<K, V> {
    rows: DashMap<K, Arc<Mutex<V>>>,
}

impl<K, V> Table<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Table {
            rows: DashMap::new(),
        }
    }

    /// Inserts a fresh row. Returns false if the key is already taken.
    pub fn insert(&self, key: K, value: V) -> bool {
        use dashmap::mapref::entry::Entry;
        match self.rows.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(Arc::new(Mutex::new(value)));
                true
            }
        }
    }

    /// Acquires the row exclusively, waiting at most `wait`. After the
    /// mutex is won the row is looked up again: a waiter that slept
    /// through a deletion must see `Missing`, not a detached copy.
    pub fn lock(&self, key: &K, wait: Duration) -> Result<RowGuard<V>, LockFailure> {
        let cell = match self.rows.get(key) {
            Some(entry) => Arc::clone(entry.value()),
            None => return Err(LockFailure::Missing),
        };
        let guard = match cell.try_lock_arc_for(wait) {
            Some(guard) => guard,
            None => return Err(LockFailure::Busy),
        };
        let still_current = match self.rows.get(key) {
            Some(entry) => Arc::ptr_eq(entry.value(), &cell),
            None => false,
        };
        if still_current {
            Ok(RowGuard { inner: guard })
        } else {
            Err(LockFailure::Missing)
        }
    }

    /// Point-in-time copy of the row, taken under its lock.
    pub fn snapshot(&self, key: &K, wait: Duration) -> Result<V, LockFailure> {
        let guard = self.lock(key, wait)?;
        Ok((*guard).clone())
    }

    /// Unlinks the row from the map. Callers hold the row's guard, so
    /// nobody can be mid-mutation; late waiters fail the identity
    /// re-check in `lock`.
    pub fn remove(&self, key: &K) {
        self.rows.remove(key);
    }

    pub fn contains(&self, key: &K) -> bool {
        self.rows.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<K, V> Default for Table<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Table::new()
    }
}
