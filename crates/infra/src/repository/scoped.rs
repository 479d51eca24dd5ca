use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tillpoint_core::StoreId;

use crate::error::{RepoError, RepoResult};

pub(crate) type Rows<K, V> = HashMap<(StoreId, K), V>;

/// Store-isolated in-memory table. Records are keyed by `(StoreId, K)` so a
/// lookup in the wrong store simply misses.
#[derive(Debug)]
pub(crate) struct ScopedTable<K, V> {
    inner: RwLock<Rows<K, V>>,
}

impl<K, V> Default for ScopedTable<K, V> {
    fn default() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> ScopedTable<K, V>
where
    K: Copy + Eq + Hash,
    V: Clone,
{
    pub(crate) fn read(&self) -> RepoResult<RwLockReadGuard<'_, Rows<K, V>>> {
        self.inner.read().map_err(|_| poisoned())
    }

    pub(crate) fn write(&self) -> RepoResult<RwLockWriteGuard<'_, Rows<K, V>>> {
        self.inner.write().map_err(|_| poisoned())
    }

    pub(crate) fn get(&self, store_id: StoreId, key: K) -> RepoResult<Option<V>> {
        Ok(self.read()?.get(&(store_id, key)).cloned())
    }

    pub(crate) fn upsert(&self, store_id: StoreId, key: K, value: V) -> RepoResult<()> {
        self.write()?.insert((store_id, key), value);
        Ok(())
    }

    /// Replace an existing row; `NotFound` when absent.
    pub(crate) fn replace(&self, store_id: StoreId, key: K, value: V, what: &str) -> RepoResult<()> {
        let mut rows = self.write()?;
        match rows.get_mut(&(store_id, key)) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(tillpoint_core::DomainError::not_found(what).into()),
        }
    }

    pub(crate) fn remove(&self, store_id: StoreId, key: K) -> RepoResult<bool> {
        Ok(self.write()?.remove(&(store_id, key)).is_some())
    }

    pub(crate) fn list_where(&self, store_id: StoreId, keep: impl Fn(&V) -> bool) -> RepoResult<Vec<V>> {
        Ok(self
            .read()?
            .iter()
            .filter(|((s, _), v)| *s == store_id && keep(v))
            .map(|(_, v)| v.clone())
            .collect())
    }
}

pub(crate) fn poisoned() -> RepoError {
    RepoError::Storage("in-memory table lock poisoned".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_isolated_per_store() {
        let table: ScopedTable<u32, &str> = ScopedTable::default();
        let (a, b) = (StoreId::new(), StoreId::new());
        table.upsert(a, 1, "apple").unwrap();
        table.upsert(b, 1, "banana").unwrap();

        assert_eq!(table.get(a, 1).unwrap(), Some("apple"));
        assert_eq!(table.list_where(b, |_| true).unwrap(), vec!["banana"]);
        assert!(table.remove(a, 1).unwrap());
        assert_eq!(table.get(a, 1).unwrap(), None);
        assert_eq!(table.get(b, 1).unwrap(), Some("banana"));
    }

    #[test]
    fn replace_missing_row_is_not_found() {
        let table: ScopedTable<u32, u32> = ScopedTable::default();
        let err = table.replace(StoreId::new(), 7, 1, "row").unwrap_err();
        assert!(matches!(err, RepoError::Domain(tillpoint_core::DomainError::NotFound(_))));
    }
}
