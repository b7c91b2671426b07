use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use matricula_core::EditionId;

/// Edition-isolated key/value store abstraction for disposable read models.
pub trait EditionStore<K, V>: Send + Sync {
    fn get(&self, edition_id: EditionId, key: &K) -> Option<V>;
    fn upsert(&self, edition_id: EditionId, key: K, value: V);
    fn list(&self, edition_id: EditionId) -> Vec<V>;
    /// Clear all read-model records for an edition (rebuild support).
    fn clear_edition(&self, edition_id: EditionId);
}

impl<K, V, S> EditionStore<K, V> for Arc<S>
where
    S: EditionStore<K, V> + ?Sized,
{
    fn get(&self, edition_id: EditionId, key: &K) -> Option<V> {
        (**self).get(edition_id, key)
    }

    fn upsert(&self, edition_id: EditionId, key: K, value: V) {
        (**self).upsert(edition_id, key, value)
    }

    fn list(&self, edition_id: EditionId) -> Vec<V> {
        (**self).list(edition_id)
    }

    fn clear_edition(&self, edition_id: EditionId) {
        (**self).clear_edition(edition_id)
    }
}

/// In-memory edition-isolated store.
#[derive(Debug)]
pub struct InMemoryEditionStore<K, V> {
    inner: RwLock<HashMap<(EditionId, K), V>>,
}

impl<K, V> InMemoryEditionStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for InMemoryEditionStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> EditionStore<K, V> for InMemoryEditionStore<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, edition_id: EditionId, key: &K) -> Option<V> {
        let map = self.inner.read().ok()?;
        map.get(&(edition_id, key.clone())).cloned()
    }

    fn upsert(&self, edition_id: EditionId, key: K, value: V) {
        if let Ok(mut map) = self.inner.write() {
            map.insert((edition_id, key), value);
        }
    }

    fn list(&self, edition_id: EditionId) -> Vec<V> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };

        map.iter()
            .filter_map(|((e, _k), v)| if *e == edition_id { Some(v.clone()) } else { None })
            .collect()
    }

    fn clear_edition(&self, edition_id: EditionId) {
        if let Ok(mut map) = self.inner.write() {
            map.retain(|(e, _k), _v| *e != edition_id);
        }
    }
}
