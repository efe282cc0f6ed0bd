//! Memoized fetch results.
//!
//! An explicit key → value map owned by whoever drives the interactions.
//! Nothing is evicted until [`ResultCache::clear`]; failed fetches are never
//! stored, so an error in one interaction leaves earlier results intact.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
pub struct ResultCache<K, V> {
    entries: HashMap<K, Arc<V>>,
    hits: u64,
    misses: u64,
}

impl<K, V> Default for ResultCache<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }
}

impl<K, V> ResultCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.entries.get(key).cloned()
    }

    pub fn insert(&mut self, key: K, value: V) -> Arc<V> {
        let value = Arc::new(value);
        self.entries.insert(key, Arc::clone(&value));
        value
    }

    /// Return the cached value for `key`, or run `load` and cache its success.
    pub async fn get_or_try_load<F, Fut, E>(&mut self, key: K, load: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.get(&key) {
            self.hits += 1;
            debug!("cache hit for {:?}", key);
            return Ok(hit);
        }

        self.misses += 1;
        debug!("cache miss for {:?}", key);
        let value = load().await?;
        Ok(self.insert(key, value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// (hits, misses) since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    pub fn clear(&mut self) {
        debug!("clearing {} cached entries", self.entries.len());
        self.entries.clear();
    }
}
