//! Process-wide store of immutable entities keyed by identifier.
//!
//! Entities such as task templates never change once registered, so the cache
//! has no expiry. Writes replace whole entries; reads clone them out.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use flytedeck_types::{Identifier, TaskTemplate};
use tracing::debug;

/// Stable string key for a cacheable entity.
pub trait CacheKey {
    fn cache_key(&self) -> String;
}

impl CacheKey for Identifier {
    fn cache_key(&self) -> String {
        self.to_string()
    }
}

impl CacheKey for TaskTemplate {
    fn cache_key(&self) -> String {
        self.id.cache_key()
    }
}

/// Shared map of entities; clones share storage.
#[derive(Debug)]
pub struct EntityCache<V> {
    entries: Arc<Mutex<HashMap<String, V>>>,
}

impl<V> Clone for EntityCache<V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<V> Default for EntityCache<V> {
    fn default() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<V: Clone> EntityCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.entries.lock().expect("entity cache lock").get(key).cloned()
    }

    /// Look up an entity by anything that produces its key.
    pub fn get_by(&self, key: &impl CacheKey) -> Option<V> {
        self.get(&key.cache_key())
    }

    /// Store `value`, returning the entry it replaced.
    pub fn insert(&self, key: impl Into<String>, value: V) -> Option<V> {
        self.entries.lock().expect("entity cache lock").insert(key.into(), value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().expect("entity cache lock").contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("entity cache lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone + CacheKey> EntityCache<V> {
    /// Insert every entity under its own key, replacing existing entries.
    pub fn merge_array(&self, entities: impl IntoIterator<Item = V>) -> usize {
        let mut entries = self.entries.lock().expect("entity cache lock");
        let mut merged = 0usize;
        for entity in entities {
            entries.insert(entity.cache_key(), entity);
            merged += 1;
        }
        debug!(merged, cached = entries.len(), "entities merged into cache");
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flytedeck_types::ResourceType;

    fn template(name: &str, kind: &str) -> TaskTemplate {
        TaskTemplate {
            id: Identifier::new(ResourceType::Task, "flyte", "development", name, "v1"),
            r#type: kind.into(),
            interface: None,
        }
    }

    #[test]
    fn merge_array_keys_by_identifier() {
        let cache = EntityCache::new();
        let merged = cache.merge_array(vec![template("a", "python-task"), template("b", "python-task")]);
        assert_eq!(merged, 2);
        assert_eq!(cache.len(), 2);

        let lookup = Identifier::new(ResourceType::Task, "flyte", "development", "a", "v1");
        assert_eq!(cache.get_by(&lookup).map(|task| task.id.name), Some("a".to_string()));
    }

    #[test]
    fn later_merge_replaces_entry() {
        let cache = EntityCache::new();
        cache.merge_array(vec![template("a", "python-task")]);
        cache.merge_array(vec![template("a", "container")]);
        assert_eq!(cache.len(), 1);
        let key = template("a", "").cache_key();
        assert_eq!(cache.get(&key).map(|task| task.r#type), Some("container".to_string()));
    }

    #[test]
    fn clones_share_storage() {
        let cache: EntityCache<TaskTemplate> = EntityCache::new();
        let other = cache.clone();
        other.insert("k", template("a", "python-task"));
        assert!(cache.contains("k"));
        assert!(!cache.is_empty());
    }
}
