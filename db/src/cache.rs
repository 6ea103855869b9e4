//! The cache port: an in-process TTL cache keyed per tenant.
//! `CachePort` is the seam a Redis-backed implementation
//! would sit behind without touching callers.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

pub trait CachePort: Send + Sync {
    fn get_raw(&self, key: &str) -> Option<String>;
    fn set_raw(&self, key: &str, value: String, ttl: Duration);
    fn invalidate(&self, key: &str);
}

pub fn tenant_key(tenant_id: Uuid, suffix: &str) -> String {
    format!("{tenant_id}:{suffix}")
}

pub fn get<T: DeserializeOwned>(cache: &dyn CachePort, key: &str) -> Option<T> {
    cache.get_raw(key).and_then(|raw| serde_json::from_str(&raw).ok())
}

pub fn set<T: Serialize>(cache: &dyn CachePort, key: &str, value: &T, ttl: Duration) {
    if let Ok(raw) = serde_json::to_string(value) {
        cache.set_raw(key, raw, ttl);
    }
}

struct Entry {
    value: String,
    expires_at: Instant,
}

/// A process-local TTL cache. Production deployments swap this for a
/// Redis-backed `CachePort` without the repository layer noticing.
#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl CachePort for InMemoryCache {
    fn get_raw(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn set_raw(&self, key: &str, value: String, ttl: Duration) {
        self.entries.lock().unwrap().insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    fn invalidate(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_value_within_ttl() {
        let cache = InMemoryCache::default();
        let tenant = Uuid::new_v4();
        let key = tenant_key(tenant, "schedule:season-1");
        set(&cache, &key, &vec![1, 2, 3], Duration::from_secs(60));
        let value: Option<Vec<i32>> = get(&cache, &key);
        assert_eq!(value, Some(vec![1, 2, 3]));
    }

    #[test]
    fn invalidate_removes_the_key() {
        let cache = InMemoryCache::default();
        cache.set_raw("k", "v".into(), Duration::from_secs(60));
        cache.invalidate("k");
        assert_eq!(cache.get_raw("k"), None);
    }

    #[test]
    fn expired_entries_return_none() {
        let cache = InMemoryCache::default();
        cache.set_raw("k", "v".into(), Duration::from_millis(0));
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get_raw("k"), None);
    }
}
