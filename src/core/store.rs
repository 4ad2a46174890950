// src/core/store.rs

//! The shared key/value store: a process-wide map guarded by a mutex, with
//! fire-and-forget TTL expiry for `SET ... PX`.

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Result of a `get`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(Bytes),
    Absent,
}

/// The process-wide key/value map.
///
/// TTL scheduling is "fire and forget": `set_with_px` spawns a task that
/// sleeps for the requested duration and then unconditionally deletes the
/// key, even if it has since been overwritten by a plain `set`. This mirrors
/// the reference server's own expiry path and is preserved rather than
/// "fixed" (see the design notes on the TTL/overwrite race).
#[derive(Debug, Default)]
pub struct Store {
    inner: Mutex<HashMap<Bytes, Bytes>>,
}

impl Store {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    pub fn set(&self, key: Bytes, value: Bytes) {
        self.inner
            .lock()
            .expect("store mutex poisoned")
            .insert(key, value);
    }

    pub fn get(&self, key: &[u8]) -> Lookup {
        match self.inner.lock().expect("store mutex poisoned").get(key) {
            Some(value) => Lookup::Found(value.clone()),
            None => Lookup::Absent,
        }
    }

    pub fn delete(&self, key: &[u8]) {
        self.inner.lock().expect("store mutex poisoned").remove(key);
    }
}

/// Schedules an unconditional delete of `key` after `millis` milliseconds.
/// Spawned separately from `Store::set` so callers can keep `Store` itself
/// free of any `Arc`/task-spawning concerns.
pub fn schedule_expiry(store: std::sync::Arc<Store>, key: Bytes, millis: u64) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(millis)).await;
        store.delete(&key);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_after_set_returns_value() {
        let store = Store::new();
        store.set(Bytes::from_static(b"k"), Bytes::from_static(b"v"));
        assert_eq!(store.get(b"k"), Lookup::Found(Bytes::from_static(b"v")));
    }

    #[test]
    fn get_on_missing_key_is_absent() {
        let store = Store::new();
        assert_eq!(store.get(b"missing"), Lookup::Absent);
    }

    #[test]
    fn overwrite_replaces_value() {
        let store = Store::new();
        store.set(Bytes::from_static(b"k"), Bytes::from_static(b"v1"));
        store.set(Bytes::from_static(b"k"), Bytes::from_static(b"v2"));
        assert_eq!(store.get(b"k"), Lookup::Found(Bytes::from_static(b"v2")));
    }

    #[test]
    fn delete_is_idempotent() {
        let store = Store::new();
        store.delete(b"never-there");
        store.set(Bytes::from_static(b"k"), Bytes::from_static(b"v"));
        store.delete(b"k");
        store.delete(b"k");
        assert_eq!(store.get(b"k"), Lookup::Absent);
    }

    #[tokio::test]
    async fn px_expiry_deletes_key_after_deadline() {
        let store = std::sync::Arc::new(Store::new());
        store.set(Bytes::from_static(b"k"), Bytes::from_static(b"v"));
        schedule_expiry(store.clone(), Bytes::from_static(b"k"), 20);

        assert_eq!(store.get(b"k"), Lookup::Found(Bytes::from_static(b"v")));
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(store.get(b"k"), Lookup::Absent);
    }

    #[tokio::test]
    async fn px_expiry_deletes_even_after_overwrite_without_px() {
        // Preserves the source's documented TTL/overwrite race: a plain SET
        // that lands before the deadline does not cancel the pending expiry.
        let store = std::sync::Arc::new(Store::new());
        store.set(Bytes::from_static(b"k"), Bytes::from_static(b"v1"));
        schedule_expiry(store.clone(), Bytes::from_static(b"k"), 30);
        tokio::time::sleep(Duration::from_millis(10)).await;
        store.set(Bytes::from_static(b"k"), Bytes::from_static(b"v2"));

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(store.get(b"k"), Lookup::Absent);
    }
}
