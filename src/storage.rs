use std::sync::Arc;

use log::error;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::store::Store;

/// JSON documents over the key-value half of a `Store`.
///
/// Reads fall back to the caller's default and writes are best-effort:
/// every failure is logged and swallowed, nothing is surfaced to the caller.
#[derive(Clone)]
pub struct SafeStorage {
    store: Arc<dyn Store>,
}

impl SafeStorage {
    pub fn new(store: Arc<dyn Store>) -> Self {
        SafeStorage { store }
    }

    /// Decoded value under `key`, or `default` if absent or undecodable.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let raw = match self.store.kv_get(key) {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => return default,
            Err(e) => {
                error!("Failed to read stored data ({}): {}", key, e);
                return default;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                error!("Failed to read stored data ({}): {}", key, e);
                default
            }
        }
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let encoded = match serde_json::to_string(value) {
            Ok(s) => s,
            Err(e) => {
                error!("Failed to save data ({}): {}", key, e);
                return;
            }
        };

        if let Err(e) = self.store.kv_set(key, &encoded) {
            error!("Failed to save data ({}): {}", key, e);
        }
    }
}
