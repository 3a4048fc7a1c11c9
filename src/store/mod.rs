use std::collections::HashMap;

use chrono::NaiveDateTime;

pub mod sqlite;

pub use sqlite::SqliteStore;

/// Unified data-access trait. Every persistence operation goes through here.
/// Implementation: `SqliteStore` (wraps rusqlite/r2d2).
pub trait Store: Send + Sync {
    // ── Lifecycle ───────────────────────────────────────────────────
    fn run_migrations(&self) -> Result<(), String>;
    fn seed_defaults(&self) -> Result<(), String>;

    // ── Key-value documents ─────────────────────────────────────────
    fn kv_get(&self, key: &str) -> Result<Option<String>, String>;
    fn kv_set(&self, key: &str, value: &str) -> Result<(), String>;

    // ── Settings ────────────────────────────────────────────────────
    fn setting_get(&self, key: &str) -> Option<String>;
    fn setting_get_or(&self, key: &str, default: &str) -> String {
        self.setting_get(key).unwrap_or_else(|| default.to_string())
    }
    fn setting_get_i64(&self, key: &str) -> i64 {
        self.setting_get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }
    fn setting_set(&self, key: &str, value: &str) -> Result<(), String>;
    fn setting_all(&self) -> HashMap<String, String>;

    // ── Sessions ────────────────────────────────────────────────────
    fn session_create(
        &self,
        id: &str,
        expires_at: NaiveDateTime,
        user_agent: Option<&str>,
    ) -> Result<(), String>;
    fn session_is_valid(&self, id: &str, now: NaiveDateTime) -> bool;
    fn session_delete(&self, id: &str) -> Result<(), String>;
    fn session_cleanup_expired(&self, now: NaiveDateTime) -> Result<usize, String>;
}
