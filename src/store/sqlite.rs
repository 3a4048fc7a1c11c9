use std::collections::HashMap;

use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, OptionalExtension};

use crate::db::DbPool;

use super::Store;

/// SQLite-backed implementation of the Store trait.
/// Wraps the r2d2 connection pool.
pub struct SqliteStore {
    pub pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl Store for SqliteStore {
    // ── Lifecycle ───────────────────────────────────────────────────

    fn run_migrations(&self) -> Result<(), String> {
        crate::db::run_migrations(&self.pool).map_err(|e| e.to_string())
    }

    fn seed_defaults(&self) -> Result<(), String> {
        crate::db::seed_defaults(&self.pool).map_err(|e| e.to_string())
    }

    // ── Key-value documents ─────────────────────────────────────────

    fn kv_get(&self, key: &str) -> Result<Option<String>, String> {
        let conn = self.pool.get().map_err(|e| e.to_string())?;
        conn.query_row(
            "SELECT value FROM kv_store WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| e.to_string())
    }

    fn kv_set(&self, key: &str, value: &str) -> Result<(), String> {
        let conn = self.pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, CURRENT_TIMESTAMP)
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = CURRENT_TIMESTAMP",
            params![key, value],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    // ── Settings ────────────────────────────────────────────────────

    fn setting_get(&self, key: &str) -> Option<String> {
        let conn = self.pool.get().ok()?;
        conn.query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .ok()
        .flatten()
    }

    fn setting_set(&self, key: &str, value: &str) -> Result<(), String> {
        let conn = self.pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    /// Every setting; an unreadable table yields an empty map.
    fn setting_all(&self) -> HashMap<String, String> {
        let conn = match self.pool.get() {
            Ok(c) => c,
            Err(e) => {
                log::error!("Failed to read settings: {}", e);
                return HashMap::new();
            }
        };
        let mut stmt = match conn.prepare("SELECT key, value FROM settings") {
            Ok(s) => s,
            Err(e) => {
                log::error!("Failed to read settings: {}", e);
                return HashMap::new();
            }
        };
        stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map(|rows| rows.filter_map(Result::ok).collect())
            .unwrap_or_default()
    }

    // ── Sessions ────────────────────────────────────────────────────

    fn session_create(
        &self,
        id: &str,
        expires_at: NaiveDateTime,
        user_agent: Option<&str>,
    ) -> Result<(), String> {
        let conn = self.pool.get().map_err(|e| e.to_string())?;
        let now = Utc::now().naive_utc();
        conn.execute(
            "INSERT INTO sessions (id, created_at, expires_at, user_agent)
             VALUES (?1, ?2, ?3, ?4)",
            params![id, now, expires_at, user_agent],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    fn session_is_valid(&self, id: &str, now: NaiveDateTime) -> bool {
        let conn = match self.pool.get() {
            Ok(c) => c,
            Err(_) => return false,
        };
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sessions WHERE id = ?1 AND expires_at > ?2",
                params![id, now],
                |row| row.get(0),
            )
            .unwrap_or(0);
        count > 0
    }

    fn session_delete(&self, id: &str) -> Result<(), String> {
        let conn = self.pool.get().map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM sessions WHERE id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    fn session_cleanup_expired(&self, now: NaiveDateTime) -> Result<usize, String> {
        let conn = self.pool.get().map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM sessions WHERE expires_at < ?1", params![now])
            .map_err(|e| e.to_string())
    }
}
