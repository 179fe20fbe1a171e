//! Durable client-side state, most importantly the chat session id.
//!
//! The session id scopes chat history on the backend. It is generated once,
//! persisted under a fixed key, and only replaced by an explicit reset.

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};

/// Fixed key the session id lives under.
const SESSION_KEY: &str = "financebot_session_id";

#[derive(Clone)]
pub struct SessionStore {
    conn: Arc<Mutex<Connection>>,
}

// Manual Debug implementation since Mutex<Connection> doesn't implement Debug
impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("conn", &"Arc<Mutex<Connection>>")
            .finish()
    }
}

impl SessionStore {
    /// Open the store in `./db`, creating the directory and schema as needed.
    pub fn open_default() -> rusqlite::Result<Self> {
        let db_dir = std::path::PathBuf::from("./db");
        if !db_dir.exists() {
            std::fs::create_dir_all(&db_dir).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create db directory: {}", e)),
                )
            })?;
        }
        Self::open(db_dir.join("financebot.db"))
    }

    pub fn open<P: AsRef<Path>>(path: P) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> rusqlite::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "CREATE TABLE IF NOT EXISTS app_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> rusqlite::Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT value FROM app_state WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
    }

    pub fn set(&self, key: &str, value: &str) -> rusqlite::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO app_state (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn delete(&self, key: &str) -> rusqlite::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM app_state WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Return the stored session id, generating and persisting one on first use.
    pub fn get_or_create_session_id(&self) -> rusqlite::Result<String> {
        if let Some(existing) = self.get(SESSION_KEY)? {
            return Ok(existing);
        }
        let id = generate_session_id();
        self.set(SESSION_KEY, &id)?;
        tracing::info!("Generated new session id {}", id);
        Ok(id)
    }

    /// Drop the stored id and mint a fresh one, detaching future history
    /// loads from the previous session.
    pub fn reset_session(&self) -> rusqlite::Result<String> {
        self.delete(SESSION_KEY)?;
        let id = generate_session_id();
        self.set(SESSION_KEY, &id)?;
        Ok(id)
    }
}

fn generate_session_id() -> String {
    format!(
        "session_{}_{}",
        random_token(),
        Utc::now().timestamp_millis()
    )
}

/// Short random alphanumeric token used in session and message ids.
pub(crate) fn random_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, SessionStore) {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::open(dir.path().join("test.db")).unwrap();
        (dir, store)
    }

    #[test]
    fn session_id_is_stable_without_reset() {
        let (_dir, store) = temp_store();
        let first = store.get_or_create_session_id().unwrap();
        let second = store.get_or_create_session_id().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn session_id_has_expected_shape() {
        let (_dir, store) = temp_store();
        let id = store.get_or_create_session_id().unwrap();
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "session");
        assert_eq!(parts[1].len(), 9);
        assert!(parts[2].parse::<i64>().is_ok());
    }

    #[test]
    fn reset_produces_a_different_id() {
        let (_dir, store) = temp_store();
        let original = store.get_or_create_session_id().unwrap();
        let reset = store.reset_session().unwrap();
        assert_ne!(original, reset);
        // The reset id is what future calls see.
        assert_eq!(store.get_or_create_session_id().unwrap(), reset);
    }

    #[test]
    fn session_id_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");

        let first = {
            let store = SessionStore::open(&path).unwrap();
            store.get_or_create_session_id().unwrap()
        };
        let store = SessionStore::open(&path).unwrap();
        assert_eq!(store.get_or_create_session_id().unwrap(), first);
    }

    #[test]
    fn generic_kv_round_trip() {
        let (_dir, store) = temp_store();
        assert_eq!(store.get("missing").unwrap(), None);
        store.set("theme", "dark").unwrap();
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
        store.set("theme", "light").unwrap();
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("light"));
        store.delete("theme").unwrap();
        assert_eq!(store.get("theme").unwrap(), None);
    }
}
