//! Persistent session storage.
//!
//! The signed-in session (access token + user profile) lives in a small
//! SQLite key/value table under the user data directory, so a restart picks
//! up where the last run left off. An in-memory mirror backs `current()`,
//! which the route guard consults every tick; the database is only touched
//! on open, sign-in, and sign-out.

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, warn};

use crate::api::auth;
use crate::api::types::Session;
use crate::api::{ApiClient, ApiError};

const KEY_TOKEN: &str = "access_token";
const KEY_USER: &str = "user";

const SESSION_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS session (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Store for the current session, shared by cheap clone.
#[derive(Clone)]
pub struct SessionStore {
  conn: Arc<Mutex<Connection>>,
  session: Arc<Mutex<Option<Session>>>,
}

impl SessionStore {
  /// Open the store at the default location, restoring any persisted
  /// session into memory.
  pub fn open() -> Result<Self> {
    Self::open_at(&Self::default_path()?)
  }

  /// Open the store at an explicit path. Used by tests.
  pub fn open_at(path: &Path) -> Result<Self> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create data directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open session database at {}: {}", path.display(), e))?;

    let store = Self {
      conn: Arc::new(Mutex::new(conn)),
      session: Arc::new(Mutex::new(None)),
    };
    store.run_migrations()?;

    let restored = store.load_persisted()?;
    if restored.is_some() {
      info!("restored persisted session");
    }
    *store.session_slot() = restored;

    Ok(store)
  }

  fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("t9s").join("session.db"))
  }

  fn run_migrations(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute_batch(SESSION_SCHEMA)
      .map_err(|e| eyre!("Failed to run session migrations: {}", e))?;

    Ok(())
  }

  fn session_slot(&self) -> std::sync::MutexGuard<'_, Option<Session>> {
    self.session.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// The session this process is running with, if any.
  pub fn current(&self) -> Option<Session> {
    self.session_slot().clone()
  }

  /// Attach the restored token to the HTTP client at startup.
  pub fn arm(&self, api: &ApiClient) {
    if let Some(session) = self.current() {
      api.set_token(Some(session.access_token));
    }
  }

  /// Exchange credentials for a session, persist it, and arm the client.
  ///
  /// A persistence failure is logged rather than propagated: the session
  /// still works for this run, it just will not survive a restart.
  pub async fn sign_in(
    &self,
    api: &ApiClient,
    email: &str,
    password: &str,
  ) -> Result<Session, ApiError> {
    let session = auth::login(api, email, password).await?;

    if let Err(e) = self.persist(&session) {
      warn!("failed to persist session: {}", e);
    }
    *self.session_slot() = Some(session.clone());
    api.set_token(Some(session.access_token.clone()));

    info!(user = %session.user.email, "signed in");
    Ok(session)
  }

  /// Drop the session everywhere. Safe to call with no session active.
  pub fn sign_out(&self, api: &ApiClient) {
    api.set_token(None);
    *self.session_slot() = None;
    if let Err(e) = self.clear() {
      warn!("failed to clear persisted session: {}", e);
    }
  }

  /// Write the session to disk under its fixed keys.
  pub fn persist(&self, session: &Session) -> Result<()> {
    let user_json = serde_json::to_string(&session.user)
      .map_err(|e| eyre!("Failed to serialize user: {}", e))?;

    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute(
        "INSERT OR REPLACE INTO session (key, value) VALUES (?, ?), (?, ?)",
        params![KEY_TOKEN, session.access_token, KEY_USER, user_json],
      )
      .map_err(|e| eyre!("Failed to store session: {}", e))?;

    Ok(())
  }

  /// Remove any persisted session.
  pub fn clear(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute(
        "DELETE FROM session WHERE key IN (?, ?)",
        params![KEY_TOKEN, KEY_USER],
      )
      .map_err(|e| eyre!("Failed to clear session: {}", e))?;

    Ok(())
  }

  fn load_persisted(&self) -> Result<Option<Session>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare("SELECT value FROM session WHERE key = ?")
      .map_err(|e| eyre!("Failed to prepare session query: {}", e))?;

    let token: Option<String> = stmt
      .query_row(params![KEY_TOKEN], |row| row.get(0))
      .optional()
      .map_err(|e| eyre!("Failed to read session token: {}", e))?;

    let user_json: Option<String> = stmt
      .query_row(params![KEY_USER], |row| row.get(0))
      .optional()
      .map_err(|e| eyre!("Failed to read session user: {}", e))?;

    match (token, user_json) {
      (Some(access_token), Some(user_json)) => {
        // A user blob that no longer parses means the schema moved on;
        // treat it as signed out instead of failing startup
        match serde_json::from_str(&user_json) {
          Ok(user) => Ok(Some(Session { access_token, user })),
          Err(e) => {
            warn!("discarding unreadable persisted session: {}", e);
            Ok(None)
          }
        }
      }
      _ => Ok(None),
    }
  }
}
