use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use thiserror::Error;

use crate::{
    auth,
    models::{LoginOutcome, Role},
};

/// Fixed key names of the persisted slot.
pub const TOKEN_KEY: &str = "token";
pub const ROLE_KEY: &str = "userRole";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("session slot I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("session slot is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
}

/// Session
///
/// The single active authentication context: the opaque token and the role it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub role: Role,
}

impl Session {
    pub fn new(token: impl Into<String>, role: Role) -> Self {
        Self {
            token: token.into(),
            role,
        }
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        auth::token_expired_at(&self.token, now)
    }
}

// 1. SessionStore Contract
/// SessionStore
///
/// Abstract persisted key/value slot holding the session. Swappable between the on-disk
/// slot used by the CLI and the in-memory slot used by tests.
pub trait SessionStore: Send + Sync {
    /// Returns the last persisted session, or `None` when no token is stored.
    fn load(&self) -> Result<Option<Session>, SessionError>;

    /// Persists token and role together. Readers never observe one without the other.
    fn save(&self, session: &Session) -> Result<(), SessionError>;

    /// Removes both keys. Clearing an empty slot is not an error.
    fn clear(&self) -> Result<(), SessionError>;
}

/// SessionState
///
/// The concrete type used to share the session slot between the API client and the route guard.
pub type SessionState = Arc<dyn SessionStore>;

/// On-disk layout of the slot: one JSON object keyed by `TOKEN_KEY` and `ROLE_KEY`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedSlot {
    #[serde(rename = "token", default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(rename = "userRole", default, skip_serializing_if = "Option::is_none")]
    user_role: Option<String>,
}

// 2. The Real Implementation (JSON file)
/// FileSessionStore
///
/// Keeps the slot in a small JSON file. Writes go to a sibling temporary file that is then
/// renamed over the slot, so a crash mid-write leaves the previous session intact.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "session.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>, SessionError> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let slot: PersistedSlot = serde_json::from_slice(&raw)?;
        Ok(slot.token.filter(|t| !t.is_empty()).map(|token| Session {
            token,
            role: slot
                .user_role
                .as_deref()
                .map(Role::parse)
                .unwrap_or(Role::Unknown),
        }))
    }

    fn save(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let slot = PersistedSlot {
            token: Some(session.token.clone()),
            user_role: Some(session.role.as_str().to_string()),
        };
        let temp = self.temp_path();
        fs::write(&temp, serde_json::to_vec_pretty(&slot)?)?;
        fs::rename(&temp, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// 3. The In-Memory Implementation (tests, ephemeral runs)
/// MemorySessionStore
///
/// Process-local slot. `new_failing` simulates an unusable slot for error-path tests.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<Session>>,
    should_fail: bool,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            slot: Mutex::new(Some(session)),
            should_fail: false,
        }
    }

    pub fn new_failing() -> Self {
        Self {
            slot: Mutex::new(None),
            should_fail: true,
        }
    }

    fn check(&self) -> Result<(), SessionError> {
        if self.should_fail {
            return Err(io::Error::other("memory session store: simulated failure").into());
        }
        Ok(())
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>, SessionError> {
        self.check()?;
        Ok(self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, session: &Session) -> Result<(), SessionError> {
        self.check()?;
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        self.check()?;
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

/// SessionContext
///
/// Explicit owner of the session lifecycle, handed to the API client and the route guard
/// at construction instead of being reached through ambient global state.
/// Created on login (`begin`), destroyed on logout or expiry (`end`).
#[derive(Clone)]
pub struct SessionContext {
    store: SessionState,
}

impl SessionContext {
    pub fn new(store: SessionState) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStore::new()))
    }

    /// Starts a session from a validated login outcome.
    pub fn begin(&self, outcome: &LoginOutcome) -> Result<Session, SessionError> {
        let session = Session::new(outcome.token.clone(), outcome.user.role);
        self.store.save(&session)?;
        tracing::info!(role = %session.role, user_id = outcome.user.id, "session started");
        Ok(session)
    }

    pub fn set_session(&self, token: &str, role: Role) -> Result<(), SessionError> {
        self.store.save(&Session::new(token, role))
    }

    pub fn current(&self) -> Result<Option<Session>, SessionError> {
        self.store.load()
    }

    pub fn token(&self) -> Result<Option<String>, SessionError> {
        Ok(self.store.load()?.map(|s| s.token))
    }

    pub fn role(&self) -> Result<Option<Role>, SessionError> {
        Ok(self.store.load()?.map(|s| s.role))
    }

    /// Destroys the session. Used by logout, by the guard on expiry and by the API client on 401.
    pub fn end(&self) -> Result<(), SessionError> {
        self.store.clear()?;
        tracing::info!("session cleared");
        Ok(())
    }

    pub fn clear_session(&self) -> Result<(), SessionError> {
        self.end()
    }
}
