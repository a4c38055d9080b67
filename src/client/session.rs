//! Storefront login state.
//!
//! A [`SessionContext`] is created once at startup from a [`SessionStore`],
//! handed to whatever needs the bearer token, and cleared on logout.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Mutex, RwLock};

use serde::{Deserialize, Serialize};

use super::TokenProvider;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: SessionUser,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored session is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("session state lock poisoned")]
    Poisoned,
}

pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<Session>, SessionError>;
    fn save(&self, session: &Session) -> Result<(), SessionError>;
    fn clear(&self) -> Result<(), SessionError>;
}

#[derive(Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            slot: Mutex::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>, SessionError> {
        Ok(self.slot.lock().map_err(|_| SessionError::Poisoned)?.clone())
    }

    fn save(&self, session: &Session) -> Result<(), SessionError> {
        *self.slot.lock().map_err(|_| SessionError::Poisoned)? = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.slot.lock().map_err(|_| SessionError::Poisoned)? = None;
        Ok(())
    }
}

/// Persists the session as a JSON file so it survives restarts.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>, SessionError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(session)?)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

pub struct SessionContext {
    store: Box<dyn SessionStore>,
    current: RwLock<Option<Session>>,
}

impl SessionContext {
    /// Loads any persisted session. A corrupt record is discarded, not fatal.
    pub fn init(store: Box<dyn SessionStore>) -> Result<Self, SessionError> {
        let current = match store.load() {
            Ok(session) => session,
            Err(SessionError::Corrupt(e)) => {
                tracing::warn!(error = %e, "discarding corrupt stored session");
                store.clear()?;
                None
            }
            Err(e) => return Err(e),
        };

        Ok(Self {
            store,
            current: RwLock::new(current),
        })
    }

    pub fn current(&self) -> Option<Session> {
        self.current.read().ok().and_then(|s| s.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    pub fn login(&self, session: Session) -> Result<(), SessionError> {
        self.store.save(&session)?;
        tracing::info!(user = %session.user.id, "session started");
        *self.current.write().map_err(|_| SessionError::Poisoned)? = Some(session);
        Ok(())
    }

    pub fn logout(&self) -> Result<(), SessionError> {
        self.store.clear()?;
        *self.current.write().map_err(|_| SessionError::Poisoned)? = None;
        tracing::info!("session cleared");
        Ok(())
    }
}

impl TokenProvider for SessionContext {
    fn bearer_token(&self) -> Option<String> {
        self.current().map(|s| s.token)
    }
}
