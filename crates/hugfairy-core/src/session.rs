//! Session persistence and lifecycle hooks.
//!
//! The exported session is a single JSON line holding the DID, handle and
//! token pair. It is written whenever the client reports a created or
//! refreshed session, and read once at startup to skip credential login.

use crate::error::Result;
use crate::xrpc::SessionTokens;
use serde::{Deserialize, Serialize};
use std::fs::{self, Permissions};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Exported authentication state for one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub did: String,
    pub handle: String,
    pub access_jwt: String,
    pub refresh_jwt: String,
}

impl From<SessionTokens> for Session {
    fn from(t: SessionTokens) -> Self {
        Self {
            did: t.did,
            handle: t.handle,
            access_jwt: t.access_jwt,
            refresh_jwt: t.refresh_jwt,
        }
    }
}

/// Lifecycle events reported by the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A session was created from credentials
    Create,
    /// The token pair was rotated via refreshSession
    Refresh,
    /// The stored session was rejected and could not be refreshed
    Expired,
}

/// Callback invoked by the agent on session lifecycle events
pub type SessionHook = Box<dyn Fn(SessionEvent, &Session) + Send + Sync>;

/// Single-file session persistence
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored session. An absent file is not a failure.
    pub fn load(&self) -> Result<Option<Session>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("Session file not found at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let session = serde_json::from_str(raw.trim())?;
        Ok(Some(session))
    }

    /// Overwrite the session file with restricted permissions (0600).
    ///
    /// Last writer wins; there is no partial-write protection.
    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let exported = serde_json::to_string(session)?;
        fs::write(&self.path, exported)?;
        fs::set_permissions(&self.path, Permissions::from_mode(0o600))?;
        Ok(())
    }
}

/// Standard lifecycle hook: persist the session on create and refresh,
/// log everything else without touching the file.
pub fn persist_hook(store: SessionStore) -> SessionHook {
    Box::new(move |event, session| {
        info!("Session changed: {:?} for {}", event, session.handle);
        match event {
            SessionEvent::Create | SessionEvent::Refresh => {
                info!("Saving changed session");
                if let Err(e) = store.save(session) {
                    warn!("Failed to save session: {}", e);
                }
            }
            _ => {}
        }
    })
}
