//! Signed-in operator state.
//!
//! The session is created once at start-up from the persisted file, handed
//! to everything that needs credentials, and torn down by an explicit
//! sign-out.

use schooldesk_core::errors::{DeskError, DeskResult};
use schooldesk_core::models::auth::SessionUser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: SessionUser,
}

pub struct SessionContext {
    path: Option<PathBuf>,
    current: RwLock<Option<Session>>,
}

impl SessionContext {
    /// In-memory session that is never written to disk.
    pub fn ephemeral() -> Self {
        Self {
            path: None,
            current: RwLock::new(None),
        }
    }

    /// Reads persisted credentials from `path`.
    ///
    /// A missing or unreadable file starts the console signed out.
    pub async fn restore(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str::<Session>(&raw) {
                Ok(session) => {
                    info!("Restored session for {}", session.user.email);
                    Some(session)
                }
                Err(e) => {
                    warn!("Ignoring unreadable session file {}: {}", path.display(), e);
                    None
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No session file at {}", path.display());
                None
            }
            Err(e) => {
                warn!("Failed to read session file {}: {}", path.display(), e);
                None
            }
        };

        Self {
            path: Some(path),
            current: RwLock::new(current),
        }
    }

    pub async fn token(&self) -> Option<String> {
        self.current.read().await.as_ref().map(|s| s.token.clone())
    }

    pub async fn user(&self) -> Option<SessionUser> {
        self.current.read().await.as_ref().map(|s| s.user.clone())
    }

    pub async fn is_signed_in(&self) -> bool {
        self.current.read().await.is_some()
    }

    /// Stores the session in memory and persists it.
    pub async fn sign_in(&self, session: Session) -> DeskResult<()> {
        if let Some(path) = &self.path {
            let raw = serde_json::to_string_pretty(&session)?;
            tokio::fs::write(path, raw)
                .await
                .map_err(|e| DeskError::Internal(eyre::eyre!("writing {}: {}", path.display(), e)))?;
        }
        *self.current.write().await = Some(session);
        Ok(())
    }

    /// Clears the session in memory and on disk.
    pub async fn sign_out(&self) -> DeskResult<()> {
        *self.current.write().await = None;
        if let Some(path) = &self.path {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(DeskError::Internal(eyre::eyre!(
                        "removing {}: {}",
                        path.display(),
                        e
                    )));
                }
            }
        }
        Ok(())
    }
}
