//! Authenticated session storage (token + user)

use std::path::{Path, PathBuf};

use tokio::sync::RwLock;

use crate::error::Result;
use crate::models::{Session, User};

/// Holds the current session, optionally mirrored to a JSON file
#[derive(Debug, Default)]
pub struct SessionStore {
    path: Option<PathBuf>,
    current: RwLock<Option<Session>>,
}

impl SessionStore {
    /// Session kept only for the lifetime of the process
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a file-backed store, restoring any saved session.
    ///
    /// A corrupt file is discarded rather than failing start-up.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let current = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<Session>(&content) {
                Ok(session) => Some(session),
                Err(e) => {
                    log::warn!(
                        "[session] Ignoring unreadable session file {}: {}",
                        path.display(),
                        e
                    );
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            path: Some(path),
            current: RwLock::new(current),
        })
    }

    pub async fn set(&self, session: Session) -> Result<()> {
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, serde_json::to_string_pretty(&session)?)?;
        }
        *self.current.write().await = Some(session);
        Ok(())
    }

    /// Forget the session (logout or rejected token)
    pub async fn clear(&self) -> Result<()> {
        *self.current.write().await = None;
        if let Some(path) = &self.path {
            if path.exists() {
                std::fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    pub async fn token(&self) -> Option<String> {
        self.current.read().await.as_ref().map(|s| s.token.clone())
    }

    pub async fn user(&self) -> Option<User> {
        self.current.read().await.as_ref().map(|s| s.user.clone())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.current.read().await.is_some()
    }

    /// Replace the stored user, keeping the token
    pub async fn update_user(&self, user: User) -> Result<()> {
        let token = match self.token().await {
            Some(token) => token,
            None => return Ok(()),
        };
        self.set(Session { token, user }).await
    }
}
