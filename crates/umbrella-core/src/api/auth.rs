//! Login, logout and current-user lookup

use std::sync::Arc;

use serde_json::json;

use super::{Backend, SessionStore};
use crate::error::{Error, Result};
use crate::models::{Session, User};
use crate::transform::{decode_item, unwrap_item};

pub struct AuthService {
    backend: Arc<dyn Backend>,
    session: Arc<SessionStore>,
}

impl AuthService {
    pub fn new(backend: Arc<dyn Backend>, session: Arc<SessionStore>) -> Self {
        Self { backend, session }
    }

    /// Authenticate with matricule and password; the session is stored on success.
    pub async fn login(&self, matricule: &str, password: &str) -> Result<User> {
        let body = json!({ "matricule": matricule, "password": password });
        let response = match self.backend.post("/auth/login", body).await {
            Ok(response) => unwrap_item(response),
            // A 401 here means bad credentials, not an expired session
            Err(Error::Unauthorized(reason)) => {
                log::warn!("[auth] Login refused for {}: {}", matricule, reason);
                return Err(Error::Api {
                    status: 401,
                    message: Some("Matricule ou mot de passe incorrect".to_string()),
                });
            }
            Err(e) => return Err(e),
        };

        let token = response
            .get("token")
            .or_else(|| response.get("access_token"))
            .and_then(|t| t.as_str())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::internal("login response has no token"))?
            .to_string();
        let user_payload = response
            .get("user")
            .cloned()
            .ok_or_else(|| Error::internal("login response has no user"))?;
        let user: User = decode_item(user_payload)?;

        if user.is_locked {
            return Err(Error::Api {
                status: 403,
                message: Some("Ce compte est verrouillé".to_string()),
            });
        }

        self.session
            .set(Session {
                token,
                user: user.clone(),
            })
            .await?;
        log::info!("[auth] Logged in as user #{}", user.id);
        Ok(user)
    }

    /// Log out remotely, then always drop the local session
    pub async fn logout(&self) -> Result<()> {
        if self.session.is_authenticated().await {
            if let Err(e) = self.backend.post("/users/logout", json!({})).await {
                log::warn!("[auth] Remote logout failed: {}", e);
            }
        }
        self.session.clear().await
    }

    /// Fetch the authenticated user and refresh the stored copy
    pub async fn me(&self) -> Result<User> {
        let user: User = decode_item(self.backend.get("/auth/me").await?)?;
        self.session.update_user(user.clone()).await?;
        Ok(user)
    }

    pub async fn current_user(&self) -> Option<User> {
        self.session.user().await
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }
}
