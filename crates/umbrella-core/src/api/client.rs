//! reqwest-backed REST client

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Method, StatusCode};
use serde_json::Value;

use super::{Backend, SessionStore};
use crate::config::AppConfig;
use crate::error::{Error, Result};

/// HTTP client for the Umbrella REST API
pub struct ApiClient {
    base_url: String,
    client: Client,
    session: Arc<SessionStore>,
}

impl ApiClient {
    /// Build a client from configuration; the bearer token is read from
    /// `session` on every request.
    pub fn new(config: &AppConfig, session: Arc<SessionStore>) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(format!("umbrella/{}", crate::VERSION))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            client,
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = self.url(path);
        log::debug!("[api] {} {}", method, url);

        let mut request = self.client.request(method.clone(), &url);
        if let Some(token) = self.session.token().await {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status == StatusCode::UNAUTHORIZED {
            log::warn!("[api] {} {} rejected with 401, clearing session", method, path);
            if let Err(e) = self.session.clear().await {
                log::warn!("[api] Failed to clear session: {}", e);
            }
            return Err(Error::Unauthorized(
                extract_message(&text).unwrap_or_else(|| "Unauthenticated".to_string()),
            ));
        }

        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: extract_message(&text),
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// Server-provided error text from a JSON error body (`message`, then `error`)
fn extract_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|m| !m.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_message() {
        assert_eq!(
            extract_message(r#"{"message":"Site introuvable"}"#).as_deref(),
            Some("Site introuvable")
        );
        assert_eq!(
            extract_message(r#"{"message":"","error":"Bad date"}"#).as_deref(),
            Some("Bad date")
        );
        assert!(extract_message("<html>502</html>").is_none());
        assert!(extract_message(r#"{"errors":{}}"#).is_none());
    }

    #[test]
    fn test_url_joining() {
        let config = AppConfig {
            api_base_url: "http://localhost:8000/api/".to_string(),
            ..AppConfig::default()
        };
        let client = ApiClient::new(&config, Arc::new(SessionStore::in_memory())).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000/api");
        assert_eq!(client.url("/plannings/3"), "http://localhost:8000/api/plannings/3");
        assert_eq!(client.url("sites"), "http://localhost:8000/api/sites");
    }
}
