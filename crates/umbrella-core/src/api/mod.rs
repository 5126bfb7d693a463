//! REST transport and authentication
//!
//! Every service talks to the backend through the [`Backend`] trait so the
//! synchronization logic can be exercised without a server.

pub mod auth;
pub mod client;
pub mod session;

pub use auth::AuthService;
pub use client::ApiClient;
pub use session::SessionStore;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use crate::error::Result;

/// JSON request/response transport to the REST backend
#[async_trait]
pub trait Backend: Send + Sync {
    /// Send one request; `path` is relative to the API base URL.
    ///
    /// Returns the decoded JSON body, `Value::Null` when the body is empty.
    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value>;

    async fn get(&self, path: &str) -> Result<Value> {
        self.send(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        self.send(Method::POST, path, Some(body)).await
    }

    async fn delete(&self, path: &str) -> Result<Value> {
        self.send(Method::DELETE, path, None).await
    }
}
