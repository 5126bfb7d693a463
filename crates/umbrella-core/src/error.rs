//! Unified error handling for umbrella-core

use std::fmt;
use thiserror::Error;

/// Remote operation that crossed the synchronization boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl Operation {
    /// French verb phrase used in user-facing notifications
    pub fn verb(&self) -> &'static str {
        match self {
            Operation::List | Operation::Get => "la récupération",
            Operation::Create => "la création",
            Operation::Update => "la mise à jour",
            Operation::Delete => "la suppression",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::List => "list",
            Operation::Get => "get",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Core error type for umbrella-core
#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("API error {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Api { status: u16, message: Option<String> },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// A failure surfaced by a collection service, carrying the text shown to the user
    #[error("{user_message}")]
    Operation {
        operation: Operation,
        user_message: String,
        #[source]
        source: Box<Error>,
    },
}

/// Result type alias for umbrella-core
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }

    /// Wrap an error raised while performing `operation`, resolving the user message.
    ///
    /// The server-provided message wins; otherwise `fallback` is used.
    pub fn operation(operation: Operation, fallback: String, source: Error) -> Self {
        let user_message = source.server_message().unwrap_or(fallback);
        Error::Operation {
            operation,
            user_message,
            source: Box::new(source),
        }
    }

    /// Message returned by the backend, if any
    pub fn server_message(&self) -> Option<String> {
        match self {
            Error::Api { message, .. } => message.clone().filter(|m| !m.trim().is_empty()),
            Error::Validation(msg) => Some(msg.clone()),
            Error::Operation { source, .. } => source.server_message(),
            _ => None,
        }
    }

    /// Text suitable for a notification, never a raw transport error
    pub fn user_message(&self) -> String {
        match self {
            Error::Operation { user_message, .. } => user_message.clone(),
            Error::Validation(msg) | Error::Config(msg) | Error::NotFound(msg) => msg.clone(),
            Error::Unauthorized(_) => "Session expirée, veuillez vous reconnecter".to_string(),
            other => other
                .server_message()
                .unwrap_or_else(|| "Une erreur inattendue est survenue".to_string()),
        }
    }

    /// True for a 401, including one wrapped by a service
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Error::Unauthorized(_) => true,
            Error::Operation { source, .. } => source.is_unauthorized(),
            _ => false,
        }
    }

    /// True when the failure is a client-side validation rejection
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

// Convert to String for front ends that only display text
impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.user_message()
    }
}
