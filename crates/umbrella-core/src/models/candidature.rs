//! Candidature (job application) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An inbound job application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidature {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
    /// Review status set by staff ("pending", "accepted", ...), absent on old records
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Create candidature request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCandidature {
    pub last_name: String,
    pub first_name: String,
    pub location: String,
    pub phone: String,
    pub email: String,
}

/// Update candidature request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCandidature {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}
