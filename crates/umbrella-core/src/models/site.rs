//! Site (work location) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::agent::Responsible;

/// A physical work location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub responsable_id: Option<i64>,
    pub responsable: Option<Responsible>,
    pub agents_count: usize,
    pub created_at: Option<DateTime<Utc>>,
}

/// Create site request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSite {
    pub name: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responsable_id: Option<i64>,
}

/// Update site request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSite {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responsable_id: Option<i64>,
}
