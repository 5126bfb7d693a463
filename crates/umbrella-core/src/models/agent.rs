//! Agent (field worker) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary of the user accountable for a site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Responsible {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub matricule: Option<String>,
}

impl Responsible {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// Site reference embedded in an agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteRef {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub responsable: Option<Responsible>,
}

impl SiteRef {
    /// Reference known only by id (payload carried `site_id` or a bare number)
    pub fn from_id(id: i64) -> Self {
        Self {
            id,
            name: String::new(),
            location: String::new(),
            responsable: None,
        }
    }
}

/// A field worker, assigned to exactly one site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: i64,
    pub matricule: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
    pub status: bool,
    pub site: SiteRef,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Agent {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    pub fn site_id(&self) -> i64 {
        self.site.id
    }
}

/// Create agent request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAgent {
    pub matricule: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub status: bool,
    pub site_id: i64,
}

/// Update agent request (PATCH semantics: absent fields are left untouched)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAgent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matricule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_id: Option<i64>,
}
