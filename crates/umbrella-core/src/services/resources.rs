//! Concrete collections and their extra endpoints

use std::fmt;

use chrono::NaiveDate;
use reqwest::Method;
use serde_json::{json, Value};

use super::collection::{CollectionService, Resource};
use crate::error::{Error, Operation, Result};
use crate::models::{
    Agent, Candidature, CreateAgent, CreateCandidature, CreatePlanning, CreateSite, CreateUser,
    Planning, Site, UpdateAgent, UpdateCandidature, UpdatePlanning, UpdateSite, UpdateUser, User,
};
use crate::transform::decode_item;

pub type PlanningService = CollectionService<Planning>;
pub type AgentService = CollectionService<Agent>;
pub type SiteService = CollectionService<Site>;
pub type CandidatureService = CollectionService<Candidature>;
pub type UserService = CollectionService<User>;

impl Resource for Planning {
    const PATH: &'static str = "/plannings";
    const LOG_TAG: &'static str = "plannings";
    const OF_ONE: &'static str = "du planning";
    const OF_MANY: &'static str = "des plannings";

    type Create = CreatePlanning;
    type Update = UpdatePlanning;

    fn id_key(&self) -> String {
        self.id.to_string()
    }
}

impl Resource for Agent {
    const PATH: &'static str = "/agents";
    const LOG_TAG: &'static str = "agents";
    const OF_ONE: &'static str = "de l'agent";
    const OF_MANY: &'static str = "des agents";

    type Create = CreateAgent;
    type Update = UpdateAgent;

    fn id_key(&self) -> String {
        self.id.to_string()
    }

    fn update_method() -> Method {
        Method::PATCH
    }
}

impl Resource for Site {
    const PATH: &'static str = "/sites";
    const LOG_TAG: &'static str = "sites";
    const OF_ONE: &'static str = "du site";
    const OF_MANY: &'static str = "des sites";

    type Create = CreateSite;
    type Update = UpdateSite;

    fn id_key(&self) -> String {
        self.id.to_string()
    }
}

impl Resource for Candidature {
    const PATH: &'static str = "/candidatures";
    const LOG_TAG: &'static str = "candidatures";
    const OF_ONE: &'static str = "de la candidature";
    const OF_MANY: &'static str = "des candidatures";
    const PREPEND_ON_CREATE: bool = true;

    type Create = CreateCandidature;
    type Update = UpdateCandidature;

    fn id_key(&self) -> String {
        self.id.clone()
    }
}

impl Resource for User {
    const PATH: &'static str = "/users";
    const LOG_TAG: &'static str = "users";
    const OF_ONE: &'static str = "de l'utilisateur";
    const OF_MANY: &'static str = "des utilisateurs";

    type Create = CreateUser;
    type Update = UpdateUser;

    fn id_key(&self) -> String {
        self.id.to_string()
    }

    fn update_method() -> Method {
        Method::PATCH
    }
}

// ============================================================================
// Plannings
// ============================================================================

impl CollectionService<Planning> {
    /// Plannings where the agent is rostered
    pub async fn by_agent(&self, agent_id: i64) -> Result<Vec<Planning>> {
        self.query_list(&format!("/plannings/agent/{}", agent_id)).await
    }

    pub async fn by_site(&self, site_id: i64) -> Result<Vec<Planning>> {
        self.query_list(&format!("/plannings/site/{}", site_id)).await
    }

    pub async fn by_date(&self, date: NaiveDate) -> Result<Vec<Planning>> {
        self.query_list(&format!("/plannings/date/{}", date.format("%Y-%m-%d")))
            .await
    }
}

// ============================================================================
// Agents
// ============================================================================

impl CollectionService<Agent> {
    /// Attendance statistics for one agent, as returned by the server
    pub async fn stats(&self, agent_id: i64) -> Result<Value> {
        self.query_raw(&format!("/agents/{}/stats", agent_id)).await
    }

    /// Cached agents of one site
    pub async fn by_site(&self, site_id: i64) -> Vec<Agent> {
        self.items()
            .await
            .into_iter()
            .filter(|a| a.site.id == site_id)
            .collect()
    }
}

// ============================================================================
// Candidatures
// ============================================================================

impl CollectionService<Candidature> {
    /// Set the review status; the cached candidature takes the server's version
    pub async fn update_status(&self, id: impl fmt::Display, status: &str) -> Result<Candidature> {
        let id = id.to_string();
        let status = status.trim();
        if status.is_empty() {
            return Err(Error::validation("Le statut est requis"));
        }

        let path = format!("/candidatures/{}/status", id);
        let updated = match self
            .backend()
            .send(Method::PATCH, &path, Some(json!({ "status": status })))
            .await
        {
            Ok(body) => decode_item::<Candidature>(body),
            Err(e) => Err(e),
        };

        match updated {
            Ok(candidature) => {
                self.replace_cached(&id, candidature.clone()).await;
                log::info!("[candidatures] candidature #{} status set to {}", id, status);
                Ok(candidature)
            }
            Err(e) => Err(self.fail(Operation::Update, e).await),
        }
    }
}

// ============================================================================
// Users
// ============================================================================

impl CollectionService<User> {
    /// Lock or unlock an account; the cached user takes the server's version
    pub async fn toggle_lock(&self, user_id: i64) -> Result<User> {
        let path = format!("/users/{}/toggle-lock", user_id);
        let toggled = match self
            .backend()
            .send(Method::PATCH, &path, Some(json!({})))
            .await
        {
            Ok(body) => decode_item::<User>(body),
            Err(e) => Err(e),
        };

        match toggled {
            Ok(user) => {
                self.replace_cached(&user_id.to_string(), user.clone()).await;
                log::info!(
                    "[users] user #{} is now {}",
                    user_id,
                    if user.is_locked { "locked" } else { "unlocked" }
                );
                Ok(user)
            }
            Err(e) => Err(self.fail(Operation::Update, e).await),
        }
    }

    /// Recent activity of one account, as returned by the server
    pub async fn activity(&self, user_id: i64) -> Result<Value> {
        self.query_raw(&format!("/users/{}/activity", user_id)).await
    }
}
