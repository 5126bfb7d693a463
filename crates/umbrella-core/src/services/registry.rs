//! One instance of every service for an application session

use std::sync::Arc;

use super::composer::PlanningComposer;
use super::resources::{AgentService, CandidatureService, PlanningService, SiteService, UserService};
use crate::api::{ApiClient, AuthService, Backend, SessionStore};
use crate::config::AppConfig;
use crate::error::Result;

pub struct ServiceRegistry {
    pub auth: AuthService,
    pub plannings: PlanningService,
    pub agents: AgentService,
    pub sites: SiteService,
    pub candidatures: CandidatureService,
    pub users: UserService,
}

impl ServiceRegistry {
    /// Services sharing one backend and one session
    pub fn new(backend: Arc<dyn Backend>, session: Arc<SessionStore>) -> Self {
        Self {
            auth: AuthService::new(backend.clone(), session),
            plannings: PlanningService::new(backend.clone()),
            agents: AgentService::new(backend.clone()),
            sites: SiteService::new(backend.clone()),
            candidatures: CandidatureService::new(backend.clone()),
            users: UserService::new(backend),
        }
    }

    /// Services over the REST API described by `config`
    pub fn connect(config: &AppConfig, session: Arc<SessionStore>) -> Result<Self> {
        let client = ApiClient::new(config, session.clone())?;
        Ok(Self::new(Arc::new(client), session))
    }

    /// Composer over the currently cached agents
    pub async fn composer(&self) -> PlanningComposer {
        PlanningComposer::new(self.agents.items().await)
    }

    /// Drop every cached collection
    pub async fn reset(&self) {
        self.plannings.reset().await;
        self.agents.reset().await;
        self.sites.reset().await;
        self.candidatures.reset().await;
        self.users.reset().await;
        log::debug!("[registry] caches cleared");
    }

    /// End the session and clear every cache
    pub async fn logout(&self) -> Result<()> {
        let result = self.auth.logout().await;
        self.reset().await;
        result
    }
}
