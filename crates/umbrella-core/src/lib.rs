//! # umbrella-core
//!
//! Core client logic for the Umbrella Industrial Services HR application,
//! shared by every front end.
//!
//! This crate provides:
//! - Canonical entities (`models` module)
//! - Payload normalization (`transform` module)
//! - REST transport and authentication (`api` module)
//! - Planning composer, site grouping and cached collections (`services` module)
//! - Client configuration (`config` module)
//! - Unified error handling (`error` module)

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod transform;

pub use api::{ApiClient, AuthService, Backend, SessionStore};
pub use config::{get_config_path, get_session_path, load_config, save_config, AppConfig};
pub use error::{Error, Operation, Result};

pub use models::{
    Agent, AgentSummary, AttendanceStatus, Candidature, CreateAgent, CreateCandidature,
    CreatePlanning, CreateSite, CreateUser, Planning, PlanningAgent, PlanningAgentInput, Session,
    ShiftType, Shifts, ShiftsInput, Site, SiteRef, UpdateAgent, UpdateCandidature,
    UpdatePlanning, UpdateSite, UpdateUser, User,
};

pub use services::{
    group_agents_by_site, AgentFieldUpdate, AgentService, CandidatureService, CollectionService,
    ComposerError, FetchOutcome, PlanningComposer, PlanningService, Resource, ServiceRegistry,
    SiteGroup, SiteService, UserService,
};

pub use transform::{decode_item, decode_list, FromPayload};

/// Library version, sent in the `User-Agent` of every API request
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
