//! Data models for the Umbrella application
//!
//! These are the canonical, fully-typed entities. Raw backend payloads are
//! normalized into them by the `transform` module.

pub mod agent;
pub mod candidature;
pub mod planning;
pub mod site;
pub mod user;

pub use agent::{Agent, CreateAgent, Responsible, SiteRef, UpdateAgent};
pub use candidature::{Candidature, CreateCandidature, UpdateCandidature};
pub use planning::{
    AgentSummary, AttendanceStatus, CreatePlanning, Planning, PlanningAgent, PlanningAgentInput,
    PlanningSite, ShiftInput, ShiftRoster, ShiftType, Shifts, ShiftsInput, UpdatePlanning,
};
pub use site::{CreateSite, Site, UpdateSite};
pub use user::{CreateUser, Session, UpdateUser, User};
