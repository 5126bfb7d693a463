//! Business logic services
//!
//! - `grouping`: agents-by-site partition
//! - `composer`: planning draft editing and validation
//! - `collection`: cached CRUD synchronization shared by all collections
//! - `resources`: the concrete collections and their extra endpoints
//! - `registry`: one instance of each service per session

pub mod collection;
pub mod composer;
pub mod grouping;
pub mod registry;
pub mod resources;

pub use collection::{CollectionService, FetchOutcome, Resource};
pub use composer::{AgentFieldUpdate, ComposerError, PlanningComposer};
pub use grouping::{collation_key, group_agents_by_site, SiteGroup};
pub use registry::ServiceRegistry;
pub use resources::{AgentService, CandidatureService, PlanningService, SiteService, UserService};
