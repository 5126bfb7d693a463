//! Agent commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;
use tabled::Tabled;
use umbrella_core::{group_agents_by_site, Agent, CreateAgent, SiteGroup, UpdateAgent};

use super::{ensure_changes, truncate, Context};
use crate::output::{or_dash, note, print_list, print_record, success, print_value};

#[derive(Subcommand)]
pub enum AgentAction {
    /// List agents
    List {
        /// Only agents of this site
        #[arg(short, long)]
        site: Option<i64>,
    },

    /// Agent head counts per site
    BySite,

    /// Show one agent
    Show {
        /// Agent ID
        id: i64,
    },

    /// Show attendance statistics of an agent
    Stats {
        /// Agent ID
        id: i64,
    },

    /// Register an agent
    Create {
        /// Matricule (employee number)
        #[arg(short, long)]
        matricule: String,

        /// First name
        #[arg(short, long)]
        first_name: String,

        /// Last name
        #[arg(short, long)]
        last_name: String,

        /// Assigned site ID
        #[arg(short, long)]
        site: i64,

        /// Phone number
        #[arg(short, long)]
        phone: Option<String>,

        /// Email address
        #[arg(short, long)]
        email: Option<String>,

        /// Home area
        #[arg(long)]
        location: Option<String>,

        /// Register the agent as inactive
        #[arg(long)]
        inactive: bool,
    },

    /// Update an agent (only the given fields change)
    Update {
        /// Agent ID
        id: i64,

        /// New matricule
        #[arg(short, long)]
        matricule: Option<String>,

        /// New first name
        #[arg(short, long)]
        first_name: Option<String>,

        /// New last name
        #[arg(short, long)]
        last_name: Option<String>,

        /// Move the agent to this site
        #[arg(short, long)]
        site: Option<i64>,

        /// New phone number
        #[arg(short, long)]
        phone: Option<String>,

        /// New email address
        #[arg(short, long)]
        email: Option<String>,

        /// New home area
        #[arg(long)]
        location: Option<String>,

        /// Activate (true) or deactivate (false) the agent
        #[arg(long)]
        active: Option<bool>,
    },

    /// Delete an agent
    Delete {
        /// Agent ID
        id: i64,

        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
}

/// Agent row for table display
#[derive(Debug, Serialize, Tabled)]
pub struct AgentRow {
    #[tabled(rename = "ID")]
    pub id: i64,
    #[tabled(rename = "Matricule")]
    pub matricule: String,
    #[tabled(rename = "Nom")]
    pub name: String,
    #[tabled(rename = "Téléphone")]
    pub phone: String,
    #[tabled(rename = "Site")]
    pub site: String,
    #[tabled(rename = "Actif")]
    pub active: String,
}

impl From<&Agent> for AgentRow {
    fn from(agent: &Agent) -> Self {
        Self {
            id: agent.id,
            matricule: agent.matricule.clone(),
            name: agent.full_name(),
            phone: or_dash(agent.phone.as_deref()),
            site: if agent.site.name.is_empty() {
                format!("#{}", agent.site.id)
            } else {
                truncate(&agent.site.name, 30)
            },
            active: if agent.status { "oui" } else { "non" }.to_string(),
        }
    }
}

/// Site group row for table display
#[derive(Debug, Serialize, Tabled)]
pub struct SiteGroupRow {
    #[tabled(rename = "Site ID")]
    pub site_id: i64,
    #[tabled(rename = "Site")]
    pub site: String,
    #[tabled(rename = "Lieu")]
    pub location: String,
    #[tabled(rename = "Agents")]
    pub agents_count: usize,
}

impl From<&SiteGroup> for SiteGroupRow {
    fn from(group: &SiteGroup) -> Self {
        Self {
            site_id: group.site.id,
            site: or_dash(Some(group.site.name.as_str())),
            location: or_dash(Some(group.site.location.as_str())),
            agents_count: group.agents_count,
        }
    }
}

pub async fn execute(ctx: &Context, action: AgentAction) -> Result<()> {
    match action {
        AgentAction::List { site } => list_agents(ctx, site).await,
        AgentAction::BySite => agents_by_site(ctx).await,
        AgentAction::Show { id } => show_agent(ctx, id).await,
        AgentAction::Stats { id } => agent_stats(ctx, id).await,
        AgentAction::Create {
            matricule,
            first_name,
            last_name,
            site,
            phone,
            email,
            location,
            inactive,
        } => {
            let payload = CreateAgent {
                matricule,
                first_name,
                last_name,
                phone,
                email,
                location,
                status: !inactive,
                site_id: site,
            };
            create_agent(ctx, &payload).await
        }
        AgentAction::Update {
            id,
            matricule,
            first_name,
            last_name,
            site,
            phone,
            email,
            location,
            active,
        } => {
            let patch = UpdateAgent {
                matricule,
                first_name,
                last_name,
                phone,
                email,
                location,
                status: active,
                site_id: site,
            };
            update_agent(ctx, id, &patch).await
        }
        AgentAction::Delete { id, force } => delete_agent(ctx, id, force).await,
    }
}

async fn list_agents(ctx: &Context, site: Option<i64>) -> Result<()> {
    ctx.require_user().await?;
    ctx.services.agents.fetch_all().await?;
    let agents = match site {
        Some(site_id) => ctx.services.agents.by_site(site_id).await,
        None => ctx.services.agents.items().await,
    };
    let rows: Vec<AgentRow> = agents.iter().map(AgentRow::from).collect();
    print_list(&rows, ctx.format)
}

async fn agents_by_site(ctx: &Context) -> Result<()> {
    ctx.require_user().await?;
    ctx.services.agents.fetch_all().await?;
    let groups = group_agents_by_site(&ctx.services.agents.items().await);
    let rows: Vec<SiteGroupRow> = groups.iter().map(SiteGroupRow::from).collect();
    print_list(&rows, ctx.format)
}

async fn show_agent(ctx: &Context, id: i64) -> Result<()> {
    ctx.require_user().await?;
    let agent = ctx.services.agents.fetch_one(id).await?;
    print_record(&AgentRow::from(&agent), ctx.format)
}

async fn agent_stats(ctx: &Context, id: i64) -> Result<()> {
    ctx.require_user().await?;
    let stats = ctx.services.agents.stats(id).await?;
    print_value(&stats, ctx.format)
}

async fn create_agent(ctx: &Context, payload: &CreateAgent) -> Result<()> {
    ctx.require_user().await?;
    let agent = ctx.services.agents.create(payload).await?;
    success(
        &format!("Agent #{} créé ({})", agent.id, agent.full_name()),
        ctx.quiet,
    );
    Ok(())
}

async fn update_agent(ctx: &Context, id: i64, patch: &UpdateAgent) -> Result<()> {
    ensure_changes(patch)?;
    ctx.require_user().await?;
    let agent = ctx.services.agents.update(id, patch).await?;
    success(&format!("Agent #{} mis à jour", agent.id), ctx.quiet);
    if !ctx.quiet {
        print_record(&AgentRow::from(&agent), ctx.format)?;
    }
    Ok(())
}

async fn delete_agent(ctx: &Context, id: i64, force: bool) -> Result<()> {
    ctx.require_user().await?;
    if !force {
        let agent = ctx.services.agents.fetch_one(id).await?;
        note("Agent à supprimer :", ctx.quiet);
        print_record(&AgentRow::from(&agent), ctx.format)?;
        note("\nUse --force to confirm deletion", ctx.quiet);
        return Ok(());
    }

    ctx.services.agents.delete(id).await?;
    success(&format!("Agent #{} supprimé", id), ctx.quiet);
    Ok(())
}
