//! Site commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;
use tabled::Tabled;
use umbrella_core::{CreateSite, Site, UpdateSite};

use super::{ensure_changes, truncate, Context};
use crate::output::{note, print_list, print_record, success};

#[derive(Subcommand)]
pub enum SiteAction {
    /// List sites
    List,

    /// Show one site
    Show {
        /// Site ID
        id: i64,
    },

    /// Create a site
    Create {
        /// Site name
        #[arg(short, long)]
        name: String,

        /// Address or area
        #[arg(short, long)]
        location: String,

        /// User ID of the site manager
        #[arg(short, long)]
        responsable: Option<i64>,
    },

    /// Update a site
    Update {
        /// Site ID
        id: i64,

        /// New name
        #[arg(short, long)]
        name: Option<String>,

        /// New address or area
        #[arg(short, long)]
        location: Option<String>,

        /// User ID of the new site manager
        #[arg(short, long)]
        responsable: Option<i64>,
    },

    /// Delete a site
    Delete {
        /// Site ID
        id: i64,

        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
}

/// Site row for table display
#[derive(Debug, Serialize, Tabled)]
pub struct SiteRow {
    #[tabled(rename = "ID")]
    pub id: i64,
    #[tabled(rename = "Nom")]
    pub name: String,
    #[tabled(rename = "Lieu")]
    pub location: String,
    #[tabled(rename = "Responsable")]
    pub responsable: String,
    #[tabled(rename = "Agents")]
    pub agents_count: usize,
}

impl From<&Site> for SiteRow {
    fn from(site: &Site) -> Self {
        Self {
            id: site.id,
            name: truncate(&site.name, 30),
            location: truncate(&site.location, 30),
            responsable: match (&site.responsable, site.responsable_id) {
                (Some(r), _) => r.full_name(),
                (None, Some(id)) => format!("#{}", id),
                (None, None) => "-".to_string(),
            },
            agents_count: site.agents_count,
        }
    }
}

pub async fn execute(ctx: &Context, action: SiteAction) -> Result<()> {
    match action {
        SiteAction::List => list_sites(ctx).await,
        SiteAction::Show { id } => show_site(ctx, id).await,
        SiteAction::Create {
            name,
            location,
            responsable,
        } => {
            let payload = CreateSite {
                name,
                location,
                responsable_id: responsable,
            };
            create_site(ctx, &payload).await
        }
        SiteAction::Update {
            id,
            name,
            location,
            responsable,
        } => {
            let patch = UpdateSite {
                name,
                location,
                responsable_id: responsable,
            };
            update_site(ctx, id, &patch).await
        }
        SiteAction::Delete { id, force } => delete_site(ctx, id, force).await,
    }
}

async fn list_sites(ctx: &Context) -> Result<()> {
    ctx.require_user().await?;
    ctx.services.sites.fetch_all().await?;
    let rows: Vec<SiteRow> = ctx
        .services
        .sites
        .items()
        .await
        .iter()
        .map(SiteRow::from)
        .collect();
    print_list(&rows, ctx.format)
}

async fn show_site(ctx: &Context, id: i64) -> Result<()> {
    ctx.require_user().await?;
    let site = ctx.services.sites.fetch_one(id).await?;
    print_record(&SiteRow::from(&site), ctx.format)
}

async fn create_site(ctx: &Context, payload: &CreateSite) -> Result<()> {
    ctx.require_user().await?;
    let site = ctx.services.sites.create(payload).await?;
    success(&format!("Site #{} créé", site.id), ctx.quiet);
    if !ctx.quiet {
        print_record(&SiteRow::from(&site), ctx.format)?;
    }
    Ok(())
}

async fn update_site(ctx: &Context, id: i64, patch: &UpdateSite) -> Result<()> {
    ensure_changes(patch)?;
    ctx.require_user().await?;
    let site = ctx.services.sites.update(id, patch).await?;
    success(&format!("Site #{} mis à jour", site.id), ctx.quiet);
    Ok(())
}

async fn delete_site(ctx: &Context, id: i64, force: bool) -> Result<()> {
    ctx.require_user().await?;
    if !force {
        let site = ctx.services.sites.fetch_one(id).await?;
        note("Site à supprimer :", ctx.quiet);
        print_record(&SiteRow::from(&site), ctx.format)?;
        note("\nUse --force to confirm deletion", ctx.quiet);
        return Ok(());
    }

    ctx.services.sites.delete(id).await?;
    success(&format!("Site #{} supprimé", id), ctx.quiet);
    Ok(())
}
