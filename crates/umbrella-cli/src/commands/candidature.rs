//! Candidature commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;
use tabled::Tabled;
use umbrella_core::{Candidature, CreateCandidature, UpdateCandidature};

use super::{ensure_changes, Context};
use crate::output::{or_dash, note, print_list, print_record, success};

#[derive(Subcommand)]
pub enum CandidatureAction {
    /// List applications, newest first
    List,

    /// Show one application
    Show {
        /// Candidature ID
        id: String,
    },

    /// Record an application
    Create {
        /// First name
        #[arg(short, long)]
        first_name: String,

        /// Last name
        #[arg(short, long)]
        last_name: String,

        /// Home area
        #[arg(long)]
        location: String,

        /// Phone number
        #[arg(short, long)]
        phone: String,

        /// Email address
        #[arg(short, long)]
        email: String,
    },

    /// Update an application (only the given fields change)
    Update {
        /// Candidature ID
        id: String,

        /// New first name
        #[arg(short, long)]
        first_name: Option<String>,

        /// New last name
        #[arg(short, long)]
        last_name: Option<String>,

        /// New home area
        #[arg(long)]
        location: Option<String>,

        /// New phone number
        #[arg(short, long)]
        phone: Option<String>,

        /// New email address
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Set the review status of an application
    Status {
        /// Candidature ID
        id: String,

        /// New status (e.g. pending, accepted, rejected)
        status: String,
    },

    /// Delete an application
    Delete {
        /// Candidature ID
        id: String,

        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
}

/// Candidature row for table display
#[derive(Debug, Serialize, Tabled)]
pub struct CandidatureRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Nom")]
    pub name: String,
    #[tabled(rename = "Téléphone")]
    pub phone: String,
    #[tabled(rename = "Email")]
    pub email: String,
    #[tabled(rename = "Lieu")]
    pub location: String,
    #[tabled(rename = "Statut")]
    pub status: String,
    #[tabled(rename = "Reçue le")]
    pub received: String,
}

impl From<&Candidature> for CandidatureRow {
    fn from(c: &Candidature) -> Self {
        Self {
            id: c.id.clone(),
            name: format!("{} {}", c.first_name, c.last_name).trim().to_string(),
            phone: or_dash(c.phone.as_deref()),
            email: or_dash(c.email.as_deref()),
            location: or_dash(c.location.as_deref()),
            status: or_dash(c.status.as_deref()),
            received: c.created_at.format("%Y-%m-%d").to_string(),
        }
    }
}

pub async fn execute(ctx: &Context, action: CandidatureAction) -> Result<()> {
    match action {
        CandidatureAction::List => list_candidatures(ctx).await,
        CandidatureAction::Show { id } => show_candidature(ctx, &id).await,
        CandidatureAction::Create {
            first_name,
            last_name,
            location,
            phone,
            email,
        } => {
            let payload = CreateCandidature {
                last_name,
                first_name,
                location,
                phone,
                email,
            };
            create_candidature(ctx, &payload).await
        }
        CandidatureAction::Update {
            id,
            first_name,
            last_name,
            location,
            phone,
            email,
        } => {
            let patch = UpdateCandidature {
                last_name,
                first_name,
                location,
                phone,
                email,
            };
            update_candidature(ctx, &id, &patch).await
        }
        CandidatureAction::Status { id, status } => set_status(ctx, &id, &status).await,
        CandidatureAction::Delete { id, force } => delete_candidature(ctx, &id, force).await,
    }
}

async fn list_candidatures(ctx: &Context) -> Result<()> {
    ctx.require_user().await?;
    ctx.services.candidatures.fetch_all().await?;
    let mut items = ctx.services.candidatures.items().await;
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let rows: Vec<CandidatureRow> = items.iter().map(CandidatureRow::from).collect();
    print_list(&rows, ctx.format)
}

async fn show_candidature(ctx: &Context, id: &str) -> Result<()> {
    ctx.require_user().await?;
    let candidature = ctx.services.candidatures.fetch_one(id).await?;
    print_record(&CandidatureRow::from(&candidature), ctx.format)
}

async fn create_candidature(ctx: &Context, payload: &CreateCandidature) -> Result<()> {
    ctx.require_user().await?;
    let candidature = ctx.services.candidatures.create(payload).await?;
    success(&format!("Candidature {} enregistrée", candidature.id), ctx.quiet);
    Ok(())
}

async fn update_candidature(ctx: &Context, id: &str, patch: &UpdateCandidature) -> Result<()> {
    ensure_changes(patch)?;
    ctx.require_user().await?;
    let candidature = ctx.services.candidatures.update(id, patch).await?;
    success(&format!("Candidature {} mise à jour", candidature.id), ctx.quiet);
    Ok(())
}

async fn set_status(ctx: &Context, id: &str, status: &str) -> Result<()> {
    ctx.require_user().await?;
    let candidature = ctx.services.candidatures.update_status(id, status).await?;
    success(
        &format!(
            "Candidature {} : statut {}",
            candidature.id,
            or_dash(candidature.status.as_deref())
        ),
        ctx.quiet,
    );
    Ok(())
}

async fn delete_candidature(ctx: &Context, id: &str, force: bool) -> Result<()> {
    ctx.require_user().await?;
    if !force {
        let candidature = ctx.services.candidatures.fetch_one(id).await?;
        note("Candidature à supprimer :", ctx.quiet);
        print_record(&CandidatureRow::from(&candidature), ctx.format)?;
        note("\nUse --force to confirm deletion", ctx.quiet);
        return Ok(());
    }

    ctx.services.candidatures.delete(id).await?;
    success(&format!("Candidature {} supprimée", id), ctx.quiet);
    Ok(())
}
