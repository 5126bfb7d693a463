//! User account commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;
use tabled::Tabled;
use umbrella_core::{CreateUser, UpdateUser, User};

use super::{ensure_changes, Context};
use crate::output::{or_dash, print_list, print_record, success, print_value};

#[derive(Subcommand)]
pub enum UserAction {
    /// List user accounts
    List {
        /// Only show accounts with this role
        #[arg(short, long)]
        role: Option<String>,
    },

    /// Show one account
    Show {
        /// User ID
        id: i64,
    },

    /// Create an account
    Create {
        /// First name
        #[arg(short, long)]
        first_name: String,

        /// Last name
        #[arg(short, long)]
        last_name: String,

        /// Phone number
        #[arg(short, long)]
        phone: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Role (e.g. admin, superviseur)
        #[arg(short, long)]
        role: String,

        /// Initial password (or set UMBRELLA_NEW_PASSWORD env var)
        #[arg(long, env = "UMBRELLA_NEW_PASSWORD", hide_env_values = true)]
        password: String,

        /// Create the account locked
        #[arg(long)]
        locked: bool,
    },

    /// Update an account (only the given fields change)
    Update {
        /// User ID
        id: i64,

        /// New first name
        #[arg(short, long)]
        first_name: Option<String>,

        /// New last name
        #[arg(short, long)]
        last_name: Option<String>,

        /// New phone number
        #[arg(short, long)]
        phone: Option<String>,

        /// New email address
        #[arg(short, long)]
        email: Option<String>,

        /// New role
        #[arg(short, long)]
        role: Option<String>,
    },

    /// Lock or unlock an account
    ToggleLock {
        /// User ID
        id: i64,
    },

    /// Show recent activity of an account
    Activity {
        /// User ID
        id: i64,
    },
}

/// User row for table display
#[derive(Debug, Serialize, Tabled)]
pub struct UserRow {
    #[tabled(rename = "ID")]
    pub id: i64,
    #[tabled(rename = "Matricule")]
    pub matricule: String,
    #[tabled(rename = "Nom")]
    pub name: String,
    #[tabled(rename = "Email")]
    pub email: String,
    #[tabled(rename = "Rôles")]
    pub roles: String,
    #[tabled(rename = "Verrouillé")]
    pub locked: String,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            matricule: or_dash(user.matricule.as_deref()),
            name: user.full_name(),
            email: or_dash(user.email.as_deref()),
            roles: if user.roles.is_empty() {
                "-".to_string()
            } else {
                user.roles.join(", ")
            },
            locked: if user.is_locked { "oui" } else { "non" }.to_string(),
        }
    }
}

pub async fn execute(ctx: &Context, action: UserAction) -> Result<()> {
    match action {
        UserAction::List { role } => list_users(ctx, role).await,
        UserAction::Show { id } => show_user(ctx, id).await,
        UserAction::Create {
            first_name,
            last_name,
            phone,
            email,
            role,
            password,
            locked,
        } => {
            let payload = CreateUser {
                first_name,
                last_name,
                phone,
                email,
                role,
                password_confirmation: password.clone(),
                password,
                is_locked: locked.then_some(true),
            };
            create_user(ctx, &payload).await
        }
        UserAction::Update {
            id,
            first_name,
            last_name,
            phone,
            email,
            role,
        } => {
            let patch = UpdateUser {
                first_name,
                last_name,
                phone,
                email,
                role,
            };
            update_user(ctx, id, &patch).await
        }
        UserAction::ToggleLock { id } => toggle_lock(ctx, id).await,
        UserAction::Activity { id } => activity(ctx, id).await,
    }
}

async fn list_users(ctx: &Context, role: Option<String>) -> Result<()> {
    ctx.require_user().await?;
    ctx.services.users.fetch_all().await?;
    let rows: Vec<UserRow> = ctx
        .services
        .users
        .items()
        .await
        .iter()
        .filter(|u| role.as_deref().map_or(true, |r| u.has_role(r)))
        .map(UserRow::from)
        .collect();
    print_list(&rows, ctx.format)
}

async fn show_user(ctx: &Context, id: i64) -> Result<()> {
    ctx.require_user().await?;
    let user = ctx.services.users.fetch_one(id).await?;
    print_record(&UserRow::from(&user), ctx.format)
}

async fn create_user(ctx: &Context, payload: &CreateUser) -> Result<()> {
    ctx.require_user().await?;
    let user = ctx.services.users.create(payload).await?;
    success(
        &format!("Compte #{} créé pour {}", user.id, user.full_name()),
        ctx.quiet,
    );
    Ok(())
}

async fn update_user(ctx: &Context, id: i64, patch: &UpdateUser) -> Result<()> {
    ensure_changes(patch)?;
    ctx.require_user().await?;
    let user = ctx.services.users.update(id, patch).await?;
    success(&format!("Compte #{} mis à jour", user.id), ctx.quiet);
    Ok(())
}

async fn toggle_lock(ctx: &Context, id: i64) -> Result<()> {
    let me = ctx.require_user().await?;
    if me.id == id {
        anyhow::bail!("Vous ne pouvez pas verrouiller votre propre compte");
    }
    let user = ctx.services.users.toggle_lock(id).await?;
    let state = if user.is_locked { "verrouillé" } else { "déverrouillé" };
    success(&format!("Compte de {} {}", user.full_name(), state), ctx.quiet);
    Ok(())
}

async fn activity(ctx: &Context, id: i64) -> Result<()> {
    ctx.require_user().await?;
    let activity = ctx.services.users.activity(id).await?;
    print_value(&activity, ctx.format)
}
