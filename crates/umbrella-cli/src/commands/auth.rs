//! Authentication commands
//!
//! Log in with matricule and password, log out, show the current account.

use anyhow::Result;
use clap::Subcommand;

use super::user::UserRow;
use super::Context;
use crate::output::{note, print_record, success};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Log in and store the session
    Login {
        /// Matricule (employee number)
        #[arg(short, long)]
        matricule: String,

        /// Password (or set UMBRELLA_PASSWORD env var)
        #[arg(short, long, env = "UMBRELLA_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Log out and forget the stored session
    Logout,

    /// Show the logged-in account
    Whoami {
        /// Ask the server instead of the stored copy
        #[arg(long)]
        refresh: bool,
    },
}

pub async fn execute(ctx: &Context, action: AuthAction) -> Result<()> {
    match action {
        AuthAction::Login { matricule, password } => login(ctx, &matricule, &password).await,
        AuthAction::Logout => logout(ctx).await,
        AuthAction::Whoami { refresh } => whoami(ctx, refresh).await,
    }
}

async fn login(ctx: &Context, matricule: &str, password: &str) -> Result<()> {
    let user = ctx.services.auth.login(matricule, password).await?;
    success(&format!("Connecté en tant que {}", user.full_name()), ctx.quiet);
    if !ctx.quiet {
        print_record(&UserRow::from(&user), ctx.format)?;
    }
    Ok(())
}

async fn logout(ctx: &Context) -> Result<()> {
    if !ctx.services.auth.session().is_authenticated().await {
        note("Aucune session active.", ctx.quiet);
        return Ok(());
    }
    ctx.services.logout().await?;
    success("Déconnecté.", ctx.quiet);
    Ok(())
}

async fn whoami(ctx: &Context, refresh: bool) -> Result<()> {
    let user = if refresh {
        ctx.require_user().await?;
        ctx.services.auth.me().await?
    } else {
        ctx.require_user().await?
    };
    print_record(&UserRow::from(&user), ctx.format)
}
