//! Umbrella CLI - workforce administration for Umbrella Industrial Services
//!
//! A command-line interface over the Umbrella REST API: plannings, agents,
//! sites, candidatures and user accounts.

mod commands;
mod output;

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use umbrella_core::{ServiceRegistry, SessionStore};

#[derive(Parser)]
#[command(name = "umbrella")]
#[command(author, version, about = "Umbrella workforce administration CLI", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format: table (default) or json
    #[arg(long, global = true, value_enum, default_value_t = output::OutputFormat::Table)]
    format: output::OutputFormat,

    /// Suppress progress messages
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Log debug information to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Override the API base URL (or set UMBRELLA_API_URL env var)
    #[arg(long, env = "UMBRELLA_API_URL", global = true)]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in, log out, show the current account
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },

    /// Manage daily shift plannings
    Planning {
        #[command(subcommand)]
        action: commands::planning::PlanningAction,
    },

    /// Manage field agents
    Agent {
        #[command(subcommand)]
        action: commands::agent::AgentAction,
    },

    /// Manage work sites
    Site {
        #[command(subcommand)]
        action: commands::site::SiteAction,
    },

    /// Review job applications
    Candidature {
        #[command(subcommand)]
        action: commands::candidature::CandidatureAction,
    },

    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: commands::user::UserAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.format_timestamp(None).init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli).await {
        output::failure(&commands::describe_error(&err));
        if commands::is_unauthorized(&err) {
            output::note("Connectez-vous avec `umbrella auth login`.", false);
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Set up API URL if provided
    if let Some(url) = &cli.api_url {
        std::env::set_var("UMBRELLA_API_URL", url);
    }

    let config = umbrella_core::load_config()?;
    let session = Arc::new(SessionStore::load(umbrella_core::get_session_path()?)?);
    let services = ServiceRegistry::connect(&config, session)?;

    // Create context for commands
    let ctx = commands::Context {
        services,
        config,
        format: cli.format,
        quiet: cli.quiet,
    };

    // Execute command
    match cli.command {
        Commands::Auth { action } => commands::auth::execute(&ctx, action).await,
        Commands::Planning { action } => commands::planning::execute(&ctx, action).await,
        Commands::Agent { action } => commands::agent::execute(&ctx, action).await,
        Commands::Site { action } => commands::site::execute(&ctx, action).await,
        Commands::Candidature { action } => commands::candidature::execute(&ctx, action).await,
        Commands::User { action } => commands::user::execute(&ctx, action).await,
        Commands::Config { action } => commands::config::execute(&ctx, action).await,
    }
}
