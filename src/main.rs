use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::process;
use tracing::Instrument;

use pims_dashboard::commands::{self, AccountArgs, AppContext};
use pims_dashboard::config::{init_config, Config};
use pims_dashboard::logging::{init_logging, run_span, LogOutput};
use pims_dashboard::session::SessionStore;

#[derive(Parser)]
#[command(name = "pims-dashboard")]
#[command(about = "Terminal dashboard for PIMS pharmacy analytics")]
#[command(version)]
struct Cli {
    /// Use this bearer token for the run instead of the stored session
    #[arg(long, global = true, env = "PIMS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login {
        #[arg(long, short)]
        username: String,
        /// Password; read from PIMS_PASSWORD when omitted
        #[arg(long, short, env = "PIMS_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Clear the stored session
    Logout,
    /// Show the signed-in user
    Whoami {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Update username, full name or password
    Account(AccountArgs),
    /// Fetch the latest analytics snapshot and print it
    Report {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show when analytics were last uploaded
    LastUpdated {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Live dashboard with background refresh
    #[cfg(feature = "live")]
    Live,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Login { .. } => "login",
            Commands::Logout => "logout",
            Commands::Whoami { .. } => "whoami",
            Commands::Account(_) => "account",
            Commands::Report { .. } => "report",
            Commands::LastUpdated { .. } => "last-updated",
            #[cfg(feature = "live")]
            Commands::Live => "live",
        }
    }

    fn json_output(&self) -> bool {
        match self {
            Commands::Whoami { json } | Commands::Report { json } | Commands::LastUpdated { json } => *json,
            _ => false,
        }
    }

    /// Commands that take over the terminal
    fn is_fullscreen(&self) -> bool {
        match self {
            #[cfg(feature = "live")]
            Commands::Live => true,
            _ => false,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.command.json_output();

    if let Err(e) = run(cli).await {
        handle_error(e, json);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = init_config(Config::load().context("Failed to load configuration")?);

    let mut output = LogOutput::from_config(&config.logging.output);
    if cli.command.is_fullscreen() {
        output = output.for_fullscreen();
    }
    if output != LogOutput::Console {
        fs::create_dir_all(&config.paths.log_directory).with_context(|| {
            format!("Failed to create log directory {}", config.paths.log_directory.display())
        })?;
    }
    let _guard = init_logging(&config.logging, output, &config.paths.log_directory);

    if !config.output.color {
        colored::control::set_override(false);
    }

    let session = match cli.token.as_deref() {
        Some(token) => {
            let session = SessionStore::in_memory();
            session.set_token(token);
            session
        }
        None => SessionStore::file(config.paths.session_file()),
    };
    let ctx = AppContext::new(config.clone(), session)?;

    let span = run_span(cli.command.name());
    dispatch(&ctx, cli.command).instrument(span).await
}

async fn dispatch(ctx: &AppContext, command: Commands) -> Result<()> {
    match command {
        Commands::Login { username, password } => commands::run_login(ctx, &username, password.as_deref()).await,
        Commands::Logout => commands::run_logout(ctx),
        Commands::Whoami { json } => commands::run_whoami(ctx, json),
        Commands::Account(args) => commands::run_account(ctx, args).await,
        Commands::Report { json } => commands::run_report(ctx, json).await,
        Commands::LastUpdated { json } => commands::run_last_updated(ctx, json).await,
        #[cfg(feature = "live")]
        Commands::Live => commands::run_live_mode(ctx).await,
    }
}

fn handle_error(e: anyhow::Error, json: bool) -> ! {
    if json {
        println!("{}", serde_json::json!({ "error": e.to_string() }));
    } else {
        eprintln!("Error: {:#}", e);
    }
    process::exit(1);
}
