mod commands;

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use jira_agile_api::error::ApiError;
use jira_agile_api::ApiClient;
use jira_agile_config::{ActiveProfile, Config};
use jira_agile_output::{OutputFormat, OutputRenderer};
use tracing_subscriber::{fmt, EnvFilter};

use commands::Context;

#[derive(Parser, Debug)]
#[command(name = "jira-agile", version, about = "Jira agile boards, webhooks and users from the terminal", long_about = None)]
struct Cli {
    /// Profile to use from config file
    #[arg(short, long, global = true)]
    profile: Option<String>,

    /// Path to config file (defaults to ~/.jira-agile/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format for command results
    #[arg(long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    output: OutputFormat,

    /// Enable verbose logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Agile board commands
    Board(commands::board::BoardArgs),
    /// Webhook registration commands
    Webhook(commands::webhook::WebhookArgs),
    /// User commands
    User(commands::user::UserArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug)?;

    let renderer = OutputRenderer::new(cli.output);
    let result = run(cli, &renderer).await;

    if let Err(err) = &result {
        if let Some(suggestion) = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<ApiError>())
            .and_then(ApiError::suggestion)
        {
            renderer.warn(suggestion);
        }
    }

    result
}

async fn run(cli: Cli, renderer: &OutputRenderer) -> Result<()> {
    let config = Config::load(cli.config.as_ref())?;
    let profile = config.active_profile(cli.profile.as_deref())?;
    let ctx = Context {
        client: build_client(&profile)?,
        renderer,
    };

    match cli.command {
        Command::Board(args) => commands::board::execute(args, &ctx).await,
        Command::Webhook(args) => commands::webhook::execute(args, &ctx).await,
        Command::User(args) => commands::user::execute(args, &ctx).await,
    }
}

fn init_tracing(debug: bool) -> Result<()> {
    let default = if debug {
        "info,jira_agile=debug,jira_agile_api=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!("failed to initialize logger: {err}"))
}

fn build_client(profile: &ActiveProfile) -> Result<ApiClient> {
    let client = ApiClient::with_timeout(&profile.base_url, profile.timeout)?;

    Ok(match (&profile.username, &profile.token) {
        (Some(username), Some(token)) => client.with_basic_auth(username.clone(), token.clone()),
        (None, Some(token)) => client.with_bearer_token(token.clone()),
        _ => {
            tracing::warn!(profile = %profile.name, "No API token found, sending anonymous requests");
            client
        }
    })
}
