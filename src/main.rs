use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fleet_sentinel::api::{GraphqlClient, QuerySet};
use fleet_sentinel::auth::{CredentialProvider, LoginRefresher};
use fleet_sentinel::config::SentinelConfig;
use fleet_sentinel::error::Result;
use fleet_sentinel::orchestrator::Orchestrator;

/// Unattended recovery controller for paused robot-fleet missions.
#[derive(Parser)]
#[command(name = "fleet-sentinel", version)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(long, default_value = "sentinel.yaml")]
    config: PathBuf,

    /// Directory containing the GraphQL operation definitions.
    #[arg(long, default_value = "queries")]
    queries: PathBuf,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("fleet_sentinel=debug")
    } else {
        EnvFilter::new("fleet_sentinel=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    info!(config = %cli.config.display(), "loading configuration");
    let config = SentinelConfig::load(&cli.config).await?;

    info!(dir = %cli.queries.display(), "loading query definitions");
    let queries = Arc::new(QuerySet::load(&cli.queries).await?);

    let provider = CredentialProvider::new();
    let token = provider
        .authenticate(
            &config.api_endpoints.login_url,
            &config.credentials.user,
            &config.credentials.key,
        )
        .await?;
    info!("initial token obtained");

    let transport = Arc::new(GraphqlClient::new(
        config.api_endpoints.graphql_url.clone(),
        token,
        config.settings.request_retries,
    ));
    let refresher = Arc::new(LoginRefresher::new(
        provider,
        config.api_endpoints.login_url.clone(),
        config.credentials.user.clone(),
        config.credentials.key.clone(),
    ));

    let mut orchestrator = Orchestrator::new(transport, refresher, queries, config);

    tokio::select! {
        _ = orchestrator.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, shutting down");
        }
    }

    Ok(())
}
