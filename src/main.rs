use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use collective_intelligence_client::{
    api::ApiClient,
    cli::{execute_command, CliContext, Commands},
    config::{Config, LogFormat},
    session::{Session, SqliteSessionStore},
};

/// Command-line client for the collective-intelligence backend.
#[derive(Parser, Debug)]
#[command(name = "ci-client", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = %config.api.base_url,
        "ci-client starting"
    );

    // Open the persistent session
    let store = match SqliteSessionStore::new(&config.session).await {
        Ok(s) => {
            info!(path = %config.session.path.display(), "Session store opened");
            s
        }
        Err(e) => {
            error!(error = %e, "Failed to open session store");
            return Err(e.into());
        }
    };
    let session = Session::load(Arc::new(store)).await?;

    let client = match ApiClient::new(&config.api, config.request.clone(), session) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Failed to initialize API client");
            return Err(e.into());
        }
    };

    let ctx = CliContext {
        client,
        insights: config.insights.clone(),
    };

    let result = execute_command(cli.command, &ctx).await;
    if result.exit_code == 0 {
        print!("{}", result.message);
    } else {
        eprintln!("{}", result.message.trim_end());
    }

    std::process::exit(result.exit_code);
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
