pub mod aggregate;
pub mod color;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod fetch;
pub mod map;
pub mod normalize;
pub mod page;
pub mod server;
pub mod table;
pub mod types;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every source and write the dashboard as a standalone HTML page
    Generate {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        /// Overrides `[output] html` from the config
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Fetch every source once and serve the dashboard over HTTP
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let fetcher = fetch::HttpFetcher::new();

    match &cli.command {
        Commands::Generate { config, output } => {
            info!("Generating dashboard with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;

            // Without boundaries there is nothing to draw; the notice becomes the error.
            let snapshot = data::load_snapshot(&app_config, &fetcher).await?;
            let mut dashboard = dashboard::Dashboard::new(snapshot, &app_config.map, app_config.default_team);

            let path = output.clone().unwrap_or_else(|| app_config.output.html.clone());
            let html = page::render_dashboard(&mut dashboard);
            std::fs::write(&path, html).with_context(|| format!("Failed to write {:?}", path))?;

            info!("Dashboard written to {:?}", path);
        }
        Commands::Serve { config } => {
            info!("Serving dashboard with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;

            let state = match data::load_snapshot(&app_config, &fetcher).await {
                Ok(snapshot) => server::AppState::Ready(tokio::sync::Mutex::new(dashboard::Dashboard::new(
                    snapshot,
                    &app_config.map,
                    app_config.default_team,
                ))),
                Err(e) => {
                    error!("Initialization halted: {}", e);
                    server::AppState::Failed { notice: e.to_string() }
                }
            };

            server::start_server(app_config, state).await?;
        }
    }

    Ok(())
}
