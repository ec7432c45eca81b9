//! burndownd — the Burndown daemon.
//!
//! Fetches the error budget and error timeseries, projects the budget
//! forward, and serves the result as a dashboard.
//!
//! # Usage
//!
//! ```text
//! burndownd serve --config burndown.toml --port 8080
//! burndownd project --fixture response.json
//! burndownd init-config > burndown.toml
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use burndown_core::{BurndownConfig, Projector};
use burndown_dashboard::{DashboardState, LoadOutcome, Widget, chart_series, dashboard_router};
use burndown_query::{FixtureSource, HttpSource, QuerySource};

#[derive(Parser)]
#[command(name = "burndownd", about = "SLO error budget forecast", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load once, then serve the dashboard until Ctrl-C.
    Serve {
        /// Path to burndown.toml (defaults apply when omitted).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Port to listen on (overrides [dashboard].port).
        #[arg(long)]
        port: Option<u16>,

        /// Read a saved query response instead of calling the endpoint.
        #[arg(long)]
        fixture: Option<PathBuf>,
    },
    /// Run one fetch + projection and print the chart series as JSON.
    Project {
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        fixture: Option<PathBuf>,
    },
    /// Print the default configuration as TOML.
    InitConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so `project` output stays clean JSON.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,burndownd=debug,burndown=debug")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            port,
            fixture,
        } => {
            let config = load_config(config.as_deref())?;
            run_serve(config, port, fixture).await
        }
        Command::Project { config, fixture } => {
            let config = load_config(config.as_deref())?;
            run_project(config, fixture).await
        }
        Command::InitConfig => {
            print!("{}", BurndownConfig::default().to_toml_string()?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<BurndownConfig> {
    match path {
        Some(path) => {
            let config = BurndownConfig::from_file(path)?;
            info!(path = %path.display(), "configuration loaded");
            Ok(config)
        }
        None => Ok(BurndownConfig::default()),
    }
}

fn build_source(
    config: &BurndownConfig,
    fixture: Option<PathBuf>,
) -> anyhow::Result<Arc<dyn QuerySource>> {
    let source: Arc<dyn QuerySource> = match fixture {
        Some(path) => Arc::new(FixtureSource::new(path)),
        None => Arc::new(HttpSource::new(&config.query)?),
    };
    info!(source = %source.describe(), "query source configured");
    Ok(source)
}

async fn run_project(config: BurndownConfig, fixture: Option<PathBuf>) -> anyhow::Result<()> {
    let source = build_source(&config, fixture)?;
    let projector = Projector::new(&config.projection)?;

    let data = source.fetch().await?;
    let set = projector.project(data.error_budget, &data.buckets)?;

    println!("{}", serde_json::to_string_pretty(&chart_series(&set))?);
    Ok(())
}

async fn run_serve(
    config: BurndownConfig,
    port: Option<u16>,
    fixture: Option<PathBuf>,
) -> anyhow::Result<()> {
    info!("burndown daemon starting");

    let source = build_source(&config, fixture)?;
    let projector = Projector::new(&config.projection)?;
    let widget = Arc::new(Widget::new(source, projector));

    // Initial load runs in the background; the page shows a loading
    // placeholder until it lands.
    let initial = {
        let widget = widget.clone();
        tokio::spawn(async move {
            match widget.load().await {
                LoadOutcome::Ready => info!("initial load complete"),
                LoadOutcome::Failed(kind) => warn!(?kind, "initial load failed"),
                LoadOutcome::Busy => {}
            }
        })
    };

    let router = dashboard_router(DashboardState {
        widget,
        title: config.dashboard.title.clone(),
    });
    let addr = SocketAddr::from(([0, 0, 0, 0], port.unwrap_or(config.dashboard.port)));

    info!(%addr, "dashboard server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
        })
        .await?;

    initial.abort();
    info!("burndown daemon stopped");
    Ok(())
}
