use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cleanbot::api::{self, AppState};
use cleanbot::config::ServerConfig;
use cleanbot::map::{self, MapFormat};
use cleanbot::models::CleanRequest;
use cleanbot::simulation;
use cleanbot::store::HistoryStore;

#[derive(Parser)]
#[command(name = "cleanbot")]
#[command(about = "Grid-cleaning robot simulator")]
struct Cli {
    /// JSON config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port for the HTTP API
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Session history file
        #[arg(long)]
        history: Option<PathBuf>,
    },
    /// Run one cleaning plan against a map file and print the result
    Simulate {
        /// Map file (.txt or .json)
        #[arg(long)]
        map: PathBuf,

        /// Plan file: {"start_x", "start_y", "actions", "premium"}
        #[arg(long)]
        plan: PathBuf,
    },
    /// Print the recorded session history
    History {
        /// Session history file
        #[arg(long)]
        history: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

/// Initialize tracing with output to stderr (for commands that print results) or stdout
fn init_tracing(use_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG")
            .unwrap_or_else(|_| "cleanbot=debug,cleanbot_core=debug,tower_http=debug".into()),
    );

    if use_stderr {
        // Keep stdout clean for the printed result
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let use_stderr = matches!(
        cli.command,
        Some(Commands::Simulate { .. }) | Some(Commands::History { .. })
    );
    init_tracing(use_stderr);

    let mut config = ServerConfig::load(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::Serve {
            port,
            host,
            history,
        }) => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(host) = host {
                config.host = host;
            }
            if history.is_some() {
                config.history_path = history;
            }
            serve(config).await?;
        }
        Some(Commands::Simulate { map, plan }) => simulate(&config, &map, &plan)?,
        Some(Commands::History { history, format }) => {
            if history.is_some() {
                config.history_path = history;
            }
            let store = HistoryStore::open(config.history_path()?)?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&store.list_all())?)
                }
                OutputFormat::Csv => print!("{}", store.export_tabular()),
            }
        }
        None => serve(config).await?,
    }

    Ok(())
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let history = HistoryStore::open(config.history_path()?)?;
    let state = AppState::new(history)
        .with_max_total_steps(config.max_total_steps)
        .with_security(config.security());
    let app = api::create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting cleanbot server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("cleanbot server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("cleanbot server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

fn simulate(config: &ServerConfig, map_path: &Path, plan_path: &Path) -> anyhow::Result<()> {
    let raw = std::fs::read(map_path)
        .with_context(|| format!("Failed to read map {}", map_path.display()))?;
    let format = match map_path.extension() {
        Some(_) => MapFormat::from_file_name(&map_path.to_string_lossy())?,
        None => MapFormat::detect(&raw),
    };
    let grid = map::parse(&raw, format)
        .with_context(|| format!("Failed to parse map {}", map_path.display()))?;

    let plan = std::fs::read_to_string(plan_path)
        .with_context(|| format!("Failed to read plan {}", plan_path.display()))?;
    let request: CleanRequest = serde_json::from_str(&plan)
        .with_context(|| format!("Failed to parse plan {}", plan_path.display()))?;
    request.validate(config.max_total_steps)?;

    let start = request.start().ok_or_else(|| {
        anyhow::anyhow!(
            "start position ({}, {}) is outside the grid",
            request.start_x,
            request.start_y
        )
    })?;
    let result = simulation::run(&grid, start, &request.actions, request.premium)?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
