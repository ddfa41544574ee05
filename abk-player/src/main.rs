//! Audiobook key-point player (abk-player) - demo entry point
//!
//! Drives the playback core from stdin against the simulated transport and
//! prints the player screen after every change.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use abk_common::config::load_config;
use abk_common::CatalogManifest;
use abk_player::command::{Command, HELP};
use abk_player::config::PlayerSettings;
use abk_player::playback::Player;
use abk_player::transport::SimulatedTransport;
use abk_player::{PlayerView, StateSnapshot};
use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEMO_CATALOG: &str = include_str!("../assets/demo_catalog.toml");

/// Command-line arguments for abk-player
#[derive(Parser, Debug)]
#[command(name = "abk-player")]
#[command(about = "Audiobook key-point player (terminal demo)")]
#[command(version)]
struct Args {
    /// Bootstrap config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Track catalog manifest (overrides catalog_path from config)
    #[arg(long, env = "ABK_CATALOG")]
    catalog: Option<PathBuf>,

    /// Transport tick interval in milliseconds (overrides config)
    #[arg(long, env = "ABK_TICK_MS")]
    tick_ms: Option<u64>,

    /// Length used for tracks without a duration hint
    #[arg(long, default_value = "30")]
    default_duration: f64,

    /// Read JSON intents and print JSON snapshots
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref()).context("Failed to load configuration")?;

    // Initialize tracing
    let fallback_filter = format!("abk_player={0},abk_common={0}", config.logging.level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting abk-player v{}", env!("CARGO_PKG_VERSION"));

    let mut settings =
        PlayerSettings::from_config(&config).context("Invalid player configuration")?;
    if let Some(tick_ms) = args.tick_ms.filter(|ms| *ms > 0) {
        settings.tick_interval = Duration::from_millis(tick_ms);
    }

    let manifest = match args.catalog.clone().or_else(|| config.resolved_catalog_path()) {
        Some(path) => {
            info!("Catalog: {}", path.display());
            CatalogManifest::load(&path)
                .with_context(|| format!("Failed to load catalog {}", path.display()))?
        }
        None => {
            info!("No catalog configured, using the bundled demo catalog");
            CatalogManifest::from_toml_str(DEMO_CATALOG).context("Bundled demo catalog is invalid")?
        }
    };

    let transport = Arc::new(SimulatedTransport::from_catalog(
        &manifest.catalog,
        &manifest.hints,
        args.default_duration,
        settings.tick_interval,
    ));
    let player = Player::spawn(manifest.catalog, transport, &settings);

    let printer = tokio::spawn(print_snapshots(player.subscribe(), args.json));
    print_snapshot(&player.snapshot().await, args.json)?;
    if !args.json {
        println!("{}", HELP);
    }

    tokio::select! {
        result = read_commands(&player, args.json) => result?,
        _ = shutdown_signal() => {},
    }

    player.shutdown().await.context("Player shutdown failed")?;
    printer.abort();

    info!("Shutdown complete");
    Ok(())
}

/// Feed stdin lines to the player until EOF or `quit`
async fn read_commands(player: &Player, json: bool) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }

        let parsed = if json {
            Command::parse_json(&line)
        } else {
            Command::parse(&line)
        };
        let command = match parsed {
            Ok(command) => command,
            Err(e) => {
                warn!("{}", e);
                continue;
            }
        };

        match command {
            Command::Dispatch(intents) => {
                for intent in intents {
                    player.dispatch(intent)?;
                }
            }
            Command::State => print_snapshot(&player.snapshot().await, json)?,
            Command::Help => println!("{}", HELP),
            Command::Quit => break,
        }
    }

    Ok(())
}

/// Print every snapshot, skipping text renders that did not change
async fn print_snapshots(mut snapshots: broadcast::Receiver<StateSnapshot>, json: bool) {
    let mut last_view: Option<PlayerView> = None;

    loop {
        match snapshots.recv().await {
            Ok(snapshot) => {
                if !json {
                    let view = PlayerView::from(snapshot.state.as_ref());
                    if last_view.as_ref() == Some(&view) {
                        continue;
                    }
                    last_view = Some(view);
                }
                if let Err(e) = print_snapshot(&snapshot, json) {
                    warn!("Could not print snapshot: {}", e);
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Printer lagged, skipped {} snapshots", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn print_snapshot(snapshot: &StateSnapshot, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(snapshot).context("Failed to serialize snapshot")?);
    } else {
        println!("{}", PlayerView::from(snapshot.state.as_ref()));
    }
    Ok(())
}

/// Ctrl+C / SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
