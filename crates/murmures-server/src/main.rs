//! Murmures match server.
//!
//! Reads `ClientMessage` JSON lines on stdin and answers with `ServerMessage`
//! JSON lines on stdout. Logs go to stderr.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use murmures_server::{
    protocol::{client_message_from_json, server_message_to_json, ServerMessage},
    MatchSession, ServerConfig,
};

#[derive(Parser)]
#[command(name = "murmures-server")]
#[command(about = "Authoritative Murmures match server", version)]
struct Cli {
    /// Server config file (YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Body and skill registry, overrides the config
    #[arg(long)]
    registry: Option<PathBuf>,

    /// Level definition, repeatable; overrides the config's level list
    #[arg(long = "level")]
    levels: Vec<PathBuf>,

    /// Id of the level the match starts on
    #[arg(long)]
    start: Option<String>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(registry) = cli.registry {
        config.registry = registry;
    }
    if !cli.levels.is_empty() {
        config.levels = cli.levels;
    }
    if let Some(start) = cli.start {
        config.start_level = start;
    }

    let filter = if cli.verbose {
        EnvFilter::new("murmures_server=debug,murmures_core=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter))
    };
    fmt().with_env_filter(filter).with_writer(io::stderr).init();

    let mut session = MatchSession::from_config(&config).context("starting match")?;
    info!(
        "Murmures server v{} on level {}",
        env!("CARGO_PKG_VERSION"),
        config.start_level
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        let replies = match client_message_from_json(&line) {
            Ok(message) => session.handle(message),
            Err(err) => {
                warn!(%err, "unreadable client message");
                vec![ServerMessage::Fault {
                    message: err.to_string(),
                }]
            }
        };
        for reply in &replies {
            writeln!(stdout, "{}", server_message_to_json(reply)?)?;
        }
        stdout.flush()?;
    }

    info!("input closed, shutting down");
    Ok(())
}
