//! feedwatch — run one aggregation cycle and print the result as JSON.
//!
//! Logs go to stderr (`RUST_LOG` overrides the default `feedwatch=info`);
//! stdout carries only the JSON document so it can be piped.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use feedwatch::{http_client, AppConfig, Aggregator, RefreshReport};

#[derive(Parser)]
#[command(name = "feedwatch", version, about = "Aggregate feeds and a repository listing")]
struct Cli {
    /// Config file to use instead of the default locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the number of items kept per feed.
    #[arg(long, global = true)]
    item_cap: Option<usize>,

    /// Override the per-fetch timeout, in seconds.
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the latest items of every feed source.
    Feeds,
    /// Print all repositories, most popular first.
    Repos,
    /// Print repositories whose name contains TEXT (case-insensitive).
    Search { text: String },
}

fn init_tracing() {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("feedwatch=info"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Repository commands are useless without the listing, so its failure is
/// fatal there. Feed warnings never are.
fn require_repositories(report: RefreshReport) -> Result<()> {
    report
        .repositories
        .map(|_| ())
        .context("repository listing unavailable")
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    // -- configuration -------------------------------------------------------
    let mut app_config = AppConfig::load(cli.config.as_deref())?;
    if let Some(cap) = cli.item_cap {
        app_config.item_cap = cap;
    }
    if let Some(secs) = cli.timeout {
        app_config.timeout_secs = secs;
    }
    let config = app_config.validate()?;

    // -- one refresh cycle ---------------------------------------------------
    let http = http_client().context("failed to build HTTP client")?;
    let aggregator = Aggregator::from_config(&config, http);
    let report = aggregator.refresh().await;

    match cli.command {
        Command::Feeds => print_json(&*aggregator.feed_snapshot()),
        Command::Repos => {
            require_repositories(report)?;
            print_json(&aggregator.repository_snapshot())
        }
        Command::Search { text } => {
            require_repositories(report)?;
            print_json(&aggregator.search(&text))
        }
    }
}
