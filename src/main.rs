//! page-router
//!
//! Inspect the routes a pages directory produces.
//!
//! # Architecture Overview
//!
//! ```text
//!   pages_dir ──▶ discovery ──▶ RouteNode tree ──▶ routing (RouteTable, Router)
//!                    ▲                                   ▲
//!                 watcher                             history
//!              (notify, live)                 (browser | hash | memory)
//!
//!   Cross-cutting: config (TOML), observability (tracing, metrics)
//! ```
//!
//! # Commands
//! - `routes`       print the discovered tree as JSON
//! - `match PATH`   resolve PATH and print the matched chain
//! - `watch`        print every rebuilt tree until Ctrl-C

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::json;

use page_router::config::{load_config, RouterConfig};
use page_router::discovery::{discover, RouteDiscovery};
use page_router::history::create_history;
use page_router::observability::logging::init_logging;
use page_router::routing::Router;

#[derive(Parser)]
#[command(name = "page-router")]
#[command(about = "Discover and match file-system page routes", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the route tree
    Routes,
    /// Resolve a path against the route tree
    Match {
        /// Path to resolve, e.g. /blog/hello?draft=1
        path: String,
    },
    /// Watch the pages directory and print each new tree
    Watch,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RouterConfig::default(),
    };
    init_logging(&config.observability);

    tracing::info!(
        pages_dir = ?config.discovery.pages_dir,
        history = ?config.history.mode,
        "page-router v0.1.0 starting"
    );

    match cli.command {
        Commands::Routes => {
            let routes = discover(&config.discovery)?;
            println!("{}", serde_json::to_string_pretty(&routes)?);
        }
        Commands::Match { path } => {
            let routes = discover(&config.discovery)?;
            let router = Router::new(create_history(&config.history)?, routes);
            let resolved = router.resolve(path.as_str(), None);

            let chain: Vec<_> = resolved
                .matches
                .iter()
                .map(|m| json!({ "id": m.route.id, "path": m.route.path, "pathname": m.pathname }))
                .collect();
            let params = resolved.matches.last().map(|m| m.params.clone()).unwrap_or_default();
            let output = json!({
                "href": resolved.href,
                "matched": !chain.is_empty(),
                "chain": chain,
                "params": params,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Watch => {
            let discovery = RouteDiscovery::new(config.discovery.clone(), config.watch.clone());
            let _errors = discovery.on_error(|e| tracing::error!(error = %e, "Watch error"));
            let _routes = discovery.subscribe(|routes| match serde_json::to_string(&**routes) {
                Ok(line) => println!("{}", line),
                Err(e) => tracing::error!(error = %e, "Failed to serialize routes"),
            })?;

            tokio::signal::ctrl_c().await?;
            tracing::info!("Shutdown signal received");
            tokio::task::spawn_blocking(move || discovery.stop()).await?;
        }
    }

    Ok(())
}
