//! route-priority host.
//!
//! Serves template routes matched first-hit in table order, with the table
//! reordered once by precedence during startup.
//!
//! # Architecture Overview
//!
//! ```text
//!   config (TOML) ──▶ lifecycle::startup ──▶ routing::table (registration order)
//!                           │
//!                           ├─ host_initialized ──▶ reorder (primary)
//!                           ├─ bind + serve ──────▶ http::server ──▶ http::dispatch
//!                           └─ application_started ▶ reorder (fallback, no-op if done)
//! ```

use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

use route_priority::config::load_config;
use route_priority::http::Endpoint;
use route_priority::lifecycle::{bind, build_table, signals, Host, Shutdown};
use route_priority::observability::{logging, metrics};
use route_priority::reorder::ReorderCoordinator;
use route_priority::routing::RouteStore;

#[derive(Parser)]
#[command(name = "route-priority")]
#[command(about = "Template route host with precedence ordering", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the host
    Serve {
        #[arg(short, long, default_value = "route-priority.toml")]
        config: PathBuf,
    },
    /// Print the configured routes in precedence order
    Order {
        #[arg(short, long, default_value = "route-priority.toml")]
        config: PathBuf,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => serve(config).await,
        Commands::Order { config, json } => order(config, json),
    }
}

async fn serve(path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&path)?;
    logging::init_logging(&config.observability);

    tracing::info!(
        config = %path.display(),
        bind_address = %config.listener.bind_address,
        reorder = config.reorder.enabled,
        "route-priority v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = bind(&config).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    let rx = shutdown.subscribe();
    signals::spawn_ctrl_c_handler(shutdown.clone());

    Host::new(config)?.run(listener, rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn order(path: PathBuf, as_json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&path)?;
    let table = Arc::new(build_table(&config)?);
    ReorderCoordinator::new(table.clone()).reorder::<Endpoint>()?;

    let routes = table.routes();
    if as_json {
        let rows: Vec<_> = routes
            .iter()
            .enumerate()
            .map(|(position, route)| {
                json!({
                    "position": position,
                    "name": route.name(),
                    "template": route.template().to_string(),
                    "target": route.target().target,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for (position, route) in routes.iter().enumerate() {
            println!("{:>3}  {:<32} {}", position, route.template().to_string(), route.name());
        }
    }
    Ok(())
}
