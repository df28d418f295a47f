//! Barkeep Server Binary
//!
//! Opens the catalog store and serves it over TCP.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use barkeep::network::Server;
use barkeep::{Config, DataService, KvCatalog};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

/// Barkeep Server
#[derive(Parser, Debug)]
#[command(name = "barkeep-server")]
#[command(about = "Cocktail and ingredient catalog server")]
#[command(version)]
struct Args {
    /// Data file
    #[arg(short, long, default_value = "./barkeep_data/catalog.db")]
    path: PathBuf,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    listen: String,

    /// Seconds to wait for the data file lock
    #[arg(long, default_value = "30")]
    lock_timeout: u64,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "64")]
    max_connections: usize,

    /// Rewrite the data file to its current contents before serving
    #[arg(long)]
    compact: bool,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,barkeep=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("Barkeep Server v{}", barkeep::VERSION);
    tracing::info!("Data file: {}", args.path.display());
    tracing::info!("Listen address: {}", args.listen);

    let config = Config::builder()
        .path(&args.path)
        .listen_addr(&args.listen)
        .lock_timeout(Duration::from_secs(args.lock_timeout))
        .max_connections(args.max_connections)
        .build();

    if let Err(e) = run(config, args.compact) {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

fn run(config: Config, compact: bool) -> barkeep::Result<()> {
    let catalog = Arc::new(KvCatalog::open(config.clone())?);

    if compact {
        catalog.database().compact()?;
    }
    let stats = catalog.database().stats()?;
    tracing::info!(
        "Store ready at lsn {} ({} bytes): {:?}",
        stats.last_lsn,
        stats.file_size,
        stats.buckets
    );

    let service = DataService::new(catalog);
    let server = Server::bind(config, service.clone())?;

    let shutdown = server.shutdown_handle();
    ctrlc::set_handler(move || {
        tracing::info!("Received shutdown signal, stopping...");
        shutdown.shutdown();
    })
    .map_err(|e| barkeep::BarkeepError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;

    let served = server.run();
    let closed = service.close();
    served.and(closed)
}
