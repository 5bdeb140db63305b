//! grouplog demo server.
//!
//! Serves a handful of routes behind the request grouping middleware so the
//! per-request aggregate entries and the per-call entries they group can be
//! inspected on stdout (JSON lines) or stderr (mirror).
//!
//! ```text
//! grouplog --config grouplog.toml --bind 127.0.0.1:8080
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use grouplog::config::{load_config, AppConfig};
use grouplog::lifecycle::{signals, startup};
use grouplog::observability::{logging, metrics};
use grouplog::HttpServer;

#[derive(Parser)]
#[command(name = "grouplog")]
#[command(about = "Demo server for request-grouped logging", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability.log_level, config.observability.json);
    tracing::info!("grouplog v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        project_id = %config.logging.project_id,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let connector = startup::connector_for(config.logging.backend);
    let (service, grouping) = startup::build_service(&config.logging, connector.as_ref())?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(&config, grouping);
    server.run(listener, signals::shutdown_signal()).await?;

    // Grouping state held clones of the service; the server has dropped them.
    service.close()?;

    tracing::info!("Shutdown complete");
    Ok(())
}
