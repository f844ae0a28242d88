use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use docsync::{ServerConfig, SyncServer};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docsync", about = "Shared JSON document server with live SSE updates")]
struct Cli {
    /// Address to listen on
    #[arg(long, env = "DOCSYNC_BIND", default_value = "0.0.0.0:8080")]
    bind: SocketAddr,

    /// File holding the shared document
    #[arg(long, env = "DOCSYNC_DATA_FILE", default_value = "shared_data.json")]
    data_file: PathBuf,

    /// Directory served for non-API requests
    #[arg(long, env = "DOCSYNC_STATIC_DIR", default_value = ".")]
    static_dir: PathBuf,

    /// Seconds between heartbeats on event streams
    #[arg(long, env = "DOCSYNC_HEARTBEAT_SECS", default_value_t = 60)]
    heartbeat_secs: u64,

    /// Seconds a client gets to accept a pushed event
    #[arg(long, env = "DOCSYNC_SEND_TIMEOUT_SECS", default_value_t = 5)]
    send_timeout_secs: u64,

    /// Maximum concurrent connections (0 = unlimited)
    #[arg(long, env = "DOCSYNC_MAX_CONNECTIONS", default_value_t = 0)]
    max_connections: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docsync=info")),
        )
        .init();

    let cli = Cli::parse();

    let config = ServerConfig::default()
        .bind(cli.bind)
        .data_file(cli.data_file)
        .static_dir(cli.static_dir)
        .heartbeat_interval(Duration::from_secs(cli.heartbeat_secs.max(1)))
        .send_timeout(Duration::from_secs(cli.send_timeout_secs.max(1)))
        .max_connections(cli.max_connections);

    let server = SyncServer::new(config);
    print_banner(server.bind_addr()).await;

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn print_banner(addr: SocketAddr) {
    let port = addr.port();
    let lan = docsync::net::local_ip().await;

    tracing::info!("docsync server started");
    tracing::info!("This device:   http://localhost:{}", port);
    tracing::info!("Other devices: http://{}:{}", lan, port);
    tracing::info!("Data API:      http://{}:{}/api/data", lan, port);
    tracing::info!("Live updates:  http://{}:{}/api/events", lan, port);
    tracing::info!("Press Ctrl+C to stop");
}
