mod config;
mod connection;
mod session;

use config::ProxyConfig;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting Shale proxy...");

    let config = Arc::new(ProxyConfig::load(Path::new("config/proxy.toml"))?);
    info!(
        "Config loaded: bind={}:{}, upstream={}, client_protocol={}",
        config.bind, config.port, config.upstream, config.client_protocol
    );

    let addr = format!("{}:{}", config.bind, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    loop {
        match listener.accept().await {
            Ok((socket, peer)) => {
                info!("New connection from {}", peer);
                let config = config.clone();
                tokio::spawn(async move {
                    if let Err(e) = session::run(socket, config).await {
                        debug!("Session for {} ended: {}", peer, e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
