use anyhow::Context;
use tracing::info;

use central_server::{server, CentralConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "central_server=info,tower_http=warn".into()),
        )
        .init();

    info!("🏁 Central Server starting...");

    let config = CentralConfig::default();
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    server::serve(listener, &config).await.context("server stopped")?;
    Ok(())
}
