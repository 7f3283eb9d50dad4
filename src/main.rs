//! Server binary: resolve configuration, init logging, run until Ctrl-C.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use delayed_echo::config::{CliArgs, Settings};
use delayed_echo::EchoServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let settings = Settings::load(&args)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&settings.log_level))
        .init();

    let server = EchoServer::new(settings.listen.clone(), settings.echo.clone());

    let shutdown = Arc::clone(&server);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received, shutting down");
            shutdown.shutdown();
        }
    });

    server.run().await?;
    Ok(())
}
