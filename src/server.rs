//! Echo server host.
//!
//! Binds a TCP listener, upgrades inbound connections to WebSocket, and runs
//! one independent [`Session`] task per connection until shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::Config;
use crate::session::Session;
use crate::socket;
use crate::Result;

/// The echo server: accept loop plus per-connection sessions.
///
/// Connections share nothing: each session owns its transport and working
/// buffer exclusively, so a slow (or deliberately delayed) session never
/// blocks the others.
pub struct EchoServer {
    listen: String,
    config: Config,
    cancel: CancellationToken,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl EchoServer {
    /// Creates a server bound to `listen` once [`run`](Self::run) starts.
    pub fn new(listen: impl Into<String>, config: Config) -> Arc<Self> {
        Arc::new(Self {
            listen: listen.into(),
            config,
            cancel: CancellationToken::new(),
            local_addr: Mutex::new(None),
        })
    }

    /// The bound address, available once [`run`](Self::run) has bound the
    /// socket (useful with port 0).
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().await
    }

    /// Gracefully shuts down the accept loop and every running session.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Runs the accept loop until cancellation.
    pub async fn run(self: &Arc<Self>) -> Result<()> {
        let listener = TcpListener::bind(self.listen.as_str()).await?;
        let local_addr = listener.local_addr()?;
        *self.local_addr.lock().await = Some(local_addr);
        info!("echo server listening on {local_addr}");

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("server shutting down");
                    break Ok(());
                }

                result = listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            let server = Arc::clone(self);
                            tokio::spawn(async move {
                                if let Err(e) = server.handle_connection(stream, peer_addr).await {
                                    error!(%peer_addr, "connection error: {e}");
                                }
                            });
                        }
                        Err(e) => {
                            error!("accept error: {e}");
                        }
                    }
                }
            }
        }
    }

    /// Upgrades one TCP connection and drives its session to completion.
    async fn handle_connection(&self, stream: TcpStream, peer_addr: SocketAddr) -> Result<()> {
        let transport = socket::accept(stream, self.config.buffer_capacity).await?;
        info!(%peer_addr, "WebSocket connection established");

        let session = Session::new(transport, self.config.clone(), self.cancel.child_token());
        let result = session.run().await;
        info!(%peer_addr, "connection closed");
        result
    }
}
