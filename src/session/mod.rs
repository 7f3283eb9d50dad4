//! Per-connection session.
//!
//! Owns the transport handle and the fixed working buffer, and drives the
//! receive → classify → act loop until the close handshake completes, the
//! peer disappears, or shutdown is requested.

mod close;
mod policy;
mod receive;

pub use policy::{
    classify, Action, ABORT_COMMAND, BINARY_REJECTED_REASON, CLOSE_COMMAND, GOODBYE_REASON,
};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::{Config, Variant};
use crate::error::Error;
use crate::transport::{DataKind, FrameTransport, CLOSE_GOING_AWAY, CLOSE_UNSUPPORTED_DATA};
use crate::Result;

use receive::Incoming;

/// Lifecycle of one connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SessionState {
    Open,
    ClosePending,
    Closed,
}

/// One accepted connection: exclusive transport handle, fixed-capacity
/// working buffer with an accumulated-length cursor, lifecycle state.
///
/// Sessions never share buffers or state; everything here runs on a single
/// task, strictly sequentially.
pub struct Session<T> {
    transport: T,
    config: Config,
    cancel: CancellationToken,
    buf: Box<[u8]>,
    len: usize,
    state: SessionState,
}

impl<T: FrameTransport> Session<T> {
    /// Wrap an upgraded transport. `cancel` aborts any pending wait and
    /// forces the session closed without a handshake.
    pub fn new(transport: T, config: Config, cancel: CancellationToken) -> Self {
        let buf = vec![0u8; config.buffer_capacity].into_boxed_slice();
        Self {
            transport,
            config,
            cancel,
            buf,
            len: 0,
            state: SessionState::Open,
        }
    }

    /// Drive the session to completion.
    pub async fn run(mut self) -> Result<()> {
        if self.config.announce_on_connect && self.config.variant == Variant::Permissive {
            self.announce().await?;
        }
        let cancel = self.cancel.clone();
        while self.state == SessionState::Open {
            let received = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("session cancelled");
                    self.state = SessionState::Closed;
                    return Ok(());
                }
                r = self.receive_message() => r,
            };
            let outcome = match received {
                Ok(Incoming::Message { kind, len }) => {
                    classify(self.config.variant, kind, &self.buf[..len])
                }
                Ok(Incoming::Close(payload)) => Ok(Action::CloseGraceful(payload)),
                Err(e) => Err(e),
            };
            match outcome {
                Ok(action) => {
                    if let Err(e) = self.apply(action).await {
                        self.state = SessionState::Closed;
                        return Err(e);
                    }
                }
                Err(Error::Protocol(violation)) => {
                    warn!(%violation, "protocol violation");
                    let code = violation.close_code();
                    if let Err(e) = self.close_with(code, &violation.to_string()).await {
                        self.state = SessionState::Closed;
                        return Err(e);
                    }
                }
                Err(e) => {
                    self.state = SessionState::Closed;
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    async fn apply(&mut self, action: Action) -> Result<()> {
        match action {
            Action::EchoText(reply) => self.transport.send(DataKind::Text, reply.as_bytes()).await,
            Action::EchoBinaryDelayed { len } => {
                if !self.delay_before_reply().await {
                    self.state = SessionState::Closed;
                    return Ok(());
                }
                self.transport.send(DataKind::Binary, &self.buf[..len]).await
            }
            Action::CloseGraceful(payload) => self.close_on_peer(payload).await,
            Action::CloseEndpointGone => self.close_with(CLOSE_GOING_AWAY, GOODBYE_REASON).await,
            Action::Abort => {
                self.abort();
                Ok(())
            }
            Action::RejectBinary => {
                self.close_with(CLOSE_UNSUPPORTED_DATA, BINARY_REJECTED_REASON)
                    .await
            }
        }
    }

    /// Sleep out the configured reply delay. Returns false when cancelled
    /// first; only this session's task is suspended either way.
    async fn delay_before_reply(&self) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(self.config.reply_delay) => true,
        }
    }

    /// Unsolicited greeting sent right after the upgrade.
    async fn announce(&mut self) -> Result<()> {
        let greeting = format!(
            "Echo server connected at {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        self.transport.send(DataKind::Text, greeting.as_bytes()).await
    }
}
