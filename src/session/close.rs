//! Close-handshake driver.
//!
//! Open → ClosePending → Closed, whether the peer or a policy action starts
//! the handshake. Closed is terminal; any transport failure short-circuits
//! to it with no further I/O.

use tracing::debug;

use crate::error::{Error, TransportError};
use crate::transport::{ClosePayload, FrameTransport, Fragment};
use crate::Result;

use super::{Session, SessionState};

impl<T: FrameTransport> Session<T> {
    /// Peer-initiated close: echo the status back (an empty status stays
    /// empty) and finish the handshake.
    pub(crate) async fn close_on_peer(&mut self, payload: Option<ClosePayload>) -> Result<()> {
        debug!(?payload, "echoing peer close");
        self.state = SessionState::ClosePending;
        let result = self.transport.send_close(payload).await;
        self.state = SessionState::Closed;
        result
    }

    /// Locally-initiated close: send our close frame, then drain the peer
    /// until its close frame or EOF.
    pub(crate) async fn close_with(&mut self, code: u16, reason: &str) -> Result<()> {
        debug!(code, reason, "closing session");
        self.state = SessionState::ClosePending;
        if let Err(e) = self
            .transport
            .send_close(Some(ClosePayload::new(code, reason)))
            .await
        {
            self.state = SessionState::Closed;
            return Err(e);
        }
        self.drain_until_peer_close().await
    }

    /// Tear the connection down without a close frame. The transport is
    /// dropped when the session ends.
    pub(crate) fn abort(&mut self) {
        debug!("aborting session");
        self.state = SessionState::Closed;
    }

    /// Discard incoming frames until the peer acknowledges the close or goes
    /// away. Nothing received here is dispatched.
    async fn drain_until_peer_close(&mut self) -> Result<()> {
        let cancel = self.cancel.clone();
        loop {
            let received = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.state = SessionState::Closed;
                    return Ok(());
                }
                r = self.transport.recv() => r,
            };
            match received {
                Ok(Fragment::Close(_)) | Err(Error::Transport(TransportError::Disconnected)) => {
                    self.state = SessionState::Closed;
                    return Ok(());
                }
                Ok(_) => {}
                Err(e) => {
                    self.state = SessionState::Closed;
                    return Err(e);
                }
            }
        }
    }
}
