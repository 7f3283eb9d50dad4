//! Transport abstraction for the session layer.
//!
//! Implement this trait to plug in a WebSocket or any other message-framed
//! transport. The session owns its transport exclusively: one outstanding
//! receive, sends serialized by construction.

use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;

/// Close code: endpoint is going away (sent for the close command).
pub const CLOSE_GOING_AWAY: u16 = 1001;
/// Close code: protocol violation in the fragment sequence.
pub const CLOSE_PROTOCOL_ERROR: u16 = 1002;
/// Close code: message type the active rule set does not accept.
pub const CLOSE_UNSUPPORTED_DATA: u16 = 1003;
/// Close code: text payload was not valid UTF-8.
pub const CLOSE_INVALID_PAYLOAD: u16 = 1007;
/// Close code: message would not fit the working buffer.
pub const CLOSE_MESSAGE_TOO_BIG: u16 = 1009;

/// Application message type carried by data fragments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataKind {
    Text,
    Binary,
}

/// Status carried by a close frame. A close frame with no payload at all is
/// represented as `None` wherever `Option<ClosePayload>` appears.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClosePayload {
    pub code: u16,
    pub reason: String,
}

impl ClosePayload {
    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }
}

/// One transport-level frame.
///
/// `kind` is set on the first fragment of a message and `None` on
/// continuations; `fin` marks the final fragment. Close frames are never
/// fragmented.
#[derive(Clone, Debug)]
pub enum Fragment {
    Data {
        kind: Option<DataKind>,
        payload: Bytes,
        fin: bool,
    },
    Close(Option<ClosePayload>),
}

/// Async trait for a bidirectional message-framed connection.
#[async_trait]
pub trait FrameTransport: Send {
    /// Receive the next fragment from the peer.
    async fn recv(&mut self) -> Result<Fragment>;

    /// Write one complete message (final fragment) of the given kind.
    /// Text payloads must be valid UTF-8.
    async fn send(&mut self, kind: DataKind, payload: &[u8]) -> Result<()>;

    /// Send a close frame; `None` sends an empty status.
    async fn send_close(&mut self, payload: Option<ClosePayload>) -> Result<()>;
}
