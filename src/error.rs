use thiserror::Error;

/// Library result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while serving a connection.
#[derive(Error, Debug)]
pub enum Error {
    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    #[error("protocol: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Transport-level failures. Any of these ends the session immediately,
/// without further handshake I/O.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("websocket: {0}")]
    WebSocket(String),

    #[error("upgrade rejected: {0}")]
    UpgradeRejected(String),

    #[error("disconnected")]
    Disconnected,
}

/// Peer behavior the session refuses to process. Fatal to the connection,
/// not the process: each maps to a close code, and the display string is
/// sent as the close reason.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("message exceeds {limit} byte limit")]
    MessageTooBig { limit: usize },

    #[error("text message is not valid utf-8")]
    InvalidUtf8,

    #[error("continuation frame without a message in progress")]
    UnexpectedContinuation,

    #[error("new message started before the previous one completed")]
    InterleavedMessage,
}

impl ProtocolError {
    /// Close code sent to the peer when this violation ends the session.
    pub fn close_code(&self) -> u16 {
        match self {
            Self::MessageTooBig { .. } => crate::transport::CLOSE_MESSAGE_TOO_BIG,
            Self::InvalidUtf8 => crate::transport::CLOSE_INVALID_PAYLOAD,
            Self::UnexpectedContinuation | Self::InterleavedMessage => {
                crate::transport::CLOSE_PROTOCOL_ERROR
            }
        }
    }
}
