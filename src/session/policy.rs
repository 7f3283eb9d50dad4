//! Message classification: the variant rule sets mapping a completed message
//! to the action the session takes.

use crate::config::Variant;
use crate::error::ProtocolError;
use crate::transport::{ClosePayload, DataKind};
use crate::Result;

/// Text command asking the server to close the connection (permissive only).
pub const CLOSE_COMMAND: &str = ".close";
/// Text command asking the server to drop the connection with no handshake
/// (permissive only).
pub const ABORT_COMMAND: &str = ".abort";
/// Close reason sent in reply to the close command.
pub const GOODBYE_REASON: &str = "Server says goodbye";
/// Close reason sent when the strict rule set rejects a binary message.
pub const BINARY_REJECTED_REASON: &str = "binary messages are not accepted";

/// What the session does with a completed message.
#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    /// Reply with the rewritten text, no delay.
    EchoText(String),
    /// Reply with the first `len` buffered bytes after the configured delay.
    EchoBinaryDelayed { len: usize },
    /// Echo the peer's close status back and finish the handshake.
    CloseGraceful(Option<ClosePayload>),
    /// Close with "going away" and the goodbye reason.
    CloseEndpointGone,
    /// Tear the connection down without a close frame.
    Abort,
    /// Close with "unsupported data" (strict rule set).
    RejectBinary,
}

/// Apply the active rule set to a completed message.
///
/// The strict set rejects binary before any delay logic runs and recognizes
/// no command sentinels; the permissive set is the delayed-echo behavior.
pub fn classify(variant: Variant, kind: DataKind, payload: &[u8]) -> Result<Action> {
    match kind {
        DataKind::Binary => Ok(match variant {
            Variant::Permissive => Action::EchoBinaryDelayed {
                len: payload.len(),
            },
            Variant::Strict => Action::RejectBinary,
        }),
        DataKind::Text => {
            let text = std::str::from_utf8(payload).map_err(|_| ProtocolError::InvalidUtf8)?;
            Ok(match variant {
                Variant::Permissive => match text {
                    CLOSE_COMMAND => Action::CloseEndpointGone,
                    ABORT_COMMAND => Action::Abort,
                    _ => Action::EchoText(format!("You said: \"{text}\"")),
                },
                Variant::Strict => Action::EchoText(format!("You said {text}")),
            })
        }
    }
}
