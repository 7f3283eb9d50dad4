//! Frame receiver: assembles transport fragments into the working buffer.

use crate::error::ProtocolError;
use crate::transport::{ClosePayload, DataKind, FrameTransport, Fragment};
use crate::Result;

use super::Session;

/// One completed receive: either a whole data message (payload sits in the
/// session buffer) or the peer's close signal.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Incoming {
    Message { kind: DataKind, len: usize },
    Close(Option<ClosePayload>),
}

impl<T: FrameTransport> Session<T> {
    /// Read fragments until one carries the end-of-message flag or a close
    /// frame arrives (close frames terminate assembly immediately).
    ///
    /// The accumulated length resets on every exit, so the next call starts
    /// a fresh message. A fragment that would push the total past the buffer
    /// capacity fails with [`ProtocolError::MessageTooBig`]; a message of
    /// exactly the capacity is accepted. Not reentrant: one assembly in
    /// flight per session.
    pub(crate) async fn receive_message(&mut self) -> Result<Incoming> {
        let mut kind: Option<DataKind> = None;
        loop {
            match self.transport.recv().await {
                Ok(Fragment::Close(payload)) => {
                    self.len = 0;
                    return Ok(Incoming::Close(payload));
                }
                Ok(Fragment::Data {
                    kind: first,
                    payload,
                    fin,
                }) => {
                    match (kind, first) {
                        (None, Some(k)) => kind = Some(k),
                        (Some(_), None) => {}
                        (None, None) => {
                            self.len = 0;
                            return Err(ProtocolError::UnexpectedContinuation.into());
                        }
                        (Some(_), Some(_)) => {
                            self.len = 0;
                            return Err(ProtocolError::InterleavedMessage.into());
                        }
                    }
                    let remaining = self.buf.len() - self.len;
                    if payload.len() > remaining {
                        self.len = 0;
                        return Err(ProtocolError::MessageTooBig {
                            limit: self.buf.len(),
                        }
                        .into());
                    }
                    self.buf[self.len..self.len + payload.len()].copy_from_slice(&payload);
                    self.len += payload.len();
                    if fin {
                        let len = self.len;
                        self.len = 0;
                        // kind is always set here: a bare continuation errored above
                        let kind = kind.ok_or(ProtocolError::UnexpectedContinuation)?;
                        return Ok(Incoming::Message { kind, len });
                    }
                }
                Err(e) => {
                    self.len = 0;
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_util::sync::CancellationToken;

    use crate::config::{Config, Variant};
    use crate::error::Error;
    use crate::transport::testing::{cont, data, ScriptedTransport};

    fn session_with_capacity(
        capacity: usize,
        script: Vec<Fragment>,
    ) -> Session<ScriptedTransport> {
        let (transport, _record) = ScriptedTransport::new(script);
        let config = Config {
            buffer_capacity: capacity,
            variant: Variant::Permissive,
            reply_delay: std::time::Duration::ZERO,
            announce_on_connect: false,
        };
        Session::new(transport, config, CancellationToken::new())
    }

    fn assert_too_big(result: Result<Incoming>, limit: usize) {
        match result {
            Err(Error::Protocol(ProtocolError::MessageTooBig { limit: l })) => {
                assert_eq!(l, limit)
            }
            other => panic!("expected MessageTooBig, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fragments_assemble_into_one_message() {
        let mut session = session_with_capacity(
            64,
            vec![
                data(DataKind::Text, b"he", false),
                cont(b"ll", false),
                cont(b"o", true),
            ],
        );
        let incoming = session.receive_message().await.unwrap();
        assert_eq!(
            incoming,
            Incoming::Message {
                kind: DataKind::Text,
                len: 5
            }
        );
        assert_eq!(&session.buf[..5], b"hello");
        assert_eq!(session.len, 0);
    }

    #[tokio::test]
    async fn close_frame_interrupts_assembly() {
        let mut session = session_with_capacity(
            64,
            vec![
                data(DataKind::Binary, b"part", false),
                Fragment::Close(Some(ClosePayload::new(1000, "bye"))),
            ],
        );
        let incoming = session.receive_message().await.unwrap();
        assert_eq!(
            incoming,
            Incoming::Close(Some(ClosePayload::new(1000, "bye")))
        );
        assert_eq!(session.len, 0);
    }

    #[tokio::test]
    async fn exactly_capacity_is_accepted() {
        let payload = vec![b'a'; 8];
        let mut session =
            session_with_capacity(8, vec![data(DataKind::Binary, &payload, true)]);
        let incoming = session.receive_message().await.unwrap();
        assert_eq!(
            incoming,
            Incoming::Message {
                kind: DataKind::Binary,
                len: 8
            }
        );
    }

    #[tokio::test]
    async fn capacity_plus_one_is_rejected() {
        let payload = vec![b'a'; 9];
        let mut session =
            session_with_capacity(8, vec![data(DataKind::Binary, &payload, true)]);
        assert_too_big(session.receive_message().await, 8);
    }

    #[tokio::test]
    async fn oversize_across_fragments_is_rejected() {
        let mut session = session_with_capacity(
            8,
            vec![data(DataKind::Text, b"aaaa", false), cont(b"bbbbb", true)],
        );
        assert_too_big(session.receive_message().await, 8);
        assert_eq!(session.len, 0);
    }

    #[tokio::test]
    async fn exact_fill_across_fragments_is_accepted() {
        let mut session = session_with_capacity(
            8,
            vec![data(DataKind::Text, b"aaaa", false), cont(b"bbbb", true)],
        );
        let incoming = session.receive_message().await.unwrap();
        assert_eq!(
            incoming,
            Incoming::Message {
                kind: DataKind::Text,
                len: 8
            }
        );
    }

    #[tokio::test]
    async fn bare_continuation_is_a_protocol_error() {
        let mut session = session_with_capacity(8, vec![cont(b"x", true)]);
        assert!(matches!(
            session.receive_message().await,
            Err(Error::Protocol(ProtocolError::UnexpectedContinuation))
        ));
    }

    #[tokio::test]
    async fn new_message_mid_assembly_is_a_protocol_error() {
        let mut session = session_with_capacity(
            8,
            vec![
                data(DataKind::Text, b"a", false),
                data(DataKind::Text, b"b", true),
            ],
        );
        assert!(matches!(
            session.receive_message().await,
            Err(Error::Protocol(ProtocolError::InterleavedMessage))
        ));
    }

    #[tokio::test]
    async fn buffer_is_reused_across_messages() {
        let mut session = session_with_capacity(
            8,
            vec![
                data(DataKind::Text, b"first", true),
                data(DataKind::Text, b"yo", true),
            ],
        );
        session.receive_message().await.unwrap();
        let incoming = session.receive_message().await.unwrap();
        assert_eq!(
            incoming,
            Incoming::Message {
                kind: DataKind::Text,
                len: 2
            }
        );
        assert_eq!(&session.buf[..2], b"yo");
    }
}
