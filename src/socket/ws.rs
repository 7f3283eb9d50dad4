//! Server-side WebSocket transport backed by tokio-tungstenite.

use async_trait::async_trait;
use bytes::Bytes;
use futures::sink::SinkExt;
use futures::stream::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::{CloseFrame, WebSocketConfig};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::WebSocketStream;

use crate::error::{ProtocolError, TransportError};
use crate::transport::{ClosePayload, DataKind, FrameTransport, Fragment};
use crate::Result;

/// One accepted WebSocket connection exposed as a [`FrameTransport`].
///
/// tungstenite reassembles wire fragments itself, so every data fragment
/// this transport yields is final; the session's capacity bookkeeping still
/// applies unchanged.
pub struct WsTransport<S> {
    inner: WebSocketStream<S>,
    max_message_size: usize,
}

/// Upgrade an inbound stream to WebSocket.
///
/// Message and frame sizes are capped at `max_message_size` so the wire
/// layer never buffers what the session could not hold anyway. A failed
/// handshake (non-upgrade request) surfaces as
/// [`TransportError::UpgradeRejected`]; tungstenite answers the peer with an
/// HTTP error itself.
pub async fn accept<S>(stream: S, max_message_size: usize) -> Result<WsTransport<S>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut config = WebSocketConfig::default();
    config.max_message_size = Some(max_message_size);
    config.max_frame_size = Some(max_message_size);
    let inner = tokio_tungstenite::accept_async_with_config(stream, Some(config))
        .await
        .map_err(|e| TransportError::UpgradeRejected(e.to_string()))?;
    Ok(WsTransport {
        inner,
        max_message_size,
    })
}

fn ws_err(e: tungstenite::Error) -> crate::Error {
    match e {
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
            TransportError::Disconnected.into()
        }
        e => TransportError::WebSocket(e.to_string()).into(),
    }
}

#[async_trait]
impl<S> FrameTransport for WsTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn recv(&mut self) -> Result<Fragment> {
        loop {
            let msg = match self.inner.next().await {
                Some(Ok(msg)) => msg,
                // The wire-level size cap tripped before our own bookkeeping.
                Some(Err(tungstenite::Error::Capacity(_))) => {
                    return Err(ProtocolError::MessageTooBig {
                        limit: self.max_message_size,
                    }
                    .into())
                }
                Some(Err(e)) => return Err(ws_err(e)),
                None => return Err(TransportError::Disconnected.into()),
            };
            let fragment = match msg {
                Message::Text(text) => Fragment::Data {
                    kind: Some(DataKind::Text),
                    payload: Bytes::from(text.into_bytes()),
                    fin: true,
                },
                Message::Binary(data) => Fragment::Data {
                    kind: Some(DataKind::Binary),
                    payload: Bytes::from(data),
                    fin: true,
                },
                Message::Close(frame) => Fragment::Close(
                    frame.map(|f| ClosePayload::new(u16::from(f.code), f.reason.into_owned())),
                ),
                // tungstenite answers pings itself; neither reaches the session
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            };
            return Ok(fragment);
        }
    }

    async fn send(&mut self, kind: DataKind, payload: &[u8]) -> Result<()> {
        let msg = match kind {
            DataKind::Text => Message::Text(String::from_utf8_lossy(payload).into_owned()),
            DataKind::Binary => Message::Binary(payload.to_vec()),
        };
        self.inner.send(msg).await.map_err(ws_err)
    }

    async fn send_close(&mut self, payload: Option<ClosePayload>) -> Result<()> {
        let frame = payload.map(|p| CloseFrame {
            code: CloseCode::from(p.code),
            reason: p.reason.into(),
        });
        match self.inner.close(frame).await {
            Ok(()) => Ok(()),
            // The protocol layer may have queued its own reply already.
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => Ok(()),
            Err(e) => Err(TransportError::WebSocket(e.to_string()).into()),
        }
    }
}
