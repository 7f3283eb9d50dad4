//! WebSocket socket layer.
//!
//! Performs the server-side HTTP upgrade and exposes the accepted stream as
//! the session's [`FrameTransport`](crate::transport::FrameTransport).

mod ws;

pub use ws::{accept, WsTransport};
