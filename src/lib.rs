//! # delayed-echo
//!
//! WebSocket echo server with delayed binary replies.
//!
//! Each accepted connection gets its own session: a complete message is
//! assembled from however many fragments the peer splits it into (into a
//! fixed-capacity working buffer), classified, and answered on the same
//! connection. Text comes back rewritten immediately, binary comes back
//! byte-identical after a configurable delay, close frames get their status
//! echoed, and messages that would overflow the buffer end the connection
//! with a descriptive close. Two rule sets ([`Variant`]) cover the
//! permissive behavior (command sentinels, delayed binary echo) and the
//! strict one (binary rejected outright).
//!
//! ## Example
//!
//! ```ignore
//! use delayed_echo::{Config, EchoServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let server = EchoServer::new("127.0.0.1:9001", Config::default());
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod server;
pub mod session;
pub mod socket;
pub mod transport;

pub use config::{CliArgs, Config, Settings, Variant};
pub use error::{Error, Result};
pub use server::EchoServer;
pub use session::{classify, Action, Session};
pub use transport::{ClosePayload, DataKind, FrameTransport, Fragment};
