//! RADIUS CoA/DM Gateway
//!
//! This crate answers RADIUS Change-of-Authorization and Disconnect-Message
//! requests (RFC 5176) on behalf of a local session authority. Requests are
//! authenticated with `radius-proto`, reduced to a session action, handed to
//! the session authority over a Unix socket, and the verdict is sent back as
//! the matching ACK or NAK.
//!
//! # Features
//!
//! - Async I/O with Tokio, one task per datagram
//! - Disconnect-Request and CoA-Request handling
//! - Per-client shared secrets and source address checks
//! - One short-lived IPC connection per request, bounded by a deadline
//! - Fail-closed: an unreachable backend always yields a NAK
//!
//! # Example
//!
//! ```rust,no_run
//! use radius_coad::{CoaServer, Config, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.apply_env()?;
//!
//!     let server = CoaServer::new(ServerConfig::from_config(config)?).await?;
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod extract;
pub mod handler;
pub mod ipc;
pub mod response;
pub mod server;

pub use config::{Client, ClientTable, Config, ConfigError};
pub use extract::SessionAttributes;
pub use handler::Dispatcher;
pub use ipc::{ActionRequest, BackendOutcome, IpcClient, IpcError, SessionAuthority};
pub use response::{build_reply, reply_code, NakReason, Reply, RequestKind, Verdict};
pub use server::{CoaServer, ServerConfig, ServerError};
