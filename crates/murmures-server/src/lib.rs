//! Murmures match server.
//!
//! Wraps the authoritative engine in a session that speaks client/server
//! messages, plus the client-side mirror those messages keep in sync.

pub mod config;
pub mod mirror;
pub mod protocol;
pub mod session;

pub use config::{ConfigError, ServerConfig};
pub use mirror::{ClientMirror, MirrorError};
pub use protocol::*;
pub use session::{MatchSession, SessionError};
