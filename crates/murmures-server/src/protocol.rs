//! Client/server messages for a match.
//!
//! Extends murmures-protocol with session-level envelopes.

use murmures_protocol::wire::{self, WireError};
use murmures_protocol::{EngineDelta, EngineSnapshot, Guid, OrderRequest};
use serde::{Deserialize, Serialize};

/// Client-to-server messages
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Register a hero built from a body template
    Join { template: String },
    /// Give the order for one hero this turn
    SubmitOrder { order: OrderRequest },
    /// Ask for the full current state (initial sync or recovery)
    RequestState,
}

/// Server-to-client messages
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// A hero joined; carries the full state every mirror resets to
    Joined {
        hero: Guid,
        tile_size: u32,
        snapshot: EngineSnapshot,
    },
    /// Full state
    GameState {
        snapshot: EngineSnapshot,
        checksum: u64,
    },
    OrderRejected {
        hero: Option<Guid>,
        reason: String,
    },
    /// Order buffered; the turn waits on `awaiting`
    OrderAccepted {
        awaiting: Vec<Guid>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        delta: Option<EngineDelta>,
    },
    /// The batch ran; `delta` carries the changes and the turn's reports
    TurnResolved {
        turn: u32,
        delta: EngineDelta,
        /// Hash of the post-turn snapshot for desync detection
        checksum: u64,
    },
    /// The request could not be served
    Fault { message: String },
}

/// Serialize a client message for network transmission
pub fn serialize_client_message(msg: &ClientMessage) -> Result<Vec<u8>, WireError> {
    wire::to_msgpack(msg)
}

/// Deserialize a client message from network data
pub fn deserialize_client_message(data: &[u8]) -> Result<ClientMessage, WireError> {
    wire::from_msgpack(data)
}

/// Serialize a server message for network transmission
pub fn serialize_server_message(msg: &ServerMessage) -> Result<Vec<u8>, WireError> {
    wire::to_msgpack(msg)
}

/// Deserialize a server message from network data
pub fn deserialize_server_message(data: &[u8]) -> Result<ServerMessage, WireError> {
    wire::from_msgpack(data)
}

pub fn client_message_from_json(line: &str) -> Result<ClientMessage, WireError> {
    wire::from_json(line)
}

pub fn client_message_to_json(msg: &ClientMessage) -> Result<String, WireError> {
    wire::to_json(msg)
}

pub fn server_message_from_json(line: &str) -> Result<ServerMessage, WireError> {
    wire::from_json(line)
}

pub fn server_message_to_json(msg: &ServerMessage) -> Result<String, WireError> {
    wire::to_json(msg)
}
