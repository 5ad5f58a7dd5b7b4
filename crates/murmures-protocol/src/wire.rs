//! JSON and MessagePack encodings shared by every wire type.
//!
//! MessagePack uses named (map) encoding so that optional delta fields can be
//! omitted without shifting positional struct fields.

use rmp_serde::{decode, encode};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::EngineSnapshot;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("encode error: {0}")]
    Encode(#[from] encode::Error),
    #[error("decode error: {0}")]
    Decode(#[from] decode::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn to_msgpack<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, WireError> {
    Ok(encode::to_vec_named(value)?)
}

pub fn from_msgpack<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, WireError> {
    Ok(decode::from_slice(bytes)?)
}

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, WireError> {
    Ok(serde_json::to_string(value)?)
}

pub fn from_json<T: DeserializeOwned>(json: &str) -> Result<T, WireError> {
    Ok(serde_json::from_str(json)?)
}

/// Deterministic snapshot hash so a mirror can check it is in sync.
///
/// FNV-1a 64-bit over the MessagePack encoding.
pub fn snapshot_hash(snapshot: &EngineSnapshot) -> Result<u64, WireError> {
    let bytes = to_msgpack(snapshot)?;
    Ok(hash_bytes_fnv1a64(&bytes))
}

fn hash_bytes_fnv1a64(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    let mut hash = OFFSET_BASIS;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}
