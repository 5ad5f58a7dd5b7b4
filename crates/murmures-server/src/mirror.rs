//! Client-side copy of the match, advanced only by server messages.

use std::sync::Arc;

use murmures_core::{validate, Engine, EngineConfig, SyncError, Templates, Validation};
use murmures_protocol::wire::{snapshot_hash, WireError};
use murmures_protocol::{playback_order, EngineSnapshot, Guid, OrderRequest, TurnReport};
use thiserror::Error;
use tracing::{debug, warn};

use crate::protocol::ServerMessage;

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Wire(#[from] WireError),
    #[error("desync: server checksum {expected:016x}, mirror {found:016x}")]
    Desync { expected: u64, found: u64 },
}

#[derive(Debug)]
pub struct ClientMirror {
    templates: Arc<Templates>,
    config: EngineConfig,
    engine: Engine,
    hero: Option<Guid>,
}

impl ClientMirror {
    pub fn new(templates: Arc<Templates>, config: EngineConfig, snapshot: &EngineSnapshot) -> Self {
        let engine = Engine::from_snapshot(templates.clone(), config.clone(), snapshot);
        Self {
            templates,
            config,
            engine,
            hero: None,
        }
    }

    /// Mirror for the client whose join produced `joined`.
    pub fn from_joined(
        templates: Arc<Templates>,
        config: EngineConfig,
        joined: &ServerMessage,
    ) -> Option<Self> {
        let ServerMessage::Joined { hero, snapshot, .. } = joined else {
            return None;
        };
        let mut mirror = Self::new(templates, config, snapshot);
        mirror.hero = Some(*hero);
        Some(mirror)
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn hero(&self) -> Option<Guid> {
        self.hero
    }

    /// Runs the server's validation rules locally before sending an order.
    pub fn prevalidate(&self, order: &OrderRequest) -> Validation {
        validate(&self.engine, order)
    }

    /// The last turn's reports in playback order.
    pub fn playback(&self) -> Vec<TurnReport> {
        playback_order(self.engine.report_queue())
    }

    pub fn checksum(&self) -> Result<u64, WireError> {
        snapshot_hash(&self.engine.clone_state())
    }

    pub fn apply(&mut self, message: &ServerMessage) -> Result<(), MirrorError> {
        match message {
            ServerMessage::Joined { snapshot, .. } => self.reset(snapshot),
            ServerMessage::GameState { snapshot, checksum } => {
                self.reset(snapshot);
                self.verify(*checksum)?;
            }
            ServerMessage::OrderAccepted {
                delta: Some(delta), ..
            } => self.engine.synchronize(delta)?,
            ServerMessage::TurnResolved {
                turn,
                delta,
                checksum,
            } => {
                self.engine.synchronize(delta)?;
                self.verify(*checksum)?;
                debug!(turn, reports = delta.report_queue.len(), "mirror advanced");
            }
            ServerMessage::OrderAccepted { delta: None, .. }
            | ServerMessage::OrderRejected { .. }
            | ServerMessage::Fault { .. } => {}
        }
        Ok(())
    }

    fn reset(&mut self, snapshot: &EngineSnapshot) {
        self.engine = Engine::from_snapshot(self.templates.clone(), self.config.clone(), snapshot);
    }

    fn verify(&self, expected: u64) -> Result<(), MirrorError> {
        let found = self.checksum()?;
        if found != expected {
            warn!(expected, found, "mirror out of sync");
            return Err(MirrorError::Desync { expected, found });
        }
        Ok(())
    }
}
