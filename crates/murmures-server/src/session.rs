//! Server-authoritative match session.
//!
//! The simulation lives in `murmures_core::Engine`; this wrapper owns it and
//! turns client messages into engine calls and engine changes into messages.
//! Every reply that changes state carries the delta since the previous one,
//! so mirrors that apply replies in order stay in lock-step.

use murmures_core::{diff, Engine, EngineError, InvariantViolation, Submission};
use murmures_protocol::wire::{snapshot_hash, WireError};
use murmures_protocol::{
    EngineDelta, EngineSnapshot, EngineState, Guid, OrderRequest, TemplateId,
};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::{ConfigError, ServerConfig};
use crate::protocol::{ClientMessage, ServerMessage};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("match is full ({max} heroes)")]
    Full { max: usize },
    #[error("{0} is not a playable hero here")]
    TemplateNotAllowed(TemplateId),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
    #[error(transparent)]
    Wire(#[from] WireError),
}

#[derive(Debug)]
pub struct MatchSession {
    engine: Engine,
    /// State as of the last message that carried state.
    synced: EngineSnapshot,
    min_heroes: usize,
    max_heroes: usize,
    /// Empty admits any hero body.
    hero_templates: Vec<TemplateId>,
}

impl MatchSession {
    pub fn new(engine: Engine, min_heroes: usize, max_heroes: usize) -> Self {
        let synced = engine.clone_state();
        Self {
            engine,
            synced,
            min_heroes,
            max_heroes,
            hero_templates: Vec::new(),
        }
    }

    /// Restricts which bodies players may join as.
    pub fn with_hero_templates(mut self, templates: Vec<TemplateId>) -> Self {
        self.hero_templates = templates;
        self
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self, SessionError> {
        let templates = config.load_templates()?;
        let catalog = config.load_catalog()?;
        let engine = Engine::new(templates, catalog, &config.start_level, config.engine.clone())?;
        Ok(Self::new(engine, config.min_heroes, config.max_heroes)
            .with_hero_templates(config.hero_templates.clone()))
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Registers a hero, opening the game once enough heroes are in.
    pub fn join(&mut self, template: &str) -> Result<(Guid, EngineSnapshot), SessionError> {
        if self.engine.heroes().len() >= self.max_heroes {
            return Err(SessionError::Full {
                max: self.max_heroes,
            });
        }
        if !self.hero_templates.is_empty() && !self.hero_templates.iter().any(|t| t == template) {
            return Err(SessionError::TemplateNotAllowed(template.to_string()));
        }
        let hero = self.engine.register_hero(template)?;
        if self.engine.state() == EngineState::PlayerRegistered
            && self.engine.heroes().len() >= self.min_heroes
        {
            self.engine.start()?;
        }
        self.synced = self.engine.clone_state();
        info!(%hero, template, heroes = self.engine.heroes().len(), "hero joined");
        Ok((hero, self.synced.clone()))
    }

    pub fn handle(&mut self, message: ClientMessage) -> Vec<ServerMessage> {
        let reply = match message {
            ClientMessage::Join { template } => {
                self.join(&template)
                    .map(|(hero, snapshot)| ServerMessage::Joined {
                        hero,
                        tile_size: self.engine.tile_size(),
                        snapshot,
                    })
            }
            ClientMessage::SubmitOrder { order } => self.submit(&order),
            ClientMessage::RequestState => self.state_message(),
        };
        match reply {
            Ok(message) => vec![message],
            Err(err) => {
                match &err {
                    SessionError::Invariant(_) | SessionError::Engine(EngineError::Invariant(_)) => {
                        error!(%err, "session fault")
                    }
                    _ => warn!(%err, "request failed"),
                }
                vec![ServerMessage::Fault {
                    message: err.to_string(),
                }]
            }
        }
    }

    pub fn submit(&mut self, order: &OrderRequest) -> Result<ServerMessage, SessionError> {
        match self.engine.submit_order(order)? {
            Submission::Rejected(reason) => Ok(ServerMessage::OrderRejected {
                hero: order.source_guid(),
                reason: reason.to_string(),
            }),
            Submission::Queued { awaiting } => Ok(ServerMessage::OrderAccepted {
                awaiting,
                delta: self.advance()?,
            }),
            Submission::Resolved { turn } => {
                let mut delta = self.advance()?.unwrap_or_else(EngineDelta::empty);
                delta.report_queue = self.engine.report_queue().to_vec();
                let checksum = snapshot_hash(&self.synced)?;
                info!(turn, reports = delta.report_queue.len(), "turn resolved");
                Ok(ServerMessage::TurnResolved {
                    turn,
                    delta,
                    checksum,
                })
            }
        }
    }

    pub fn state_message(&self) -> Result<ServerMessage, SessionError> {
        Ok(ServerMessage::GameState {
            checksum: snapshot_hash(&self.synced)?,
            snapshot: self.synced.clone(),
        })
    }

    /// Changes since the last state-carrying message.
    fn advance(&mut self) -> Result<Option<EngineDelta>, InvariantViolation> {
        let now = self.engine.clone_state();
        let delta = diff(&self.synced, &now)?;
        self.synced = now;
        Ok(delta)
    }
}
