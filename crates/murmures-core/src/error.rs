use murmures_protocol::{Coord, Guid};
use thiserror::Error;

use crate::LevelError;

/// A broken engine invariant. Never recovered from: the operation that hit it
/// is aborted and the fault is surfaced to the caller.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("hero {0} not found")]
    HeroNotFound(Guid),
    #[error("validated order from {0} is malformed")]
    MalformedOrder(Guid),
    #[error("actor {0} is unknown to this engine")]
    UnknownActor(Guid),
    #[error("{collection}[{index}] changed identity: {before} -> {after}")]
    GuidMismatch {
        collection: &'static str,
        index: usize,
        before: Guid,
        after: Guid,
    },
    #[error("{collection} shrank from {before} to {after} actors")]
    ActorCountMismatch {
        collection: &'static str,
        before: usize,
        after: usize,
    },
    #[error("level {id} changed shape between snapshots")]
    LevelShapeMismatch { id: String },
    #[error("delta targets level instance {remote} but the mirror holds {local}")]
    LevelMismatch { local: Guid, remote: Guid },
    #[error("tile {0} is outside the level")]
    TileOutOfBounds(Coord),
    #[error("skill {0} is not in the registry")]
    UnknownSkill(String),
    #[error("level {0} is not in the catalog")]
    UnknownLevel(String),
}

impl InvariantViolation {
    /// Logs the violation at error level and hands it back for propagation.
    pub(crate) fn raise(self) -> Self {
        tracing::error!(violation = %self, "engine invariant violated");
        self
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error("unknown body template {0}")]
    UnknownTemplate(String),
    #[error("body template {0} is not a hero")]
    NotAHero(String),
    #[error("level {0} is not in the catalog")]
    UnknownLevel(String),
    #[error("level {0} has no starting point")]
    NoStartingPoint(String),
    #[error("cannot start a game without heroes")]
    NoHeroes,
    #[error("heroes cannot join a finished game")]
    GameOver,
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("delta version {found} is not supported (expected {expected})")]
    Version { expected: u32, found: u32 },
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}
