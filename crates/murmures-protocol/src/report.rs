use serde::{Deserialize, Serialize};

use crate::{Coord, Guid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Effect {
    CharacterMove,
    ProjectileMove,
    Damage,
}

/// Playback priorities. Lower plays first; hero effects precede AI effects.
pub mod priority {
    pub const HERO_MOVE: i32 = 10;
    pub const HERO_PROJECTILE: i32 = 20;
    pub const HERO_DAMAGE: i32 = 30;
    pub const AI_PROJECTILE: i32 = 120;
    pub const AI_DAMAGE: i32 = 130;
}

/// One effect of a resolved turn, for client-side playback. Not durable state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnReport {
    pub effect: Effect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<Guid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_tile: Option<Coord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_tile: Option<Coord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i32>,
    pub priority: i32,
}

impl TurnReport {
    pub fn character_move(character: Guid, from: Coord, to: Coord, priority: i32) -> Self {
        Self {
            effect: Effect::CharacterMove,
            character: Some(character),
            source_tile: Some(from),
            target_tile: Some(to),
            value: None,
            priority,
        }
    }

    pub fn projectile(from: Coord, to: Coord, priority: i32) -> Self {
        Self {
            effect: Effect::ProjectileMove,
            character: None,
            source_tile: Some(from),
            target_tile: Some(to),
            value: None,
            priority,
        }
    }

    pub fn damage(character: Guid, value: i32, priority: i32) -> Self {
        Self {
            effect: Effect::Damage,
            character: Some(character),
            source_tile: None,
            target_tile: None,
            value: Some(value),
            priority,
        }
    }
}

/// Reports in playback order: stable by priority, emission order within a priority.
pub fn playback_order(reports: &[TurnReport]) -> Vec<TurnReport> {
    let mut ordered = reports.to_vec();
    ordered.sort_by_key(|r| r.priority);
    ordered
}
