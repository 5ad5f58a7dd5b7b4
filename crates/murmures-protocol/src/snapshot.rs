use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    CharacterType, Coord, EngineState, Guid, Layout, OrderState, SkillId, TemplateId, TileState,
};

/// Detached copy of the synchronized part of the engine: `{state, level, heroes}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    pub state: EngineState,
    #[serde(default)]
    pub game_turn: u32,
    pub level: LevelSnapshot,
    pub heroes: Vec<ActorSnapshot>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelSnapshot {
    /// Identity of this build of the level. A rebuild of the same catalog
    /// level gets a new guid.
    pub guid: Guid,
    pub id: String,
    #[serde(default)]
    pub layout: Layout,
    pub width: u32,
    pub height: u32,
    /// Row-major, `width * height` entries.
    pub tiles: Vec<TileSnapshot>,
    #[serde(default)]
    pub mobs: Vec<ActorSnapshot>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileSnapshot {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub state: TileState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ground_id: Option<TemplateId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prop_id: Option<TemplateId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub char_id: Option<TemplateId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ground_deco: Option<TemplateId>,
}

impl TileSnapshot {
    pub fn coord(&self) -> Coord {
        Coord::new(self.x, self.y)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorSnapshot {
    pub guid: Guid,
    pub kind: CharacterType,
    pub position: Coord,
    pub template_id: TemplateId,
    pub hit_points_max: i32,
    pub hit_points: i32,
    /// Observer guid → currently visible to that observer.
    #[serde(default)]
    pub on_vision: BTreeMap<Guid, bool>,
    #[serde(default)]
    pub char_spotted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_skill: Option<SkillId>,
    #[serde(default)]
    pub state_order: OrderState,
}
