//! Partial state updates.
//!
//! Every field of a delta is optional: a present field overwrites the mirror's
//! value, an absent one leaves it untouched. Layer ids can be cleared, so they
//! use `Option<Option<_>>` where `Some(None)` means "now empty".

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    ActorSnapshot, Coord, EngineState, Guid, LevelSnapshot, OrderState, SkillId, TemplateId,
    TileState, TurnReport,
};

/// Bumped whenever the delta schema changes incompatibly.
pub const PROTOCOL_VERSION: u32 = 1;

/// Changed top-level keys of the engine since a previous snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineDelta {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<EngineState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_turn: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<LevelDelta>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub heroes: Vec<ActorDelta>,
    /// Never diffed: the mirror's queue is replaced by this on every merge.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub report_queue: Vec<TurnReport>,
}

impl EngineDelta {
    pub fn empty() -> Self {
        Self {
            version: PROTOCOL_VERSION,
            state: None,
            game_turn: None,
            level: None,
            heroes: Vec::new(),
            report_queue: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_none()
            && self.game_turn.is_none()
            && self.level.is_none()
            && self.heroes.is_empty()
            && self.report_queue.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LevelDelta {
    /// The level identity changed: the mirror drops its level and takes this one.
    Replace(LevelSnapshot),
    /// Same level instance: merge tiles by coordinate and mobs by guid.
    #[serde(rename_all = "camelCase")]
    Patch {
        guid: Guid,
        #[serde(default)]
        tiles: Vec<TileDelta>,
        #[serde(default)]
        mobs: Vec<ActorDelta>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileDelta {
    pub x: i32,
    pub y: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<TileState>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub ground_id: Option<Option<TemplateId>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub prop_id: Option<Option<TemplateId>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub char_id: Option<Option<TemplateId>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub ground_deco: Option<Option<TemplateId>>,
}

impl TileDelta {
    pub fn at(at: Coord) -> Self {
        Self {
            x: at.x,
            y: at.y,
            state: None,
            ground_id: None,
            prop_id: None,
            char_id: None,
            ground_deco: None,
        }
    }

    pub fn coord(&self) -> Coord {
        Coord::new(self.x, self.y)
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_none()
            && self.ground_id.is_none()
            && self.prop_id.is_none()
            && self.char_id.is_none()
            && self.ground_deco.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorDelta {
    pub guid: Guid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Coord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<TemplateId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hit_points_max: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hit_points: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_vision: Option<BTreeMap<Guid, bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub char_spotted: Option<bool>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub active_skill: Option<Option<SkillId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_order: Option<OrderState>,
    /// Full actor for a guid the mirror has never seen (e.g. a newly registered hero).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spawn: Option<Box<ActorSnapshot>>,
}

impl ActorDelta {
    pub fn for_guid(guid: Guid) -> Self {
        Self {
            guid,
            position: None,
            template_id: None,
            hit_points_max: None,
            hit_points: None,
            on_vision: None,
            char_spotted: None,
            active_skill: None,
            state_order: None,
            spawn: None,
        }
    }

    pub fn spawned(actor: ActorSnapshot) -> Self {
        let mut delta = Self::for_guid(actor.guid);
        delta.spawn = Some(Box::new(actor));
        delta
    }

    pub fn is_empty(&self) -> bool {
        self.position.is_none()
            && self.template_id.is_none()
            && self.hit_points_max.is_none()
            && self.hit_points.is_none()
            && self.on_vision.is_none()
            && self.char_spotted.is_none()
            && self.active_skill.is_none()
            && self.state_order.is_none()
            && self.spawn.is_none()
    }
}

/// Distinguishes an explicit `null` (clear) from an absent field (keep).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
