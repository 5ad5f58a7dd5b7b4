use std::collections::BTreeMap;

use murmures_protocol::{ActorSnapshot, CharacterType, Coord, Guid, OrderState, SkillId, TemplateId};

use crate::{Body, EngineConfig};

/// A hero or a mob. Heroes are owned by the engine, mobs by their level.
#[derive(Clone, Debug, PartialEq)]
pub struct Actor {
    guid: Guid,
    pub kind: CharacterType,
    /// Tile coordinate inside the owning level.
    pub position: Coord,
    pub template_id: TemplateId,
    hit_points_max: i32,
    hit_points: i32,
    /// Observer guid -> visible to that observer this turn.
    pub on_vision: BTreeMap<Guid, bool>,
    char_spotted: bool,
    pub skills: Vec<SkillId>,
    pub active_skill: Option<SkillId>,
    pub range: i32,
    pub default_damage: i32,
    pub state_order: OrderState,
    pub to_update: bool,
    pub updated_turn: u32,
}

impl Actor {
    pub fn from_body(
        guid: Guid,
        template_id: &str,
        body: &Body,
        position: Coord,
        config: &EngineConfig,
    ) -> Self {
        let kind = if body.is_hero() {
            CharacterType::Hero
        } else {
            CharacterType::Mob
        };
        let hit_points_max = body.hit_points_max.unwrap_or(match kind {
            CharacterType::Hero => config.hero_hit_points,
            CharacterType::Mob => config.mob_hit_points,
        });
        Self {
            guid,
            kind,
            position,
            template_id: template_id.to_string(),
            hit_points_max,
            hit_points: hit_points_max,
            on_vision: BTreeMap::new(),
            char_spotted: false,
            skills: body.skills.clone(),
            active_skill: body.skills.first().cloned(),
            range: body.range.unwrap_or(config.default_range),
            default_damage: body.default_damage.unwrap_or(config.default_damage),
            state_order: OrderState::WaitingForOrder,
            to_update: true,
            updated_turn: 0,
        }
    }

    /// Rebuilds an actor from its wire form. Combat stats that are not
    /// synchronized come from the body when the registry knows it.
    pub fn from_snapshot(snapshot: &ActorSnapshot, body: Option<&Body>, config: &EngineConfig) -> Self {
        let hit_points_max = snapshot.hit_points_max.max(0);
        Self {
            guid: snapshot.guid,
            kind: snapshot.kind,
            position: snapshot.position,
            template_id: snapshot.template_id.clone(),
            hit_points_max,
            hit_points: snapshot.hit_points.clamp(0, hit_points_max),
            on_vision: snapshot.on_vision.clone(),
            char_spotted: snapshot.char_spotted,
            skills: body.map(|b| b.skills.clone()).unwrap_or_default(),
            active_skill: snapshot.active_skill.clone(),
            range: body.and_then(|b| b.range).unwrap_or(config.default_range),
            default_damage: body
                .and_then(|b| b.default_damage)
                .unwrap_or(config.default_damage),
            state_order: snapshot.state_order,
            to_update: false,
            updated_turn: 0,
        }
    }

    pub fn snapshot(&self) -> ActorSnapshot {
        ActorSnapshot {
            guid: self.guid,
            kind: self.kind,
            position: self.position,
            template_id: self.template_id.clone(),
            hit_points_max: self.hit_points_max,
            hit_points: self.hit_points,
            on_vision: self.on_vision.clone(),
            char_spotted: self.char_spotted,
            active_skill: self.active_skill.clone(),
            state_order: self.state_order,
        }
    }

    pub fn guid(&self) -> Guid {
        self.guid
    }

    pub fn hit_points(&self) -> i32 {
        self.hit_points
    }

    pub fn hit_points_max(&self) -> i32 {
        self.hit_points_max
    }

    pub fn is_alive(&self) -> bool {
        self.hit_points > 0
    }

    pub fn is_hero(&self) -> bool {
        self.kind == CharacterType::Hero
    }

    pub fn char_spotted(&self) -> bool {
        self.char_spotted
    }

    /// Marks the actor as seen by a hero. Sticky.
    pub fn spot(&mut self) {
        self.char_spotted = true;
    }

    pub fn is_visible_to(&self, observer: Guid) -> bool {
        self.on_vision.get(&observer).copied().unwrap_or(false)
    }

    pub fn has_skill(&self, skill: &str) -> bool {
        self.skills.iter().any(|s| s == skill)
    }

    /// Applies damage, clamping at zero. Returns the hit points actually lost.
    pub fn take_damage(&mut self, amount: i32, turn: u32) -> i32 {
        let before = self.hit_points;
        self.hit_points = (self.hit_points - amount.max(0)).max(0);
        self.touch(turn);
        before - self.hit_points
    }

    pub fn set_hit_points(&mut self, hit_points_max: i32, hit_points: i32) {
        self.hit_points_max = hit_points_max.max(0);
        self.hit_points = hit_points.clamp(0, self.hit_points_max);
    }

    pub fn move_to(&mut self, to: Coord, turn: u32) {
        self.position = to;
        self.touch(turn);
    }

    pub(crate) fn restore_spotted(&mut self, spotted: bool) {
        self.char_spotted |= spotted;
    }

    pub(crate) fn touch(&mut self, turn: u32) {
        self.to_update = true;
        self.updated_turn = turn;
    }
}
