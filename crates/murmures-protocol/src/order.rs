use serde::{Deserialize, Serialize};

use crate::{Coord, Guid, SkillId};

/// Commands a hero can be given.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Command {
    Move,
    Attack,
    ChangeSkill,
}

impl Command {
    /// Parse the wire name (`"move"`, `"attack"`, `"changeSkill"`).
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "move" => Some(Command::Move),
            "attack" => Some(Command::Attack),
            "changeSkill" => Some(Command::ChangeSkill),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Command::Move => "move",
            Command::Attack => "attack",
            Command::ChangeSkill => "changeSkill",
        }
    }

    /// Commands that act on a target tile.
    pub fn targets_tile(self) -> bool {
        matches!(self, Command::Move | Command::Attack)
    }
}

/// Order as submitted by a client. Every field is optional on the wire;
/// the validator reports what is missing instead of failing to decode.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub source: Option<OrderSource>,
    #[serde(default)]
    pub target: Option<Coord>,
    #[serde(default)]
    pub custom: OrderCustom,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSource {
    pub guid: Guid,
    #[serde(default)]
    pub active_skill: Option<SkillId>,
}

/// Command-specific parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCustom {
    #[serde(default)]
    pub active_skill: Option<SkillId>,
}

impl OrderRequest {
    pub fn new(command: Command, source: Guid, target: Coord) -> Self {
        Self {
            command: Some(command.as_str().to_string()),
            source: Some(OrderSource {
                guid: source,
                active_skill: None,
            }),
            target: Some(target),
            custom: OrderCustom::default(),
        }
    }

    pub fn move_to(source: Guid, target: Coord) -> Self {
        Self::new(Command::Move, source, target)
    }

    pub fn attack(source: Guid, target: Coord) -> Self {
        Self::new(Command::Attack, source, target)
    }

    pub fn change_skill(source: Guid, at: Coord, skill: impl Into<SkillId>) -> Self {
        let mut request = Self::new(Command::ChangeSkill, source, at);
        request.custom.active_skill = Some(skill.into());
        request
    }

    pub fn with_active_skill(mut self, skill: impl Into<SkillId>) -> Self {
        if let Some(source) = self.source.as_mut() {
            source.active_skill = Some(skill.into());
        }
        self
    }

    pub fn source_guid(&self) -> Option<Guid> {
        self.source.as_ref().map(|s| s.guid)
    }
}
