use murmures_protocol::{Command, Coord, Guid, OrderRequest, SkillId};

use crate::{Engine, InvariantViolation};

/// A validated order, ready for the resolver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Order {
    pub command: Command,
    pub source: Guid,
    pub target: Coord,
    /// Attack: the skill fired. ChangeSkill: the skill to equip.
    pub skill: Option<SkillId>,
}

impl Order {
    /// Types a request that already passed validation. The hero must exist;
    /// anything else is a broken invariant.
    pub fn build(engine: &Engine, request: &OrderRequest) -> Result<Self, InvariantViolation> {
        let source = request.source.as_ref();
        let guid = source.map_or(Guid(0), |s| s.guid);
        let hero = source
            .and_then(|s| engine.hero(s.guid))
            .ok_or_else(|| InvariantViolation::HeroNotFound(guid).raise())?;
        let command = request
            .command
            .as_deref()
            .and_then(Command::parse)
            .ok_or_else(|| InvariantViolation::MalformedOrder(guid).raise())?;
        let target = request
            .target
            .ok_or_else(|| InvariantViolation::MalformedOrder(guid).raise())?;

        let skill = match command {
            Command::Move => None,
            Command::Attack => source
                .and_then(|s| s.active_skill.clone())
                .or_else(|| hero.active_skill.clone()),
            Command::ChangeSkill => request.custom.active_skill.clone(),
        };

        Ok(Self {
            command,
            source: hero.guid(),
            target,
            skill,
        })
    }
}
