//! Order validation. Pure: reads the engine, never mutates it, so a client
//! mirror can run the same checks before sending an order.

use murmures_protocol::{Command, Coord, EngineState, OrderRequest, TargetAudience};
use thiserror::Error;

use crate::{Actor, Engine};

/// Why an order was refused. The display text is what players see.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("You are dead!")]
    Dead,
    #[error("Order source is not defined")]
    MissingSource,
    #[error("Order target is not defined")]
    MissingTarget,
    #[error("Order command is not defined")]
    MissingCommand,
    #[error("Order contains an unknown command: {0}")]
    UnknownCommand(String),
    #[error("Order target {0} is outside the level")]
    TargetOutsideLevel(Coord),
    #[error("Order sent for an invalid hero")]
    InvalidHero,
    #[error("You cannot target a wall")]
    TargetIsWall,
    #[error("You cannot attack an empty tile")]
    EmptyTile,
    #[error("You cannot attack over an obstacle")]
    NotVisible,
    #[error("Hero doesn't have such a skill")]
    SkillNotOwned,
    #[error("The skill is not defined")]
    SkillUndefined,
    #[error("Target is too far. Your attack range is: {range}")]
    AttackOutOfRange { range: i32 },
    #[error("Invalid target. Target must be a {0}")]
    WrongAudience(&'static str),
    #[error("Target is too far. Your moving range is: 1")]
    MoveOutOfRange,
    #[error("The target tile is occupied by a mob")]
    Occupied,
    #[error("The game has not started")]
    NotStarted,
    #[error("An order was already given this turn")]
    AlreadyOrdered,
}

/// Outcome of [`validate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Validation {
    Accepted,
    Rejected { reason: Rejection },
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Accepted)
    }

    pub fn reason(&self) -> Option<String> {
        match self {
            Validation::Accepted => None,
            Validation::Rejected { reason } => Some(reason.to_string()),
        }
    }
}

impl From<Result<(), Rejection>> for Validation {
    fn from(result: Result<(), Rejection>) -> Self {
        match result {
            Ok(()) => Validation::Accepted,
            Err(reason) => Validation::Rejected { reason },
        }
    }
}

pub fn validate(engine: &Engine, request: &OrderRequest) -> Validation {
    check_order(engine, request).into()
}

/// Rules in precedence order; the first failure wins.
pub fn check_order(engine: &Engine, request: &OrderRequest) -> Result<(), Rejection> {
    if engine.state() == EngineState::Death {
        return Err(Rejection::Dead);
    }

    let source = request.source.as_ref().ok_or(Rejection::MissingSource)?;
    let target = request.target.ok_or(Rejection::MissingTarget)?;
    let name = request.command.as_deref().ok_or(Rejection::MissingCommand)?;
    let command =
        Command::parse(name).ok_or_else(|| Rejection::UnknownCommand(name.to_string()))?;
    if command.targets_tile() && !engine.level().contains(target) {
        return Err(Rejection::TargetOutsideLevel(target));
    }

    let hero = engine
        .hero(source.guid)
        .filter(|h| h.is_alive())
        .ok_or(Rejection::InvalidHero)?;

    if command.targets_tile() && engine.level().is_wall(target, engine.templates()) {
        return Err(Rejection::TargetIsWall);
    }

    match command {
        Command::Attack => {
            let skill = source
                .active_skill
                .as_deref()
                .or(hero.active_skill.as_deref());
            check_attack(engine, hero, target, skill)
        }
        Command::Move => check_move(engine, hero, target),
        Command::ChangeSkill => check_change_skill(engine, hero, request),
    }
}

fn check_attack(
    engine: &Engine,
    attacker: &Actor,
    target: Coord,
    skill_id: Option<&str>,
) -> Result<(), Rejection> {
    let defender = defender_at(engine, attacker, target).ok_or(Rejection::EmptyTile)?;
    if !defender.is_visible_to(attacker.guid()) {
        return Err(Rejection::NotVisible);
    }

    let skill_id = skill_id.ok_or(Rejection::SkillNotOwned)?;
    if !attacker.has_skill(skill_id) {
        return Err(Rejection::SkillNotOwned);
    }
    let skill = engine
        .templates()
        .skill(skill_id)
        .ok_or(Rejection::SkillUndefined)?;

    if !attacker.position.within(target, skill.range) {
        return Err(Rejection::AttackOutOfRange { range: skill.range });
    }
    if !skill.target_audience.admits(defender.kind) {
        return Err(Rejection::WrongAudience(match skill.target_audience {
            TargetAudience::Hero => "hero",
            _ => "mob",
        }));
    }
    Ok(())
}

/// The actor an attack on `target` would be checked against: a living mob
/// first, then another living hero.
fn defender_at<'a>(engine: &'a Engine, attacker: &Actor, target: Coord) -> Option<&'a Actor> {
    engine.level().living_mob_at(target).or_else(|| {
        engine
            .heroes()
            .iter()
            .find(|h| h.position == target && h.is_alive() && h.guid() != attacker.guid())
    })
}

fn check_move(engine: &Engine, hero: &Actor, target: Coord) -> Result<(), Rejection> {
    if !hero.position.within(target, 1) {
        return Err(Rejection::MoveOutOfRange);
    }
    if engine.level().living_mob_at(target).is_some() {
        return Err(Rejection::Occupied);
    }
    Ok(())
}

fn check_change_skill(
    engine: &Engine,
    hero: &Actor,
    request: &OrderRequest,
) -> Result<(), Rejection> {
    let skill = request
        .custom
        .active_skill
        .as_deref()
        .ok_or(Rejection::SkillUndefined)?;
    if engine.templates().skill(skill).is_none() {
        return Err(Rejection::SkillUndefined);
    }
    if !hero.has_skill(skill) {
        return Err(Rejection::SkillNotOwned);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use murmures_protocol::{Guid, OrderCustom, OrderSource};

    use super::*;
    use crate::test_support::*;

    fn reason(engine: &Engine, request: &OrderRequest) -> String {
        validate(engine, request).reason().unwrap_or_default()
    }

    #[test]
    fn adjacent_moves_are_valid() {
        let (engine, heroes) = playing_engine(&["...", ".h.", "..."], 1);
        for dx in -1..=1 {
            for dy in -1..=1 {
                let request = OrderRequest::move_to(heroes[0], Coord::new(1 + dx, 1 + dy));
                assert!(validate(&engine, &request).is_valid(), "{dx},{dy}");
            }
        }
    }

    #[test]
    fn long_moves_cite_range() {
        let (engine, heroes) = playing_engine(&["h...."], 1);
        let request = OrderRequest::move_to(heroes[0], Coord::new(2, 0));
        let validation = validate(&engine, &request);
        assert!(!validation.is_valid());
        assert!(reason(&engine, &request).contains("moving range is: 1"));
    }

    #[test]
    fn move_blockers() {
        let (engine, heroes) = playing_engine(&["hr", "#."], 1);
        let hero = heroes[0];
        assert_eq!(
            reason(&engine, &OrderRequest::move_to(hero, Coord::new(1, 0))),
            "The target tile is occupied by a mob"
        );
        assert_eq!(
            reason(&engine, &OrderRequest::move_to(hero, Coord::new(0, 1))),
            "You cannot target a wall"
        );
        assert!(matches!(
            validate(&engine, &OrderRequest::move_to(hero, Coord::new(-1, 0))),
            Validation::Rejected {
                reason: Rejection::TargetOutsideLevel(_)
            }
        ));
    }

    #[test]
    fn malformed_orders() {
        let (engine, heroes) = playing_engine(&["h.."], 1);
        let mut request = OrderRequest::move_to(heroes[0], Coord::new(1, 0));
        request.command = Some("dance".into());
        assert!(reason(&engine, &request).contains("unknown command"));
        request.command = None;
        assert_eq!(reason(&engine, &request), "Order command is not defined");
        request.target = None;
        assert_eq!(reason(&engine, &request), "Order target is not defined");
        request.source = None;
        assert_eq!(reason(&engine, &request), "Order source is not defined");

        let stranger = OrderRequest::move_to(Guid(999), Coord::new(1, 0));
        assert_eq!(reason(&engine, &stranger), "Order sent for an invalid hero");
    }

    #[test]
    fn attack_rules() {
        let (engine, heroes) = playing_engine(&["h.r..", ".....", "....."], 1);
        let hero = heroes[0];

        assert_eq!(
            reason(&engine, &OrderRequest::attack(hero, Coord::new(1, 0))),
            "You cannot attack an empty tile"
        );
        // Sword reaches one tile.
        assert_eq!(
            reason(&engine, &OrderRequest::attack(hero, Coord::new(2, 0))),
            "Target is too far. Your attack range is: 1"
        );
        let bow = OrderRequest::attack(hero, Coord::new(2, 0)).with_active_skill("bow");
        assert!(validate(&engine, &bow).is_valid());

        let mend = OrderRequest::attack(hero, Coord::new(2, 0)).with_active_skill("mend");
        assert_eq!(reason(&engine, &mend), "Invalid target. Target must be a hero");

        let unknown = OrderRequest::attack(hero, Coord::new(2, 0)).with_active_skill("fireball");
        assert_eq!(reason(&engine, &unknown), "Hero doesn't have such a skill");
    }

    #[test]
    fn cannot_attack_through_walls() {
        let (engine, heroes) = playing_engine(&["h#r"], 1);
        let bow = OrderRequest::attack(heroes[0], Coord::new(2, 0)).with_active_skill("bow");
        assert_eq!(reason(&engine, &bow), "You cannot attack over an obstacle");
    }

    #[test]
    fn change_skill_rules() {
        let (engine, heroes) = playing_engine(&["h.."], 1);
        let hero = heroes[0];
        let at = Coord::new(0, 0);
        assert!(validate(&engine, &OrderRequest::change_skill(hero, at, "bow")).is_valid());

        let mut missing = OrderRequest::change_skill(hero, at, "bow");
        missing.custom = OrderCustom::default();
        assert_eq!(reason(&engine, &missing), "The skill is not defined");
        assert_eq!(
            reason(&engine, &OrderRequest::change_skill(hero, at, "fireball")),
            "The skill is not defined"
        );
    }

    #[test]
    fn dead_engines_refuse_everything() {
        let (mut engine, heroes) = playing_engine(&["h.."], 1);
        engine.state = EngineState::Death;
        assert_eq!(
            reason(&engine, &OrderRequest::move_to(heroes[0], Coord::new(1, 0))),
            "You are dead!"
        );
        // Even garbage is refused for the same reason.
        let garbage = OrderRequest {
            source: Some(OrderSource {
                guid: Guid(7),
                active_skill: None,
            }),
            ..OrderRequest::default()
        };
        assert_eq!(reason(&engine, &garbage), "You are dead!");
    }
}
