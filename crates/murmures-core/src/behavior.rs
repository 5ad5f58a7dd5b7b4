//! Tile behaviors triggered by a hero stepping onto a tile.

use murmures_protocol::{priority, Coord, Guid, TurnReport};
use tracing::info;

use crate::{Engine, EngineError, TileBehavior};

/// Whether the rest of the turn's batch still applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    /// The active level was swapped; queued orders point at the old one.
    LevelChanged,
}

pub(crate) fn trigger(
    engine: &mut Engine,
    behavior: &TileBehavior,
    hero: Guid,
    target: Coord,
) -> Result<Flow, EngineError> {
    match behavior {
        TileBehavior::Trap { damage } => spring_trap(engine, *damage, hero, target),
        TileBehavior::Stairs { level } => take_stairs(engine, level, hero),
    }
}

fn spring_trap(
    engine: &mut Engine,
    damage: i32,
    hero: Guid,
    target: Coord,
) -> Result<Flow, EngineError> {
    engine.move_hero(hero, target)?;
    let turn = engine.game_turn;
    let victim = engine.hero_mut(hero)?;
    victim.take_damage(damage, turn);
    let died = !victim.is_alive();
    engine
        .report_queue
        .push(TurnReport::damage(hero, damage, priority::HERO_DAMAGE));
    info!(hero = %hero, at = %target, damage, "trap sprung");

    if died {
        engine.mark_death(target);
        engine.declare_death();
    }
    Ok(Flow::Continue)
}

fn take_stairs(engine: &mut Engine, level: &str, hero: Guid) -> Result<Flow, EngineError> {
    info!(hero = %hero, level, "stairs taken");
    engine.change_level(level)?;
    Ok(Flow::LevelChanged)
}
