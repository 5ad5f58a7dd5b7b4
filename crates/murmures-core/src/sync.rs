//! Snapshots, diffs and merges between the authoritative engine and mirrors.

use std::sync::Arc;

use murmures_protocol::{
    ActorDelta, ActorSnapshot, EngineDelta, EngineSnapshot, LevelDelta, LevelSnapshot, TileDelta,
    TileSnapshot, PROTOCOL_VERSION,
};
use tracing::{debug, warn};

use crate::{
    Actor, Engine, EngineConfig, GuidAllocator, InvariantViolation, Level, LevelCatalog,
    SyncError, Templates, Tile,
};

impl Engine {
    /// Detached copy of `{state, gameTurn, level, heroes}`.
    pub fn clone_state(&self) -> EngineSnapshot {
        EngineSnapshot {
            state: self.state,
            game_turn: self.game_turn,
            level: self.level.snapshot(),
            heroes: self.heroes.iter().map(Actor::snapshot).collect(),
        }
    }

    /// What changed since `before`, plus the current report queue.
    /// `None` when nothing differs and there is nothing to play back.
    pub fn compare(&self, before: &EngineSnapshot) -> Result<Option<EngineDelta>, InvariantViolation> {
        let mut delta = diff(before, &self.clone_state())?.unwrap_or_else(EngineDelta::empty);
        delta.report_queue = self.report_queue.clone();
        Ok((!delta.is_empty()).then_some(delta))
    }

    /// Builds a mirror from a full snapshot. Mirrors have no level catalog:
    /// level changes reach them as whole-level replacements.
    pub fn from_snapshot(
        templates: Arc<Templates>,
        config: EngineConfig,
        snapshot: &EngineSnapshot,
    ) -> Self {
        let level = Level::from_snapshot(&snapshot.level, &templates, &config);
        let heroes = snapshot
            .heroes
            .iter()
            .map(|h| Actor::from_snapshot(h, templates.body(&h.template_id), &config))
            .collect();
        let last_guid = snapshot
            .heroes
            .iter()
            .chain(&snapshot.level.mobs)
            .map(|a| a.guid.0)
            .chain(std::iter::once(snapshot.level.guid.0))
            .max()
            .unwrap_or(0);

        Self {
            config,
            templates,
            levels: LevelCatalog::new(),
            state: snapshot.state,
            level,
            heroes,
            order_queue: Vec::new(),
            report_queue: Vec::new(),
            game_turn: snapshot.game_turn,
            guids: GuidAllocator::starting_after(last_guid),
        }
    }

    /// Merges a delta into this engine. Present fields overwrite, absent
    /// fields are kept. Nothing is applied if any part of the delta is
    /// inconsistent with this engine.
    pub fn synchronize(&mut self, delta: &EngineDelta) -> Result<(), SyncError> {
        if delta.version != PROTOCOL_VERSION {
            warn!(found = delta.version, "delta with unsupported version");
            return Err(SyncError::Version {
                expected: PROTOCOL_VERSION,
                found: delta.version,
            });
        }

        let turn = delta.game_turn.unwrap_or(self.game_turn);
        let level = match &delta.level {
            None => None,
            Some(LevelDelta::Replace(snapshot)) => Some(Level::from_snapshot(
                snapshot,
                &self.templates,
                &self.config,
            )),
            Some(LevelDelta::Patch { guid, tiles, mobs }) => {
                if *guid != self.level.guid() {
                    return Err(InvariantViolation::LevelMismatch {
                        local: self.level.guid(),
                        remote: *guid,
                    }
                    .raise()
                    .into());
                }
                let mut level = self.level.clone();
                for tile_delta in tiles {
                    let tile = level.tile_mut(tile_delta.coord()).ok_or_else(|| {
                        InvariantViolation::TileOutOfBounds(tile_delta.coord()).raise()
                    })?;
                    merge_tile(tile, tile_delta, turn);
                }
                merge_actors(&mut level.mobs, mobs, &self.templates, &self.config, turn)?;
                Some(level)
            }
        };

        let mut heroes = self.heroes.clone();
        merge_actors(&mut heroes, &delta.heroes, &self.templates, &self.config, turn)?;

        if let Some(level) = level {
            self.level = level;
        }
        self.heroes = heroes;
        if let Some(state) = delta.state {
            self.state = state;
        }
        self.game_turn = turn;
        self.report_queue = delta.report_queue.clone();
        debug!(turn, reports = self.report_queue.len(), "delta merged");
        Ok(())
    }
}

/// Top-level changes from `before` to `after`.
pub fn diff(
    before: &EngineSnapshot,
    after: &EngineSnapshot,
) -> Result<Option<EngineDelta>, InvariantViolation> {
    let mut delta = EngineDelta::empty();
    if before.state != after.state {
        delta.state = Some(after.state);
    }
    if before.game_turn != after.game_turn {
        delta.game_turn = Some(after.game_turn);
    }
    delta.level = diff_level(&before.level, &after.level)?;
    delta.heroes = diff_actors("heroes", &before.heroes, &after.heroes, true)?;
    Ok((!delta.is_empty()).then_some(delta))
}

fn diff_level(
    before: &LevelSnapshot,
    after: &LevelSnapshot,
) -> Result<Option<LevelDelta>, InvariantViolation> {
    if before.guid != after.guid {
        return Ok(Some(LevelDelta::Replace(after.clone())));
    }
    if before.width != after.width
        || before.height != after.height
        || before.tiles.len() != after.tiles.len()
    {
        return Err(InvariantViolation::LevelShapeMismatch {
            id: after.id.clone(),
        }
        .raise());
    }

    let tiles: Vec<TileDelta> = before
        .tiles
        .iter()
        .zip(&after.tiles)
        .filter_map(|(b, a)| diff_tile(b, a))
        .collect();
    let mobs = diff_actors("mobs", &before.mobs, &after.mobs, false)?;

    if tiles.is_empty() && mobs.is_empty() {
        return Ok(None);
    }
    Ok(Some(LevelDelta::Patch {
        guid: after.guid,
        tiles,
        mobs,
    }))
}

fn diff_tile(before: &TileSnapshot, after: &TileSnapshot) -> Option<TileDelta> {
    fn layer(before: &Option<String>, after: &Option<String>) -> Option<Option<String>> {
        (before != after).then(|| after.clone())
    }

    let mut delta = TileDelta::at(after.coord());
    if before.state != after.state {
        delta.state = Some(after.state);
    }
    delta.ground_id = layer(&before.ground_id, &after.ground_id);
    delta.prop_id = layer(&before.prop_id, &after.prop_id);
    delta.char_id = layer(&before.char_id, &after.char_id);
    delta.ground_deco = layer(&before.ground_deco, &after.ground_deco);
    (!delta.is_empty()).then_some(delta)
}

/// Actors are compared position by position in their collection. Growth is
/// only legal where `may_grow` is set (heroes joining).
fn diff_actors(
    collection: &'static str,
    before: &[ActorSnapshot],
    after: &[ActorSnapshot],
    may_grow: bool,
) -> Result<Vec<ActorDelta>, InvariantViolation> {
    if after.len() < before.len() || (!may_grow && after.len() != before.len()) {
        return Err(InvariantViolation::ActorCountMismatch {
            collection,
            before: before.len(),
            after: after.len(),
        }
        .raise());
    }

    let mut deltas = Vec::new();
    for (index, actor) in after.iter().enumerate() {
        let Some(previous) = before.get(index) else {
            deltas.push(ActorDelta::spawned(actor.clone()));
            continue;
        };
        if previous.guid != actor.guid {
            return Err(InvariantViolation::GuidMismatch {
                collection,
                index,
                before: previous.guid,
                after: actor.guid,
            }
            .raise());
        }
        if let Some(delta) = diff_actor(previous, actor) {
            deltas.push(delta);
        }
    }
    Ok(deltas)
}

fn diff_actor(before: &ActorSnapshot, after: &ActorSnapshot) -> Option<ActorDelta> {
    fn changed<T: PartialEq + Clone>(before: &T, after: &T) -> Option<T> {
        (before != after).then(|| after.clone())
    }

    let delta = ActorDelta {
        position: changed(&before.position, &after.position),
        template_id: changed(&before.template_id, &after.template_id),
        hit_points_max: changed(&before.hit_points_max, &after.hit_points_max),
        hit_points: changed(&before.hit_points, &after.hit_points),
        on_vision: changed(&before.on_vision, &after.on_vision),
        char_spotted: changed(&before.char_spotted, &after.char_spotted),
        active_skill: changed(&before.active_skill, &after.active_skill),
        state_order: changed(&before.state_order, &after.state_order),
        ..ActorDelta::for_guid(after.guid)
    };
    (!delta.is_empty()).then_some(delta)
}

fn merge_tile(tile: &mut Tile, delta: &TileDelta, turn: u32) {
    if let Some(state) = delta.state {
        tile.state = state;
    }
    if let Some(ground) = &delta.ground_id {
        tile.ground_id = ground.clone();
    }
    if let Some(prop) = &delta.prop_id {
        tile.prop_id = prop.clone();
    }
    if let Some(character) = &delta.char_id {
        tile.char_id = character.clone();
    }
    if let Some(deco) = &delta.ground_deco {
        tile.ground_deco = deco.clone();
    }
    tile.touch(turn);
}

fn merge_actors(
    actors: &mut Vec<Actor>,
    deltas: &[ActorDelta],
    templates: &Templates,
    config: &EngineConfig,
    turn: u32,
) -> Result<(), InvariantViolation> {
    for delta in deltas {
        match actors.iter_mut().find(|a| a.guid() == delta.guid) {
            Some(actor) => merge_actor(actor, delta, turn),
            None => {
                let spawn = delta
                    .spawn
                    .as_deref()
                    .ok_or_else(|| InvariantViolation::UnknownActor(delta.guid).raise())?;
                let mut actor =
                    Actor::from_snapshot(spawn, templates.body(&spawn.template_id), config);
                actor.touch(turn);
                actors.push(actor);
            }
        }
    }
    Ok(())
}

fn merge_actor(actor: &mut Actor, delta: &ActorDelta, turn: u32) {
    if let Some(spawn) = delta.spawn.as_deref() {
        actor.position = spawn.position;
        actor.template_id = spawn.template_id.clone();
        actor.set_hit_points(spawn.hit_points_max, spawn.hit_points);
        actor.on_vision = spawn.on_vision.clone();
        actor.restore_spotted(spawn.char_spotted);
        actor.active_skill = spawn.active_skill.clone();
        actor.state_order = spawn.state_order;
    }
    if let Some(position) = delta.position {
        actor.position = position;
    }
    if let Some(template_id) = &delta.template_id {
        actor.template_id = template_id.clone();
    }
    if delta.hit_points_max.is_some() || delta.hit_points.is_some() {
        let max = delta.hit_points_max.unwrap_or(actor.hit_points_max());
        let hp = delta.hit_points.unwrap_or(actor.hit_points());
        actor.set_hit_points(max, hp);
    }
    if let Some(on_vision) = &delta.on_vision {
        actor.on_vision = on_vision.clone();
    }
    if let Some(spotted) = delta.char_spotted {
        actor.restore_spotted(spotted);
    }
    if let Some(skill) = &delta.active_skill {
        actor.active_skill = skill.clone();
    }
    if let Some(state_order) = delta.state_order {
        actor.state_order = state_order;
    }
    actor.touch(turn);
}
