//! Ray-cast field of view.
//!
//! 360 rays, one per whole degree, are stepped one tile length at a time from
//! the observer's tile center. Tiles hit by a ray are highlighted; a blocking
//! tile is highlighted and then ends its ray.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::f64::consts::PI;

use murmures_protocol::{Coord, Guid, TileState};

use crate::{Engine, Level, Templates};

/// Default number of ray steps.
pub const DEFAULT_RANGE_SOV: u32 = 10;

/// Tiles already cleared as non-blocking during one vision refresh. Shared
/// by every hero pass of the same turn.
#[derive(Debug, Default)]
pub struct VisionPass {
    visited: HashSet<Coord>,
}

impl VisionPass {
    pub fn visited(&self, at: Coord) -> bool {
        self.visited.contains(&at)
    }
}

/// Turns every `Highlighted` tile into `FogOfWar`. Other states are kept.
pub fn degrade_highlighted(level: &mut Level) {
    for tile in level.tiles_mut() {
        if tile.state == TileState::Highlighted {
            tile.state = TileState::FogOfWar;
        }
    }
}

/// Casts the field of view of an observer standing on `origin` and returns
/// the tiles it lit.
pub fn cast_field_of_view(
    level: &mut Level,
    templates: &Templates,
    origin: Coord,
    range: u32,
    pass: &mut VisionPass,
) -> BTreeSet<Coord> {
    let mut lit = BTreeSet::new();
    let center_x = f64::from(origin.x) + 0.5;
    let center_y = f64::from(origin.y) + 0.5;

    for degree in 0..360u32 {
        let radians = f64::from(degree) * PI / 180.0;
        let (step_x, step_y) = (radians.cos(), radians.sin());
        let (mut ox, mut oy) = (center_x, center_y);

        for step in 0..range {
            let at = Coord::new(ox.floor() as i32, oy.floor() as i32);
            let Some(tile) = level.tile_mut(at) else {
                break;
            };
            tile.state = TileState::Highlighted;
            lit.insert(at);

            if !pass.visited(at) {
                let ground_light = templates.lets_light_through(tile.ground_id.as_deref());
                let prop_light = templates.lets_light_through(tile.prop_id.as_deref());
                if !(ground_light && prop_light) && step > 0 {
                    break;
                }
                pass.visited.insert(at);
            }

            ox += step_x;
            oy += step_y;
        }
    }
    lit
}

impl Engine {
    /// Recomputes the fog of war and every actor's per-hero visibility from
    /// the living heroes' positions.
    pub(crate) fn refresh_vision(&mut self) {
        let turn = self.game_turn;
        let range = self.config.vision_range;
        let before: Vec<TileState> = self.level.tiles().iter().map(|t| t.state).collect();

        degrade_highlighted(&mut self.level);
        let mut pass = VisionPass::default();
        let mut fields: Vec<(Guid, BTreeSet<Coord>)> = Vec::new();
        for hero in self.heroes.iter().filter(|h| h.is_alive()) {
            let lit = cast_field_of_view(
                &mut self.level,
                &self.templates,
                hero.position,
                range,
                &mut pass,
            );
            fields.push((hero.guid(), lit));
        }

        for (tile, previous) in self.level.tiles_mut().iter_mut().zip(before) {
            if tile.state != previous {
                tile.touch(turn);
            }
        }

        for actor in self.level.mobs.iter_mut().chain(self.heroes.iter_mut()) {
            let mut on_vision = BTreeMap::new();
            for (observer, lit) in &fields {
                if *observer == actor.guid() {
                    continue;
                }
                let seen = lit.contains(&actor.position);
                if seen {
                    actor.spot();
                }
                on_vision.insert(*observer, seen);
            }
            if on_vision != actor.on_vision {
                actor.on_vision = on_vision;
                actor.touch(turn);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;

    fn highlighted(level: &Level) -> BTreeSet<Coord> {
        level
            .tiles()
            .iter()
            .filter(|t| t.state == TileState::Highlighted)
            .map(|t| t.coord())
            .collect()
    }

    fn cast(rows: &[&str], origin: Coord) -> Level {
        let engine = open_engine(rows);
        let mut level = engine.level().clone();
        cast_field_of_view(
            &mut level,
            engine.templates(),
            origin,
            DEFAULT_RANGE_SOV,
            &mut VisionPass::default(),
        );
        level
    }

    fn grid(wall: Option<Coord>) -> Vec<String> {
        let mut rows = vec![".".repeat(11); 11];
        if let Some(at) = wall {
            let x = at.x as usize;
            rows[at.y as usize].replace_range(x..x + 1, "#");
        }
        rows
    }

    fn every_tile() -> BTreeSet<Coord> {
        (0..11)
            .flat_map(|y| (0..11).map(move |x| Coord::new(x, y)))
            .collect()
    }

    #[test]
    fn open_grid_lights_every_tile() {
        let rows = grid(None);
        let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
        let lit = highlighted(&cast(&rows, Coord::new(5, 5)));
        assert_eq!(lit, every_tile());
        assert_eq!(highlighted(&cast(&rows, Coord::new(5, 5))), lit);
    }

    #[test]
    fn wall_truncates_only_its_rays() {
        let rows = grid(Some(Coord::new(6, 5)));
        let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
        let lit = highlighted(&cast(&rows, Coord::new(5, 5)));

        let shadow: BTreeSet<Coord> = [
            (7, 5),
            (8, 4),
            (8, 5),
            (8, 6),
            (9, 3),
            (9, 4),
            (9, 5),
            (9, 6),
            (9, 7),
            (10, 3),
            (10, 4),
            (10, 5),
            (10, 6),
            (10, 7),
        ]
        .into_iter()
        .map(|(x, y)| Coord::new(x, y))
        .collect();
        let expected: BTreeSet<Coord> = every_tile().difference(&shadow).copied().collect();
        assert_eq!(lit, expected);
        assert!(lit.contains(&Coord::new(6, 5)), "the wall itself is seen");
    }

    #[test]
    fn shared_pass_does_not_leak_through_walls() {
        let rows = grid(Some(Coord::new(5, 5)));
        let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
        let engine = open_engine(&rows);
        let templates = engine.templates();
        let (west, east) = (Coord::new(2, 5), Coord::new(8, 5));

        let mut level = engine.level().clone();
        let mut pass = VisionPass::default();
        let from_west = cast_field_of_view(&mut level, templates, west, DEFAULT_RANGE_SOV, &mut pass);
        assert!(pass.visited(Coord::new(7, 4)));
        assert!(!pass.visited(Coord::new(5, 5)), "blocking tiles are never cached");
        let from_east = cast_field_of_view(&mut level, templates, east, DEFAULT_RANGE_SOV, &mut pass);

        let mut alone = engine.level().clone();
        let east_alone = cast_field_of_view(
            &mut alone,
            templates,
            east,
            DEFAULT_RANGE_SOV,
            &mut VisionPass::default(),
        );
        assert_eq!(from_east, east_alone);
        assert!(from_east.intersection(&from_west).count() > 100);
        for x in 0..=4 {
            assert!(!from_east.contains(&Coord::new(x, 5)), "({x}, 5) is behind the wall");
        }
        assert_eq!(highlighted(&level), every_tile());
    }

    #[test]
    fn corridor_stops_at_wall() {
        let level = cast(&["...#......."], Coord::new(0, 0));
        for x in 0..=3 {
            assert_eq!(level.tile(Coord::new(x, 0)).unwrap().state, TileState::Highlighted);
        }
        for x in 4..=10 {
            assert_eq!(level.tile(Coord::new(x, 0)).unwrap().state, TileState::NotDiscovered);
        }
    }

    #[test]
    fn highlighted_degrades_to_fog() {
        let mut level = cast(&["...#......."], Coord::new(0, 0));
        degrade_highlighted(&mut level);
        assert_eq!(level.tile(Coord::new(1, 0)).unwrap().state, TileState::FogOfWar);
        assert_eq!(level.tile(Coord::new(5, 0)).unwrap().state, TileState::NotDiscovered);
    }

    #[test]
    fn refresh_spots_mobs_and_remembers() {
        let (mut engine, heroes) = playing_engine(&["h.r", "...", "###", "..."], 1);
        let rat = engine.level().mobs[0].guid();
        let mob = engine.level().mob(rat).unwrap();
        assert!(mob.char_spotted());
        assert!(mob.is_visible_to(heroes[0]));

        // Behind the wall row the rat is out of sight but stays spotted.
        engine.heroes[0].position = Coord::new(0, 3);
        engine.refresh_vision();
        let mob = engine.level().mob(rat).unwrap();
        assert!(mob.char_spotted());
        assert!(!mob.is_visible_to(heroes[0]));
        assert_eq!(
            engine.level().tile(Coord::new(1, 0)).unwrap().state,
            TileState::FogOfWar
        );
    }
}
