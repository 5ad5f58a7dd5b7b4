//! Levels: the tile grid, its mobs, and the hero starting points.

use std::collections::BTreeMap;
use std::path::Path;

use murmures_protocol::{Coord, Guid, LevelSnapshot, Layout, TemplateId, TileSnapshot, TileState};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Actor, EngineConfig, GuidAllocator, Templates};

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported level format: {0}")]
    UnsupportedFormat(String),
    #[error("level {level}: expected {expected} rows, found {found}")]
    RowCount {
        level: String,
        expected: u32,
        found: usize,
    },
    #[error("level {level}: row {row} has {found} tiles, expected {expected}")]
    RowWidth {
        level: String,
        row: usize,
        expected: u32,
        found: usize,
    },
    #[error("level {level}: tile {at} references unknown body {body}")]
    UnknownBody {
        level: String,
        at: Coord,
        body: TemplateId,
    },
}

/// What happens when a hero steps onto a tile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TileBehavior {
    Trap { damage: i32 },
    Stairs { level: String },
}

/// Authored tile: only the non-empty layers are listed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TileDefinition {
    pub ground_id: Option<TemplateId>,
    pub prop_id: Option<TemplateId>,
    pub char_id: Option<TemplateId>,
    pub ground_deco: Option<TemplateId>,
    pub behavior: Option<TileBehavior>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelDefinition {
    pub id: String,
    #[serde(default)]
    pub layout: Layout,
    pub width: u32,
    pub height: u32,
    /// `tiles[y][x]`.
    pub tiles: Vec<Vec<TileDefinition>>,
}

pub enum LevelSource<'a> {
    Path(&'a Path),
    Json(&'a str),
    Yaml(&'a str),
}

pub fn load_level(source: LevelSource<'_>) -> Result<LevelDefinition, LevelError> {
    Ok(match source {
        LevelSource::Json(text) => serde_json::from_str(text)?,
        LevelSource::Yaml(text) => serde_yaml::from_str(text)?,
        LevelSource::Path(path) => {
            let text = std::fs::read_to_string(path)?;
            match path.extension().and_then(|e| e.to_str()) {
                Some("json") => serde_json::from_str(&text)?,
                Some("yaml") | Some("yml") => serde_yaml::from_str(&text)?,
                other => {
                    return Err(LevelError::UnsupportedFormat(
                        other.unwrap_or_default().to_string(),
                    ))
                }
            }
        }
    })
}

/// Level definitions by id, consulted when stairs change the active level.
#[derive(Clone, Debug, Default)]
pub struct LevelCatalog {
    levels: BTreeMap<String, LevelDefinition>,
}

impl LevelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, definition: LevelDefinition) -> Option<LevelDefinition> {
        self.levels.insert(definition.id.clone(), definition)
    }

    pub fn get(&self, id: &str) -> Option<&LevelDefinition> {
        self.levels.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.levels.contains_key(id)
    }
}

impl FromIterator<LevelDefinition> for LevelCatalog {
    fn from_iter<I: IntoIterator<Item = LevelDefinition>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for definition in iter {
            catalog.insert(definition);
        }
        catalog
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    x: i32,
    y: i32,
    pub state: TileState,
    pub ground_id: Option<TemplateId>,
    pub prop_id: Option<TemplateId>,
    pub char_id: Option<TemplateId>,
    pub ground_deco: Option<TemplateId>,
    pub behavior: Option<TileBehavior>,
    pub to_update: bool,
    pub updated_turn: u32,
}

impl Tile {
    fn from_definition(at: Coord, definition: &TileDefinition) -> Self {
        Self {
            x: at.x,
            y: at.y,
            state: TileState::NotDiscovered,
            ground_id: definition.ground_id.clone(),
            prop_id: definition.prop_id.clone(),
            char_id: definition.char_id.clone(),
            ground_deco: definition.ground_deco.clone(),
            behavior: definition.behavior.clone(),
            to_update: true,
            updated_turn: 0,
        }
    }

    fn from_snapshot(snapshot: &TileSnapshot) -> Self {
        Self {
            x: snapshot.x,
            y: snapshot.y,
            state: snapshot.state,
            ground_id: snapshot.ground_id.clone(),
            prop_id: snapshot.prop_id.clone(),
            char_id: snapshot.char_id.clone(),
            ground_deco: snapshot.ground_deco.clone(),
            behavior: None,
            to_update: false,
            updated_turn: 0,
        }
    }

    pub fn snapshot(&self) -> TileSnapshot {
        TileSnapshot {
            x: self.x,
            y: self.y,
            state: self.state,
            ground_id: self.ground_id.clone(),
            prop_id: self.prop_id.clone(),
            char_id: self.char_id.clone(),
            ground_deco: self.ground_deco.clone(),
        }
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn coord(&self) -> Coord {
        Coord::new(self.x, self.y)
    }

    pub fn set_ground_deco(&mut self, deco: impl Into<TemplateId>, turn: u32) {
        self.ground_deco = Some(deco.into());
        self.touch(turn);
    }

    pub(crate) fn touch(&mut self, turn: u32) {
        self.to_update = true;
        self.updated_turn = turn;
    }
}

/// Tiles and actors flagged for redraw since the last `clear_update_flags`.
#[derive(Debug, Default)]
pub struct MinimalUpdate<'a> {
    pub tiles: Vec<&'a Tile>,
    pub actors: Vec<&'a Actor>,
}

impl MinimalUpdate<'_> {
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty() && self.actors.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Level {
    guid: Guid,
    id: String,
    layout: Layout,
    width: u32,
    height: u32,
    /// Row-major.
    tiles: Vec<Tile>,
    pub mobs: Vec<Actor>,
    starting_points: Vec<Coord>,
}

impl Level {
    /// Builds a playable level, spawning a mob on every tile whose character
    /// layer is a non-hero body. Hero bodies mark starting points instead.
    pub fn build(
        definition: &LevelDefinition,
        templates: &Templates,
        config: &EngineConfig,
        guids: &mut GuidAllocator,
    ) -> Result<Self, LevelError> {
        if definition.tiles.len() != definition.height as usize {
            return Err(LevelError::RowCount {
                level: definition.id.clone(),
                expected: definition.height,
                found: definition.tiles.len(),
            });
        }

        let guid = guids.allocate();
        let mut tiles = Vec::with_capacity(definition.width as usize * definition.height as usize);
        let mut mobs = Vec::new();
        let mut starting_points = Vec::new();

        for (y, row) in definition.tiles.iter().enumerate() {
            if row.len() != definition.width as usize {
                return Err(LevelError::RowWidth {
                    level: definition.id.clone(),
                    row: y,
                    expected: definition.width,
                    found: row.len(),
                });
            }
            for (x, tile_def) in row.iter().enumerate() {
                let at = Coord::new(x as i32, y as i32);
                let layers = [
                    &tile_def.ground_id,
                    &tile_def.prop_id,
                    &tile_def.char_id,
                    &tile_def.ground_deco,
                ];
                for body in layers.into_iter().flatten() {
                    if templates.body(body).is_none() {
                        return Err(LevelError::UnknownBody {
                            level: definition.id.clone(),
                            at,
                            body: body.clone(),
                        });
                    }
                }

                if let Some((char_id, body)) = tile_def
                    .char_id
                    .as_ref()
                    .and_then(|id| templates.body(id).map(|body| (id, body)))
                {
                    if body.is_hero() {
                        starting_points.push(at);
                    } else {
                        mobs.push(Actor::from_body(guids.allocate(), char_id, body, at, config));
                    }
                }
                tiles.push(Tile::from_definition(at, tile_def));
            }
        }

        tracing::debug!(
            level = %definition.id,
            mobs = mobs.len(),
            starting_points = starting_points.len(),
            "level built"
        );

        Ok(Self {
            guid,
            id: definition.id.clone(),
            layout: definition.layout,
            width: definition.width,
            height: definition.height,
            tiles,
            mobs,
            starting_points,
        })
    }

    /// Mirror-side level. Behaviors and starting points are server-only.
    pub fn from_snapshot(
        snapshot: &LevelSnapshot,
        templates: &Templates,
        config: &EngineConfig,
    ) -> Self {
        Self {
            guid: snapshot.guid,
            id: snapshot.id.clone(),
            layout: snapshot.layout,
            width: snapshot.width,
            height: snapshot.height,
            tiles: snapshot.tiles.iter().map(Tile::from_snapshot).collect(),
            mobs: snapshot
                .mobs
                .iter()
                .map(|mob| Actor::from_snapshot(mob, templates.body(&mob.template_id), config))
                .collect(),
            starting_points: Vec::new(),
        }
    }

    pub fn snapshot(&self) -> LevelSnapshot {
        LevelSnapshot {
            guid: self.guid,
            id: self.id.clone(),
            layout: self.layout,
            width: self.width,
            height: self.height,
            tiles: self.tiles.iter().map(Tile::snapshot).collect(),
            mobs: self.mobs.iter().map(Actor::snapshot).collect(),
        }
    }

    /// Identity of this build; differs between two builds of one definition.
    pub fn guid(&self) -> Guid {
        self.guid
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn starting_points(&self) -> &[Coord] {
        &self.starting_points
    }

    pub fn contains(&self, at: Coord) -> bool {
        at.x >= 0 && at.y >= 0 && at.x < self.width as i32 && at.y < self.height as i32
    }

    fn index(&self, at: Coord) -> Option<usize> {
        self.contains(at)
            .then(|| at.y as usize * self.width as usize + at.x as usize)
    }

    pub fn tile(&self, at: Coord) -> Option<&Tile> {
        self.index(at).and_then(|i| self.tiles.get(i))
    }

    pub fn tile_mut(&mut self, at: Coord) -> Option<&mut Tile> {
        self.index(at).and_then(move |i| self.tiles.get_mut(i))
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub(crate) fn tiles_mut(&mut self) -> &mut [Tile] {
        &mut self.tiles
    }

    pub fn is_wall(&self, at: Coord, templates: &Templates) -> bool {
        self.tile(at)
            .is_some_and(|tile| templates.blocks_movement(tile.ground_id.as_deref()))
    }

    pub fn mob(&self, guid: Guid) -> Option<&Actor> {
        self.mobs.iter().find(|m| m.guid() == guid)
    }

    pub fn living_mob_at(&self, at: Coord) -> Option<&Actor> {
        self.mobs.iter().find(|m| m.position == at && m.is_alive())
    }

    pub fn minimal_update(&self) -> MinimalUpdate<'_> {
        MinimalUpdate {
            tiles: self.tiles.iter().filter(|t| t.to_update).collect(),
            actors: self.mobs.iter().filter(|m| m.to_update).collect(),
        }
    }

    pub fn clear_update_flags(&mut self) {
        for tile in &mut self.tiles {
            tile.to_update = false;
        }
        for mob in &mut self.mobs {
            mob.to_update = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{load_templates, TemplateSource};

    const TEMPLATES: &str = r#"{
        "bodies": {
            "floor": { "layerId": "01" },
            "wall": { "layerId": "06", "hasPhysics": true },
            "hero": { "layerId": "56" },
            "rat": { "layerId": "32", "hitPointsMax": 4 }
        }
    }"#;

    const LEVEL: &str = r#"
id: cellar
width: 3
height: 2
tiles:
  - - { groundId: floor, charId: hero }
    - { groundId: wall }
    - { groundId: floor, behavior: { kind: trap, damage: 3 } }
  - - { groundId: floor }
    - { groundId: floor, charId: rat }
    - { groundId: floor, behavior: { kind: stairs, level: attic } }
"#;

    fn build() -> Level {
        let templates = load_templates(TemplateSource::Json(TEMPLATES)).unwrap();
        let definition = load_level(LevelSource::Yaml(LEVEL)).unwrap();
        Level::build(
            &definition,
            &templates,
            &EngineConfig::default(),
            &mut GuidAllocator::default(),
        )
        .unwrap()
    }

    #[test]
    fn builds_mobs_and_starting_points() {
        let level = build();
        assert_eq!(level.starting_points(), &[Coord::new(0, 0)]);
        assert_eq!(level.mobs.len(), 1);
        assert_eq!(level.mobs[0].position, Coord::new(1, 1));
        assert_eq!(level.mobs[0].hit_points(), 4);
        assert_eq!(
            level.tile(Coord::new(2, 0)).unwrap().behavior,
            Some(TileBehavior::Trap { damage: 3 })
        );
    }

    #[test]
    fn walls_and_bounds() {
        let templates = load_templates(TemplateSource::Json(TEMPLATES)).unwrap();
        let level = build();
        assert!(level.is_wall(Coord::new(1, 0), &templates));
        assert!(!level.is_wall(Coord::new(0, 0), &templates));
        assert!(level.tile(Coord::new(3, 0)).is_none());
        assert!(level.tile(Coord::new(0, -1)).is_none());
        assert_eq!(level.tile(Coord::new(2, 1)).unwrap().coord(), Coord::new(2, 1));
    }

    #[test]
    fn rejects_ragged_rows_and_unknown_bodies() {
        let templates = load_templates(TemplateSource::Json(TEMPLATES)).unwrap();
        let mut definition = load_level(LevelSource::Yaml(LEVEL)).unwrap();
        definition.tiles[1].pop();
        let err = Level::build(&definition, &templates, &EngineConfig::default(), &mut GuidAllocator::default())
            .unwrap_err();
        assert!(matches!(err, LevelError::RowWidth { row: 1, .. }));

        let mut definition = load_level(LevelSource::Yaml(LEVEL)).unwrap();
        definition.tiles[0][0].prop_id = Some("chest".into());
        let err = Level::build(&definition, &templates, &EngineConfig::default(), &mut GuidAllocator::default())
            .unwrap_err();
        assert!(matches!(err, LevelError::UnknownBody { .. }));
    }

    #[test]
    fn minimal_update_tracks_flags() {
        let mut level = build();
        assert_eq!(level.minimal_update().tiles.len(), 6);
        level.clear_update_flags();
        assert!(level.minimal_update().is_empty());
        level
            .tile_mut(Coord::new(1, 1))
            .unwrap()
            .set_ground_deco("floor", 4);
        let update = level.minimal_update();
        assert_eq!(update.tiles.len(), 1);
        assert_eq!(update.tiles[0].updated_turn, 4);
    }

    #[test]
    fn snapshot_roundtrip_preserves_layers() {
        let templates = load_templates(TemplateSource::Json(TEMPLATES)).unwrap();
        let level = build();
        let snapshot = level.snapshot();
        let mirror = Level::from_snapshot(&snapshot, &templates, &EngineConfig::default());
        assert_eq!(mirror.snapshot(), snapshot);
    }
}
