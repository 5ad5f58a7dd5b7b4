//! Tiny ASCII fixtures shared by the unit tests.
//!
//! `.` floor, `#` wall, `h` hero start, `r` rat, `o` ogre, `T` trap (3 dmg),
//! `>` stairs to `attic`, `<` stairs back to `test`.

use std::sync::Arc;

use murmures_protocol::{Guid, Layout};

use crate::{
    load_templates, Engine, EngineConfig, LevelCatalog, LevelDefinition, TemplateSource,
    Templates, TileBehavior, TileDefinition,
};

pub const HERO: &str = "hero";
pub const RAT: &str = "rat";

pub const TEMPLATES_JSON: &str = r#"{
    "bodies": {
        "floor": { "layerId": "01" },
        "wall": { "layerId": "06", "hasPhysics": true },
        "hero": { "layerId": "56", "skills": ["sword", "bow", "mend"] },
        "rat": { "layerId": "32", "range": 1, "defaultDamage": 2 },
        "ogre": { "layerId": "40", "hitPointsMax": 30, "range": 2, "defaultDamage": 25 }
    },
    "skills": {
        "sword": { "range": 1, "targetAudience": "all", "damage": 6 },
        "bow": { "range": 3, "targetAudience": "mob", "damage": 4 },
        "mend": { "range": 2, "targetAudience": "hero", "damage": 1 }
    }
}"#;

pub fn templates() -> Arc<Templates> {
    Arc::new(load_templates(TemplateSource::Json(TEMPLATES_JSON)).unwrap())
}

pub fn level_definition(id: &str, rows: &[&str]) -> LevelDefinition {
    let tiles: Vec<Vec<TileDefinition>> = rows
        .iter()
        .map(|row| row.chars().map(tile_definition).collect())
        .collect();
    LevelDefinition {
        id: id.to_string(),
        layout: Layout::Square,
        width: tiles.first().map_or(0, |r| r.len() as u32),
        height: tiles.len() as u32,
        tiles,
    }
}

fn tile_definition(c: char) -> TileDefinition {
    let mut tile = TileDefinition {
        ground_id: Some("floor".into()),
        ..TileDefinition::default()
    };
    match c {
        '#' => tile.ground_id = Some("wall".into()),
        'h' => tile.char_id = Some(HERO.into()),
        'r' => tile.char_id = Some(RAT.into()),
        'o' => tile.char_id = Some("ogre".into()),
        'T' => tile.behavior = Some(TileBehavior::Trap { damage: 3 }),
        '>' => {
            tile.behavior = Some(TileBehavior::Stairs {
                level: "attic".into(),
            })
        }
        '<' => {
            tile.behavior = Some(TileBehavior::Stairs {
                level: "test".into(),
            })
        }
        _ => {}
    }
    tile
}

/// Engine on level `test` built from `rows`, with `attic` in the catalog.
pub fn open_engine(rows: &[&str]) -> Engine {
    let catalog: LevelCatalog = [
        level_definition("test", rows),
        level_definition("attic", &["...", ".h.", "..r"]),
    ]
    .into_iter()
    .collect();
    Engine::new(templates(), catalog, "test", EngineConfig::default()).unwrap()
}

/// Started engine with `heroes` registered heroes.
pub fn playing_engine(rows: &[&str], heroes: usize) -> (Engine, Vec<Guid>) {
    let mut engine = open_engine(rows);
    let guids = (0..heroes)
        .map(|_| engine.register_hero(HERO).unwrap())
        .collect();
    engine.start().unwrap();
    (engine, guids)
}
