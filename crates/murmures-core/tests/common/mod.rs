#![allow(dead_code)]

use std::sync::Arc;

use murmures_core::{
    load_level, load_templates, Engine, EngineConfig, LevelCatalog, LevelSource, TemplateSource,
    Templates,
};
use murmures_protocol::Guid;

pub const TEMPLATES_YAML: &str = r#"
bodies:
  floor: { layerId: "01" }
  wall: { layerId: "06", hasPhysics: true }
  knight: { layerId: "56", skills: [sword, bow] }
  rat: { layerId: "32", range: 1, defaultDamage: 2 }
skills:
  sword: { range: 1, targetAudience: all, damage: 6 }
  bow: { range: 3, targetAudience: mob, damage: 4 }
"#;

pub fn templates() -> Arc<Templates> {
    Arc::new(load_templates(TemplateSource::Yaml(TEMPLATES_YAML)).unwrap())
}

/// `.` floor, `#` wall, `h` hero start, `r` rat.
pub fn level_yaml(id: &str, rows: &[&str]) -> String {
    let mut yaml = format!(
        "id: {id}\nwidth: {}\nheight: {}\ntiles:\n",
        rows[0].len(),
        rows.len()
    );
    for row in rows {
        yaml.push_str("  -\n");
        for c in row.chars() {
            let tile = match c {
                '#' => "{ groundId: wall }",
                'h' => "{ groundId: floor, charId: knight }",
                'r' => "{ groundId: floor, charId: rat }",
                _ => "{ groundId: floor }",
            };
            yaml.push_str(&format!("    - {tile}\n"));
        }
    }
    yaml
}

pub fn engine(rows: &[&str]) -> Engine {
    let definition = load_level(LevelSource::Yaml(&level_yaml("crypt", rows))).unwrap();
    let catalog: LevelCatalog = std::iter::once(definition).collect();
    Engine::new(templates(), catalog, "crypt", EngineConfig::default()).unwrap()
}

pub fn started(rows: &[&str], heroes: usize) -> (Engine, Vec<Guid>) {
    let mut engine = engine(rows);
    let guids = (0..heroes)
        .map(|_| engine.register_hero("knight").unwrap())
        .collect();
    engine.start().unwrap();
    (engine, guids)
}
