use serde::{Deserialize, Serialize};

/// Rules knobs shared by the authoritative engine and client mirrors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Pixel size of a tile, forwarded to clients for rendering.
    pub tile_size: u32,
    /// Ray length for every hero's field of view.
    pub vision_range: u32,
    pub hero_hit_points: i32,
    pub mob_hit_points: i32,
    /// Attack range for bodies that do not declare one.
    pub default_range: i32,
    pub default_damage: i32,
    /// Ground decoration painted under an actor when it dies.
    pub death_decoration: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tile_size: 32,
            vision_range: 10,
            hero_hit_points: 20,
            mob_hit_points: 10,
            default_range: 1,
            default_damage: 1,
            death_decoration: "_b1_02_blood_red00".to_string(),
        }
    }
}
