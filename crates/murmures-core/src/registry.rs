//! Read-only template registry: physical bodies and skills.
//!
//! Loaded once at startup from JSON or YAML and shared (behind an `Arc`) by
//! the authoritative engine and every client mirror.

use std::collections::BTreeMap;
use std::path::Path;

use murmures_protocol::{SkillId, TargetAudience, TemplateId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Layer id of hero bodies.
pub const HERO_LAYER: &str = "56";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("body {body} references unknown skill {skill}")]
    MissingSkill { body: TemplateId, skill: SkillId },
    #[error("unsupported registry format: {0}")]
    UnsupportedFormat(String),
}

/// Physical body template.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    #[serde(default)]
    pub hit_points_max: Option<i32>,
    pub layer_id: String,
    /// Blocks movement.
    #[serde(default)]
    pub has_physics: bool,
    /// Lets projectiles and light through even when `has_physics` is set.
    #[serde(default)]
    pub allow_flying: bool,
    #[serde(default)]
    pub tileset_coord: [u32; 2],
    #[serde(default)]
    pub range: Option<i32>,
    #[serde(default)]
    pub default_damage: Option<i32>,
    #[serde(default)]
    pub skills: Vec<SkillId>,
}

impl Body {
    pub fn is_hero(&self) -> bool {
        self.layer_id == HERO_LAYER
    }

    pub fn lets_light_through(&self) -> bool {
        !self.has_physics || self.allow_flying
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    #[serde(default = "default_skill_range")]
    pub range: i32,
    #[serde(default)]
    pub target_audience: TargetAudience,
    pub damage: i32,
}

fn default_skill_range() -> i32 {
    1
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Templates {
    #[serde(default)]
    pub bodies: BTreeMap<TemplateId, Body>,
    #[serde(default)]
    pub skills: BTreeMap<SkillId, Skill>,
}

impl Templates {
    pub fn body(&self, id: &str) -> Option<&Body> {
        self.bodies.get(id)
    }

    pub fn skill(&self, id: &str) -> Option<&Skill> {
        self.skills.get(id)
    }

    /// Light test for an optional layer: empty or unknown layers never block.
    pub fn lets_light_through(&self, layer: Option<&str>) -> bool {
        layer
            .and_then(|id| self.body(id))
            .map_or(true, Body::lets_light_through)
    }

    /// Movement test for the ground layer.
    pub fn blocks_movement(&self, ground: Option<&str>) -> bool {
        ground
            .and_then(|id| self.body(id))
            .is_some_and(|body| body.has_physics)
    }

    fn check_references(&self) -> Result<(), RegistryError> {
        for (id, body) in &self.bodies {
            if let Some(skill) = body.skills.iter().find(|s| !self.skills.contains_key(*s)) {
                return Err(RegistryError::MissingSkill {
                    body: id.clone(),
                    skill: skill.clone(),
                });
            }
        }
        Ok(())
    }
}

pub enum TemplateSource<'a> {
    Path(&'a Path),
    Json(&'a str),
    Yaml(&'a str),
}

pub fn load_templates(source: TemplateSource<'_>) -> Result<Templates, RegistryError> {
    let templates: Templates = match source {
        TemplateSource::Json(text) => serde_json::from_str(text)?,
        TemplateSource::Yaml(text) => serde_yaml::from_str(text)?,
        TemplateSource::Path(path) => {
            let text = std::fs::read_to_string(path)?;
            match path.extension().and_then(|e| e.to_str()) {
                Some("json") => serde_json::from_str(&text)?,
                Some("yaml") | Some("yml") => serde_yaml::from_str(&text)?,
                other => {
                    return Err(RegistryError::UnsupportedFormat(
                        other.unwrap_or_default().to_string(),
                    ))
                }
            }
        }
    };
    templates.check_references()?;
    Ok(templates)
}
