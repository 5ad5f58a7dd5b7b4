//! Server configuration

use std::path::{Path, PathBuf};
use std::sync::Arc;

use murmures_core::{
    load_level, load_templates, EngineConfig, LevelCatalog, LevelError, LevelSource,
    RegistryError, TemplateSource, Templates,
};
use murmures_protocol::TemplateId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error("start level {0} is not among the loaded levels")]
    UnknownStartLevel(String),
    #[error("min_heroes ({min}) must be between 1 and max_heroes ({max})")]
    HeroLimits { min: usize, max: usize },
    #[error("hero template {0} is not a hero body in the registry")]
    UnknownHeroTemplate(TemplateId),
}

/// Server configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerConfig {
    /// Body and skill registry (JSON or YAML)
    pub registry: PathBuf,
    /// Level definitions making up the catalog
    pub levels: Vec<PathBuf>,
    /// Level the match starts on
    pub start_level: String,
    /// Heroes needed before the first turn opens
    pub min_heroes: usize,
    /// Heroes allowed in one match
    pub max_heroes: usize,
    /// Bodies players may join as; empty admits every hero body
    pub hero_templates: Vec<TemplateId>,
    /// Rules knobs forwarded to the engine
    pub engine: EngineConfig,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            registry: PathBuf::from("data/registry.yaml"),
            levels: vec![
                PathBuf::from("data/levels/crypt.yaml"),
                PathBuf::from("data/levels/attic.yaml"),
            ],
            start_level: "crypt".to_string(),
            min_heroes: 1,
            max_heroes: 4,
            hero_templates: Vec::new(),
            engine: EngineConfig::default(),
            log_filter: "murmures_server=info,murmures_core=info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Reads a config file, picking the format from its extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.check()?;
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.check()?;
        Ok(config)
    }

    pub fn check(&self) -> Result<(), ConfigError> {
        if self.min_heroes == 0 || self.min_heroes > self.max_heroes {
            return Err(ConfigError::HeroLimits {
                min: self.min_heroes,
                max: self.max_heroes,
            });
        }
        Ok(())
    }

    pub fn load_templates(&self) -> Result<Arc<Templates>, ConfigError> {
        let templates = load_templates(TemplateSource::Path(&self.registry))?;
        if let Some(id) = self
            .hero_templates
            .iter()
            .find(|id| !templates.body(id).is_some_and(|body| body.is_hero()))
        {
            return Err(ConfigError::UnknownHeroTemplate(id.clone()));
        }
        Ok(Arc::new(templates))
    }

    pub fn load_catalog(&self) -> Result<LevelCatalog, ConfigError> {
        let catalog = self
            .levels
            .iter()
            .map(|path| load_level(LevelSource::Path(path)))
            .collect::<Result<LevelCatalog, LevelError>>()?;
        if !catalog.contains(&self.start_level) {
            return Err(ConfigError::UnknownStartLevel(self.start_level.clone()));
        }
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_overrides_keep_defaults() {
        let config = ServerConfig::from_yaml_str(
            "startLevel: attic\nmaxHeroes: 2\nengine:\n  visionRange: 6\n",
        )
        .unwrap();
        assert_eq!(config.start_level, "attic");
        assert_eq!(config.max_heroes, 2);
        assert_eq!(config.min_heroes, 1);
        assert_eq!(config.engine.vision_range, 6);
        assert_eq!(config.engine.tile_size, 32);
    }

    #[test]
    fn rejects_bad_hero_limits() {
        let err = ServerConfig::from_json_str(r#"{"minHeroes": 3, "maxHeroes": 2}"#).unwrap_err();
        assert!(matches!(err, ConfigError::HeroLimits { min: 3, max: 2 }));
    }

    #[test]
    fn hero_templates_must_be_hero_bodies() {
        let dir = tempfile::tempdir().unwrap();
        let registry = dir.path().join("registry.yaml");
        std::fs::write(
            &registry,
            "bodies:\n  knight: { layerId: \"56\" }\n  rat: { layerId: \"32\" }\n",
        )
        .unwrap();
        let mut config = ServerConfig {
            registry,
            hero_templates: vec!["knight".into()],
            ..ServerConfig::default()
        };
        assert!(config.load_templates().is_ok());

        config.hero_templates.push("rat".into());
        assert!(matches!(
            config.load_templates(),
            Err(ConfigError::UnknownHeroTemplate(id)) if id == "rat"
        ));
    }

    #[test]
    fn load_picks_format_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("server.json");
        std::fs::write(&json, r#"{"startLevel": "vault"}"#).unwrap();
        assert_eq!(ServerConfig::load(&json).unwrap().start_level, "vault");

        let toml = dir.path().join("server.toml");
        std::fs::write(&toml, "startLevel = 'vault'").unwrap();
        assert!(matches!(
            ServerConfig::load(&toml),
            Err(ConfigError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            ServerConfig::load(&dir.path().join("missing.yaml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
