//! # Engine Configuration
//!
//! Tunables for the streaming policy and the terrain generator. Every field has a
//! default, so a configuration file only needs to name the values it overrides:
//!
//! ```json
//! { "streaming": { "render_distance": 6, "max_generated": 64 } }
//! ```

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Default render distance, in chunks.
pub const DEFAULT_RENDER_DISTANCE: i32 = 10;
/// Default per-frame budget for every rate-limited stage.
pub const DEFAULT_FRAME_BUDGET: usize = 128;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Chunk streaming and eviction settings.
    pub streaming: StreamingConfig,
    /// Procedural terrain settings.
    pub terrain: TerrainConfig,
}

/// Per-frame budgets and distances used by the chunk manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Radius in chunks within which chunks are meshed and rendered.
    pub render_distance: i32,
    /// Chunk creations plus mesh dispatches allowed per update.
    pub max_generated: usize,
    /// Mesh uploads allowed per update.
    pub max_loaded: usize,
    /// Chunk deletions allowed per update.
    pub max_deleted: usize,
    /// Extra chunks past the render distance (box distance) kept before eviction.
    pub unload_margin: i32,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            render_distance: DEFAULT_RENDER_DISTANCE,
            max_generated: DEFAULT_FRAME_BUDGET,
            max_loaded: DEFAULT_FRAME_BUDGET,
            max_deleted: DEFAULT_FRAME_BUDGET,
            unload_margin: 2,
        }
    }
}

/// Parameters of the height-map terrain generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Noise seed.
    pub seed: u32,
    /// Height reached by the tallest mountains.
    pub max_height: i32,
    /// Base level above which the ground turns to stone.
    pub grass_level: i32,
    /// Sea level; air at or below it becomes water.
    pub water_level: i32,
    /// Number of (x, z) columns memoized between cache clears.
    pub cache_capacity: usize,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            max_height: 200,
            grass_level: 65,
            water_level: 35,
            cache_capacity: 65_536,
        }
    }
}

impl EngineConfig {
    /// Parses a configuration from a JSON string and validates it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Rejects values the engine cannot make progress with.
    ///
    /// # Returns
    /// `Err(EngineError::InvalidConfig)` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let streaming = &self.streaming;
        if streaming.render_distance < 0 {
            return Err(EngineError::InvalidConfig(format!(
                "streaming.render_distance must be non-negative, got {}",
                streaming.render_distance
            )));
        }
        if streaming.unload_margin < 0 {
            return Err(EngineError::InvalidConfig(format!(
                "streaming.unload_margin must be non-negative, got {}",
                streaming.unload_margin
            )));
        }
        for (name, budget) in [
            ("max_generated", streaming.max_generated),
            ("max_loaded", streaming.max_loaded),
            ("max_deleted", streaming.max_deleted),
        ] {
            if budget == 0 {
                return Err(EngineError::InvalidConfig(format!(
                    "streaming.{name} must be at least 1"
                )));
            }
        }
        if self.terrain.cache_capacity == 0 {
            return Err(EngineError::InvalidConfig(
                "terrain.cache_capacity must be at least 1".to_string(),
            ));
        }
        if self.terrain.max_height <= 0 {
            return Err(EngineError::InvalidConfig(format!(
                "terrain.max_height must be positive, got {}",
                self.terrain.max_height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.streaming.render_distance, 10);
        assert_eq!(config.streaming.unload_margin, 2);
        assert_eq!(config.terrain.water_level, 35);
    }

    #[test]
    fn partial_document_overrides_only_named_fields() {
        let config = EngineConfig::from_json_str(
            r#"{ "streaming": { "render_distance": 4 }, "terrain": { "seed": 7 } }"#,
        )
        .unwrap();
        assert_eq!(config.streaming.render_distance, 4);
        assert_eq!(config.streaming.max_generated, DEFAULT_FRAME_BUDGET);
        assert_eq!(config.terrain.seed, 7);
        assert_eq!(config.terrain.max_height, 200);
    }

    #[test]
    fn zero_budget_is_rejected() {
        let err = EngineConfig::from_json_str(r#"{ "streaming": { "max_loaded": 0 } }"#)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(ref msg) if msg.contains("max_loaded")));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = EngineConfig::from_json_str("{ streaming: ").unwrap_err();
        assert!(matches!(err, EngineError::Parse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = EngineConfig::from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, EngineError::Io(_)));
    }
}
