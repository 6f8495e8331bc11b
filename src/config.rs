/*
 * Configuration Module
 *
 * The complete description of a simulation before it starts: bounds, global
 * parameters and one FlockConfig per flock. It can be built in code or
 * loaded from a JSON file, where every missing field takes its default.
 */

use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::bounds::Bounds;
use crate::error::{ConfigSource, FlockError, Result};
use crate::params::{FlockConfig, SimulationParams};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub bounds: Bounds,
    pub params: SimulationParams,
    pub flocks: Vec<FlockConfig>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            bounds: Bounds::default(),
            params: SimulationParams::default(),
            flocks: vec![FlockConfig::default()],
        }
    }
}

impl SimulationConfig {
    pub fn from_json_str(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let wrap = |source: ConfigSource| FlockError::Config {
            path: path.to_path_buf(),
            source,
        };

        let text = fs::read_to_string(path).map_err(|err| wrap(err.into()))?;
        let config = Self::from_json_str(&text).map_err(|err| wrap(err.into()))?;
        config.validate()?;

        debug!(
            "loaded configuration from {} with {} flock(s)",
            path.display(),
            config.flocks.len()
        );
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<()> {
        self.bounds.validate()?;
        self.params.validate()?;
        if self.flocks.is_empty() {
            return Err(FlockError::invalid("at least one flock must be configured"));
        }
        for flock in &self.flocks {
            flock.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::BoundsMode;
    use crate::params::NeighborStrategy;
    use glam::Vec2;

    #[test]
    fn parses_partial_json() {
        let json = r#"{
            "bounds": { "min": [-20.0, -10.0], "max": [20.0, 10.0] },
            "params": { "batch_size": 64, "neighbor_strategy": "grid", "bounds_mode": "wrap" },
            "flocks": [
                { "name": "swifts", "visibility": 8.0 },
                { "name": "gulls", "use_separation_rule": false }
            ]
        }"#;
        let config = SimulationConfig::from_json_str(json).unwrap();
        config.validate().unwrap();

        assert_eq!(config.bounds.min, Vec2::new(-20.0, -10.0));
        assert_eq!(config.params.batch_size, 64);
        assert_eq!(config.params.neighbor_strategy, NeighborStrategy::Grid);
        assert_eq!(config.params.bounds_mode, BoundsMode::Wrap);
        assert_eq!(config.params.boid_increment, 100);
        assert_eq!(config.flocks.len(), 2);
        assert!(!config.flocks[1].use_separation_rule);
    }

    #[test]
    fn json_round_trip_preserves_config() {
        let config = SimulationConfig::default();
        let json = config.to_json_pretty().unwrap();
        assert_eq!(SimulationConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn empty_flock_list_is_invalid() {
        let config = SimulationConfig {
            flocks: Vec::new(),
            ..SimulationConfig::default()
        };
        assert!(matches!(config.validate(), Err(FlockError::InvalidConfiguration(_))));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = SimulationConfig::load("/definitely/not/here.json").unwrap_err();
        match err {
            FlockError::Config { path, source: ConfigSource::Io(_) } => {
                assert!(path.ends_with("here.json"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
