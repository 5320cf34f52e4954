use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    climate::ClimateConfig, logging::LoggingConfig, materials::MaterialTable, rng::RngManager,
    world::World, worldgen::GenerationConfig, worldgen::WorldGenerator,
};

fn default_grid_size() -> usize {
    32
}

fn default_snapshot_interval_ticks() -> u64 {
    24
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read scenario file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid scenario '{name}': {reason}")]
    Validation { name: String, reason: String },
}

/// Which atmosphere passes run after the heat balance each tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtmosphereConfig {
    #[serde(default = "default_true")]
    pub ideal_gas: bool,
    #[serde(default)]
    pub smoothing: bool,
    #[serde(default)]
    pub wind: bool,
    #[serde(default)]
    pub advection: bool,
}

impl Default for AtmosphereConfig {
    fn default() -> Self {
        Self {
            ideal_gas: true,
            smoothing: false,
            wind: false,
            advection: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default = "default_grid_size")]
    pub grid_size: usize,
    #[serde(default)]
    pub ticks: Option<u64>,
    #[serde(default = "default_snapshot_interval_ticks")]
    pub snapshot_interval_ticks: u64,
    /// Starting greenhouse multiplier.
    #[serde(default)]
    pub greenhouse: f64,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub climate: ClimateConfig,
    #[serde(default)]
    pub materials: MaterialTable,
    #[serde(default)]
    pub atmosphere: AtmosphereConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario, ScenarioError> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path).map_err(|source| ScenarioError::Io {
            path: path.clone(),
            source,
        })?;
        let scenario = Scenario::from_yaml(&data).map_err(|source| ScenarioError::Parse {
            path: path.clone(),
            source,
        })?;
        scenario.validate()?;
        Ok(scenario)
    }
}

impl Scenario {
    pub fn from_yaml(data: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(data)
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        let invalid = |reason: String| ScenarioError::Validation {
            name: self.name.clone(),
            reason,
        };
        if self.grid_size < 3 {
            return Err(invalid(format!(
                "grid_size must be at least 3, got {}",
                self.grid_size
            )));
        }
        self.climate
            .hour_angle_step()
            .map_err(|err| invalid(err.to_string()))?;
        self.materials
            .validate()
            .map_err(|err| invalid(err.to_string()))?;
        if self.greenhouse.is_nan() || self.greenhouse < 0.0 {
            return Err(invalid(format!(
                "greenhouse must be non-negative, got {}",
                self.greenhouse
            )));
        }
        let generation = &self.generation;
        if generation.min_elevation_ft > 0 || generation.max_elevation_ft < 0 {
            return Err(invalid(format!(
                "elevation bounds must straddle sea level, got {}..{}",
                generation.min_elevation_ft, generation.max_elevation_ft
            )));
        }
        if generation.elevation_noise_max_ft < 0
            || generation.temperature_noise_max < 0
            || generation.continental_warming_max < 0
        {
            return Err(invalid("noise amplitudes must be non-negative".to_string()));
        }
        Ok(())
    }

    /// Generates the scenario's world from its seed.
    pub fn build_world(&self) -> Result<World> {
        let mut rng = RngManager::new(self.seed);
        let mut world = WorldGenerator::new(self.generation.clone())
            .generate(
                self.grid_size,
                self.climate.clone(),
                self.materials.clone(),
                &mut rng.stream("worldgen"),
            )
            .with_context(|| format!("failed to generate world for '{}'", self.name))?;
        world.adjust_greenhouse(self.greenhouse);
        Ok(world)
    }

    pub fn ticks(&self, override_ticks: Option<u64>) -> u64 {
        override_ticks.or(self.ticks).unwrap_or(48)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_yaml_takes_defaults() {
        let scenario = Scenario::from_yaml("name: bare\nseed: 3\n").unwrap();
        assert_eq!(scenario.grid_size, 32);
        assert_eq!(scenario.snapshot_interval_ticks, 24);
        assert_eq!(scenario.atmosphere, AtmosphereConfig::default());
        assert_eq!(scenario.climate, ClimateConfig::default());
        assert_eq!(scenario.ticks(None), 48);
        assert_eq!(scenario.ticks(Some(5)), 5);
        assert!(scenario.validate().is_ok());
    }

    #[test]
    fn test_partial_sections_merge_with_defaults() {
        let yaml = "name: tweaked\nseed: 1\nclimate:\n  smooth_factor: 0.01\nmaterials:\n  stone:\n    heat_capacity: 0.3\n    density: 170.0\n    albedo: 0.3\n    calc_depth_ft: 1.0\n";
        let scenario = Scenario::from_yaml(yaml).unwrap();
        assert_eq!(scenario.climate.smooth_factor, 0.01);
        assert_eq!(scenario.climate.time_step_hours, 1.0);
        assert_eq!(scenario.materials.stone.roughness, 1.0);
        assert_eq!(scenario.materials.water, MaterialTable::default().water);
    }

    #[test]
    fn test_tiny_grid_is_rejected() {
        let scenario = Scenario::from_yaml("name: tiny\nseed: 1\ngrid_size: 2\n").unwrap();
        assert!(matches!(
            scenario.validate(),
            Err(ScenarioError::Validation { .. })
        ));
    }

    #[test]
    fn test_uneven_time_step_is_rejected() {
        let yaml = "name: odd\nseed: 1\nclimate:\n  time_step_hours: 5.0\n";
        let scenario = Scenario::from_yaml(yaml).unwrap();
        assert!(scenario.validate().is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let loader = ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"));
        assert!(matches!(
            loader.load("scenarios/does_not_exist.yaml"),
            Err(ScenarioError::Io { .. })
        ));
    }
}
