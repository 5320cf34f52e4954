//! Procedural terrain and initial climate: scattered elevation seeds smoothed into
//! continents, a parabolic latitude temperature profile, and ideal-gas pressures.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::climate::{to_rankine, ClimateConfig, FEET_PER_MILE};
use crate::error::SimError;
use crate::materials::MaterialTable;
use crate::tile::SurfaceMaterial;
use crate::world::World;

/// psi ft³ / (lbmol °R)
const UNIVERSAL_GAS_CONSTANT: f64 = 10.731_577_089_016;
/// lbmol of air in one cubic mile.
const AIR_LBMOL_PER_CUBIC_MILE: f64 = (4.168e12 / 24.0) * 0.002_204_62;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub ocean_baseline_ft: i64,
    pub min_elevation_ft: i64,
    pub max_elevation_ft: i64,
    pub total_iterations: usize,
    pub smoothing_iterations: usize,
    /// Seeds scattered per iteration; half the tile count when unset.
    pub seed_count: Option<usize>,
    pub percent_high_elevation: f64,
    /// Noise is added to roughly one tile in this many.
    pub elevation_noise_frequency: u32,
    pub elevation_noise_max_ft: i64,
    pub max_temperature: f64,
    pub min_temperature: f64,
    pub temperature_noise_frequency: u32,
    pub temperature_noise_max: i64,
    pub continental_warming_max: i64,
    pub initial_air_density: f64,
    pub initial_wind_speed: f64,
    pub initial_wind_angle: f64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            ocean_baseline_ft: -12_500,
            min_elevation_ft: -40_000,
            max_elevation_ft: 60_000,
            total_iterations: 25,
            smoothing_iterations: 2,
            seed_count: None,
            percent_high_elevation: 0.4,
            elevation_noise_frequency: 5,
            elevation_noise_max_ft: 100,
            max_temperature: 75.0,
            min_temperature: -15.0,
            temperature_noise_frequency: 2,
            temperature_noise_max: 10,
            continental_warming_max: 50,
            initial_air_density: 0.0765,
            initial_wind_speed: 5.0,
            initial_wind_angle: 0.0,
        }
    }
}

impl GenerationConfig {
    /// `T(lat) = max + (min - max) * lat²`, `lat` in -1..1 from the grid's vertical center.
    pub fn temperature_curve(&self, latitude: f64) -> f64 {
        self.max_temperature + (self.min_temperature - self.max_temperature) * latitude * latitude
    }
}

/// Pressure (psi) of a one-cubic-mile air column at the given temperature.
pub fn column_pressure(temperature_f: f64) -> f64 {
    let volume = FEET_PER_MILE.powi(3);
    AIR_LBMOL_PER_CUBIC_MILE * UNIVERSAL_GAS_CONSTANT * to_rankine(temperature_f) / volume
}

pub struct WorldGenerator {
    config: GenerationConfig,
}

impl WorldGenerator {
    pub fn new(config: GenerationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Builds and fully seeds a new world. Deterministic for a given `rng` state.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        size: usize,
        climate: ClimateConfig,
        materials: MaterialTable,
        rng: &mut R,
    ) -> Result<World, SimError> {
        let mut world = World::new(size, climate, materials)?;
        self.populate(&mut world, rng)?;
        Ok(world)
    }

    /// Seeds an empty world in place. Fails if the world has already been generated.
    pub fn populate<R: Rng + ?Sized>(&self, world: &mut World, rng: &mut R) -> Result<(), SimError> {
        if world.elevation_corrected() {
            return Err(SimError::ElevationAlreadyApplied);
        }
        let elevation = self.generate_elevation(world, rng);
        for (tile, height) in world.tiles.iter_mut().zip(&elevation) {
            tile.elevation = *height as f64;
            tile.surface = SurfaceMaterial::Water;
        }
        self.assign_temperature(world, rng);
        self.assign_atmosphere(world);
        world.apply_elevation_correction()?;
        world.reclassify_surfaces();
        info!(
            size = world.size(),
            land_fraction = world.land_fraction(),
            mean_surface_f = world.mean_surface_temperature(),
            "world generated"
        );
        Ok(())
    }

    fn generate_elevation<R: Rng + ?Sized>(&self, world: &World, rng: &mut R) -> Vec<i64> {
        let cfg = &self.config;
        let size = world.size();
        let topology = world.topology();
        let mut elevation = vec![cfg.ocean_baseline_ft; topology.tile_count()];
        let seed_count = cfg.seed_count.unwrap_or(topology.tile_count() / 2);

        for _ in 0..cfg.total_iterations {
            for _ in 0..seed_count {
                let row = rng.gen_range(0..size);
                let col = rng.gen_range(0..size);
                let height = if rng.gen::<f64>() < cfg.percent_high_elevation {
                    rng.gen_range(0..=cfg.max_elevation_ft)
                } else {
                    rng.gen_range(cfg.min_elevation_ft..=0)
                };
                elevation[row * size + col] = height;
            }

            // Box filter written back in place, so later tiles in a pass see
            // already-smoothed neighbors.
            for _ in 0..cfg.smoothing_iterations {
                for index in 0..elevation.len() {
                    let total: f64 = topology
                        .box_indices(index)
                        .iter()
                        .map(|&i| elevation[i] as f64)
                        .sum();
                    let mut smoothed = total / 9.0;
                    if chance(rng, cfg.elevation_noise_frequency) {
                        smoothed += rng
                            .gen_range(-cfg.elevation_noise_max_ft..=cfg.elevation_noise_max_ft)
                            as f64;
                    }
                    elevation[index] = smoothed.trunc() as i64;
                }
            }
        }
        elevation
    }

    fn assign_temperature<R: Rng + ?Sized>(&self, world: &mut World, rng: &mut R) {
        let cfg = &self.config;
        let half = world.size() as f64 / 2.0;
        let sea_level = world.sea_level();
        for tile in world.tiles.iter_mut() {
            let latitude = (tile.pos.row as f64 - half) / half;
            let base = cfg.temperature_curve(latitude);
            let mut surface = base;
            if chance(rng, cfg.temperature_noise_frequency) {
                surface += rng.gen_range(-cfg.temperature_noise_max..=cfg.temperature_noise_max) as f64;
            }
            if tile.elevation > sea_level {
                surface += rng.gen_range(0..=cfg.continental_warming_max) as f64;
            }
            tile.surface_temperature = surface;
            tile.air_temperature = base;
            tile.previous_air_temperature = base;
        }
    }

    fn assign_atmosphere(&self, world: &mut World) {
        let cfg = &self.config;
        for tile in world.tiles.iter_mut() {
            tile.air_pressure = column_pressure(tile.air_temperature);
            tile.air_density = cfg.initial_air_density;
            tile.wind_speed = cfg.initial_wind_speed;
            tile.wind_angle = cfg.initial_wind_angle;
            tile.heat_carried_from_air = 0.0;
        }
    }
}

/// One-in-`frequency` coin flip.
fn chance<R: Rng + ?Sized>(rng: &mut R, frequency: u32) -> bool {
    frequency > 0 && rng.gen_range(0..frequency) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn small_config() -> GenerationConfig {
        GenerationConfig {
            total_iterations: 5,
            ..GenerationConfig::default()
        }
    }

    fn generate(seed: u64) -> World {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        WorldGenerator::new(small_config())
            .generate(12, ClimateConfig::default(), MaterialTable::default(), &mut rng)
            .unwrap()
    }

    #[test]
    fn test_same_seed_same_world() {
        let a = generate(11);
        let b = generate(11);
        for (x, y) in a.tiles().iter().zip(b.tiles()) {
            assert_eq!(x.elevation.to_bits(), y.elevation.to_bits());
            assert_eq!(x.surface_temperature.to_bits(), y.surface_temperature.to_bits());
            assert_eq!(x.air_temperature.to_bits(), y.air_temperature.to_bits());
        }
    }

    #[test]
    fn test_different_seed_different_terrain() {
        let a = generate(1);
        let b = generate(2);
        let differs = a
            .tiles()
            .iter()
            .zip(b.tiles())
            .any(|(x, y)| x.elevation != y.elevation);
        assert!(differs);
    }

    #[test]
    fn test_elevations_are_whole_feet() {
        let world = generate(5);
        assert!(world.tiles().iter().all(|t| t.elevation.fract() == 0.0));
    }

    #[test]
    fn test_generation_applies_elevation_factors() {
        let world = generate(3);
        assert!(world.elevation_corrected());
        for tile in world.tiles() {
            let expected = crate::climate::ElevationFactors::for_elevation(tile.elevation, 0.0);
            assert_eq!(tile.elevation_factors, expected);
        }
    }

    #[test]
    fn test_populate_twice_fails() {
        let mut world = generate(3);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let result = WorldGenerator::new(small_config()).populate(&mut world, &mut rng);
        assert!(matches!(result, Err(SimError::ElevationAlreadyApplied)));
    }

    #[test]
    fn test_temperature_curve_endpoints() {
        let cfg = GenerationConfig::default();
        assert_eq!(cfg.temperature_curve(0.0), 75.0);
        assert_eq!(cfg.temperature_curve(1.0), -15.0);
        assert_eq!(cfg.temperature_curve(-1.0), -15.0);
    }

    #[test]
    fn test_room_temperature_column_is_near_one_atmosphere() {
        assert_abs_diff_eq!(column_pressure(70.0), 14.78, epsilon = 0.05);
    }
}
