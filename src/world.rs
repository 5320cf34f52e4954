use serde::{Deserialize, Serialize};

use crate::climate::{ClimateConfig, ElevationFactors};
use crate::error::SimError;
use crate::grid::{TilePos, Topology};
use crate::insolation::InsolationTable;
use crate::materials::MaterialTable;
use crate::tile::{SurfaceMaterial, Tile, TileSnapshot};

const HOURS_PER_DAY: f64 = 24.0;
const DAYS_PER_YEAR: f64 = 365.0;

/// Elapsed simulated time broken down for readouts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimClock {
    pub years: u64,
    pub days: u64,
    pub hours: f64,
}

impl SimClock {
    pub fn from_hours(total_hours: f64) -> Self {
        let hours = total_hours % HOURS_PER_DAY;
        let total_days = ((total_hours - hours) / HOURS_PER_DAY).round();
        let days = total_days % DAYS_PER_YEAR;
        let years = ((total_days - days) / DAYS_PER_YEAR).round();
        Self {
            years: years as u64,
            days: days as u64,
            hours,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl FieldStats {
    fn collect(values: impl Iterator<Item = f64>) -> Self {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut count = 0usize;
        for value in values {
            min = min.min(value);
            max = max.max(value);
            sum += value;
            count += 1;
        }
        let mean = if count > 0 { sum / count as f64 } else { 0.0 };
        Self { min, max, mean }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub scenario: String,
    pub tick: u64,
    pub hours_elapsed: f64,
    pub clock: SimClock,
    pub grid_size: usize,
    pub sun_hour_angle: u32,
    pub sea_level: f64,
    pub greenhouse: f64,
    pub land_fraction: f64,
    pub surface_temperature: FieldStats,
    pub air_temperature: FieldStats,
    pub air_pressure: FieldStats,
    pub tiles: Vec<TileSnapshot>,
}

/// The whole simulated planet: an N x N toroidal grid of tiles plus the scalar
/// state shared by every tile.
pub struct World {
    pub(crate) topology: Topology,
    pub(crate) tiles: Vec<Tile>,
    pub(crate) insolation: InsolationTable,
    pub(crate) climate: ClimateConfig,
    pub(crate) materials: MaterialTable,
    sun_hour_angle: u32,
    sea_level: f64,
    greenhouse: f64,
    tick: u64,
    hours_elapsed: f64,
    elevation_corrected: bool,
}

impl World {
    pub fn new(size: usize, climate: ClimateConfig, materials: MaterialTable) -> Result<Self, SimError> {
        let topology = Topology::new(size)?;
        let step = climate.hour_angle_step()?;
        let insolation = InsolationTable::compute(size, step, climate.solar_declination_deg)?;
        let tiles = (0..topology.tile_count())
            .filter_map(|index| topology.pos_of(index))
            .map(Tile::new)
            .collect();
        Ok(Self {
            topology,
            tiles,
            insolation,
            climate,
            materials,
            sun_hour_angle: 0,
            sea_level: 0.0,
            greenhouse: 0.0,
            tick: 0,
            hours_elapsed: 0.0,
            elevation_corrected: false,
        })
    }

    /// Swap in a prebuilt insolation table. Only valid before the first tick.
    pub fn with_insolation(mut self, insolation: InsolationTable) -> Result<Self, SimError> {
        if insolation.tile_count() != self.tiles.len() {
            return Err(SimError::InsolationMismatch {
                expected: self.tiles.len(),
                found: insolation.tile_count(),
            });
        }
        if insolation.step_deg() != self.climate.hour_angle_step()? {
            return Err(SimError::InvalidTimeStep(insolation.step_deg() as f64 / 15.0));
        }
        self.insolation = insolation;
        Ok(self)
    }

    pub fn size(&self) -> usize {
        self.topology.size()
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn climate(&self) -> &ClimateConfig {
        &self.climate
    }

    pub fn materials(&self) -> &MaterialTable {
        &self.materials
    }

    pub fn insolation(&self) -> &InsolationTable {
        &self.insolation
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile(&self, row: usize, col: usize) -> Result<&Tile, SimError> {
        let index = self.index_of(row, col)?;
        Ok(&self.tiles[index])
    }

    pub fn tile_mut(&mut self, row: usize, col: usize) -> Result<&mut Tile, SimError> {
        let index = self.index_of(row, col)?;
        Ok(&mut self.tiles[index])
    }

    pub fn tile_snapshot(&self, row: usize, col: usize) -> Result<TileSnapshot, SimError> {
        let index = self.index_of(row, col)?;
        Ok(self.tiles[index].snapshot(self.cosine_solar_zenith(index)))
    }

    fn index_of(&self, row: usize, col: usize) -> Result<usize, SimError> {
        self.topology
            .index_of(TilePos::new(row, col))
            .ok_or(SimError::TileOutOfBounds {
                row,
                col,
                size: self.size(),
            })
    }

    pub fn sun_hour_angle(&self) -> u32 {
        self.sun_hour_angle
    }

    /// Moves the sun one tick's worth of hour angle, wrapping at 360.
    pub fn advance_sun(&mut self) {
        self.sun_hour_angle = (self.sun_hour_angle + self.insolation.step_deg()) % 360;
    }

    pub fn set_sun_hour_angle(&mut self, degrees: u32) {
        self.sun_hour_angle = degrees % 360;
    }

    /// Clamped cos(Z) of a tile at the current sun position.
    pub fn cosine_solar_zenith(&self, index: usize) -> f64 {
        self.insolation.cosine(self.sun_hour_angle, index)
    }

    pub fn sea_level(&self) -> f64 {
        self.sea_level
    }

    /// Shifts sea level; elevations are untouched but land/sea classification follows.
    pub fn adjust_sea_level(&mut self, delta_ft: f64) {
        self.sea_level += delta_ft;
        self.reclassify_surfaces();
    }

    pub fn greenhouse(&self) -> f64 {
        self.greenhouse
    }

    /// Greenhouse multiplier never drops below zero.
    pub fn adjust_greenhouse(&mut self, delta: f64) {
        self.greenhouse = (self.greenhouse + delta).max(0.0);
    }

    pub fn reclassify_surfaces(&mut self) {
        let sea_level = self.sea_level;
        for tile in &mut self.tiles {
            tile.reclassify(sea_level);
        }
    }

    /// Computes each tile's altitude factors and folds them into the generated
    /// baseline temperature, pressure and density. Allowed exactly once per world.
    pub fn apply_elevation_correction(&mut self) -> Result<(), SimError> {
        if self.elevation_corrected {
            return Err(SimError::ElevationAlreadyApplied);
        }
        let sea_level = self.sea_level;
        for tile in &mut self.tiles {
            let factors = ElevationFactors::for_elevation(tile.elevation, sea_level);
            tile.elevation_factors = factors;
            tile.air_temperature *= factors.temperature;
            tile.previous_air_temperature = tile.air_temperature;
            tile.surface_temperature *= factors.temperature;
            tile.air_pressure *= factors.pressure;
            tile.air_density *= factors.density;
        }
        self.elevation_corrected = true;
        Ok(())
    }

    pub fn elevation_corrected(&self) -> bool {
        self.elevation_corrected
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn hours_elapsed(&self) -> f64 {
        self.hours_elapsed
    }

    pub fn clock(&self) -> SimClock {
        SimClock::from_hours(self.hours_elapsed)
    }

    pub fn advance_time(&mut self) {
        self.tick += 1;
        self.hours_elapsed += self.climate.time_step_hours;
    }

    pub fn land_fraction(&self) -> f64 {
        let land = self.tiles.iter().filter(|t| t.surface.is_land()).count();
        land as f64 / self.tiles.len() as f64
    }

    pub fn count_surface(&self, surface: SurfaceMaterial) -> usize {
        self.tiles.iter().filter(|t| t.surface == surface).count()
    }

    pub fn mean_surface_temperature(&self) -> f64 {
        FieldStats::collect(self.tiles.iter().map(|t| t.surface_temperature)).mean
    }

    pub fn mean_air_temperature(&self) -> f64 {
        FieldStats::collect(self.tiles.iter().map(|t| t.air_temperature)).mean
    }

    pub fn snapshot(&self, scenario: &str) -> WorldSnapshot {
        let tiles = (0..self.tiles.len())
            .map(|index| self.tiles[index].snapshot(self.cosine_solar_zenith(index)))
            .collect();
        WorldSnapshot {
            scenario: scenario.to_string(),
            tick: self.tick,
            hours_elapsed: self.hours_elapsed,
            clock: self.clock(),
            grid_size: self.size(),
            sun_hour_angle: self.sun_hour_angle,
            sea_level: self.sea_level,
            greenhouse: self.greenhouse,
            land_fraction: self.land_fraction(),
            surface_temperature: FieldStats::collect(self.tiles.iter().map(|t| t.surface_temperature)),
            air_temperature: FieldStats::collect(self.tiles.iter().map(|t| t.air_temperature)),
            air_pressure: FieldStats::collect(self.tiles.iter().map(|t| t.air_pressure)),
            tiles,
        }
    }
}
