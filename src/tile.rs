use serde::{Deserialize, Serialize};

use crate::climate::{ElevationFactors, FREEZING_F};
use crate::grid::TilePos;
use crate::materials::Material;

/// Sea water freezes a little below fresh-water freezing.
pub const SEA_ICE_F: f64 = 28.0;

/// What a tile's surface currently is; derived from elevation, sea level and temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceMaterial {
    Stone,
    Water,
    Snow,
    SeaIce,
}

impl SurfaceMaterial {
    pub fn classify(elevation_ft: f64, sea_level_ft: f64, surface_temperature_f: f64) -> Self {
        if elevation_ft >= sea_level_ft {
            if surface_temperature_f < FREEZING_F {
                SurfaceMaterial::Snow
            } else {
                SurfaceMaterial::Stone
            }
        } else if surface_temperature_f > SEA_ICE_F {
            SurfaceMaterial::Water
        } else {
            SurfaceMaterial::SeaIce
        }
    }

    /// Snow and sea ice take ice properties.
    pub fn material(&self) -> Material {
        match self {
            SurfaceMaterial::Stone => Material::Stone,
            SurfaceMaterial::Water => Material::Water,
            SurfaceMaterial::Snow | SurfaceMaterial::SeaIce => Material::Ice,
        }
    }

    pub fn is_frozen(&self) -> bool {
        matches!(self, SurfaceMaterial::Snow | SurfaceMaterial::SeaIce)
    }

    pub fn is_land(&self) -> bool {
        matches!(self, SurfaceMaterial::Stone | SurfaceMaterial::Snow)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub pos: TilePos,
    /// ft
    pub elevation: f64,
    /// °F
    pub surface_temperature: f64,
    pub air_temperature: f64,
    pub previous_air_temperature: f64,
    /// psi
    pub air_pressure: f64,
    /// lb/ft³
    pub air_density: f64,
    pub elevation_factors: ElevationFactors,
    /// BTU of atmospheric radiation owed to the surface on the next tick.
    pub heat_carried_from_air: f64,
    /// mph
    pub wind_speed: f64,
    /// Compass degrees, 0..360, 0 toward row - 1.
    pub wind_angle: f64,
    pub surface: SurfaceMaterial,
}

impl Tile {
    /// Room-temperature, sea-level tile. Generation overwrites these values.
    pub fn new(pos: TilePos) -> Self {
        Self {
            pos,
            elevation: 0.0,
            surface_temperature: 70.0,
            air_temperature: 70.0,
            previous_air_temperature: 70.0,
            air_pressure: 14.7,
            air_density: 0.0765,
            elevation_factors: ElevationFactors::NEUTRAL,
            heat_carried_from_air: 0.0,
            wind_speed: 5.0,
            wind_angle: 0.0,
            surface: SurfaceMaterial::Water,
        }
    }

    pub fn reclassify(&mut self, sea_level_ft: f64) {
        self.surface = SurfaceMaterial::classify(self.elevation, sea_level_ft, self.surface_temperature);
    }

    pub fn snapshot(&self, cosine_solar_zenith: f64) -> TileSnapshot {
        TileSnapshot {
            row: self.pos.row,
            col: self.pos.col,
            elevation: self.elevation,
            surface_temperature: self.surface_temperature,
            air_temperature: self.air_temperature,
            previous_air_temperature: self.previous_air_temperature,
            air_pressure: self.air_pressure,
            air_density: self.air_density,
            heat_carried_from_air: self.heat_carried_from_air,
            wind_speed: self.wind_speed,
            wind_angle: self.wind_angle,
            surface: self.surface,
            cosine_solar_zenith,
        }
    }
}

/// Read-only projection of a tile for rendering and readouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSnapshot {
    pub row: usize,
    pub col: usize,
    pub elevation: f64,
    pub surface_temperature: f64,
    pub air_temperature: f64,
    pub previous_air_temperature: f64,
    pub air_pressure: f64,
    pub air_density: f64,
    pub heat_carried_from_air: f64,
    pub wind_speed: f64,
    pub wind_angle: f64,
    pub surface: SurfaceMaterial,
    pub cosine_solar_zenith: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_land_classification() {
        assert_eq!(SurfaceMaterial::classify(100.0, 0.0, 50.0), SurfaceMaterial::Stone);
        assert_eq!(SurfaceMaterial::classify(100.0, 0.0, 20.0), SurfaceMaterial::Snow);
        assert_eq!(SurfaceMaterial::classify(0.0, 0.0, 31.9), SurfaceMaterial::Snow);
    }

    #[test]
    fn test_ocean_classification() {
        assert_eq!(SurfaceMaterial::classify(-10.0, 0.0, 30.0), SurfaceMaterial::Water);
        assert_eq!(SurfaceMaterial::classify(-10.0, 0.0, 28.0), SurfaceMaterial::SeaIce);
    }

    #[test]
    fn test_frozen_surfaces_use_ice() {
        assert_eq!(SurfaceMaterial::Snow.material(), Material::Ice);
        assert_eq!(SurfaceMaterial::SeaIce.material(), Material::Ice);
        assert_eq!(SurfaceMaterial::Water.material(), Material::Water);
    }

    #[test]
    fn test_raising_sea_level_floods_land() {
        let mut tile = Tile::new(TilePos::new(0, 0));
        tile.elevation = 50.0;
        tile.reclassify(0.0);
        assert_eq!(tile.surface, SurfaceMaterial::Stone);
        tile.reclassify(100.0);
        assert_eq!(tile.surface, SurfaceMaterial::Water);
    }
}
