//! Thermal and optical properties of the materials a tile can be made of.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::climate::TILE_AREA_FT2;
use crate::error::SimError;
use crate::tile::SurfaceMaterial;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Material {
    Stone,
    Water,
    Ice,
    Air,
}

impl Material {
    pub fn as_str(&self) -> &'static str {
        match self {
            Material::Stone => "stone",
            Material::Water => "water",
            Material::Ice => "ice",
            Material::Air => "air",
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialProperties {
    /// BTU / (lb °F)
    pub heat_capacity: f64,
    /// lb / ft³
    pub density: f64,
    pub albedo: f64,
    /// Effective thickness (ft) that turns a tile footprint into a finite thermal mass.
    pub calc_depth_ft: f64,
    /// Multiplier on convective surface area.
    #[serde(default = "default_roughness")]
    pub roughness: f64,
}

fn default_roughness() -> f64 {
    1.0
}

impl MaterialProperties {
    /// Mass of one tile's worth of this material, in lb.
    pub fn tile_mass(&self) -> f64 {
        self.density * self.calc_depth_ft * TILE_AREA_FT2
    }

    /// Energy (BTU) needed to move the tile mass by one °F.
    pub fn thermal_mass(&self) -> f64 {
        self.tile_mass() * self.heat_capacity
    }
}

/// Material lookup, exposed as configuration so scenarios and tests can override it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialTable {
    pub stone: MaterialProperties,
    pub water: MaterialProperties,
    pub ice: MaterialProperties,
    pub air: MaterialProperties,
    /// Roughness used for snow-covered land, which otherwise takes ice properties.
    pub snow_roughness: f64,
}

impl Default for MaterialTable {
    fn default() -> Self {
        Self {
            stone: MaterialProperties {
                heat_capacity: 0.23885,
                density: 175.0,
                albedo: 0.35,
                calc_depth_ft: 1.0,
                roughness: 1.2,
            },
            water: MaterialProperties {
                heat_capacity: 1.001,
                density: 62.4,
                albedo: 0.075,
                calc_depth_ft: 300.0,
                roughness: 1.0,
            },
            ice: MaterialProperties {
                heat_capacity: 0.5,
                density: 57.24644,
                albedo: 0.75,
                calc_depth_ft: 5.0,
                roughness: 1.0,
            },
            air: MaterialProperties {
                heat_capacity: 0.17128,
                density: 0.075,
                albedo: 0.3,
                calc_depth_ft: 2500.0,
                roughness: 1.0,
            },
            snow_roughness: 1.5,
        }
    }
}

impl MaterialTable {
    pub fn get(&self, material: Material) -> &MaterialProperties {
        match material {
            Material::Stone => &self.stone,
            Material::Water => &self.water,
            Material::Ice => &self.ice,
            Material::Air => &self.air,
        }
    }

    pub fn roughness(&self, surface: SurfaceMaterial) -> f64 {
        match surface {
            SurfaceMaterial::Snow => self.snow_roughness,
            other => self.get(other.material()).roughness,
        }
    }

    /// Every material must have a finite, positive thermal mass or the heat pass
    /// would divide by zero.
    pub fn validate(&self) -> Result<(), SimError> {
        for material in [Material::Stone, Material::Water, Material::Ice, Material::Air] {
            let value = self.get(material).thermal_mass();
            if !value.is_finite() || value <= 0.0 {
                return Err(SimError::DegenerateThermalMass { material, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_is_valid() {
        assert!(MaterialTable::default().validate().is_ok());
    }

    #[test]
    fn test_stone_tile_mass() {
        let table = MaterialTable::default();
        let expected = 175.0 * 1.0 * 5280.0 * 5280.0;
        assert_eq!(table.stone.tile_mass(), expected);
    }

    #[test]
    fn test_zero_heat_capacity_is_rejected() {
        let mut table = MaterialTable::default();
        table.water.heat_capacity = 0.0;
        match table.validate() {
            Err(SimError::DegenerateThermalMass { material, .. }) => {
                assert_eq!(material, Material::Water)
            }
            other => panic!("unexpected result {other:?}"),
        }
    }
}
