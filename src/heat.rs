//! Surface/air energy balance of a single tile over one tick.
//!
//! All energies are BTU for the whole tile (one square mile) over the tick. The
//! surface sees sunlight, last tick's downward atmospheric radiation and warm-air
//! convection; the air sees its share of sunlight, re-absorbed surface radiation
//! and reflection (both scaled by the greenhouse factor) and warm-surface
//! convection. Half of what the air radiates comes back down next tick.

use serde::Serialize;

use crate::climate::{to_rankine, ClimateConfig, ABSOLUTE_ZERO_F, FREEZING_F, TILE_AREA_FT2};
use crate::error::SimError;
use crate::materials::{Material, MaterialTable};
use crate::tile::{SurfaceMaterial, Tile};

/// Per-tile state the balance needs. Nothing here depends on neighboring tiles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatInputs {
    pub surface_temperature: f64,
    pub air_temperature: f64,
    pub heat_carried_from_air: f64,
    pub cosine_solar_zenith: f64,
    pub wind_speed: f64,
    pub surface: SurfaceMaterial,
    pub greenhouse: f64,
    pub elevation_temperature_factor: f64,
}

impl HeatInputs {
    pub fn from_tile(tile: &Tile, cosine_solar_zenith: f64, greenhouse: f64) -> Self {
        Self {
            surface_temperature: tile.surface_temperature,
            air_temperature: tile.air_temperature,
            heat_carried_from_air: tile.heat_carried_from_air,
            cosine_solar_zenith,
            wind_speed: tile.wind_speed,
            surface: tile.surface,
            greenhouse,
            elevation_temperature_factor: tile.elevation_factors.temperature,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct HeatBudget {
    /// Temperatures after the absolute-zero clamp, before this tick's change.
    pub surface_start: f64,
    pub air_start: f64,
    pub surface_clamped: bool,
    pub air_clamped: bool,

    pub solar_in: f64,
    pub albedo: f64,
    pub convection_coefficient: f64,
    pub convection_air_to_surface: f64,
    pub convection_surface_to_air: f64,

    pub solar_absorbed_by_surface: f64,
    pub carried_from_air: f64,
    pub surface_radiation: f64,
    pub surface_reflection: f64,
    pub surface_gain: f64,
    pub surface_loss: f64,
    pub surface_delta: f64,

    pub solar_absorbed_by_air: f64,
    pub surface_radiation_to_air: f64,
    pub reflection_to_air: f64,
    pub air_radiation: f64,
    pub air_gain: f64,
    pub air_loss: f64,
    /// Air change before the elevation factor.
    pub air_delta_raw: f64,
    /// Elevation factor actually applied; forced to 1 when the air is cooling.
    pub elevation_factor_applied: f64,
    pub air_delta: f64,

    /// Becomes the tile's `heat_carried_from_air` for the next tick.
    pub carried_forward: f64,
}

impl HeatBudget {
    pub fn surface_end(&self) -> f64 {
        self.surface_start + self.surface_delta
    }

    pub fn air_end(&self) -> f64 {
        self.air_start + self.air_delta
    }

    /// Share of the surface's radiation that the air absorbed.
    pub fn surface_radiation_capture(&self) -> f64 {
        if self.surface_radiation > 0.0 {
            self.surface_radiation_to_air / self.surface_radiation
        } else {
            0.0
        }
    }
}

fn clamp_absolute_zero(fahrenheit: f64) -> (f64, bool) {
    if to_rankine(fahrenheit) < 0.0 {
        (ABSOLUTE_ZERO_F, true)
    } else {
        (fahrenheit, false)
    }
}

fn thermal_mass(materials: &MaterialTable, material: Material) -> Result<f64, SimError> {
    let value = materials.get(material).thermal_mass();
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SimError::DegenerateThermalMass { material, value })
    }
}

pub fn balance_tile(
    climate: &ClimateConfig,
    materials: &MaterialTable,
    inputs: &HeatInputs,
) -> Result<HeatBudget, SimError> {
    let material = inputs.surface.material();
    let surface_thermal_mass = thermal_mass(materials, material)?;
    let air_thermal_mass = thermal_mass(materials, Material::Air)?;
    let props = materials.get(material);
    let dt = climate.time_step_hours;
    let greenhouse = 1.0 + inputs.greenhouse.max(0.0);

    let (surface_start, surface_clamped) = clamp_absolute_zero(inputs.surface_temperature);
    let (air_start, air_clamped) = clamp_absolute_zero(inputs.air_temperature);
    let surface_rankine = to_rankine(surface_start);
    let air_rankine = to_rankine(air_start);

    let cosine = if inputs.cosine_solar_zenith.is_finite() {
        inputs.cosine_solar_zenith.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let solar_in = climate.base_solar_flux * cosine * dt;

    let mut albedo = props.albedo;
    if inputs.surface.is_frozen() {
        if air_start > FREEZING_F {
            albedo -= climate.melt_albedo_reduction_air;
        }
        if surface_start > FREEZING_F {
            albedo -= climate.melt_albedo_reduction_surface;
        }
    }
    let albedo = albedo.clamp(0.0, 1.0);

    let convection_coefficient =
        climate.convection_coefficient(inputs.wind_speed) * materials.roughness(inputs.surface);
    let convection = convection_coefficient * TILE_AREA_FT2 * (air_start - surface_start) * dt;
    let convection_air_to_surface = convection.max(0.0);
    let convection_surface_to_air = (-convection).max(0.0);

    let solar_to_air = climate.air_solar_fraction * solar_in;
    let solar_to_surface = (1.0 - climate.air_solar_fraction) * solar_in;

    // Surface
    let solar_absorbed_by_surface = solar_to_surface * (1.0 - albedo);
    let surface_reflection = solar_to_surface * albedo;
    let surface_radiation = climate.blackbody_loss(climate.surface_emissivity, surface_rankine);
    let carried_from_air = inputs.heat_carried_from_air.max(0.0);
    let surface_gain = solar_absorbed_by_surface + carried_from_air + convection_air_to_surface;
    let surface_loss = surface_radiation + convection_surface_to_air;
    let surface_delta = (surface_gain - surface_loss) / surface_thermal_mass;

    // Air
    let solar_absorbed_by_air = solar_to_air * (1.0 - materials.air.albedo);
    let surface_radiation_to_air =
        surface_radiation * climate.surface_radiation_absorbed_by_air * greenhouse;
    let reflection_to_air = surface_reflection * climate.reflection_absorbed_by_air * greenhouse;
    let air_radiation = climate.blackbody_loss(climate.air_emissivity * greenhouse, air_rankine);
    let air_gain =
        solar_absorbed_by_air + surface_radiation_to_air + reflection_to_air + convection_surface_to_air;
    let air_loss = air_radiation + convection_air_to_surface;
    let air_delta_raw = (air_gain - air_loss) / air_thermal_mass;

    // Altitude slows warming only; cooling runs at the sea-level rate.
    let elevation_factor_applied = if air_delta_raw < 0.0 {
        1.0
    } else {
        inputs.elevation_temperature_factor
    };
    let air_delta = air_delta_raw * elevation_factor_applied;

    Ok(HeatBudget {
        surface_start,
        air_start,
        surface_clamped,
        air_clamped,
        solar_in,
        albedo,
        convection_coefficient,
        convection_air_to_surface,
        convection_surface_to_air,
        solar_absorbed_by_surface,
        carried_from_air,
        surface_radiation,
        surface_reflection,
        surface_gain,
        surface_loss,
        surface_delta,
        solar_absorbed_by_air,
        surface_radiation_to_air,
        reflection_to_air,
        air_radiation,
        air_gain,
        air_loss,
        air_delta_raw,
        elevation_factor_applied,
        air_delta,
        carried_forward: air_radiation * climate.air_to_surface_radiation_ratio,
    })
}

/// Writes a computed budget back onto its tile.
pub fn commit(tile: &mut Tile, budget: &HeatBudget) {
    tile.surface_temperature = budget.surface_end();
    tile.previous_air_temperature = budget.air_start;
    tile.air_temperature = budget.air_end();
    tile.heat_carried_from_air = budget.carried_forward;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn inputs() -> HeatInputs {
        HeatInputs {
            surface_temperature: 70.0,
            air_temperature: 70.0,
            heat_carried_from_air: 0.0,
            cosine_solar_zenith: 0.0,
            wind_speed: 0.0,
            surface: SurfaceMaterial::Stone,
            greenhouse: 0.0,
            elevation_temperature_factor: 1.0,
        }
    }

    fn balance(inputs: &HeatInputs) -> HeatBudget {
        balance_tile(&ClimateConfig::default(), &MaterialTable::default(), inputs).unwrap()
    }

    #[test]
    fn test_night_equal_temperatures_cools_by_radiation() {
        let budget = balance(&inputs());
        assert_eq!(budget.convection_air_to_surface, 0.0);
        assert_eq!(budget.convection_surface_to_air, 0.0);
        assert_eq!(budget.solar_in, 0.0);
        assert!(budget.surface_radiation > 0.0);
        assert!(budget.surface_delta < 0.0);
    }

    #[test]
    fn test_full_sun_warms_surface() {
        let lit = HeatInputs {
            cosine_solar_zenith: 1.0,
            ..inputs()
        };
        let budget = balance(&lit);
        assert!(budget.surface_delta > 0.0);
        assert!(budget.air_delta > 0.0);
    }

    #[test]
    fn test_negative_cosine_is_no_sun() {
        let below_horizon = HeatInputs {
            cosine_solar_zenith: -0.7,
            ..inputs()
        };
        assert_eq!(balance(&below_horizon).solar_in, 0.0);
    }

    #[test]
    fn test_absolute_zero_clamp() {
        let frozen = HeatInputs {
            surface_temperature: -600.0,
            air_temperature: -500.0,
            ..inputs()
        };
        let budget = balance(&frozen);
        assert_eq!(budget.surface_start, ABSOLUTE_ZERO_F);
        assert_eq!(budget.air_start, ABSOLUTE_ZERO_F);
        assert!(budget.surface_clamped && budget.air_clamped);
        assert_eq!(budget.surface_radiation, 0.0);
        assert_eq!(budget.air_radiation, 0.0);
    }

    #[test]
    fn test_greenhouse_increases_radiation_capture() {
        let clear = balance(&inputs());
        let hazy = balance(&HeatInputs {
            greenhouse: 0.5,
            ..inputs()
        });
        assert!(clear.surface_radiation > 0.0);
        assert!(hazy.surface_radiation_capture() > clear.surface_radiation_capture());
        assert_relative_eq!(hazy.surface_radiation_capture(), 0.8 * 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_warm_air_convects_into_surface() {
        let budget = balance(&HeatInputs {
            air_temperature: 90.0,
            ..inputs()
        });
        assert!(budget.convection_air_to_surface > 0.0);
        assert_eq!(budget.convection_surface_to_air, 0.0);
    }

    #[test]
    fn test_half_of_air_radiation_carried_forward() {
        let budget = balance(&inputs());
        assert_relative_eq!(budget.carried_forward, budget.air_radiation * 0.5);
    }

    #[test]
    fn test_elevation_factor_disabled_when_cooling() {
        let cooling = balance(&HeatInputs {
            elevation_temperature_factor: 0.4,
            ..inputs()
        });
        assert!(cooling.air_delta_raw < 0.0);
        assert_eq!(cooling.elevation_factor_applied, 1.0);
        assert_eq!(cooling.air_delta, cooling.air_delta_raw);

        let warming = balance(&HeatInputs {
            elevation_temperature_factor: 0.4,
            cosine_solar_zenith: 1.0,
            ..inputs()
        });
        assert!(warming.air_delta_raw > 0.0);
        assert_relative_eq!(warming.air_delta, warming.air_delta_raw * 0.4);
    }

    #[test]
    fn test_melting_snow_darkens() {
        let cold = balance(&HeatInputs {
            surface: SurfaceMaterial::Snow,
            surface_temperature: 20.0,
            air_temperature: 20.0,
            ..inputs()
        });
        let thawing = balance(&HeatInputs {
            surface: SurfaceMaterial::Snow,
            surface_temperature: 20.0,
            air_temperature: 40.0,
            ..inputs()
        });
        assert_relative_eq!(cold.albedo, 0.75);
        assert_relative_eq!(thawing.albedo, 0.65);
    }

    #[test]
    fn test_degenerate_material_is_an_error() {
        let mut materials = MaterialTable::default();
        materials.stone.density = 0.0;
        let result = balance_tile(&ClimateConfig::default(), &materials, &inputs());
        assert!(matches!(
            result,
            Err(SimError::DegenerateThermalMass { material: Material::Stone, .. })
        ));
    }
}
