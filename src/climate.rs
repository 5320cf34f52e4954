//! Physical constants of the energy-balance model and the altitude correction curves.

use serde::{Deserialize, Serialize};

use crate::error::SimError;

pub const FEET_PER_MILE: f64 = 5280.0;
/// One tile is one square mile.
pub const TILE_AREA_FT2: f64 = FEET_PER_MILE * FEET_PER_MILE;
pub const RANKINE_OFFSET: f64 = 459.67;
pub const ABSOLUTE_ZERO_F: f64 = -RANKINE_OFFSET;
pub const FREEZING_F: f64 = 32.0;
pub const MPH_TO_FT_PER_SEC: f64 = 1.466_667;

pub fn to_rankine(fahrenheit: f64) -> f64 {
    fahrenheit + RANKINE_OFFSET
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimateConfig {
    /// BTU/hr reaching one square mile with the sun at zenith, before albedo.
    pub base_solar_flux: f64,
    /// Share of incoming sunlight absorbed by the atmosphere.
    pub air_solar_fraction: f64,
    /// Share of atmospheric radiation carried down to the surface next tick.
    pub air_to_surface_radiation_ratio: f64,
    pub surface_radiation_absorbed_by_air: f64,
    pub reflection_absorbed_by_air: f64,
    /// BTU / (hr ft² °R⁴)
    pub stefan_boltzmann: f64,
    pub radiation_control_factor: f64,
    pub surface_emissivity: f64,
    pub air_emissivity: f64,
    /// BTU / (ft² °F), floor for the convection coefficient.
    pub natural_convection_coefficient: f64,
    pub convection_coefficient_calm: f64,
    pub convection_coefficient_max: f64,
    pub max_convection_wind_mph: f64,
    pub melt_albedo_reduction_air: f64,
    pub melt_albedo_reduction_surface: f64,
    /// ft lbf / (lb °R)
    pub gas_constant: f64,
    pub psf_to_psi: f64,
    pub smooth_factor: f64,
    pub time_step_hours: f64,
    pub solar_declination_deg: f64,
    pub sun_latitude_deg: f64,
    pub greenhouse_increment: f64,
    pub sea_level_increment_ft: f64,
    /// Blend between a tile's own wind and the pressure-driven estimate.
    pub wind_relaxation: f64,
    pub advection_factor: f64,
}

impl Default for ClimateConfig {
    fn default() -> Self {
        Self {
            base_solar_flux: 1.2028e10,
            air_solar_fraction: 0.23,
            air_to_surface_radiation_ratio: 0.5,
            surface_radiation_absorbed_by_air: 0.8,
            reflection_absorbed_by_air: 0.2,
            stefan_boltzmann: 0.1714,
            radiation_control_factor: 0.9e-9,
            surface_emissivity: 0.9,
            air_emissivity: 0.7,
            natural_convection_coefficient: 0.5,
            convection_coefficient_calm: 0.088,
            convection_coefficient_max: 30.840,
            max_convection_wind_mph: 120.0,
            melt_albedo_reduction_air: 0.1,
            melt_albedo_reduction_surface: 0.15,
            gas_constant: 53.353,
            psf_to_psi: 0.006_944_44,
            smooth_factor: 0.003,
            time_step_hours: 1.0,
            solar_declination_deg: 0.0,
            sun_latitude_deg: 0.0,
            greenhouse_increment: 0.05,
            sea_level_increment_ft: 100.0,
            wind_relaxation: 0.5,
            advection_factor: 0.05,
        }
    }
}

impl ClimateConfig {
    /// Degrees of sun hour angle covered by one tick (15 for hourly ticks).
    pub fn hour_angle_step(&self) -> Result<u32, SimError> {
        let dt = self.time_step_hours;
        if dt.is_nan() || dt <= 0.0 || dt > 24.0 {
            return Err(SimError::InvalidTimeStep(dt));
        }
        let step = 15.0 * dt;
        let rounded = step.round();
        if (step - rounded).abs() > 1e-9 || rounded < 1.0 || 360 % rounded as u32 != 0 {
            return Err(SimError::InvalidTimeStep(dt));
        }
        Ok(rounded as u32)
    }

    /// Radiative loss in BTU for one tick from one tile at the given Rankine temperature.
    pub fn blackbody_loss(&self, emissivity: f64, rankine: f64) -> f64 {
        self.radiation_control_factor
            * self.stefan_boltzmann
            * emissivity
            * TILE_AREA_FT2
            * rankine.powi(4)
            * self.time_step_hours
    }

    /// Convection coefficient for a given wind speed, before roughness.
    pub fn convection_coefficient(&self, wind_mph: f64) -> f64 {
        let ratio = (wind_mph.abs() / self.max_convection_wind_mph).min(1.0);
        let coefficient = self.convection_coefficient_calm
            + (self.convection_coefficient_max - self.convection_coefficient_calm) * ratio.sqrt();
        coefficient.max(self.natural_convection_coefficient)
    }
}

/// Multipliers applied to temperature, pressure and density for a tile's altitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationFactors {
    pub temperature: f64,
    pub pressure: f64,
    pub density: f64,
}

impl ElevationFactors {
    pub const NEUTRAL: ElevationFactors = ElevationFactors {
        temperature: 1.0,
        pressure: 1.0,
        density: 1.0,
    };

    /// Second-order fits to the standard atmosphere. Air over the ocean sits at
    /// sea level, so anything below `sea_level` is evaluated at 0 ft.
    pub fn for_elevation(elevation_ft: f64, sea_level_ft: f64) -> Self {
        let e = if elevation_ft < sea_level_ft { 0.0 } else { elevation_ft };
        Self {
            temperature: 1.0 - 6e-5 * e + 5e-12 * e * e,
            pressure: 1.0004 - 4e-5 * e + 5e-10 * e * e,
            density: 1.0001 - 3e-5 * e + 3e-10 * e * e,
        }
    }
}
