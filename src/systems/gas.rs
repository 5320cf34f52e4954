use anyhow::Result;

use crate::{
    climate::to_rankine,
    engine::{System, SystemContext},
    rng::SystemRng,
    world::World,
};

/// Ideal-gas pressure from each tile's own density and current air temperature.
pub struct GasSystem;

impl GasSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GasSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// psi = lb/ft³ · ft·lbf/(lb·°R) · °R · (ft²→in²)
pub fn ideal_gas_pressure(density: f64, gas_constant: f64, air_temperature_f: f64, psf_to_psi: f64) -> f64 {
    density * gas_constant * to_rankine(air_temperature_f) * psf_to_psi
}

impl System for GasSystem {
    fn name(&self) -> &str {
        "gas"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let gas_constant = world.climate.gas_constant;
        let psf_to_psi = world.climate.psf_to_psi;
        for tile in &mut world.tiles {
            tile.air_pressure =
                ideal_gas_pressure(tile.air_density, gas_constant, tile.air_temperature, psf_to_psi);
        }
        Ok(())
    }
}
