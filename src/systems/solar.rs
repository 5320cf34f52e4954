use anyhow::Result;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::World,
};

/// Moves the sun one time step west; insolation for the tick is then looked up
/// at the new hour angle.
pub struct SolarSystem;

impl SolarSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SolarSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for SolarSystem {
    fn name(&self) -> &str {
        "solar"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        world.advance_sun();
        Ok(())
    }
}
