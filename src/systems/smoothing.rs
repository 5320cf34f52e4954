use anyhow::Result;
use rand::seq::SliceRandom;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::World,
};

/// Diffuses air temperature by nudging each 3x3 block toward its own mean.
///
/// Neighbors are written during a tile's step, so results depend on visiting
/// order; the order is reshuffled every tick.
pub struct SmoothingSystem;

impl SmoothingSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SmoothingSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for SmoothingSystem {
    fn name(&self) -> &str {
        "smoothing"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let factor = world.climate.smooth_factor;
        let topology = &world.topology;
        let tiles = &mut world.tiles;

        let mut order: Vec<usize> = (0..tiles.len()).collect();
        order.shuffle(rng);
        for index in order {
            let block = topology.box_indices(index);
            let mean = block.iter().map(|&i| tiles[i].air_temperature).sum::<f64>() / 9.0;
            for &i in &block {
                let tile = &mut tiles[i];
                tile.air_temperature += (mean - tile.air_temperature) * factor;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{climate::ClimateConfig, materials::MaterialTable, rng::RngManager};

    fn ctx() -> SystemContext<'static> {
        SystemContext {
            tick: 0,
            time_step_hours: 1.0,
            scenario_name: "test",
        }
    }

    #[test]
    fn test_hot_spot_spreads() {
        let mut world = World::new(5, ClimateConfig::default(), MaterialTable::default()).unwrap();
        world.tile_mut(2, 2).unwrap().air_temperature = 170.0;
        let mut rng = RngManager::new(3);
        SmoothingSystem::new()
            .run(&ctx(), &mut world, &mut rng.stream("smoothing"))
            .unwrap();
        assert!(world.tile(2, 2).unwrap().air_temperature < 170.0);
        assert!(world.tile(1, 1).unwrap().air_temperature > 70.0);
        assert!(world.tiles().iter().all(|t| t.air_temperature >= 70.0));
    }

    #[test]
    fn test_uniform_field_is_unchanged() {
        let mut world = World::new(4, ClimateConfig::default(), MaterialTable::default()).unwrap();
        let mut rng = RngManager::new(3);
        SmoothingSystem::new()
            .run(&ctx(), &mut world, &mut rng.stream("smoothing"))
            .unwrap();
        assert!(world.tiles().iter().all(|t| t.air_temperature == 70.0));
    }
}
