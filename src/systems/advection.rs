use anyhow::Result;
use rand::seq::SliceRandom;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::World,
};

const FULL_WIND_MPH: f64 = 120.0;

/// Carries air temperature downwind.
///
/// Each neighbor whose bearing lies strictly within 90° of the tile's wind
/// direction exchanges `advection_factor * speed / 120 mph` of the temperature
/// difference with the tile. The exchange is symmetric, so the grid's summed
/// air temperature is unchanged.
pub struct AdvectionSystem;

impl AdvectionSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AdvectionSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Smallest absolute angle between two compass bearings.
fn angular_distance(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(360.0);
    diff.min(360.0 - diff)
}

impl System for AdvectionSystem {
    fn name(&self) -> &str {
        "advection"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let factor = world.climate.advection_factor;
        let topology = &world.topology;
        let tiles = &mut world.tiles;

        let mut order: Vec<usize> = (0..tiles.len()).collect();
        order.shuffle(rng);
        for index in order {
            let strength = factor * (tiles[index].wind_speed.abs() / FULL_WIND_MPH).min(1.0);
            if strength <= 0.0 {
                continue;
            }
            let wind_angle = tiles[index].wind_angle;
            for neighbor in topology.neighbors(index) {
                if angular_distance(neighbor.bearing_deg, wind_angle) >= 90.0 {
                    continue;
                }
                let share = strength * (tiles[index].air_temperature - tiles[neighbor.index].air_temperature);
                tiles[index].air_temperature -= share;
                tiles[neighbor.index].air_temperature += share;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{climate::ClimateConfig, materials::MaterialTable, rng::RngManager};
    use approx::assert_abs_diff_eq;

    fn run(world: &mut World) {
        let mut rng = RngManager::new(5);
        let ctx = SystemContext {
            tick: 0,
            time_step_hours: 1.0,
            scenario_name: "test",
        };
        AdvectionSystem::new()
            .run(&ctx, world, &mut rng.stream("advection"))
            .unwrap();
    }

    fn windy_world() -> World {
        let mut world = World::new(6, ClimateConfig::default(), MaterialTable::default()).unwrap();
        for tile in &mut world.tiles {
            tile.wind_speed = 0.0;
        }
        let source = world.tile_mut(3, 3).unwrap();
        source.air_temperature = 100.0;
        source.wind_speed = 60.0;
        source.wind_angle = 90.0;
        world
    }

    #[test]
    fn test_heat_moves_downwind_only() {
        let mut world = windy_world();
        run(&mut world);
        assert!(world.tile(3, 4).unwrap().air_temperature > 70.0);
        assert!(world.tile(2, 4).unwrap().air_temperature > 70.0);
        assert_eq!(world.tile(3, 2).unwrap().air_temperature, 70.0);
        assert_eq!(world.tile(2, 3).unwrap().air_temperature, 70.0);
    }

    #[test]
    fn test_total_air_temperature_conserved() {
        let mut world = windy_world();
        let before: f64 = world.tiles().iter().map(|t| t.air_temperature).sum();
        run(&mut world);
        let after: f64 = world.tiles().iter().map(|t| t.air_temperature).sum();
        assert_abs_diff_eq!(before, after, epsilon = 1e-9);
    }

    #[test]
    fn test_angular_distance_wraps() {
        assert_eq!(angular_distance(350.0, 10.0), 20.0);
        assert_eq!(angular_distance(90.0, 270.0), 180.0);
    }
}
