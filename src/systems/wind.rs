use anyhow::Result;
use rand::seq::SliceRandom;

use crate::{
    climate::MPH_TO_FT_PER_SEC,
    engine::{System, SystemContext},
    grid::Neighbor,
    rng::SystemRng,
    tile::Tile,
    world::World,
};

const PSI_TO_PSF: f64 = 144.0;
/// lbm per slug
const STANDARD_GRAVITY: f64 = 32.174;
const MAX_WIND_MPH: f64 = 120.0;

/// Wind from neighbor pressure differences.
///
/// Along each of the eight bearings the tile's own wind component is carried
/// through a Bernoulli step, `v² = v₀|v₀| + 2ΔP/ρ`, so higher pressure behind
/// speeds the flow toward a lower-pressure neighbor and a negative result
/// reverses it. The eight signed components are summed as vectors; the sum
/// reproduces the tile's own wind when pressure is flat. The estimate is then
/// blended with the current wind by `wind_relaxation`.
pub struct WindSystem;

impl WindSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WindSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// (east, north) components in mph for a compass angle in degrees.
fn components(speed: f64, angle_deg: f64) -> (f64, f64) {
    let angle = angle_deg.to_radians();
    (speed * angle.sin(), speed * angle.cos())
}

/// Wraps into [0, 360); `rem_euclid` can round tiny negatives up to 360.
fn compass_degrees(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

fn bernoulli_speed(outbound_mph: f64, pressure_drop_psi: f64, air_density: f64) -> f64 {
    let v0 = outbound_mph * MPH_TO_FT_PER_SEC;
    let rho = air_density / STANDARD_GRAVITY;
    let v_squared = v0 * v0.abs() + 2.0 * pressure_drop_psi * PSI_TO_PSF / rho;
    v_squared.signum() * v_squared.abs().sqrt() / MPH_TO_FT_PER_SEC
}

/// New (speed, angle) for a tile from its neighbors' pressures.
pub fn pressure_driven_wind(tile: &Tile, neighbors: &[(Neighbor, f64)], relaxation: f64) -> (f64, f64) {
    let (mut east, mut north) = (0.0, 0.0);
    if tile.air_density > 0.0 {
        for (neighbor, neighbor_pressure) in neighbors {
            let bearing = neighbor.bearing_deg;
            let outbound = tile.wind_speed * (tile.wind_angle - bearing).to_radians().cos();
            let speed = bernoulli_speed(outbound, tile.air_pressure - neighbor_pressure, tile.air_density);
            let (e, n) = components(speed, bearing);
            east += e;
            north += n;
        }
    }
    // Eight evenly spaced projections sum to four times the original vector.
    let estimate = (east / 4.0, north / 4.0);
    let current = components(tile.wind_speed, tile.wind_angle);
    let east = (1.0 - relaxation) * current.0 + relaxation * estimate.0;
    let north = (1.0 - relaxation) * current.1 + relaxation * estimate.1;

    let speed = east.hypot(north);
    if !speed.is_finite() {
        return (0.0, tile.wind_angle);
    }
    let angle = if speed > 0.0 {
        compass_degrees(east.atan2(north).to_degrees())
    } else {
        tile.wind_angle
    };
    (speed.min(MAX_WIND_MPH), angle)
}

impl System for WindSystem {
    fn name(&self) -> &str {
        "wind"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let relaxation = world.climate.wind_relaxation.clamp(0.0, 1.0);
        let topology = &world.topology;
        let tiles = &mut world.tiles;

        let mut order: Vec<usize> = (0..tiles.len()).collect();
        order.shuffle(rng);
        for index in order {
            let neighbors: Vec<(Neighbor, f64)> = topology
                .neighbors(index)
                .iter()
                .map(|n| (*n, tiles[n.index].air_pressure))
                .collect();
            let (speed, angle) = pressure_driven_wind(&tiles[index], &neighbors, relaxation);
            tiles[index].wind_speed = speed;
            tiles[index].wind_angle = angle;
        }
        Ok(())
    }
}
