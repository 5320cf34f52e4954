use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    engine::{System, SystemContext},
    heat::{balance_tile, commit, HeatBudget, HeatInputs},
    rng::SystemRng,
    world::World,
};

/// World-wide energy sums for one heat pass, BTU.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HeatTotals {
    pub solar_in: f64,
    pub surface_gain: f64,
    pub surface_loss: f64,
    pub air_gain: f64,
    pub air_loss: f64,
    pub clamped_tiles: usize,
}

impl HeatTotals {
    fn add(&mut self, budget: &HeatBudget) {
        self.solar_in += budget.solar_in;
        self.surface_gain += budget.surface_gain;
        self.surface_loss += budget.surface_loss;
        self.air_gain += budget.air_gain;
        self.air_loss += budget.air_loss;
        if budget.surface_clamped || budget.air_clamped {
            self.clamped_tiles += 1;
        }
    }
}

/// Surface/air energy balance for every tile.
///
/// Budgets are computed for the whole grid from start-of-pass state and only
/// then written back, so the pass is independent of tile order and a bad
/// material table leaves the world untouched.
pub struct HeatTransferSystem {
    last_totals: Option<HeatTotals>,
}

impl HeatTransferSystem {
    pub fn new() -> Self {
        Self { last_totals: None }
    }

    pub fn last_totals(&self) -> Option<HeatTotals> {
        self.last_totals
    }

    pub fn compute_budgets(world: &World) -> Result<Vec<HeatBudget>> {
        world.materials.validate().context("heat pass aborted")?;
        let greenhouse = world.greenhouse();
        world
            .tiles
            .iter()
            .enumerate()
            .map(|(index, tile)| {
                let inputs = HeatInputs::from_tile(tile, world.cosine_solar_zenith(index), greenhouse);
                balance_tile(&world.climate, &world.materials, &inputs)
                    .with_context(|| format!("heat balance failed at {:?}", tile.pos))
            })
            .collect()
    }
}

impl Default for HeatTransferSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for HeatTransferSystem {
    fn name(&self) -> &str {
        "heat_transfer"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let budgets = Self::compute_budgets(world)?;
        let mut totals = HeatTotals::default();
        for (tile, budget) in world.tiles.iter_mut().zip(&budgets) {
            totals.add(budget);
            commit(tile, budget);
        }
        if totals.clamped_tiles > 0 {
            warn!(
                tick = ctx.tick,
                tiles = totals.clamped_tiles,
                "temperatures clamped at absolute zero"
            );
        }
        debug!(
            tick = ctx.tick,
            solar_in = totals.solar_in,
            surface_gain = totals.surface_gain,
            surface_loss = totals.surface_loss,
            air_gain = totals.air_gain,
            air_loss = totals.air_loss,
            "heat totals"
        );
        self.last_totals = Some(totals);
        Ok(())
    }
}
