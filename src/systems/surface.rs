use anyhow::Result;
use tracing::debug;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::World,
};

/// Re-derives each tile's surface material after temperatures have moved.
pub struct SurfaceSystem;

impl SurfaceSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SurfaceSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for SurfaceSystem {
    fn name(&self) -> &str {
        "surface"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let before: Vec<_> = world.tiles().iter().map(|t| t.surface).collect();
        world.reclassify_surfaces();
        let changed = world
            .tiles()
            .iter()
            .zip(&before)
            .filter(|(tile, previous)| tile.surface != **previous)
            .count();
        if changed > 0 {
            debug!(tick = ctx.tick, changed, "surface materials reclassified");
        }
        Ok(())
    }
}
