use std::path::PathBuf;

use anyhow::{bail, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    rng::{RngManager, SystemRng},
    scenario::AtmosphereConfig,
    snapshot::SnapshotWriter,
    systems::{
        AdvectionSystem, GasSystem, HeatTransferSystem, SmoothingSystem, SolarSystem,
        SurfaceSystem, WindSystem,
    },
    world::{World, WorldSnapshot},
};

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
    pub snapshot_interval_ticks: u64,
    pub snapshot_dir: PathBuf,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    systems: Vec<Box<dyn System>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
        }
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn push_system(&mut self, system: impl System + 'static) {
        self.systems.push(Box::new(system));
    }

    /// Standard hourly pipeline. Atmosphere passes are included per the toggles;
    /// the sun, heat and surface passes always run.
    pub fn with_climate_systems(mut self, atmosphere: &AtmosphereConfig) -> Self {
        self.push_system(SolarSystem::new());
        self.push_system(HeatTransferSystem::new());
        if atmosphere.ideal_gas {
            self.push_system(GasSystem::new());
        }
        if atmosphere.smoothing {
            self.push_system(SmoothingSystem::new());
        }
        if atmosphere.wind {
            self.push_system(WindSystem::new());
        }
        if atmosphere.advection {
            self.push_system(AdvectionSystem::new());
        }
        self.push_system(SurfaceSystem::new());
        self
    }

    pub fn build(self) -> Engine {
        info!(
            scenario = %self.settings.scenario_name,
            systems = ?self.systems.iter().map(|s| s.name().to_string()).collect::<Vec<_>>(),
            "engine built"
        );
        Engine {
            rng: RngManager::new(self.settings.seed),
            systems: self.systems,
            snapshot_writer: SnapshotWriter::new(
                &self.settings.snapshot_dir,
                self.settings.snapshot_interval_ticks,
            ),
            settings: self.settings,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TickSummary {
    pub tick: u64,
    pub hours_elapsed: f64,
    pub sun_hour_angle: u32,
    pub mean_surface_temperature: f64,
    pub mean_air_temperature: f64,
    pub snapshot_path: Option<PathBuf>,
}

pub struct Engine {
    rng: RngManager,
    systems: Vec<Box<dyn System>>,
    snapshot_writer: SnapshotWriter,
    settings: EngineSettings,
}

impl Engine {
    pub fn scenario_name(&self) -> &str {
        &self.settings.scenario_name
    }

    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.name()).collect()
    }

    /// Runs one simulated time step: every system in order, then the clock,
    /// then an optional snapshot.
    pub fn advance_tick(&mut self, world: &mut World) -> Result<TickSummary> {
        if !world.elevation_corrected() {
            bail!("world must be generated before it can be ticked");
        }
        let current_tick = world.tick();
        for system in &mut self.systems {
            let mut rng_stream = self.rng.stream(system.name());
            let ctx = SystemContext {
                tick: current_tick,
                time_step_hours: world.climate().time_step_hours,
                scenario_name: &self.settings.scenario_name,
            };
            system.run(&ctx, world, &mut rng_stream)?;
        }
        world.advance_time();
        let snapshot_path = self
            .snapshot_writer
            .maybe_write(world, &self.settings.scenario_name)?;

        let summary = TickSummary {
            tick: world.tick(),
            hours_elapsed: world.hours_elapsed(),
            sun_hour_angle: world.sun_hour_angle(),
            mean_surface_temperature: world.mean_surface_temperature(),
            mean_air_temperature: world.mean_air_temperature(),
            snapshot_path,
        };
        debug!(
            tick = summary.tick,
            sun = summary.sun_hour_angle,
            surface_f = summary.mean_surface_temperature,
            air_f = summary.mean_air_temperature,
            "tick complete"
        );
        Ok(summary)
    }

    pub fn run(&mut self, world: &mut World, ticks: u64) -> Result<()> {
        for _ in 0..ticks {
            self.advance_tick(world)?;
        }
        Ok(())
    }

    /// Like `run`, handing a snapshot of the world to `hook` after every tick.
    pub fn run_with_hook<F>(&mut self, world: &mut World, ticks: u64, mut hook: F) -> Result<()>
    where
        F: FnMut(WorldSnapshot),
    {
        for _ in 0..ticks {
            self.advance_tick(world)?;
            hook(world.snapshot(&self.settings.scenario_name));
        }
        Ok(())
    }
}

pub struct SystemContext<'a> {
    pub tick: u64,
    pub time_step_hours: f64,
    pub scenario_name: &'a str,
}

pub trait System: Send {
    fn name(&self) -> &str;
    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()>;
}
