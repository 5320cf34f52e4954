use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::info;

use antistasis::{
    engine::{EngineBuilder, EngineSettings},
    logging,
    scenario::{Scenario, ScenarioLoader},
    web::{self, WebServerConfig},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Antistasis planetary climate simulation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a scenario headless, writing periodic snapshots
    Run(ScenarioArgs),
    /// Run a scenario behind the web viewer
    Serve {
        #[command(flatten)]
        scenario: ScenarioArgs,

        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 8080)]
        port: u16,

        /// Milliseconds to wait between ticks
        #[arg(long, default_value_t = 250)]
        tick_ms: u64,
    },
}

#[derive(Debug, Args)]
struct ScenarioArgs {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/temperate_world.yaml")]
    scenario: PathBuf,

    /// Override tick count (uses scenario default when omitted)
    #[arg(long)]
    ticks: Option<u64>,

    /// Override snapshot interval in ticks
    #[arg(long)]
    snapshot_interval: Option<u64>,

    /// Directory for snapshots
    #[arg(long, default_value = "snapshots")]
    snapshot_dir: PathBuf,

    /// Log filter, overriding the scenario's logging.level
    #[arg(long)]
    log_level: Option<String>,
}

impl ScenarioArgs {
    fn load(&self) -> Result<Scenario> {
        let scenario = ScenarioLoader::new(".").load(&self.scenario)?;
        logging::init(&scenario.logging.clone().with_level(self.log_level.clone()))?;
        Ok(scenario)
    }

    fn snapshot_interval(&self, scenario: &Scenario) -> u64 {
        self.snapshot_interval
            .unwrap_or(scenario.snapshot_interval_ticks)
    }
}

fn run_headless(args: ScenarioArgs) -> Result<()> {
    let scenario = args.load()?;
    let mut world = scenario.build_world()?;
    let ticks = scenario.ticks(args.ticks);

    let settings = EngineSettings {
        scenario_name: scenario.name.clone(),
        seed: scenario.seed,
        snapshot_interval_ticks: args.snapshot_interval(&scenario),
        snapshot_dir: args.snapshot_dir.clone(),
    };
    let mut engine = EngineBuilder::new(settings)
        .with_climate_systems(&scenario.atmosphere)
        .build();

    engine.run(&mut world, ticks)?;
    let clock = world.clock();
    info!(
        scenario = %scenario.name,
        ticks,
        years = clock.years,
        days = clock.days,
        hours = clock.hours,
        mean_surface_f = world.mean_surface_temperature(),
        mean_air_f = world.mean_air_temperature(),
        land_fraction = world.land_fraction(),
        "scenario completed"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => tokio::task::spawn_blocking(move || run_headless(args)).await?,
        Command::Serve {
            scenario: args,
            host,
            port,
            tick_ms,
        } => {
            let scenario = args.load()?;
            let config = WebServerConfig {
                ticks: scenario.ticks(args.ticks),
                snapshot_interval: args.snapshot_interval(&scenario),
                snapshot_dir: args.snapshot_dir,
                scenario,
                host,
                port,
                tick_interval: Duration::from_millis(tick_ms),
            };
            web::run(config).await
        }
    }
}
