use std::path::PathBuf;

use antistasis::{
    climate::ClimateConfig,
    engine::{EngineBuilder, EngineSettings},
    insolation::InsolationTable,
    materials::MaterialTable,
    scenario::{AtmosphereConfig, Scenario, ScenarioLoader},
    systems::{HeatTransferSystem, SolarSystem},
    tile::SurfaceMaterial,
    world::World,
};
use tempfile::tempdir;

fn scenario_loader() -> ScenarioLoader {
    ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"))
}

fn fixture() -> Scenario {
    scenario_loader()
        .load("scenarios/temperate_world.yaml")
        .expect("scenario parses")
}

fn settings(seed: u64, snapshot_dir: PathBuf, snapshot_interval: u64) -> EngineSettings {
    EngineSettings {
        scenario_name: "temperate_world".into(),
        seed,
        snapshot_interval_ticks: snapshot_interval,
        snapshot_dir,
    }
}

fn build_engine(scenario: &Scenario, snapshot_dir: PathBuf, snapshot_interval: u64) -> EngineBuilder {
    EngineBuilder::new(settings(scenario.seed, snapshot_dir, snapshot_interval))
        .with_climate_systems(&scenario.atmosphere)
}

/// 4x4 sea-level stone world at 70 °F where only tile (1, 1) sees the sun.
fn single_lit_tile_world() -> World {
    let mut cosines = vec![0.0; 16];
    cosines[5] = 1.0;
    let mut world = World::new(4, ClimateConfig::default(), MaterialTable::default())
        .unwrap()
        .with_insolation(InsolationTable::constant(15, cosines).unwrap())
        .unwrap();
    world.apply_elevation_correction().unwrap();
    world.reclassify_surfaces();
    world
}

#[test]
fn scenario_loader_reads_fixture() {
    let scenario = fixture();
    assert_eq!(scenario.name, "temperate_world");
    assert_eq!(scenario.grid_size, 32);
    assert_eq!(scenario.ticks(None), 48);
    assert!(scenario.atmosphere.smoothing);
    assert!(!scenario.atmosphere.wind);
}

#[test]
fn world_generation_is_reproducible() {
    let scenario = fixture();
    let a = scenario.build_world().unwrap();
    let b = scenario.build_world().unwrap();
    for (x, y) in a.tiles().iter().zip(b.tiles()) {
        assert_eq!(x.elevation.to_bits(), y.elevation.to_bits());
        assert_eq!(x.surface_temperature.to_bits(), y.surface_temperature.to_bits());
        assert_eq!(x.air_temperature.to_bits(), y.air_temperature.to_bits());
        assert_eq!(x.air_pressure.to_bits(), y.air_pressure.to_bits());
    }
    assert!(a.land_fraction() > 0.0 && a.land_fraction() < 1.0);
}

#[test]
fn engine_runs_deterministically() {
    let scenario = fixture();
    let temp = tempdir().unwrap();

    let mut world_a = scenario.build_world().unwrap();
    let mut engine_a = build_engine(&scenario, temp.path().join("a"), 0).build();
    engine_a.run(&mut world_a, 12).unwrap();

    let mut world_b = scenario.build_world().unwrap();
    let mut engine_b = build_engine(&scenario, temp.path().join("b"), 0).build();
    engine_b.run(&mut world_b, 12).unwrap();

    for (x, y) in world_a.tiles().iter().zip(world_b.tiles()) {
        assert_eq!(x.surface_temperature.to_bits(), y.surface_temperature.to_bits());
        assert_eq!(x.air_temperature.to_bits(), y.air_temperature.to_bits());
    }
    assert_eq!(world_a.tick(), 12);
    assert_eq!(world_a.sun_hour_angle(), 180);
}

#[test]
fn engine_emits_snapshots() {
    let scenario = fixture();
    let temp = tempdir().unwrap();
    let snapshot_dir = temp.path().join("snaps");

    let mut world = scenario.build_world().unwrap();
    let mut engine = build_engine(&scenario, snapshot_dir.clone(), 10).build();
    engine.run(&mut world, 30).unwrap();

    for tick in [10, 20, 30] {
        let expected = snapshot_dir
            .join("temperate_world")
            .join(format!("tick_{tick:06}.json"));
        assert!(expected.exists(), "expected snapshot {}", expected.display());
    }
    let data = std::fs::read_to_string(snapshot_dir.join("temperate_world/tick_000010.json")).unwrap();
    assert!(data.contains("\"scenario\": \"temperate_world\""));
    assert!(data.contains("\"generated_at\""));
}

#[test]
fn engine_runs_hook_each_tick() {
    let scenario = fixture();
    let temp = tempdir().unwrap();
    let mut world = scenario.build_world().unwrap();
    let mut engine = build_engine(&scenario, temp.path().to_path_buf(), 0).build();

    let mut ticks = Vec::new();
    engine
        .run_with_hook(&mut world, 6, |snapshot| ticks.push(snapshot.tick))
        .expect("run succeeds");

    assert_eq!(ticks, vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn lit_tile_warms_while_dark_tiles_do_not() {
    let temp = tempdir().unwrap();
    let mut world = single_lit_tile_world();
    assert_eq!(world.count_surface(SurfaceMaterial::Stone), 16);

    let mut engine = EngineBuilder::new(settings(1, temp.path().to_path_buf(), 0))
        .with_system(SolarSystem::new())
        .with_system(HeatTransferSystem::new())
        .build();
    engine.advance_tick(&mut world).unwrap();

    assert!(world.tile(1, 1).unwrap().surface_temperature > 70.0);
    let dark_not_warmer = world
        .tiles()
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != 5)
        .any(|(_, tile)| tile.surface_temperature <= 70.0);
    assert!(dark_not_warmer);
}

#[test]
fn elevation_factors_survive_ticks_unchanged() {
    let scenario = fixture();
    let temp = tempdir().unwrap();
    let mut world = scenario.build_world().unwrap();
    let factors: Vec<_> = world.tiles().iter().map(|t| t.elevation_factors).collect();

    let mut engine = build_engine(&scenario, temp.path().to_path_buf(), 0).build();
    engine.run(&mut world, 5).unwrap();

    let after: Vec<_> = world.tiles().iter().map(|t| t.elevation_factors).collect();
    assert_eq!(factors, after);
    assert!(world.apply_elevation_correction().is_err());
}

#[test]
fn greenhouse_raises_reabsorbed_surface_radiation() {
    let mut world = single_lit_tile_world();
    let clear = HeatTransferSystem::compute_budgets(&world).unwrap();
    world.adjust_greenhouse(0.5);
    let hazy = HeatTransferSystem::compute_budgets(&world).unwrap();

    let dark = 0;
    assert!(clear[dark].surface_radiation > 0.0);
    assert!(hazy[dark].surface_radiation_capture() > clear[dark].surface_radiation_capture());
}

#[test]
fn ungenerated_world_cannot_tick() {
    let temp = tempdir().unwrap();
    let mut world = World::new(4, ClimateConfig::default(), MaterialTable::default()).unwrap();
    let mut engine = EngineBuilder::new(settings(1, temp.path().to_path_buf(), 0))
        .with_system(HeatTransferSystem::new())
        .build();
    assert!(engine.advance_tick(&mut world).is_err());
    assert_eq!(world.tick(), 0);
}

#[test]
fn full_atmosphere_stays_finite() {
    let mut scenario = fixture();
    scenario.grid_size = 12;
    scenario.atmosphere = AtmosphereConfig {
        ideal_gas: true,
        smoothing: true,
        wind: true,
        advection: true,
    };
    let temp = tempdir().unwrap();
    let mut world = scenario.build_world().unwrap();
    let mut engine = build_engine(&scenario, temp.path().to_path_buf(), 0).build();
    assert_eq!(
        engine.system_names(),
        vec!["solar", "heat_transfer", "gas", "smoothing", "wind", "advection", "surface"]
    );
    engine.run(&mut world, 24).unwrap();

    for tile in world.tiles() {
        assert!(tile.surface_temperature.is_finite());
        assert!(tile.air_temperature.is_finite());
        assert!(tile.air_pressure.is_finite());
        assert!(tile.wind_speed >= 0.0 && tile.wind_speed <= 120.0);
        assert!((0.0..360.0).contains(&tile.wind_angle));
    }
    assert_eq!(world.clock().days, 1);
}

#[test]
fn raising_sea_level_floods_coastline() {
    let scenario = fixture();
    let mut world = scenario.build_world().unwrap();
    let land_before = world.land_fraction();
    world.adjust_sea_level(5_000.0);
    assert!(world.land_fraction() < land_before);
    assert!(world
        .tiles()
        .iter()
        .filter(|t| t.elevation < world.sea_level())
        .all(|t| !t.surface.is_land()));
}
