pub mod climate;
pub mod engine;
pub mod error;
pub mod grid;
pub mod heat;
pub mod insolation;
pub mod logging;
pub mod materials;
pub mod render;
pub mod rng;
pub mod scenario;
pub mod snapshot;
pub mod systems;
pub mod tile;
pub mod web;
pub mod world;
pub mod worldgen;

pub use engine::{Engine, EngineBuilder, EngineSettings, TickSummary};
pub use error::SimError;
pub use scenario::{Scenario, ScenarioLoader};
pub use world::World;
