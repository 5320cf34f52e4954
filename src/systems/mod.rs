mod advection;
mod gas;
mod heat_transfer;
mod smoothing;
mod solar;
mod surface;
mod wind;

pub use advection::AdvectionSystem;
pub use gas::{ideal_gas_pressure, GasSystem};
pub use heat_transfer::{HeatTotals, HeatTransferSystem};
pub use smoothing::SmoothingSystem;
pub use solar::SolarSystem;
pub use surface::SurfaceSystem;
pub use wind::{pressure_driven_wind, WindSystem};
