use thiserror::Error;

use crate::materials::Material;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("material '{material}' has a degenerate thermal mass ({value})")]
    DegenerateThermalMass { material: Material, value: f64 },
    #[error("elevation correction has already been applied to this world")]
    ElevationAlreadyApplied,
    #[error("tile ({row}, {col}) is outside a {size}x{size} grid")]
    TileOutOfBounds { row: usize, col: usize, size: usize },
    #[error("grid size {0} is too small; at least 3 tiles per side are required")]
    InvalidGridSize(usize),
    #[error("time step of {0} hours does not divide a day into whole hour-angle steps")]
    InvalidTimeStep(f64),
    #[error("insolation table covers {found} tiles but the grid has {expected}")]
    InsolationMismatch { expected: usize, found: usize },
    #[error("unknown display mode '{0}'")]
    UnknownDisplayMode(String),
}
