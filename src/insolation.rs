//! Precomputed cosine of the solar zenith angle for every tile at every sun hour angle.
//!
//! Built once at startup in O(steps x N²); each tick then does a constant-time
//! lookup per tile.

use crate::error::SimError;

#[derive(Debug, Clone, PartialEq)]
pub struct InsolationTable {
    step_deg: u32,
    tile_count: usize,
    /// `values[step][tile]`, unclamped cos(Z).
    values: Vec<Vec<f64>>,
}

impl InsolationTable {
    /// Equinox-style table: the sun sits over the equator row band shifted by
    /// `declination_deg`, sweeping across columns as the hour angle advances.
    pub fn compute(size: usize, step_deg: u32, declination_deg: f64) -> Result<Self, SimError> {
        if size < 3 {
            return Err(SimError::InvalidGridSize(size));
        }
        if step_deg == 0 || 360 % step_deg != 0 {
            return Err(SimError::InvalidTimeStep(step_deg as f64 / 15.0));
        }
        let n = size as f64;
        let half = n / 2.0;
        let declination = declination_deg.to_radians();
        let mut values = Vec::with_capacity((360 / step_deg) as usize);
        for hour_angle in (0..360).step_by(step_deg as usize) {
            let sun_x = n * (hour_angle as f64 / 360.0);
            let mut column = Vec::with_capacity(size * size);
            for row in 0..size {
                let latitude = (90.0 - (180.0 / (n - 1.0)) * row as f64).abs().to_radians();
                for col in 0..size {
                    let mut delta = (col as f64 - sun_x + n).rem_euclid(n);
                    if delta > half {
                        delta -= n;
                    }
                    let local_hour_angle = ((360.0 / n) * delta).to_radians();
                    let cosine = latitude.sin() * declination.sin()
                        + latitude.cos() * declination.cos() * local_hour_angle.cos();
                    column.push(cosine);
                }
            }
            values.push(column);
        }
        Ok(Self {
            step_deg,
            tile_count: size * size,
            values,
        })
    }

    /// Table from explicit values, one row per hour-angle step.
    pub fn from_values(step_deg: u32, values: Vec<Vec<f64>>) -> Result<Self, SimError> {
        if step_deg == 0 || 360 % step_deg != 0 || values.len() != (360 / step_deg) as usize {
            return Err(SimError::InvalidTimeStep(step_deg as f64 / 15.0));
        }
        let tile_count = values.first().map(Vec::len).unwrap_or(0);
        if let Some(bad) = values.iter().find(|row| row.len() != tile_count) {
            return Err(SimError::InsolationMismatch {
                expected: tile_count,
                found: bad.len(),
            });
        }
        Ok(Self {
            step_deg,
            tile_count,
            values,
        })
    }

    /// Same cos(Z) for every hour angle; handy for fixed lighting.
    pub fn constant(step_deg: u32, per_tile: Vec<f64>) -> Result<Self, SimError> {
        let steps = if step_deg == 0 { 0 } else { (360 / step_deg) as usize };
        Self::from_values(step_deg, vec![per_tile; steps])
    }

    pub fn step_deg(&self) -> u32 {
        self.step_deg
    }

    pub fn tile_count(&self) -> usize {
        self.tile_count
    }

    /// Raw cos(Z); negative on the night side.
    pub fn raw(&self, hour_angle_deg: u32, tile: usize) -> f64 {
        let step = ((hour_angle_deg % 360) / self.step_deg) as usize;
        self.values[step][tile]
    }

    /// cos(Z) clamped to the physically meaningful [0, 1].
    pub fn cosine(&self, hour_angle_deg: u32, tile: usize) -> f64 {
        let value = self.raw(hour_angle_deg, tile);
        if value.is_finite() {
            value.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Shade alpha for the day/night overlay: 255 at night, 0 under the sun.
    pub fn shade_alpha(&self, hour_angle_deg: u32, tile: usize) -> u8 {
        (255.0 * (1.0 - self.raw(hour_angle_deg, tile))).clamp(0.0, 255.0) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_repeated_precomputation_is_identical() {
        let a = InsolationTable::compute(12, 15, 0.0).unwrap();
        let b = InsolationTable::compute(12, 15, 0.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_equator_under_sun_is_fully_lit() {
        // Odd size puts a row exactly on the equator.
        let size = 9;
        let table = InsolationTable::compute(size, 15, 0.0).unwrap();
        let equator = size / 2;
        let tile = equator * size;
        assert_abs_diff_eq!(table.cosine(0, tile), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_poles_receive_nothing_at_equinox() {
        let size = 9;
        let table = InsolationTable::compute(size, 15, 0.0).unwrap();
        assert_abs_diff_eq!(table.cosine(0, 0), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_night_side_clamps_to_zero() {
        let size = 8;
        let table = InsolationTable::compute(size, 15, 0.0).unwrap();
        let far_side = (size / 2) * size + size / 2;
        assert!(table.raw(0, far_side) < 0.0);
        assert_eq!(table.cosine(0, far_side), 0.0);
        assert_eq!(table.shade_alpha(0, far_side), 255);
    }

    #[test]
    fn test_lookup_wraps_hour_angle() {
        let table = InsolationTable::compute(6, 15, 0.0).unwrap();
        assert_eq!(table.raw(375, 3), table.raw(15, 3));
        assert_eq!(table.raw(360, 3), table.raw(0, 3));
    }

    #[test]
    fn test_from_values_rejects_ragged_rows() {
        let mut values = vec![vec![0.0; 4]; 24];
        values[3] = vec![0.0; 3];
        assert!(InsolationTable::from_values(15, values).is_err());
    }
}
