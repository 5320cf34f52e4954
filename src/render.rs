//! Map colouring: display modes, the shared 11-band contour scale, surface
//! tiles and the day/night overlay.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::tile::{SurfaceMaterial, Tile};
use crate::world::World;

pub const BAND_COUNT: usize = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Band 0 (highest) through band 10 (lowest).
pub const PALETTE: [Rgb; BAND_COUNT] = [
    Rgb(255, 0, 220),
    Rgb(255, 0, 0),
    Rgb(255, 106, 0),
    Rgb(255, 216, 0),
    Rgb(182, 255, 0),
    Rgb(76, 255, 0),
    Rgb(0, 255, 144),
    Rgb(0, 255, 255),
    Rgb(0, 148, 255),
    Rgb(0, 38, 255),
    Rgb(87, 0, 127),
];

/// Exposed stone from lowlands (0) to peaks (9), one step per 1000 ft.
const STONE: [Rgb; 10] = [
    Rgb(112, 104, 88),
    Rgb(120, 111, 95),
    Rgb(128, 119, 103),
    Rgb(136, 128, 112),
    Rgb(145, 137, 122),
    Rgb(155, 148, 134),
    Rgb(166, 160, 147),
    Rgb(178, 173, 162),
    Rgb(191, 187, 178),
    Rgb(205, 202, 195),
];
const SNOW: Rgb = Rgb(240, 244, 250);
const WATER: Rgb = Rgb(28, 78, 158);
const SEA_ICE: Rgb = Rgb(190, 214, 230);
const BLANK: Rgb = Rgb(0, 0, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    Surface,
    Elevation,
    ElevationLandOnly,
    SurfaceTemperature,
    AirTemperature,
    AirPressure,
    AirDensity,
    WindSpeed,
}

impl DisplayMode {
    pub const ALL: [DisplayMode; 8] = [
        DisplayMode::Surface,
        DisplayMode::Elevation,
        DisplayMode::ElevationLandOnly,
        DisplayMode::SurfaceTemperature,
        DisplayMode::AirTemperature,
        DisplayMode::AirPressure,
        DisplayMode::AirDensity,
        DisplayMode::WindSpeed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayMode::Surface => "surface",
            DisplayMode::Elevation => "elevation",
            DisplayMode::ElevationLandOnly => "elevation_land_only",
            DisplayMode::SurfaceTemperature => "surface_temperature",
            DisplayMode::AirTemperature => "air_temperature",
            DisplayMode::AirPressure => "air_pressure",
            DisplayMode::AirDensity => "air_density",
            DisplayMode::WindSpeed => "wind_speed",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            DisplayMode::Surface => "",
            DisplayMode::Elevation | DisplayMode::ElevationLandOnly => "ft",
            DisplayMode::SurfaceTemperature | DisplayMode::AirTemperature => "°F",
            DisplayMode::AirPressure => "psi",
            DisplayMode::AirDensity => "lb/ft³",
            DisplayMode::WindSpeed => "mph",
        }
    }

    /// Contour (min, max); `None` for the textured surface view.
    pub fn range(&self, sea_level: f64) -> Option<(f64, f64)> {
        match self {
            DisplayMode::Surface => None,
            DisplayMode::Elevation => Some((-9000.0, 15000.0)),
            DisplayMode::ElevationLandOnly => Some((sea_level, 15000.0)),
            DisplayMode::SurfaceTemperature | DisplayMode::AirTemperature => Some((-50.0, 120.0)),
            DisplayMode::AirPressure => Some((5.0, 15.0)),
            DisplayMode::AirDensity => Some((0.04, 0.08)),
            DisplayMode::WindSpeed => Some((0.0, 120.0)),
        }
    }

    pub fn value(&self, tile: &Tile) -> f64 {
        match self {
            DisplayMode::Surface | DisplayMode::Elevation | DisplayMode::ElevationLandOnly => {
                tile.elevation
            }
            DisplayMode::SurfaceTemperature => tile.surface_temperature,
            DisplayMode::AirTemperature => tile.air_temperature,
            DisplayMode::AirPressure => tile.air_pressure,
            DisplayMode::AirDensity => tile.air_density,
            DisplayMode::WindSpeed => tile.wind_speed,
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayMode {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DisplayMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| SimError::UnknownDisplayMode(s.to_string()))
    }
}

/// Contour band for `value`: 0 at or above `max`, then nine equal steps down
/// to `min`, and 10 below `min`. `None` for NaN.
pub fn band_index(value: f64, min: f64, max: f64) -> Option<usize> {
    if value.is_nan() {
        return None;
    }
    if value >= max {
        return Some(0);
    }
    let increment = (max - min) / 9.0;
    (1..=9)
        .find(|&k| value >= max - increment * k as f64)
        .or(Some(10))
}

pub fn surface_color(surface: SurfaceMaterial, elevation: f64) -> Rgb {
    match surface {
        SurfaceMaterial::Stone => {
            let step = ((elevation / 1000.0).ceil() - 1.0).clamp(0.0, 9.0) as usize;
            STONE[step]
        }
        SurfaceMaterial::Snow => SNOW,
        SurfaceMaterial::Water => WATER,
        SurfaceMaterial::SeaIce => SEA_ICE,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendRow {
    pub band: usize,
    /// Inclusive lower bound; open for the bottom band.
    pub lower: Option<f64>,
    /// Exclusive upper bound; open for the top band.
    pub upper: Option<f64>,
    pub color: Rgb,
}

pub fn legend(min: f64, max: f64) -> Vec<LegendRow> {
    let increment = (max - min) / 9.0;
    (0..BAND_COUNT)
        .map(|band| {
            let (lower, upper) = match band {
                0 => (Some(max), None),
                10 => (None, Some(min)),
                k => (
                    Some(max - increment * k as f64),
                    Some(max - increment * (k - 1) as f64),
                ),
            };
            LegendRow {
                band,
                lower,
                upper,
                color: PALETTE[band],
            }
        })
        .collect()
}

/// Sun position in tile coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SunMarker {
    pub x: f64,
    pub y: f64,
}

impl SunMarker {
    pub fn new(size: usize, hour_angle_deg: u32, sun_latitude_deg: f64) -> Self {
        let n = size as f64;
        Self {
            x: n * hour_angle_deg as f64 / 360.0,
            y: n / 2.0 + sun_latitude_deg / 90.0 * n / 2.0,
        }
    }
}

/// Everything the viewer needs to paint one map in one display mode.
#[derive(Debug, Clone, Serialize)]
pub struct MapFrame {
    pub mode: DisplayMode,
    pub unit: &'static str,
    pub size: usize,
    pub tick: u64,
    /// Row-major tile colours.
    pub colors: Vec<Rgb>,
    /// Night-side shade alpha per tile.
    pub shade: Vec<u8>,
    pub sun: SunMarker,
    pub legend: Option<Vec<LegendRow>>,
}

impl MapFrame {
    pub fn render(world: &World, mode: DisplayMode) -> Self {
        let range = mode.range(world.sea_level());
        let colors = world
            .tiles()
            .iter()
            .map(|tile| match range {
                None => surface_color(tile.surface, tile.elevation),
                Some((min, max)) => band_index(mode.value(tile), min, max)
                    .map(|band| PALETTE[band])
                    .unwrap_or(BLANK),
            })
            .collect();
        let hour_angle = world.sun_hour_angle();
        let shade = (0..world.tile_count())
            .map(|index| world.insolation().shade_alpha(hour_angle, index))
            .collect();
        Self {
            mode,
            unit: mode.unit(),
            size: world.size(),
            tick: world.tick(),
            colors,
            shade,
            sun: SunMarker::new(world.size(), hour_angle, world.climate().sun_latitude_deg),
            legend: range.map(|(min, max)| legend(min, max)),
        }
    }
}
