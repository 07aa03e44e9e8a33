use serde::Deserialize;

use crate::predict::types::PassCalculation;

/// Tunable visibility heuristics. Not photometric models: magnitudes are a
/// coarse lookup on peak elevation and duration, and the bright day rule only
/// picks which daylight passes are worth listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Heuristics {
    pub brightness: BrightnessHeuristic,
    pub bright_day: BrightDayHeuristic,
}

/// A pass strictly above both bounds gets `magnitude`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BrightnessBand {
    pub min_elevation_deg: f64,
    pub min_duration_minutes: f64,
    pub magnitude: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BrightnessHeuristic {
    /// Checked in order; first match wins.
    pub bands: Vec<BrightnessBand>,
    pub floor_magnitude: f64,
}

impl Default for BrightnessHeuristic {
    fn default() -> Self {
        Self {
            bands: vec![
                BrightnessBand {
                    min_elevation_deg: 60.0,
                    min_duration_minutes: 5.0,
                    magnitude: -3.5,
                },
                BrightnessBand {
                    min_elevation_deg: 40.0,
                    min_duration_minutes: 4.0,
                    magnitude: -2.5,
                },
                BrightnessBand {
                    min_elevation_deg: 20.0,
                    min_duration_minutes: 3.0,
                    magnitude: -1.5,
                },
            ],
            floor_magnitude: -0.5,
        }
    }
}

impl BrightnessHeuristic {
    pub fn estimate(&self, max_elevation_deg: f64, duration_minutes: f64) -> f64 {
        self.bands
            .iter()
            .find(|b| {
                max_elevation_deg > b.min_elevation_deg && duration_minutes > b.min_duration_minutes
            })
            .map(|b| b.magnitude)
            .unwrap_or(self.floor_magnitude)
    }
}

pub fn describe_magnitude(magnitude: f64) -> &'static str {
    if magnitude <= -3.0 {
        "★★★★ Extremely bright like Venus"
    } else if magnitude <= -2.0 {
        "★★★☆ Very bright like Jupiter"
    } else if magnitude <= -1.0 {
        "★★☆☆ Bright like a star"
    } else {
        "★☆☆☆ Visible"
    }
}

/// Which daylight passes are still worth showing.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct BrightDayHeuristic {
    /// Lower edge of the "high in the sky" band.
    pub min_elevation_deg: f64,
    pub min_duration_minutes: f64,
}

impl Default for BrightDayHeuristic {
    fn default() -> Self {
        Self {
            min_elevation_deg: 45.0,
            min_duration_minutes: 5.0,
        }
    }
}

impl BrightDayHeuristic {
    pub fn is_bright(&self, pass: &PassCalculation) -> bool {
        pass.max_elevation_deg >= self.min_elevation_deg
            || pass.duration_minutes >= self.min_duration_minutes
    }
}
