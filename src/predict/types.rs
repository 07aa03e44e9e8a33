use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Satellite position in the TEME inertial frame, kilometres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EciPosition {
    pub x_km: f64,
    pub y_km: f64,
    pub z_km: f64,
}

impl EciPosition {
    pub fn as_array(&self) -> [f64; 3] {
        [self.x_km, self.y_km, self.z_km]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct LookAngles {
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub range_km: f64,
}

/// One contiguous interval where the satellite stays above the search threshold.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PassCalculation {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_minutes: f64,
    pub max_elevation_deg: f64,
    pub start_azimuth_deg: f64,
    pub end_azimuth_deg: f64,
    /// Heuristic apparent magnitude, see [`crate::predict::BrightnessHeuristic`].
    pub brightness_magnitude: f64,
}

impl PassCalculation {
    pub fn duration_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
        (end - start).num_milliseconds() as f64 / 60_000.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PassOrigin {
    Computed,
    Synthetic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SearchDirection {
    /// Passes found scanning forward from now.
    Upcoming,
    /// Nothing upcoming; passes from the prior window.
    Past,
    /// Neither window produced a pass.
    None,
}

/// Map coordinate as `[longitude, latitude]` degrees.
pub type LonLat = [f64; 2];

/// A selected pass with everything a presentation layer needs.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClassifiedPass {
    #[serde(flatten)]
    pub pass: PassCalculation,
    pub viewable: bool,
    pub reason: String,
    pub origin: PassOrigin,
    pub from_direction: String,
    pub to_direction: String,
    #[schema(value_type = Vec<f64>)]
    pub local_start_coord: LonLat,
    #[schema(value_type = Vec<f64>)]
    pub local_end_coord: LonLat,
    pub elevation_description: String,
    pub brightness_description: String,
}

impl ClassifiedPass {
    pub fn is_synthetic(&self) -> bool {
        self.origin == PassOrigin::Synthetic
    }
}
