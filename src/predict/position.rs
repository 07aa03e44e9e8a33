use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::predict::error::PredictError;
use crate::predict::local_reference::{ground_distance_km, initial_bearing_deg, CompassPoint};
use crate::predict::observer::Observer;
use crate::predict::propagation::{eci_to_ecef, gmst, look_angles, Sgp4Propagator};

/// Where the satellite is right now.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SatellitePosition {
    pub timestamp: DateTime<Utc>,
    /// Geodetic sub-satellite point, WGS-84.
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_km: f64,
    /// Inertial speed.
    pub velocity_km_s: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative: Option<RelativePosition>,
}

/// The satellite as seen from an observer.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RelativePosition {
    /// Great-circle distance to the sub-satellite point.
    pub ground_distance_km: f64,
    /// Bearing along the ground toward the sub-satellite point.
    pub bearing_deg: f64,
    pub direction: String,
    /// Straight-line distance to the satellite.
    pub range_km: f64,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub above_horizon: bool,
}

pub fn current_position(
    propagator: &Sgp4Propagator,
    observer: Option<&Observer>,
    now: DateTime<Utc>,
) -> Result<SatellitePosition, PredictError> {
    let (position, velocity) = propagator.state(now)?;
    let sub_point = Observer::from_ecef_km(eci_to_ecef(position.as_array(), gmst(now)));
    let [vx, vy, vz] = velocity;

    let relative = observer.map(|observer| {
        let angles = look_angles(observer, &position, now);
        let bearing_deg = initial_bearing_deg(
            observer.latitude_deg,
            observer.longitude_deg,
            sub_point.latitude_deg,
            sub_point.longitude_deg,
        );
        RelativePosition {
            ground_distance_km: ground_distance_km(
                observer.latitude_deg,
                observer.longitude_deg,
                sub_point.latitude_deg,
                sub_point.longitude_deg,
            ),
            bearing_deg,
            direction: CompassPoint::from_azimuth(bearing_deg)
                .abbreviation()
                .to_string(),
            range_km: angles.range_km,
            azimuth_deg: angles.azimuth_deg,
            elevation_deg: angles.elevation_deg,
            above_horizon: angles.elevation_deg > 0.0,
        }
    });

    Ok(SatellitePosition {
        timestamp: now,
        latitude_deg: sub_point.latitude_deg,
        longitude_deg: sub_point.longitude_deg,
        altitude_km: sub_point.height_km,
        velocity_km_s: (vx * vx + vy * vy + vz * vz).sqrt(),
        relative,
    })
}
