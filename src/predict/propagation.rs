use chrono::{DateTime, Utc};
use sgp4::{Constants, Elements};

use crate::elements::OrbitalElements;
use crate::predict::error::PredictError;
use crate::predict::observer::Observer;
use crate::predict::types::{EciPosition, LookAngles};

/// Anything that can place the satellite in the inertial frame at an instant.
///
/// An `Err` marks a single failed sample; callers scanning over time skip it.
pub trait Propagator {
    fn propagate(&self, instant: DateTime<Utc>) -> Result<EciPosition, PredictError>;
}

pub struct Sgp4Propagator {
    elements: Elements,
    constants: Constants,
}

impl Sgp4Propagator {
    pub fn new(tle: &OrbitalElements) -> Result<Self, PredictError> {
        let elements = tle.to_sgp4()?;
        let constants =
            Constants::from_elements(&elements).map_err(|e| PredictError::InvalidTle {
                name: tle.name.clone(),
                message: e.to_string(),
            })?;
        Ok(Self {
            elements,
            constants,
        })
    }

    pub fn epoch(&self) -> DateTime<Utc> {
        self.elements.datetime.and_utc()
    }

    /// Position and inertial velocity (km/s) at `instant`.
    pub fn state(&self, instant: DateTime<Utc>) -> Result<(EciPosition, [f64; 3]), PredictError> {
        let minutes = self
            .elements
            .datetime_to_minutes_since_epoch(&instant.naive_utc())
            .map_err(|e| PredictError::Propagation(e.to_string()))?;

        let prediction = self
            .constants
            .propagate(minutes)
            .map_err(|e| PredictError::Propagation(e.to_string()))?;

        let [x_km, y_km, z_km] = prediction.position;
        if !(x_km.is_finite() && y_km.is_finite() && z_km.is_finite()) {
            return Err(PredictError::Propagation(format!(
                "non-finite position at {}",
                instant
            )));
        }
        Ok((EciPosition { x_km, y_km, z_km }, prediction.velocity))
    }
}

impl Propagator for Sgp4Propagator {
    fn propagate(&self, instant: DateTime<Utc>) -> Result<EciPosition, PredictError> {
        self.state(instant).map(|(position, _)| position)
    }
}

/// Greenwich mean sidereal time in radians, `[0, 2π)`.
pub fn gmst(instant: DateTime<Utc>) -> f64 {
    sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(&instant.naive_utc()))
        .rem_euclid(std::f64::consts::TAU)
}

pub fn eci_to_ecef(pos_eci: [f64; 3], gmst: f64) -> [f64; 3] {
    let cos_gmst = gmst.cos();
    let sin_gmst = gmst.sin();
    [
        pos_eci[0] * cos_gmst + pos_eci[1] * sin_gmst,
        -pos_eci[0] * sin_gmst + pos_eci[1] * cos_gmst,
        pos_eci[2],
    ]
}

pub fn ecef_to_enu(dr: [f64; 3], lat_rad: f64, lon_rad: f64) -> (f64, f64, f64) {
    let sin_lat = lat_rad.sin();
    let cos_lat = lat_rad.cos();
    let sin_lon = lon_rad.sin();
    let cos_lon = lon_rad.cos();

    let east = -sin_lon * dr[0] + cos_lon * dr[1];
    let north = -sin_lat * cos_lon * dr[0] - sin_lat * sin_lon * dr[1] + cos_lat * dr[2];
    let up = cos_lat * cos_lon * dr[0] + cos_lat * sin_lon * dr[1] + sin_lat * dr[2];
    (east, north, up)
}

pub fn look_angles(
    observer: &Observer,
    position: &EciPosition,
    instant: DateTime<Utc>,
) -> LookAngles {
    let sat_ecef = eci_to_ecef(position.as_array(), gmst(instant));
    let sta_ecef = observer.position_ecef_km();

    let dr = [
        sat_ecef[0] - sta_ecef[0],
        sat_ecef[1] - sta_ecef[1],
        sat_ecef[2] - sta_ecef[2],
    ];
    let range_km = (dr[0] * dr[0] + dr[1] * dr[1] + dr[2] * dr[2]).sqrt();

    let (east, north, up) = ecef_to_enu(dr, observer.lat_rad(), observer.lon_rad());
    let azimuth_deg = east.atan2(north).to_degrees().rem_euclid(360.0);
    let elevation_deg = if range_km > 0.0 {
        (up / range_km).clamp(-1.0, 1.0).asin().to_degrees()
    } else {
        0.0
    };

    LookAngles {
        azimuth_deg,
        elevation_deg,
        range_km,
    }
}

pub fn look_angles_at<P: Propagator + ?Sized>(
    propagator: &P,
    observer: &Observer,
    instant: DateTime<Utc>,
) -> Result<LookAngles, PredictError> {
    let position = propagator.propagate(instant)?;
    Ok(look_angles(observer, &position, instant))
}


#[cfg(test)]
mod tests {
    use super::fakes::*;
    use super::*;
    use chrono::TimeZone;

    fn barcelona() -> Observer {
        Observer::new(41.3851, 2.1734, 0.1)
    }

    fn angle_diff(a: f64, b: f64) -> f64 {
        ((a - b + 180.0).rem_euclid(360.0) - 180.0).abs()
    }

    #[test]
    fn gmst_at_j2000() {
        let j2000 = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        // 280.46061837 deg
        assert!((gmst(j2000) - 4.894_961_2).abs() < 1e-6);
    }

    #[test]
    fn gmst_is_normalised() {
        let mut t = Utc.with_ymd_and_hms(2025, 8, 18, 0, 0, 0).unwrap();
        for _ in 0..48 {
            let g = gmst(t);
            assert!((0.0..std::f64::consts::TAU).contains(&g));
            t += chrono::Duration::minutes(37);
        }
    }

    #[test]
    fn eci_to_ecef_rotates_about_z() {
        let ecef = eci_to_ecef([7000.0, 0.0, 100.0], std::f64::consts::FRAC_PI_2);
        assert!(ecef[0].abs() < 1e-9);
        assert!((ecef[1] + 7000.0).abs() < 1e-9);
        assert_eq!(ecef[2], 100.0);
    }

    #[test]
    fn look_angles_round_trip_through_eci() {
        let observer = barcelona();
        let t = Utc.with_ymd_and_hms(2025, 8, 18, 21, 30, 0).unwrap();
        for (az, el) in [(0.0, 45.0), (90.0, 10.0), (225.0, 70.0), (300.0, -20.0)] {
            let eci = eci_from_look_angles(&observer, az, el, 1200.0, t);
            let angles = look_angles(&observer, &eci, t);
            assert!(angle_diff(angles.azimuth_deg, az) < 1e-6, "az {}", az);
            assert!((angles.elevation_deg - el).abs() < 1e-6, "el {}", el);
            assert!((angles.range_km - 1200.0).abs() < 1e-6);
        }
    }

    #[test]
    fn azimuth_is_in_range() {
        let observer = barcelona();
        let t = Utc.with_ymd_and_hms(2025, 8, 18, 21, 30, 0).unwrap();
        let eci = eci_from_look_angles(&observer, 359.9, 30.0, 900.0, t);
        let angles = look_angles(&observer, &eci, t);
        assert!((0.0..360.0).contains(&angles.azimuth_deg));
    }

    #[test]
    fn sgp4_propagates_iss_near_epoch() {
        let propagator = Sgp4Propagator::new(&OrbitalElements::fallback()).unwrap();
        let t = propagator.epoch() + chrono::Duration::hours(6);
        let pos = propagator.propagate(t).unwrap();
        let radius = (pos.x_km.powi(2) + pos.y_km.powi(2) + pos.z_km.powi(2)).sqrt();
        // ISS orbits roughly 400-430 km up
        assert!((6700.0..6850.0).contains(&radius), "radius {}", radius);
    }

    #[test]
    fn failing_propagator_surfaces_error() {
        let t = Utc.with_ymd_and_hms(2025, 8, 18, 0, 0, 0).unwrap();
        let result = look_angles_at(&FailingPropagator, &barcelona(), t);
        assert!(matches!(result, Err(PredictError::Propagation(_))));
    }
}
