use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::predict::error::PredictError;

// WGS-84
const EARTH_EQUATORIAL_RADIUS_KM: f64 = 6378.137;
const EARTH_ECCENTRICITY_SQ: f64 = 0.006_694_379_990_14;

/// Observer on the ground. Supplied per prediction call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Observer {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    #[serde(default)]
    pub height_km: f64,
}

impl Observer {
    pub fn new(latitude_deg: f64, longitude_deg: f64, height_km: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
            height_km,
        }
    }

    /// Parses `"lat, lon"` as found in config files.
    pub fn from_coordinates(coordinates: &str, height_km: Option<f64>) -> Option<Self> {
        let parts: Vec<_> = coordinates.split(',').map(|s| s.trim()).collect();
        if parts.len() < 2 {
            return None;
        }
        let lat = parts[0].parse().ok()?;
        let lon = parts[1].parse().ok()?;
        Some(Self::new(lat, lon, height_km.unwrap_or(0.0)))
    }

    /// Rejects coordinates that would produce meaningless geometry.
    ///
    /// `(0, 0)` is treated as "no location" since that is what an
    /// unresolved location provider hands over.
    pub fn validate(&self) -> Result<(), PredictError> {
        if !self.latitude_deg.is_finite()
            || !self.longitude_deg.is_finite()
            || !self.height_km.is_finite()
        {
            return Err(PredictError::InvalidObserver(format!(
                "non-finite coordinates ({}, {}, {} km)",
                self.latitude_deg, self.longitude_deg, self.height_km
            )));
        }
        if self.latitude_deg == 0.0 && self.longitude_deg == 0.0 {
            return Err(PredictError::InvalidObserver(
                "coordinates (0, 0) are not a resolved location".into(),
            ));
        }
        if self.latitude_deg.abs() > 90.0 || self.longitude_deg.abs() > 180.0 {
            return Err(PredictError::InvalidObserver(format!(
                "coordinates out of range ({}, {})",
                self.latitude_deg, self.longitude_deg
            )));
        }
        Ok(())
    }

    pub fn lat_rad(&self) -> f64 {
        self.latitude_deg.to_radians()
    }

    pub fn lon_rad(&self) -> f64 {
        self.longitude_deg.to_radians()
    }

    pub fn position_ecef_km(&self) -> [f64; 3] {
        let lat = self.lat_rad();
        let lon = self.lon_rad();
        let sin_lat = lat.sin();
        let cos_lat = lat.cos();
        let n = EARTH_EQUATORIAL_RADIUS_KM / (1.0 - EARTH_ECCENTRICITY_SQ * sin_lat * sin_lat).sqrt();
        let x = (n + self.height_km) * cos_lat * lon.cos();
        let y = (n + self.height_km) * cos_lat * lon.sin();
        let z = (n * (1.0 - EARTH_ECCENTRICITY_SQ) + self.height_km) * sin_lat;
        [x, y, z]
    }

    /// Geodetic point under an Earth-fixed position. Inverse of [`Self::position_ecef_km`].
    pub fn from_ecef_km(ecef: [f64; 3]) -> Self {
        let [x, y, z] = ecef;
        let p = (x * x + y * y).sqrt();
        let longitude = y.atan2(x);

        let prime_vertical = |lat: f64| {
            EARTH_EQUATORIAL_RADIUS_KM / (1.0 - EARTH_ECCENTRICITY_SQ * lat.sin().powi(2)).sqrt()
        };
        let mut latitude = z.atan2(p * (1.0 - EARTH_ECCENTRICITY_SQ));
        for _ in 0..6 {
            let n = prime_vertical(latitude);
            let height = p / latitude.cos() - n;
            latitude = z.atan2(p * (1.0 - EARTH_ECCENTRICITY_SQ * n / (n + height)));
        }
        let height_km = p / latitude.cos() - prime_vertical(latitude);

        Self::new(latitude.to_degrees(), longitude.to_degrees(), height_km)
    }

    /// Mean-solar UTC offset in whole hours, used when no local offset is configured.
    pub fn solar_utc_offset_hours(&self) -> f64 {
        (self.longitude_deg / 15.0).round()
    }
}
