use crate::predict::observer::Observer;
use crate::predict::types::LonLat;

const EARTH_MEAN_RADIUS_KM: f64 = 6371.0;
pub const REFERENCE_DISTANCE_KM: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompassPoint {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

const COMPASS_POINTS: [CompassPoint; 8] = [
    CompassPoint::N,
    CompassPoint::NE,
    CompassPoint::E,
    CompassPoint::SE,
    CompassPoint::S,
    CompassPoint::SW,
    CompassPoint::W,
    CompassPoint::NW,
];

impl CompassPoint {
    /// Nearest of the 8 points; halfway bearings round clockwise.
    pub fn from_azimuth(azimuth_deg: f64) -> Self {
        let sector = (azimuth_deg.rem_euclid(360.0) / 45.0).round() as usize % 8;
        COMPASS_POINTS[sector]
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            CompassPoint::N => "N",
            CompassPoint::NE => "NE",
            CompassPoint::E => "E",
            CompassPoint::SE => "SE",
            CompassPoint::S => "S",
            CompassPoint::SW => "SW",
            CompassPoint::W => "W",
            CompassPoint::NW => "NW",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElevationBand {
    AlmostOverhead,
    High,
    Medium,
    Low,
    NearHorizon,
}

impl ElevationBand {
    pub fn from_elevation(max_elevation_deg: f64) -> Self {
        match max_elevation_deg {
            e if e >= 70.0 => ElevationBand::AlmostOverhead,
            e if e >= 45.0 => ElevationBand::High,
            e if e >= 25.0 => ElevationBand::Medium,
            e if e >= 15.0 => ElevationBand::Low,
            _ => ElevationBand::NearHorizon,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ElevationBand::AlmostOverhead => "Almost overhead",
            ElevationBand::High => "High in the sky",
            ElevationBand::Medium => "Medium height",
            ElevationBand::Low => "Low in the sky",
            ElevationBand::NearHorizon => "Close to horizon",
        }
    }
}

/// Human-facing directions and nearby map points for a pass.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalReference {
    pub from_direction: CompassPoint,
    pub to_direction: CompassPoint,
    pub start_coord: LonLat,
    pub end_coord: LonLat,
    pub elevation: ElevationBand,
}

/// Point `distance_km` from `(lat, lon)` along `bearing_deg` on a spherical Earth.
/// Returns `[lon, lat]` with longitude wrapped to `[-180, 180)`.
pub fn destination_point(
    latitude_deg: f64,
    longitude_deg: f64,
    bearing_deg: f64,
    distance_km: f64,
) -> LonLat {
    let lat1 = latitude_deg.to_radians();
    let lon1 = longitude_deg.to_radians();
    let bearing = bearing_deg.to_radians();
    let delta = distance_km / EARTH_MEAN_RADIUS_KM;

    let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * bearing.cos()).asin();
    let lon2 = lon1
        + (bearing.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());

    let lon2_deg = (lon2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0;
    [lon2_deg, lat2.to_degrees()]
}

/// Great-circle distance between two points on a spherical Earth.
pub fn ground_distance_km(
    from_lat_deg: f64,
    from_lon_deg: f64,
    to_lat_deg: f64,
    to_lon_deg: f64,
) -> f64 {
    let d_lat = (to_lat_deg - from_lat_deg).to_radians();
    let d_lon = (to_lon_deg - from_lon_deg).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + from_lat_deg.to_radians().cos()
            * to_lat_deg.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);
    EARTH_MEAN_RADIUS_KM * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Initial great-circle bearing from the first point toward the second, `[0, 360)`.
pub fn initial_bearing_deg(
    from_lat_deg: f64,
    from_lon_deg: f64,
    to_lat_deg: f64,
    to_lon_deg: f64,
) -> f64 {
    let (lat1, lat2) = (from_lat_deg.to_radians(), to_lat_deg.to_radians());
    let d_lon = (to_lon_deg - from_lon_deg).to_radians();
    let y = d_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();
    y.atan2(x).to_degrees().rem_euclid(360.0)
}

pub fn project(
    observer: &Observer,
    start_azimuth_deg: f64,
    end_azimuth_deg: f64,
    max_elevation_deg: f64,
) -> LocalReference {
    let point = |azimuth| {
        destination_point(
            observer.latitude_deg,
            observer.longitude_deg,
            azimuth,
            REFERENCE_DISTANCE_KM,
        )
    };
    LocalReference {
        from_direction: CompassPoint::from_azimuth(start_azimuth_deg),
        to_direction: CompassPoint::from_azimuth(end_azimuth_deg),
        start_coord: point(start_azimuth_deg),
        end_coord: point(end_azimuth_deg),
        elevation: ElevationBand::from_elevation(max_elevation_deg),
    }
}
