use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::predict::PredictError;

pub const MIN_LINE_LENGTH: usize = 60;

const FALLBACK_NAME: &str = "ISS (ZARYA) - FALLBACK";
const FALLBACK_LINE1: &str =
    "1 25544U 98067A   25229.89652778  .00013208  00000-0  24090-3 0  9994";
const FALLBACK_LINE2: &str =
    "2 25544  51.6429 339.5850 0003961  62.1749  65.3031 15.49254649433197";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementsOrigin {
    Live { provider: String },
    /// Bundled snapshot used when every provider failed. Accuracy degrades
    /// with distance from its epoch.
    StaleFallback,
}

/// A two-line element set. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct OrbitalElements {
    pub name: String,
    pub line1: String,
    pub line2: String,
    pub origin: ElementsOrigin,
}

impl OrbitalElements {
    pub fn fallback() -> Self {
        Self {
            name: FALLBACK_NAME.to_string(),
            line1: FALLBACK_LINE1.to_string(),
            line2: FALLBACK_LINE2.to_string(),
            origin: ElementsOrigin::StaleFallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.origin == ElementsOrigin::StaleFallback
    }

    pub fn to_sgp4(&self) -> Result<sgp4::Elements, PredictError> {
        sgp4::Elements::from_tle(
            Some(self.name.clone()),
            self.line1.as_bytes(),
            self.line2.as_bytes(),
        )
        .map_err(|e| PredictError::InvalidTle {
            name: self.name.clone(),
            message: e.to_string(),
        })
    }

    /// Structural checks plus a full sgp4 parse.
    pub fn validate(&self) -> Result<(), String> {
        if self.line1.len() < MIN_LINE_LENGTH || self.line2.len() < MIN_LINE_LENGTH {
            return Err(format!(
                "lines too short ({} and {} chars, need {})",
                self.line1.len(),
                self.line2.len(),
                MIN_LINE_LENGTH
            ));
        }
        if !self.line1.starts_with("1 ") || !self.line2.starts_with("2 ") {
            return Err("line numbers out of order".into());
        }
        self.to_sgp4().map(|_| ()).map_err(|e| e.to_string())
    }
}

/// Which catalog object the source looks for.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SatelliteTarget {
    pub norad_id: u32,
    pub name_hint: String,
}

impl Default for SatelliteTarget {
    fn default() -> Self {
        Self {
            norad_id: 25544,
            name_hint: "ISS".to_string(),
        }
    }
}

impl SatelliteTarget {
    /// True when a TLE line 1 carries this catalog number.
    pub fn matches_line1(&self, line1: &str) -> bool {
        line1
            .get(2..7)
            .and_then(|id| id.trim().parse::<u32>().ok())
            .is_some_and(|id| id == self.norad_id)
    }
}
