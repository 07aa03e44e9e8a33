use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

use crate::predict::error::PredictError;
use crate::predict::observer::Observer;

const MAX_UTC_OFFSET_HOURS: f64 = 14.0;

/// The wall clock an observer reads night and evening hours from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocalClock {
    /// IANA zone, daylight saving included.
    Zone(Tz),
    Fixed(FixedOffset),
    /// Zone of the machine running the process.
    System,
}

impl LocalClock {
    /// Builds a clock from user options. A fixed offset overrides the zone name.
    /// `Ok(None)` when neither is given.
    pub fn from_options(
        time_zone: Option<&str>,
        utc_offset_hours: Option<f64>,
    ) -> Result<Option<Self>, PredictError> {
        if let Some(hours) = utc_offset_hours {
            return Self::fixed_hours(hours).map(Some);
        }
        time_zone
            .map(|name| {
                name.trim()
                    .parse::<Tz>()
                    .map(LocalClock::Zone)
                    .map_err(|e| {
                        PredictError::InvalidSettings(format!("unknown time zone {:?}: {}", name, e))
                    })
            })
            .transpose()
    }

    pub fn fixed_hours(hours: f64) -> Result<Self, PredictError> {
        if !hours.is_finite() || hours.abs() > MAX_UTC_OFFSET_HOURS {
            return Err(PredictError::InvalidSettings(
                "utc_offset_hours must be within ±14".into(),
            ));
        }
        FixedOffset::east_opt((hours * 3600.0).round() as i32)
            .map(LocalClock::Fixed)
            .ok_or_else(|| PredictError::InvalidSettings(format!("bad UTC offset {}", hours)))
    }

    /// Mean solar time at the observer's longitude, whole hours, no daylight saving.
    pub fn solar(observer: &Observer) -> Self {
        Self::fixed_hours(observer.solar_utc_offset_hours())
            .unwrap_or(LocalClock::Fixed(Utc.fix()))
    }

    /// Offset in force at `instant`. Changes across daylight-saving transitions for zones.
    pub fn offset_at(&self, instant: DateTime<Utc>) -> FixedOffset {
        match self {
            LocalClock::Zone(tz) => instant.with_timezone(tz).offset().fix(),
            LocalClock::Fixed(offset) => *offset,
            LocalClock::System => instant.with_timezone(&Local).offset().fix(),
        }
    }

    pub fn local_time(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        instant.with_timezone(&self.offset_at(instant))
    }

    /// UTC instant of a local wall-clock time. Ambiguous times take the earlier
    /// reading; times skipped by a transition give `None`.
    pub fn to_utc(&self, local: &NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            LocalClock::Zone(tz) => resolve(tz, local),
            LocalClock::Fixed(offset) => resolve(offset, local),
            LocalClock::System => resolve(&Local, local),
        }
    }

    pub fn name(&self) -> String {
        match self {
            LocalClock::Zone(tz) => tz.name().to_string(),
            LocalClock::Fixed(offset) => format!("UTC{}", offset),
            LocalClock::System => "local".to_string(),
        }
    }
}

fn resolve<Z: TimeZone>(zone: &Z, local: &NaiveDateTime) -> Option<DateTime<Utc>> {
    zone.from_local_datetime(local)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
}
