use chrono::{DateTime, Duration, Utc};

use crate::predict::heuristics::BrightnessHeuristic;
use crate::predict::local_clock::LocalClock;
use crate::predict::night::is_night_local;
use crate::predict::types::PassCalculation;

struct Template {
    offset_minutes: i64,
    duration_minutes: i64,
    max_elevation_deg: f64,
    start_azimuth_deg: f64,
    end_azimuth_deg: f64,
}

// +4.5h, +16.8h, +28.3h
const TEMPLATES: [Template; 3] = [
    Template {
        offset_minutes: 270,
        duration_minutes: 6,
        max_elevation_deg: 72.0,
        start_azimuth_deg: 315.0,
        end_azimuth_deg: 135.0,
    },
    Template {
        offset_minutes: 1008,
        duration_minutes: 4,
        max_elevation_deg: 41.0,
        start_azimuth_deg: 225.0,
        end_azimuth_deg: 45.0,
    },
    Template {
        offset_minutes: 1698,
        duration_minutes: 5,
        max_elevation_deg: 58.0,
        start_azimuth_deg: 270.0,
        end_azimuth_deg: 90.0,
    },
];

/// First local evening hour a synthetic pass is moved to when its offset lands in daylight.
/// Every night window contains 20:00-23:00.
const EVENING_HOUR: u32 = 20;

/// Three deterministic placeholder passes after `now`, each starting inside
/// the local night window. They are not predictions; callers tag them
/// [`PassOrigin::Synthetic`](crate::predict::types::PassOrigin).
pub fn synthetic_passes(
    now: DateTime<Utc>,
    latitude_deg: f64,
    clock: &LocalClock,
    brightness: &BrightnessHeuristic,
) -> Vec<PassCalculation> {
    let mut passes: Vec<_> = TEMPLATES
        .iter()
        .zip(0u32..)
        .map(|(template, index)| {
            let start = night_start(
                now + Duration::minutes(template.offset_minutes),
                latitude_deg,
                clock,
                EVENING_HOUR + index,
            );
            let duration = template.duration_minutes as f64;
            PassCalculation {
                start_time: start,
                end_time: start + Duration::minutes(template.duration_minutes),
                duration_minutes: duration,
                max_elevation_deg: template.max_elevation_deg,
                start_azimuth_deg: template.start_azimuth_deg,
                end_azimuth_deg: template.end_azimuth_deg,
                brightness_magnitude: brightness.estimate(template.max_elevation_deg, duration),
            }
        })
        .collect();
    passes.sort_by_key(|p| p.start_time);
    passes
}

/// `start` if it is already night locally, otherwise `evening_hour` on the same local date.
fn night_start(
    start: DateTime<Utc>,
    latitude_deg: f64,
    clock: &LocalClock,
    evening_hour: u32,
) -> DateTime<Utc> {
    let local = clock.local_time(start);
    if is_night_local(&local, latitude_deg) {
        return start;
    }
    local
        .date_naive()
        .and_hms_opt(evening_hour, 0, 0)
        .and_then(|naive| clock.to_utc(&naive))
        .unwrap_or(start)
}
