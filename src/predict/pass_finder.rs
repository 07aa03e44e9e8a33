use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::predict::error::PredictError;
use crate::predict::heuristics::BrightnessHeuristic;
use crate::predict::observer::Observer;
use crate::predict::propagation::{look_angles_at, Propagator};
use crate::predict::types::{PassCalculation, SearchDirection};

const COARSE_STEP: Duration = Duration::minutes(5);
const FINE_STEP: Duration = Duration::seconds(15);
const REFINE_BEFORE: Duration = Duration::minutes(15);
const REFINE_AFTER: Duration = Duration::minutes(25);
const EXCLUSION_BUFFER: Duration = Duration::minutes(30);
const MIN_PASS_MINUTES: f64 = 2.0;

pub const MAX_SEARCH_DAYS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub days: u32,
    pub min_elevation_deg: f64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            days: 14,
            min_elevation_deg: 5.0,
        }
    }
}

impl SearchSettings {
    pub fn validate(&self) -> Result<(), PredictError> {
        if self.days == 0 || self.days > MAX_SEARCH_DAYS {
            return Err(PredictError::InvalidSettings(format!(
                "days must be between 1 and {}",
                MAX_SEARCH_DAYS
            )));
        }
        if !(0.0..90.0).contains(&self.min_elevation_deg) {
            return Err(PredictError::InvalidSettings(
                "min_elevation must be in [0, 90)".into(),
            ));
        }
        Ok(())
    }
}

/// Coarse-scan accumulator. `excluded_until` suppresses seeds that belong
/// to a pass already accepted.
#[derive(Default)]
struct ScanState {
    passes: Vec<PassCalculation>,
    excluded_until: Option<DateTime<Utc>>,
    samples: usize,
    failed: usize,
}

/// Find every pass above `min_elevation_deg` within `window_days` of `window_start`.
///
/// Samples that fail to propagate are skipped. An empty result is a valid outcome.
pub fn find_passes<P: Propagator + ?Sized>(
    propagator: &P,
    observer: &Observer,
    window_start: DateTime<Utc>,
    window_days: u32,
    min_elevation_deg: f64,
    brightness: &BrightnessHeuristic,
) -> Result<Vec<PassCalculation>, PredictError> {
    observer.validate()?;

    let window_end = Duration::try_days(i64::from(window_days))
        .and_then(|span| window_start.checked_add_signed(span))
        .ok_or_else(|| {
            PredictError::InvalidSettings(format!("{} day window is out of range", window_days))
        })?;
    let coarse = std::iter::successors(Some(window_start), |t| Some(*t + COARSE_STEP))
        .take_while(|t| *t < window_end);

    let state = coarse.fold(ScanState::default(), |mut state, t| {
        state.samples += 1;
        if state.excluded_until.is_some_and(|until| t < until) {
            return state;
        }

        match look_angles_at(propagator, observer, t) {
            Ok(angles) if angles.elevation_deg > min_elevation_deg => {}
            Ok(_) => return state,
            Err(e) => {
                log::trace!("Skipping coarse sample {}: {}", t, e);
                state.failed += 1;
                return state;
            }
        }

        if let Some(pass) = refine_pass(propagator, observer, t, min_elevation_deg, brightness) {
            if pass.duration_minutes >= MIN_PASS_MINUTES {
                log::debug!(
                    "Pass {} -> {} ({:.1} min, max {:.1}°)",
                    pass.start_time,
                    pass.end_time,
                    pass.duration_minutes,
                    pass.max_elevation_deg
                );
                state.excluded_until = Some(pass.end_time + EXCLUSION_BUFFER);
                state.passes.push(pass);
            }
        }
        state
    });

    log::info!(
        "Checked {} samples from {} ({} failed), found {} passes",
        state.samples,
        window_start,
        state.failed,
        state.passes.len()
    );
    Ok(state.passes)
}

/// Searches upcoming passes first and, if there are none, the window just before `now`.
pub fn search_with_fallback<P: Propagator + ?Sized>(
    propagator: &P,
    observer: &Observer,
    now: DateTime<Utc>,
    settings: &SearchSettings,
    brightness: &BrightnessHeuristic,
) -> Result<(SearchDirection, Vec<PassCalculation>), PredictError> {
    settings.validate()?;

    let upcoming = find_passes(
        propagator,
        observer,
        now,
        settings.days,
        settings.min_elevation_deg,
        brightness,
    )?;
    if !upcoming.is_empty() {
        return Ok((SearchDirection::Upcoming, upcoming));
    }

    log::info!("No upcoming passes, searching the previous {} days", settings.days);
    let past_start = Duration::try_days(i64::from(settings.days))
        .and_then(|span| now.checked_sub_signed(span))
        .ok_or_else(|| PredictError::InvalidSettings("search window is out of range".into()))?;
    let past = find_passes(
        propagator,
        observer,
        past_start,
        settings.days,
        settings.min_elevation_deg,
        brightness,
    )?;
    if past.is_empty() {
        Ok((SearchDirection::None, past))
    } else {
        Ok((SearchDirection::Past, past))
    }
}

/// Re-scan around a coarse seed at fine resolution. Returns `None` when no
/// fine sample clears the threshold.
fn refine_pass<P: Propagator + ?Sized>(
    propagator: &P,
    observer: &Observer,
    seed: DateTime<Utc>,
    min_elevation_deg: f64,
    brightness: &BrightnessHeuristic,
) -> Option<PassCalculation> {
    let search_end = seed + REFINE_AFTER;
    let mut start: Option<(DateTime<Utc>, f64)> = None;
    let mut end: Option<(DateTime<Utc>, f64)> = None;
    let mut max_elevation = f64::MIN;

    let mut cursor = seed - REFINE_BEFORE;
    while cursor <= search_end {
        if let Ok(angles) = look_angles_at(propagator, observer, cursor) {
            if angles.elevation_deg > min_elevation_deg {
                if start.is_none() {
                    start = Some((cursor, angles.azimuth_deg));
                }
                end = Some((cursor, angles.azimuth_deg));
                max_elevation = max_elevation.max(angles.elevation_deg);
            }
        }
        cursor += FINE_STEP;
    }

    let ((start_time, start_az), (end_time, end_az)) = (start?, end?);
    let duration_minutes = PassCalculation::duration_between(start_time, end_time);

    Some(PassCalculation {
        start_time,
        end_time,
        duration_minutes,
        max_elevation_deg: max_elevation,
        start_azimuth_deg: round2(start_az),
        end_azimuth_deg: round2(end_az),
        brightness_magnitude: brightness.estimate(max_elevation, duration_minutes),
    })
}

fn round2(v: f64) -> f64 {
    ((v * 100.0).round() / 100.0).rem_euclid(360.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::OrbitalElements;
    use crate::predict::propagation::fakes::{FailingPropagator, ScriptedSky};
    use crate::predict::propagation::Sgp4Propagator;
    use chrono::TimeZone;

    fn barcelona() -> Observer {
        Observer::new(41.3851, 2.1734, 0.1)
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 18, 0, 0, 0).unwrap()
    }

    /// Triangular elevation profile peaking at `peak` halfway through each window,
    /// from 0° at its edges. Below the horizon everywhere else.
    fn sky(
        windows: Vec<(DateTime<Utc>, i64, f64)>,
    ) -> ScriptedSky<impl Fn(DateTime<Utc>) -> Option<(f64, f64)>> {
        ScriptedSky {
            observer: barcelona(),
            script: move |t: DateTime<Utc>| {
                for (start, minutes, peak) in &windows {
                    let end = *start + Duration::minutes(*minutes);
                    if t >= *start && t <= end {
                        let half = *minutes as f64 * 30.0;
                        let elapsed = (t - *start).num_seconds() as f64;
                        let from_mid = (elapsed - half).abs();
                        let elevation = peak * (1.0 - from_mid / half);
                        let azimuth = 300.0 - 180.0 * elapsed / (half * 2.0);
                        return Some((azimuth, elevation));
                    }
                }
                Some((0.0, -30.0))
            },
        }
    }

    #[test]
    fn refines_single_pass() {
        let start = t0() + Duration::minutes(62);
        let propagator = sky(vec![(start, 8, 40.0)]);

        let passes = find_passes(
            &propagator,
            &barcelona(),
            t0(),
            1,
            5.0,
            &BrightnessHeuristic::default(),
        )
        .unwrap();

        assert_eq!(passes.len(), 1);
        let pass = &passes[0];
        assert!(pass.start_time > start && pass.start_time < start + Duration::minutes(1));
        assert!(pass.end_time < start + Duration::minutes(8));
        assert!(pass.start_time < pass.end_time);
        assert_eq!(
            pass.duration_minutes,
            (pass.end_time - pass.start_time).num_milliseconds() as f64 / 60_000.0
        );
        assert!((pass.max_elevation_deg - 40.0).abs() < 1e-6);
        assert!(pass.start_azimuth_deg > pass.end_azimuth_deg);
    }

    #[test]
    fn seeds_inside_one_pass_collapse() {
        // About 12.5 minutes above threshold, covering three coarse samples.
        let start = t0() + Duration::minutes(3);
        let propagator = sky(vec![(start, 14, 60.0)]);

        let passes = find_passes(
            &propagator,
            &barcelona(),
            t0(),
            1,
            5.0,
            &BrightnessHeuristic::default(),
        )
        .unwrap();

        assert_eq!(passes.len(), 1);
    }

    #[test]
    fn exclusion_buffer_swallows_close_followup() {
        // A second window starting 25 minutes after the first ends is inside
        // the 30 minute buffer; one 90 minutes later is not.
        let first = t0() + Duration::minutes(61);
        let propagator = sky(vec![
            (first, 6, 50.0),
            (first + Duration::minutes(31), 6, 50.0),
            (first + Duration::minutes(96), 6, 50.0),
        ]);

        let passes = find_passes(
            &propagator,
            &barcelona(),
            t0(),
            1,
            5.0,
            &BrightnessHeuristic::default(),
        )
        .unwrap();

        assert_eq!(passes.len(), 2);
        assert!(passes[1].start_time > passes[0].end_time + EXCLUSION_BUFFER);
    }

    #[test]
    fn discards_grazing_passes() {
        // About a minute and a half above 5°.
        let propagator = sky(vec![(t0() + Duration::minutes(59), 3, 12.0)]);

        let passes = find_passes(
            &propagator,
            &barcelona(),
            t0(),
            1,
            5.0,
            &BrightnessHeuristic::default(),
        )
        .unwrap();

        assert!(passes.is_empty());
    }

    #[test]
    fn failed_samples_are_skipped() {
        let start = t0() + Duration::minutes(121);
        let inner = sky(vec![(start, 8, 45.0)]);
        // Fail every coarse sample but the one inside the pass.
        let propagator = ScriptedSky {
            observer: barcelona(),
            script: move |t: DateTime<Utc>| {
                let seconds = (t - t0()).num_seconds();
                if seconds % 300 == 0 && !(t > start && t < start + Duration::minutes(8)) {
                    None
                } else {
                    (inner.script)(t)
                }
            },
        };

        let passes = find_passes(
            &propagator,
            &barcelona(),
            t0(),
            1,
            5.0,
            &BrightnessHeuristic::default(),
        )
        .unwrap();

        assert_eq!(passes.len(), 1);
    }

    #[test]
    fn total_propagation_failure_yields_empty() {
        let passes = find_passes(
            &FailingPropagator,
            &barcelona(),
            t0(),
            2,
            5.0,
            &BrightnessHeuristic::default(),
        )
        .unwrap();
        assert!(passes.is_empty());

        let (direction, passes) = search_with_fallback(
            &FailingPropagator,
            &barcelona(),
            t0(),
            &SearchSettings::default(),
            &BrightnessHeuristic::default(),
        )
        .unwrap();
        assert_eq!(direction, SearchDirection::None);
        assert!(passes.is_empty());
    }

    #[test]
    fn oversized_window_is_an_error() {
        let propagator = FailingPropagator;
        let result = find_passes(
            &propagator,
            &barcelona(),
            t0(),
            u32::MAX,
            5.0,
            &BrightnessHeuristic::default(),
        );
        assert!(matches!(result, Err(PredictError::InvalidSettings(_))));
    }

    #[test]
    fn search_rejects_settings_out_of_range() {
        let propagator = FailingPropagator;
        for settings in [
            SearchSettings { days: 0, min_elevation_deg: 5.0 },
            SearchSettings { days: 31, min_elevation_deg: 5.0 },
            SearchSettings { days: u32::MAX, min_elevation_deg: 5.0 },
            SearchSettings { days: 7, min_elevation_deg: 90.0 },
            SearchSettings { days: 7, min_elevation_deg: -1.0 },
            SearchSettings { days: 7, min_elevation_deg: f64::NAN },
        ] {
            let result = search_with_fallback(
                &propagator,
                &barcelona(),
                t0(),
                &settings,
                &BrightnessHeuristic::default(),
            );
            assert!(
                matches!(result, Err(PredictError::InvalidSettings(_))),
                "{:?}",
                settings
            );
        }
        assert!(SearchSettings { days: 30, min_elevation_deg: 0.0 }.validate().is_ok());
    }

    #[test]
    fn falls_back_to_previous_window() {
        let propagator = sky(vec![(t0() - Duration::hours(30), 7, 55.0)]);

        let (direction, passes) = search_with_fallback(
            &propagator,
            &barcelona(),
            t0(),
            &SearchSettings {
                days: 3,
                min_elevation_deg: 5.0,
            },
            &BrightnessHeuristic::default(),
        )
        .unwrap();

        assert_eq!(direction, SearchDirection::Past);
        assert_eq!(passes.len(), 1);
        assert!(passes[0].end_time < t0());
    }

    #[test]
    fn invalid_observer_fails_fast() {
        let result = find_passes(
            &FailingPropagator,
            &Observer::new(0.0, 0.0, 0.0),
            t0(),
            1,
            5.0,
            &BrightnessHeuristic::default(),
        );
        assert!(matches!(result, Err(PredictError::InvalidObserver(_))));
    }

    #[test]
    fn barcelona_iss_passes_are_physical() {
        let propagator = Sgp4Propagator::new(&OrbitalElements::fallback()).unwrap();
        let start = propagator.epoch() + Duration::days(1);

        let passes = find_passes(
            &propagator,
            &barcelona(),
            start,
            14,
            5.0,
            &BrightnessHeuristic::default(),
        )
        .unwrap();

        assert!(!passes.is_empty());
        for pair in passes.windows(2) {
            assert!(pair[0].start_time < pair[1].start_time);
            assert!(pair[0].end_time < pair[1].start_time);
        }
        for pass in &passes {
            assert!(pass.start_time < pass.end_time);
            assert!(pass.duration_minutes >= 2.0 && pass.duration_minutes <= 10.0);
            assert!(pass.max_elevation_deg >= 5.0 && pass.max_elevation_deg <= 90.0);
            assert!((0.0..360.0).contains(&pass.start_azimuth_deg));
            assert!((0.0..360.0).contains(&pass.end_azimuth_deg));
        }
    }
}
