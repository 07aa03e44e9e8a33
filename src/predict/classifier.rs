use chrono::{DateTime, Utc};

use crate::predict::fallback::synthetic_passes;
use crate::predict::heuristics::{describe_magnitude, BrightDayHeuristic, BrightnessHeuristic};
use crate::predict::local_clock::LocalClock;
use crate::predict::local_reference::project;
use crate::predict::night::is_night_local;
use crate::predict::observer::Observer;
use crate::predict::types::{ClassifiedPass, PassCalculation, PassOrigin};

pub const MAX_SELECTED: usize = 3;

pub const NIGHT_REASON: &str = "Perfect night viewing";
pub const DAYLIGHT_REASON: &str = "Daylight pass - not visible";
pub const SYNTHETIC_REASON: &str = "Synthetic fallback - no computed passes";

const DAY_BRIGHTNESS: &str = "Day pass - not visible";
const SYNTHETIC_BRIGHTNESS: &str = "Unknown - simulated pass";

/// A pass picked for presentation, before local projection.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedPass {
    pub pass: PassCalculation,
    pub viewable: bool,
    pub reason: &'static str,
    pub origin: PassOrigin,
}

impl SelectedPass {
    fn night(pass: PassCalculation) -> Self {
        Self {
            pass,
            viewable: true,
            reason: NIGHT_REASON,
            origin: PassOrigin::Computed,
        }
    }

    fn day(pass: PassCalculation) -> Self {
        Self {
            pass,
            viewable: false,
            reason: DAYLIGHT_REASON,
            origin: PassOrigin::Computed,
        }
    }

    fn synthetic(pass: PassCalculation) -> Self {
        Self {
            pass,
            viewable: false,
            reason: SYNTHETIC_REASON,
            origin: PassOrigin::Synthetic,
        }
    }

    pub fn project(self, observer: &Observer) -> ClassifiedPass {
        let reference = project(
            observer,
            self.pass.start_azimuth_deg,
            self.pass.end_azimuth_deg,
            self.pass.max_elevation_deg,
        );
        let brightness_description = match (self.origin, self.viewable) {
            (PassOrigin::Synthetic, _) => SYNTHETIC_BRIGHTNESS,
            (PassOrigin::Computed, true) => describe_magnitude(self.pass.brightness_magnitude),
            (PassOrigin::Computed, false) => DAY_BRIGHTNESS,
        };
        ClassifiedPass {
            pass: self.pass,
            viewable: self.viewable,
            reason: self.reason.to_string(),
            origin: self.origin,
            from_direction: reference.from_direction.abbreviation().to_string(),
            to_direction: reference.to_direction.abbreviation().to_string(),
            local_start_coord: reference.start_coord,
            local_end_coord: reference.end_coord,
            elevation_description: reference.elevation.description().to_string(),
            brightness_description: brightness_description.to_string(),
        }
    }
}

/// Picks up to three passes to show an observer at `latitude_deg` who reads
/// time from `clock`.
pub struct PassClassifier {
    pub latitude_deg: f64,
    pub clock: LocalClock,
    pub bright_day: BrightDayHeuristic,
    pub brightness: BrightnessHeuristic,
}

impl PassClassifier {
    pub fn is_night(&self, pass: &PassCalculation) -> bool {
        is_night_local(&self.clock.local_time(pass.start_time), self.latitude_deg)
    }

    /// Night passes first, topped up with daylight passes, ordered by start time.
    /// An empty input yields exactly three synthetic passes after `now`.
    pub fn classify(&self, mut passes: Vec<PassCalculation>, now: DateTime<Utc>) -> Vec<SelectedPass> {
        if passes.is_empty() {
            log::warn!("No computed passes, using synthetic fallback");
            return synthetic_passes(now, self.latitude_deg, &self.clock, &self.brightness)
                .into_iter()
                .map(SelectedPass::synthetic)
                .collect();
        }

        passes.sort_by_key(|p| p.start_time);
        let (night, day): (Vec<_>, Vec<_>) = passes.into_iter().partition(|p| self.is_night(p));
        let (bright_day, dim_day): (Vec<_>, Vec<_>) =
            day.into_iter().partition(|p| self.bright_day.is_bright(p));

        let mut selected: Vec<SelectedPass> = night
            .into_iter()
            .take(MAX_SELECTED)
            .map(SelectedPass::night)
            .collect();

        let missing = MAX_SELECTED - selected.len();
        if selected.is_empty() {
            // Nothing visible at all: bright day passes first, then whatever is left.
            selected.extend(
                bright_day
                    .into_iter()
                    .chain(dim_day)
                    .take(missing)
                    .map(SelectedPass::day),
            );
        } else {
            selected.extend(bright_day.into_iter().take(missing).map(SelectedPass::day));
        }

        selected.sort_by_key(|s| s.pass.start_time);
        log::debug!(
            "Selected {} passes ({} viewable)",
            selected.len(),
            selected.iter().filter(|s| s.viewable).count()
        );
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset, TimeZone};

    fn utc_plus_two() -> FixedOffset {
        FixedOffset::east_opt(2 * 3600).unwrap()
    }

    fn classifier() -> PassClassifier {
        PassClassifier {
            latitude_deg: 41.4,
            clock: LocalClock::Fixed(utc_plus_two()),
            bright_day: BrightDayHeuristic::default(),
            brightness: BrightnessHeuristic::default(),
        }
    }

    /// A pass starting at local `hour:00` on the given August day.
    fn pass_at(day: u32, hour: u32, max_elevation_deg: f64, minutes: i64) -> PassCalculation {
        let start = utc_plus_two()
            .with_ymd_and_hms(2025, 8, day, hour, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        PassCalculation {
            start_time: start,
            end_time: start + Duration::minutes(minutes),
            duration_minutes: minutes as f64,
            max_elevation_deg,
            start_azimuth_deg: 250.0,
            end_azimuth_deg: 60.0,
            brightness_magnitude: BrightnessHeuristic::default()
                .estimate(max_elevation_deg, minutes as f64),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn takes_earliest_three_night_passes() {
        let passes = vec![
            pass_at(5, 22, 30.0, 4),
            pass_at(2, 21, 50.0, 6),
            pass_at(3, 12, 80.0, 6),
            pass_at(4, 5, 20.0, 3),
            pass_at(3, 23, 10.0, 3),
        ];
        let selected = classifier().classify(passes, now());
        assert_eq!(selected.len(), 3);
        assert!(selected.iter().all(|s| s.viewable && s.reason == NIGHT_REASON));
        let days: Vec<_> = selected
            .iter()
            .map(|s| s.pass.start_time.with_timezone(&utc_plus_two()).format("%d %H").to_string())
            .collect();
        assert_eq!(days, vec!["02 21", "03 23", "04 05"]);
    }

    #[test]
    fn tops_up_with_bright_day_passes() {
        let passes = vec![
            pass_at(2, 21, 30.0, 4),
            pass_at(3, 10, 30.0, 3),  // dim
            pass_at(3, 12, 60.0, 4),  // high
            pass_at(4, 13, 20.0, 6),  // long
            pass_at(5, 14, 70.0, 6),  // bright but not needed
        ];
        let selected = classifier().classify(passes, now());
        assert_eq!(selected.len(), 3);
        assert!(selected[0].viewable);
        assert_eq!(selected[0].reason, NIGHT_REASON);
        assert!(selected[1..].iter().all(|s| !s.viewable && s.reason == DAYLIGHT_REASON));
        assert_eq!(selected[1].pass.max_elevation_deg, 60.0);
        assert_eq!(selected[2].pass.duration_minutes, 6.0);
    }

    #[test]
    fn night_passes_without_bright_days_stay_short() {
        let passes = vec![pass_at(2, 21, 30.0, 4), pass_at(3, 10, 20.0, 3)];
        let selected = classifier().classify(passes, now());
        assert_eq!(selected.len(), 1);
        assert!(selected[0].viewable);
    }

    #[test]
    fn all_daylight_prefers_bright_passes() {
        let passes = vec![
            pass_at(2, 9, 20.0, 3),
            pass_at(3, 10, 20.0, 3),
            pass_at(4, 12, 50.0, 4),
            pass_at(5, 13, 20.0, 6),
            pass_at(6, 14, 10.0, 2),
        ];
        let selected = classifier().classify(passes, now());
        assert_eq!(selected.len(), 3);
        assert!(selected.iter().all(|s| !s.viewable && s.reason == DAYLIGHT_REASON));
        // Two bright ones plus the earliest dim one, in time order.
        let elevations: Vec<_> = selected.iter().map(|s| s.pass.max_elevation_deg).collect();
        assert_eq!(elevations, vec![20.0, 50.0, 20.0]);
        assert_eq!(selected[0].pass.start_time, pass_at(2, 9, 20.0, 3).start_time);
        assert!(selected.windows(2).all(|w| w[0].pass.start_time < w[1].pass.start_time));
    }

    #[test]
    fn empty_input_gives_three_synthetic_passes() {
        let selected = classifier().classify(Vec::new(), now());
        assert_eq!(selected.len(), 3);
        for s in &selected {
            assert_eq!(s.origin, PassOrigin::Synthetic);
            assert!(s.reason.contains("Synthetic"));
            assert!(!s.viewable);
        }
    }

    #[test]
    fn summer_time_evening_counts_as_night() {
        let pass = |hour, minute| {
            let start = Utc.with_ymd_and_hms(2025, 7, 15, hour, minute, 0).unwrap();
            PassCalculation {
                start_time: start,
                end_time: start + Duration::minutes(5),
                ..pass_at(2, 12, 40.0, 5)
            }
        };
        let madrid = PassClassifier {
            latitude_deg: 41.3851,
            clock: LocalClock::Zone(chrono_tz::Europe::Madrid),
            bright_day: BrightDayHeuristic::default(),
            brightness: BrightnessHeuristic::default(),
        };

        // 11:00 and 19:30 CEST; the morning one tops up as a bright day pass.
        let selected = madrid.classify(vec![pass(17, 30), pass(9, 0)], now());
        assert_eq!(selected.len(), 2);
        assert!(!selected[0].viewable);
        assert!(selected[1].viewable);
        assert_eq!(selected[1].reason, NIGHT_REASON);
    }

    #[test]
    fn projection_carries_descriptions() {
        let observer = Observer::new(41.4, 2.17, 0.0);
        let c = classifier();

        let night = c.classify(vec![pass_at(2, 21, 72.0, 6)], now()).remove(0);
        let projected = night.project(&observer);
        assert_eq!(projected.from_direction, "W");
        assert_eq!(projected.to_direction, "NE");
        assert_eq!(projected.elevation_description, "Almost overhead");
        assert!(projected.brightness_description.contains("Venus"));

        let day = c.classify(vec![pass_at(3, 12, 50.0, 4)], now()).remove(0);
        assert_eq!(day.project(&observer).brightness_description, "Day pass - not visible");

        let synthetic = c.classify(Vec::new(), now()).remove(0).project(&observer);
        assert!(synthetic.is_synthetic());
        assert_eq!(synthetic.brightness_description, "Unknown - simulated pass");
    }
}
