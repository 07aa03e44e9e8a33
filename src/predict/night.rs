use chrono::{DateTime, Datelike, TimeZone, Timelike};

const POLAR_LATITUDE_DEG: f64 = 60.0;

/// Local clock window `[start, 24:00) ∪ [00:00, end)` treated as night.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NightWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl NightWindow {
    pub fn contains(&self, hour: u32, minute: u32) -> bool {
        let minutes = hour * 60 + minute;
        minutes >= self.start_hour * 60 || minutes < self.end_hour * 60
    }
}

const BASE_NIGHT: NightWindow = NightWindow {
    start_hour: 18,
    end_hour: 7,
};
const WINTER_NIGHT: NightWindow = NightWindow {
    start_hour: 17,
    end_hour: 6,
};
const POLAR_WINTER_NIGHT: NightWindow = NightWindow {
    start_hour: 14,
    end_hour: 9,
};

/// Nov-Feb north of the equator, Jun-Aug south of it. `month` is 1-based.
pub fn is_winter(latitude_deg: f64, month: u32) -> bool {
    if latitude_deg < 0.0 {
        (6..=8).contains(&month)
    } else {
        month >= 11 || month <= 2
    }
}

pub fn night_window(latitude_deg: f64, month: u32) -> NightWindow {
    let winter = is_winter(latitude_deg, month);
    if winter && latitude_deg.abs() > POLAR_LATITUDE_DEG {
        POLAR_WINTER_NIGHT
    } else if winter {
        WINTER_NIGHT
    } else {
        BASE_NIGHT
    }
}

/// Whether `instant`, read on its own local clock, falls in the night window.
pub fn is_night_local<Tz: TimeZone>(instant: &DateTime<Tz>, latitude_deg: f64) -> bool {
    let local = instant.naive_local();
    night_window(latitude_deg, local.month()).contains(local.hour(), local.minute())
}
