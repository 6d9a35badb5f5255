//! Day-period classification from solar geometry.
//!
//! Solar event times follow the low-precision solar position model popularised
//! by the suncalc library (accurate to about a minute at mid latitudes):
//! dawn/dusk at -6°, golden hour at +6°, sunrise/sunset at -0.833°.
//! Events are computed for the solar day whose noon is nearest the instant.

use std::f64::consts::PI;

use chrono::{DateTime, Utc};

use crate::types::DayPeriod;

const RAD: f64 = PI / 180.0;
const DAY_MS: f64 = 1000.0 * 60.0 * 60.0 * 24.0;
const J1970: f64 = 2_440_588.0;
const J2000: f64 = 2_451_545.0;
const J0: f64 = 0.0009;
/// Obliquity of the ecliptic
const OBLIQUITY: f64 = RAD * 23.4397;

const SUNRISE_ANGLE: f64 = -0.833;
const TWILIGHT_ANGLE: f64 = -6.0;
const GOLDEN_HOUR_ANGLE: f64 = 6.0;

/// When the sun crosses a given altitude on one solar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossing {
    /// Rises through the altitude in the morning and sets through it in the evening.
    Occurs {
        rise: DateTime<Utc>,
        set: DateTime<Utc>,
    },
    /// Sun stays above the altitude all day (polar day for that altitude).
    AlwaysAbove,
    /// Sun stays below the altitude all day (polar night for that altitude).
    AlwaysBelow,
}

impl Crossing {
    pub fn rise(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Occurs { rise, .. } => Some(*rise),
            _ => None,
        }
    }

    pub fn set(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Occurs { set, .. } => Some(*set),
            _ => None,
        }
    }
}

/// Solar events for one coordinate and solar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolarTimes {
    pub solar_noon: DateTime<Utc>,
    /// -0.833°: sunrise / sunset
    pub horizon: Crossing,
    /// -6°: dawn / dusk
    pub twilight: Crossing,
    /// +6°: golden hour end / golden hour start
    pub golden_hour: Crossing,
}

impl SolarTimes {
    pub fn dawn(&self) -> Option<DateTime<Utc>> {
        self.twilight.rise()
    }

    pub fn dusk(&self) -> Option<DateTime<Utc>> {
        self.twilight.set()
    }

    pub fn sunrise(&self) -> Option<DateTime<Utc>> {
        self.horizon.rise()
    }

    pub fn sunset(&self) -> Option<DateTime<Utc>> {
        self.horizon.set()
    }

    pub fn golden_hour_end(&self) -> Option<DateTime<Utc>> {
        self.golden_hour.rise()
    }

    pub fn golden_hour_start(&self) -> Option<DateTime<Utc>> {
        self.golden_hour.set()
    }
}

fn to_julian(instant: DateTime<Utc>) -> f64 {
    instant.timestamp_millis() as f64 / DAY_MS - 0.5 + J1970
}

fn from_julian(j: f64) -> Option<DateTime<Utc>> {
    let ms = (j + 0.5 - J1970) * DAY_MS;
    if !ms.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(ms.round() as i64)
}

fn solar_mean_anomaly(d: f64) -> f64 {
    RAD * (357.5291 + 0.985_600_28 * d)
}

fn ecliptic_longitude(m: f64) -> f64 {
    let center = RAD * (1.9148 * m.sin() + 0.02 * (2.0 * m).sin() + 0.0003 * (3.0 * m).sin());
    let perihelion = RAD * 102.9372;
    m + center + perihelion + PI
}

fn declination(l: f64) -> f64 {
    (OBLIQUITY.sin() * l.sin()).asin()
}

fn approx_transit(hour_angle: f64, lw: f64, n: f64) -> f64 {
    J0 + (hour_angle + lw) / (2.0 * PI) + n
}

fn solar_transit_j(ds: f64, m: f64, l: f64) -> f64 {
    J2000 + ds + 0.0053 * m.sin() - 0.0069 * (2.0 * l).sin()
}

/// Solar event times for the solar day nearest `instant`.
pub fn solar_times(latitude: f64, longitude: f64, instant: DateTime<Utc>) -> SolarTimes {
    let lw = RAD * -longitude;
    let phi = RAD * latitude;
    let d = to_julian(instant) - J2000;

    let n = (d - J0 - lw / (2.0 * PI)).round();
    let ds = approx_transit(0.0, lw, n);
    let m = solar_mean_anomaly(ds);
    let l = ecliptic_longitude(m);
    let dec = declination(l);
    let j_noon = solar_transit_j(ds, m, l);

    let crossing = |angle: f64| -> Crossing {
        let h = angle * RAD;
        let x = (h.sin() - phi.sin() * dec.sin()) / (phi.cos() * dec.cos());
        if x.is_nan() || x > 1.0 {
            return Crossing::AlwaysBelow;
        }
        if x < -1.0 {
            return Crossing::AlwaysAbove;
        }
        let j_set = solar_transit_j(approx_transit(x.acos(), lw, n), m, l);
        let j_rise = j_noon - (j_set - j_noon);
        match (from_julian(j_rise), from_julian(j_set)) {
            (Some(rise), Some(set)) => Crossing::Occurs { rise, set },
            _ => Crossing::AlwaysBelow,
        }
    };

    SolarTimes {
        solar_noon: from_julian(j_noon).unwrap_or(instant),
        horizon: crossing(SUNRISE_ANGLE),
        twilight: crossing(TWILIGHT_ANGLE),
        golden_hour: crossing(GOLDEN_HOUR_ANGLE),
    }
}

/// Classify `instant` at the coordinate.
///
/// `[dawn, golden hour end)` is sunrise, `[golden hour end, golden hour)` is
/// day, `[golden hour, dusk)` is sunset, anything else is night. At high
/// latitudes where the sun never reaches +6° the twilight splits at solar
/// noon; where it never drops below +6° it is day all day.
pub fn classify(latitude: f64, longitude: f64, instant: DateTime<Utc>) -> DayPeriod {
    let times = solar_times(latitude, longitude, instant);
    classify_with(&times, instant)
}

/// Classify against already computed solar times.
pub fn classify_with(times: &SolarTimes, instant: DateTime<Utc>) -> DayPeriod {
    match (times.twilight, times.golden_hour) {
        (_, Crossing::AlwaysAbove) => DayPeriod::Day,
        (Crossing::AlwaysBelow, _) => DayPeriod::Night,
        (
            Crossing::Occurs { rise: dawn, set: dusk },
            Crossing::Occurs {
                rise: golden_end,
                set: golden_start,
            },
        ) => {
            if instant >= dawn && instant < golden_end {
                DayPeriod::Sunrise
            } else if instant >= golden_end && instant < golden_start {
                DayPeriod::Day
            } else if instant >= golden_start && instant < dusk {
                DayPeriod::Sunset
            } else {
                DayPeriod::Night
            }
        }
        (Crossing::Occurs { rise: dawn, set: dusk }, Crossing::AlwaysBelow) => {
            if instant >= dawn && instant < times.solar_noon {
                DayPeriod::Sunrise
            } else if instant >= times.solar_noon && instant < dusk {
                DayPeriod::Sunset
            } else {
                DayPeriod::Night
            }
        }
        (
            Crossing::AlwaysAbove,
            Crossing::Occurs {
                rise: golden_end,
                set: golden_start,
            },
        ) => {
            if instant < golden_end {
                DayPeriod::Sunrise
            } else if instant < golden_start {
                DayPeriod::Day
            } else {
                DayPeriod::Sunset
            }
        }
        // Sun always above -6° yet always below +6° cannot happen with a
        // rising and setting golden hour; treat as twilight.
        (Crossing::AlwaysAbove, Crossing::AlwaysBelow) => {
            if instant < times.solar_noon {
                DayPeriod::Sunrise
            } else {
                DayPeriod::Sunset
            }
        }
    }
}
