use serde::{Deserialize, Serialize};

/// Display unit for temperatures. Payloads are always metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Metric,
    Imperial,
}

impl TemperatureUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Metric => "°C",
            Self::Imperial => "°F",
        }
    }
}

/// Persisted user settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub unit: TemperatureUnit,
}

/// Convert a Celsius reading for display, rounded to a whole degree
/// (halves round up).
pub fn convert_temperature(celsius: f64, unit: TemperatureUnit) -> i64 {
    let value = match unit {
        TemperatureUnit::Metric => celsius,
        TemperatureUnit::Imperial => celsius * 9.0 / 5.0 + 32.0,
    };
    (value + 0.5).floor() as i64
}
