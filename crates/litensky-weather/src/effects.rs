//! Normalized inputs for the ambient backdrop (rain, snow, clouds, lightning).

use serde::{Deserialize, Serialize};

use crate::types::{WeatherCondition, WeatherValues};

/// Precipitation below this (mm/h) does not show.
const PRECIPITATION_THRESHOLD: f64 = 0.05;
/// Rain intensity (mm/h) rendered at full strength.
const RAIN_FULL_SCALE: f64 = 5.0;
/// Snow intensity (mm/h) rendered at full strength.
const SNOW_FULL_SCALE: f64 = 3.0;

/// Intensities in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AmbientEffects {
    pub rain: f64,
    pub snow: f64,
    pub clouds: f64,
    pub thunder: bool,
}

impl AmbientEffects {
    pub fn from_values(values: &WeatherValues) -> Self {
        Self {
            rain: scaled(values.rain_intensity, RAIN_FULL_SCALE),
            snow: scaled(values.snow_intensity, SNOW_FULL_SCALE),
            clouds: (values.cloud_cover / 100.0).clamp(0.0, 1.0),
            thunder: WeatherCondition::from_code(values.weather_code).is_some_and(|c| c.is_thunder()),
        }
    }

    pub fn is_calm(&self) -> bool {
        self.rain == 0.0 && self.snow == 0.0 && !self.thunder
    }
}

fn scaled(intensity: f64, full_scale: f64) -> f64 {
    if intensity > PRECIPITATION_THRESHOLD {
        (intensity / full_scale).min(1.0)
    } else {
        0.0
    }
}
