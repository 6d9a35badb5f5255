use litensky_weather::{AmbientEffects, City, DayPeriod, WeatherCondition, WeatherPayload};
use serde::Serialize;

use crate::settings::{convert_temperature, TemperatureUnit};

/// Everything the presentation layer needs to draw one city card.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CityWeatherView {
    pub city: City,
    pub city_image: Option<String>,
    pub weather_data: Option<WeatherPayload>,
    pub day_period: DayPeriod,
    pub is_loading: bool,
    pub is_current: bool,
}

impl CityWeatherView {
    /// `None` without data, or when the weather code is unmapped.
    pub fn condition(&self) -> Option<WeatherCondition> {
        self.weather_data.as_ref().and_then(WeatherPayload::condition)
    }

    /// Temperature in the display unit
    pub fn temperature(&self, unit: TemperatureUnit) -> Option<i64> {
        self.weather_data
            .as_ref()
            .map(|w| convert_temperature(w.values().temperature, unit))
    }

    pub fn description(&self) -> Option<&'static str> {
        self.condition().map(|c| c.description(self.day_period))
    }

    pub fn icon_name(&self) -> Option<&'static str> {
        self.condition().map(|c| c.icon_name(self.day_period))
    }

    /// Backdrop intensities; calm when there is no data.
    pub fn effects(&self) -> AmbientEffects {
        self.weather_data
            .as_ref()
            .map(|w| AmbientEffects::from_values(w.values()))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use chrono::{TimeZone, Utc};
    use litensky_weather::{GeoPoint, Observation, WeatherValues};

    fn view(weather_code: i32) -> CityWeatherView {
        CityWeatherView {
            city: City::new("Oslo", 59.9139, 10.7522),
            city_image: None,
            weather_data: Some(WeatherPayload {
                data: Observation {
                    time: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
                    values: WeatherValues {
                        temperature: 20.0,
                        weather_code,
                        ..Default::default()
                    },
                },
                location: GeoPoint { lat: 59.9139, lon: 10.7522 },
            }),
            day_period: DayPeriod::Day,
            is_loading: false,
            is_current: false,
        }
    }

    #[test]
    fn test_known_code_has_icon_and_text() {
        let view = view(1000);
        assert_eq!(view.description(), Some("Sunny"));
        assert_eq!(view.icon_name(), Some("sun"));
        assert_eq!(view.temperature(TemperatureUnit::Imperial), Some(68));
    }

    #[test]
    fn test_unmapped_code_shows_no_condition() {
        let view = view(0);
        assert!(view.condition().is_none());
        assert!(view.description().is_none());
        assert!(view.icon_name().is_none());
        assert_eq!(view.temperature(TemperatureUnit::Metric), Some(20));
    }
}
