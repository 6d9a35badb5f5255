use chrono::{DateTime, Utc};
use litensky_core::{AppError, ConfigError, NetworkError, ReqwestErrorExt};
use serde::{Deserialize, Serialize};

/// A place the user can select.
///
/// Two cities are compared by `is_same_city`, never by field equality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl City {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            timezone: None,
        }
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    /// True if the name is empty or whitespace only.
    pub fn has_blank_name(&self) -> bool {
        self.name.trim().is_empty()
    }
}

/// A city in the recents list, with its background image once known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentCity {
    #[serde(flatten)]
    pub city: City,
    #[serde(
        rename = "cityImage",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub city_image: Option<String>,
}

impl RecentCity {
    pub fn with_image(city: City, city_image: Option<String>) -> Self {
        Self { city, city_image }
    }
}

impl From<City> for RecentCity {
    fn from(city: City) -> Self {
        Self {
            city,
            city_image: None,
        }
    }
}

/// Day period derived from solar geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DayPeriod {
    Night,
    Sunrise,
    #[default]
    Day,
    Sunset,
}

impl DayPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Night => "night",
            Self::Sunrise => "sunrise",
            Self::Day => "day",
            Self::Sunset => "sunset",
        }
    }

    pub fn is_night(&self) -> bool {
        matches!(self, Self::Night)
    }
}

impl std::fmt::Display for DayPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw realtime values as reported by the weather API (metric units).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct WeatherValues {
    pub altimeter_setting: f64,
    pub cloud_base: Option<f64>,
    pub cloud_ceiling: Option<f64>,
    pub cloud_cover: f64,
    pub dew_point: f64,
    pub freezing_rain_intensity: f64,
    pub humidity: f64,
    pub precipitation_probability: f64,
    pub pressure_sea_level: f64,
    pub pressure_surface_level: f64,
    pub rain_intensity: f64,
    pub sleet_intensity: f64,
    pub snow_intensity: f64,
    pub temperature: f64,
    pub temperature_apparent: f64,
    pub uv_health_concern: f64,
    pub uv_index: f64,
    pub visibility: f64,
    pub weather_code: i32,
    pub wind_direction: f64,
    pub wind_gust: f64,
    pub wind_speed: f64,
}

/// One observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub time: DateTime<Utc>,
    pub values: WeatherValues,
}

/// Coordinates the provider resolved the request to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Weather for one place, as fetched. Never mutated after fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherPayload {
    pub data: Observation,
    pub location: GeoPoint,
}

impl WeatherPayload {
    pub fn values(&self) -> &WeatherValues {
        &self.data.values
    }

    /// `None` when the weather code is not one the provider documents.
    pub fn condition(&self) -> Option<WeatherCondition> {
        WeatherCondition::from_code(self.data.values.weather_code)
    }
}

/// Weather condition categories mapped from realtime weather codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    HeavyRain,
    Snow,
    Sleet,
    Thunderstorm,
}

impl WeatherCondition {
    /// See: https://docs.tomorrow.io/reference/data-layers-weather-codes
    pub fn from_code(code: i32) -> Option<Self> {
        let condition = match code {
            1000 => Self::Clear,
            1100 | 1101 => Self::PartlyCloudy,
            1001 | 1102 => Self::Cloudy,
            2000 | 2100 => Self::Fog,
            4000 => Self::Drizzle,
            4001 | 4200 => Self::Rain,
            4201 => Self::HeavyRain,
            5000 | 5001 | 5100 | 5101 => Self::Snow,
            6000 | 6001 | 6200 | 6201 => Self::Sleet, // Freezing rain/drizzle
            7000 | 7101 | 7102 => Self::Sleet,        // Ice pellets
            8000 => Self::Thunderstorm,
            _ => return None,
        };
        Some(condition)
    }

    /// Human-readable description; clear skies read differently at night.
    pub fn description(&self, period: DayPeriod) -> &'static str {
        match (self, period.is_night()) {
            (Self::Clear, false) => "Sunny",
            (Self::Clear, true) => "Clear",
            (Self::PartlyCloudy, _) => "Partly Cloudy",
            (Self::Cloudy, _) => "Cloudy",
            (Self::Fog, _) => "Fog",
            (Self::Drizzle, _) => "Drizzle",
            (Self::Rain, _) => "Rain",
            (Self::HeavyRain, _) => "Heavy Rain",
            (Self::Snow, _) => "Snow",
            (Self::Sleet, _) => "Sleet",
            (Self::Thunderstorm, _) => "Thunderstorm",
        }
    }

    pub fn icon_name(&self, period: DayPeriod) -> &'static str {
        match (self, period.is_night()) {
            (Self::Clear, false) => "sun",
            (Self::Clear, true) => "moon",
            (Self::PartlyCloudy, false) => "cloud_sun",
            (Self::PartlyCloudy, true) => "cloud_moon",
            (Self::Cloudy, _) => "cloud",
            (Self::Fog, _) => "cloud_fog",
            (Self::Drizzle | Self::Rain | Self::HeavyRain, _) => "cloud_rain",
            (Self::Snow | Self::Sleet, _) => "cloud_snow",
            (Self::Thunderstorm, _) => "cloud_lightning",
        }
    }

    pub fn is_thunder(&self) -> bool {
        matches!(self, Self::Thunderstorm)
    }
}

/// Location service errors
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location response missing coordinates")]
    MissingCoordinates,
    #[error("Location error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for LocationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Other(e.to_string())
        }
    }
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("API error: status {status}")]
    Api { status: u16 },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("No weather API key configured")]
    MissingApiKey,
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Network(_) => "Unable to reach the weather service.",
            Self::Api { status } if *status == 401 || *status == 403 => {
                "Weather API key is invalid. Check settings."
            }
            Self::Api { status } if *status == 429 => {
                "Weather service rate limit reached. Please try again later."
            }
            Self::Api { .. } => "Weather service error. Please try again.",
            Self::Parse(_) => "Weather data could not be read.",
            Self::MissingApiKey => "No weather API key configured.",
        }
    }
}

impl From<LocationError> for AppError {
    fn from(e: LocationError) -> Self {
        match e {
            LocationError::Timeout => AppError::Network(NetworkError::Timeout),
            LocationError::ServiceUnavailable => {
                AppError::Network(NetworkError::ConnectionFailed(e.to_string()))
            }
            LocationError::MissingCoordinates => {
                AppError::Network(NetworkError::InvalidResponse(e.to_string()))
            }
            LocationError::Other(message) => AppError::Service(message),
        }
    }
}

impl From<WeatherError> for AppError {
    fn from(e: WeatherError) -> Self {
        match e {
            WeatherError::Network(e) => AppError::Network(e.into_network_error()),
            WeatherError::Api { status } => AppError::Network(NetworkError::ServerError {
                status,
                message: "weather API".to_string(),
            }),
            WeatherError::Parse(message) => AppError::Network(NetworkError::InvalidResponse(message)),
            WeatherError::MissingApiKey => {
                AppError::Config(ConfigError::Invalid("weather.api_key is not set".to_string()))
            }
        }
    }
}
