//! Current-location resolution.
//!
//! Sources are tried in order, most precise first. The first one that yields
//! coordinates wins; a missing name is filled in by reverse geocoding.

use std::time::Duration;

use async_trait::async_trait;
use litensky_core::{FixedPosition, LocationConfig};
use reqwest::Client;
use serde::Deserialize;

use crate::geocode::ReverseGeocoder;
use crate::types::{City, LocationError};

/// Name used when nothing better is known.
pub const FALLBACK_CITY_NAME: &str = "Current City";

/// Raw position reported by a source.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub name: Option<String>,
    pub timezone: Option<String>,
}

#[async_trait]
pub trait LocationSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn locate(&self) -> Result<Position, LocationError>;
}

#[async_trait]
pub trait LocationResolver: Send + Sync {
    /// `None` when no source could produce a position.
    async fn resolve_current_location(&self) -> Option<City>;
}

/// Configured coordinates; the desktop stand-in for device geolocation.
#[derive(Debug, Clone)]
pub struct FixedLocation {
    position: FixedPosition,
}

impl FixedLocation {
    pub fn new(position: FixedPosition) -> Self {
        Self { position }
    }
}

#[async_trait]
impl LocationSource for FixedLocation {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn locate(&self) -> Result<Position, LocationError> {
        Ok(Position {
            latitude: self.position.latitude,
            longitude: self.position.longitude,
            name: self.position.name.clone(),
            timezone: None,
        })
    }
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
    lat: Option<f64>,
    lon: Option<f64>,
    city: Option<String>,
    timezone: Option<String>,
}

/// Coarse position from an ipapi-style JSON endpoint.
#[derive(Debug, Clone)]
pub struct IpLocation {
    client: Client,
    url: String,
}

impl IpLocation {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, LocationError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl LocationSource for IpLocation {
    fn name(&self) -> &'static str {
        "ip"
    }

    async fn locate(&self) -> Result<Position, LocationError> {
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            tracing::debug!("IP lookup returned status {}", response.status());
            return Err(LocationError::ServiceUnavailable);
        }

        let body: IpLookupResponse = response.json().await?;
        let latitude = body.latitude.or(body.lat);
        let longitude = body.longitude.or(body.lon);

        match (latitude, longitude) {
            (Some(latitude), Some(longitude)) if latitude.is_finite() && longitude.is_finite() => {
                Ok(Position {
                    latitude,
                    longitude,
                    name: body.city,
                    timezone: body.timezone,
                })
            }
            _ => Err(LocationError::MissingCoordinates),
        }
    }
}

pub struct ChainedLocationResolver {
    sources: Vec<Box<dyn LocationSource>>,
    geocoder: Option<ReverseGeocoder>,
}

impl ChainedLocationResolver {
    pub fn new(sources: Vec<Box<dyn LocationSource>>, geocoder: Option<ReverseGeocoder>) -> Self {
        Self { sources, geocoder }
    }

    /// Fixed position (if configured), then IP lookup, with Nominatim naming.
    pub fn from_config(config: &LocationConfig) -> Result<Self, LocationError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let mut sources: Vec<Box<dyn LocationSource>> = Vec::new();
        if let Some(fixed) = &config.fixed {
            sources.push(Box::new(FixedLocation::new(fixed.clone())));
        }
        sources.push(Box::new(IpLocation::new(config.ip_lookup_url.clone(), timeout)?));

        let geocoder = ReverseGeocoder::new(config.reverse_geocode_url.clone(), timeout)?;
        Ok(Self::new(sources, Some(geocoder)))
    }

    async fn name_for(&self, position: &Position) -> String {
        if let Some(name) = position.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        if let Some(geocoder) = &self.geocoder {
            if let Some(name) = geocoder
                .reverse_geocode(position.latitude, position.longitude)
                .await
            {
                return name;
            }
        }
        FALLBACK_CITY_NAME.to_string()
    }
}

#[async_trait]
impl LocationResolver for ChainedLocationResolver {
    async fn resolve_current_location(&self) -> Option<City> {
        for source in &self.sources {
            let position = match source.locate().await {
                Ok(position) => position,
                Err(e) => {
                    tracing::debug!("Location source '{}' failed: {}", source.name(), e);
                    continue;
                }
            };

            let name = self.name_for(&position).await;
            tracing::info!(
                "Current location from '{}': {} ({:.4}, {:.4})",
                source.name(),
                name,
                position.latitude,
                position.longitude
            );
            let city = City {
                name,
                latitude: position.latitude,
                longitude: position.longitude,
                timezone: position.timezone,
            };
            return Some(city);
        }

        tracing::warn!("No location source produced a position");
        None
    }
}
