//! Reverse geocoding: convert coordinates to a place name.
//! Uses Nominatim (OpenStreetMap) - free, no API key required.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::types::LocationError;

const USER_AGENT: &str = concat!("LitenSky/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    state_district: Option<String>,
    county: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

impl NominatimAddress {
    /// Most specific populated place: city > town > village > municipality,
    /// then wider regions.
    fn place_name(self) -> Option<String> {
        [
            self.city,
            self.town,
            self.village,
            self.municipality,
            self.state_district,
            self.county,
            self.state,
            self.country,
        ]
        .into_iter()
        .flatten()
        .map(|name| name.trim().to_string())
        .find(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct ReverseGeocoder {
    client: Client,
    url: String,
}

impl ReverseGeocoder {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, LocationError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Place name for the coordinate. `None` on any failure; callers fall back.
    pub async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Option<String> {
        let lat = latitude.to_string();
        let lon = longitude.to_string();
        let response = match self
            .client
            .get(&self.url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("format", "json"),
                ("addressdetails", "1"),
                ("zoom", "10"),
            ])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("Reverse geocode request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!("Reverse geocode returned status {}", response.status());
            return None;
        }

        let body: NominatimResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                tracing::debug!("Reverse geocode parse error: {}", e);
                return None;
            }
        };

        let place = body.address?.place_name()?;
        tracing::info!("Reverse geocoded to: {}", place);
        Some(place)
    }
}
