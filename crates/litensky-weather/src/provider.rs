//! Realtime weather over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use litensky_core::WeatherConfig;
use reqwest::Client;

use crate::retry::{with_retry, RetryConfig};
use crate::types::{WeatherError, WeatherPayload};

/// Anything that can produce current weather for a coordinate.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch_weather(&self, latitude: f64, longitude: f64) -> Result<WeatherPayload, WeatherError>;
}

/// Client for the tomorrow.io realtime endpoint. Always requests metric units;
/// conversion for display happens downstream.
#[derive(Debug, Clone)]
pub struct TomorrowProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    retry: RetryConfig,
}

impl TomorrowProvider {
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.resolved_api_key(),
            retry: RetryConfig::with_max_retries(config.max_retries),
        })
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl WeatherSource for TomorrowProvider {
    async fn fetch_weather(&self, latitude: f64, longitude: f64) -> Result<WeatherPayload, WeatherError> {
        let api_key = self.api_key.as_deref().ok_or(WeatherError::MissingApiKey)?;
        let location = format!("{},{}", latitude, longitude);

        tracing::debug!("Fetching weather for {}", location);

        let response = with_retry(&self.retry, || {
            self.client
                .get(&self.base_url)
                .query(&[
                    ("location", location.as_str()),
                    ("units", "metric"),
                    ("apikey", api_key),
                ])
                .send()
        })
        .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Weather API returned {} for {}", status, location);
            return Err(WeatherError::Api {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let payload: WeatherPayload =
            serde_json::from_str(&body).map_err(|e| WeatherError::Parse(e.to_string()))?;

        tracing::info!(
            "Weather for {}: {:.1}°C, code {}",
            location,
            payload.values().temperature,
            payload.values().weather_code
        );
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[tokio::test]
    async fn test_missing_api_key_fails_without_request() {
        let mut provider = TomorrowProvider::new(&WeatherConfig::default()).unwrap();
        provider.api_key = None;
        assert!(!provider.has_api_key());

        let err = provider.fetch_weather(1.0, 2.0).await.unwrap_err();
        assert!(matches!(err, WeatherError::MissingApiKey));
    }
}
