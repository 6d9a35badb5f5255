//! Background imagery for a city name.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use litensky_core::ImagesConfig;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

const THUMBNAIL_WIDTH: &str = "1600";
const COMMONS_FILE_PATH: &str = "https://commons.wikimedia.org/wiki/Special:FilePath";
const USER_AGENT: &str = concat!("LitenSky/", env!("CARGO_PKG_VERSION"));

#[async_trait]
pub trait CityImageSource: Send + Sync {
    /// Image URL for the city, or `None` when nothing suitable exists.
    async fn fetch_city_image(&self, name: &str) -> Option<String>;
}

#[derive(Debug, Deserialize)]
struct PageImagesResponse {
    query: Option<PageImagesQuery>,
}

#[derive(Debug, Deserialize)]
struct PageImagesQuery {
    #[serde(default)]
    pages: HashMap<String, Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    thumbnail: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    source: String,
}

#[derive(Debug, Deserialize)]
struct EntitiesResponse {
    #[serde(default)]
    entities: HashMap<String, Entity>,
}

#[derive(Debug, Deserialize)]
struct Entity {
    #[serde(default)]
    claims: HashMap<String, Vec<Claim>>,
}

#[derive(Debug, Deserialize)]
struct Claim {
    mainsnak: Snak,
}

#[derive(Debug, Deserialize)]
struct Snak {
    datavalue: Option<DataValue>,
}

#[derive(Debug, Deserialize)]
struct DataValue {
    value: serde_json::Value,
}

/// Wikipedia page thumbnail first, then the Wikidata "image" (P18) claim.
#[derive(Debug, Clone)]
pub struct WikiImageProvider {
    client: Client,
    wikipedia_url: String,
    wikidata_url: String,
}

impl WikiImageProvider {
    pub fn new(config: &ImagesConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            wikipedia_url: config.wikipedia_url.clone(),
            wikidata_url: config.wikidata_url.clone(),
        })
    }

    async fn wikipedia_thumbnail(&self, name: &str) -> Result<Option<String>, reqwest::Error> {
        let response = self
            .client
            .get(&self.wikipedia_url)
            .query(&[
                ("action", "query"),
                ("titles", name),
                ("prop", "pageimages"),
                ("format", "json"),
                ("pithumbsize", THUMBNAIL_WIDTH),
                ("redirects", "1"),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Ok(None);
        }

        let body: PageImagesResponse = response.json().await?;
        Ok(body
            .query
            .and_then(|q| q.pages.into_values().find_map(|p| p.thumbnail))
            .map(|t| t.source))
    }

    async fn wikidata_image(&self, name: &str) -> Result<Option<String>, reqwest::Error> {
        let response = self
            .client
            .get(&self.wikidata_url)
            .query(&[
                ("action", "wbgetentities"),
                ("sites", "enwiki"),
                ("titles", name),
                ("props", "claims"),
                ("format", "json"),
                ("redirects", "yes"),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Ok(None);
        }

        let body: EntitiesResponse = response.json().await?;
        let file_name = body.entities.into_values().find_map(|entity| {
            entity
                .claims
                .get("P18")
                .and_then(|claims| claims.first())
                .and_then(|claim| claim.mainsnak.datavalue.as_ref())
                .and_then(|dv| dv.value.as_str().map(String::from))
        });
        Ok(file_name.and_then(|f| commons_file_url(&f)))
    }
}

/// Direct Commons URL for a file name, scaled to the thumbnail width.
pub fn commons_file_url(file_name: &str) -> Option<String> {
    let mut url = Url::parse(COMMONS_FILE_PATH).ok()?;
    url.path_segments_mut().ok()?.push(file_name);
    url.query_pairs_mut().append_pair("width", THUMBNAIL_WIDTH);
    Some(url.into())
}

#[async_trait]
impl CityImageSource for WikiImageProvider {
    async fn fetch_city_image(&self, name: &str) -> Option<String> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        match self.wikipedia_thumbnail(name).await {
            Ok(Some(url)) => return Some(url),
            Ok(None) => {}
            Err(e) => tracing::debug!("Wikipedia image lookup for '{}' failed: {}", name, e),
        }

        match self.wikidata_image(name).await {
            Ok(found) => {
                if found.is_none() {
                    tracing::debug!("No image found for '{}'", name);
                }
                found
            }
            Err(e) => {
                tracing::debug!("Wikidata image lookup for '{}' failed: {}", name, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commons_url_encodes_file_name() {
        assert_eq!(
            commons_file_url("Oslo Opera House.jpg").as_deref(),
            Some("https://commons.wikimedia.org/wiki/Special:FilePath/Oslo%20Opera%20House.jpg?width=1600")
        );
    }
}
