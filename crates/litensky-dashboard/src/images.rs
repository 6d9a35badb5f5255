//! City background images, memoized for good per city name.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use litensky_core::{keys, Storage};
use litensky_weather::CityImageSource;
use parking_lot::Mutex;

/// Memo key: trimmed, lowercased city name.
pub fn image_key(name: &str) -> String {
    name.trim().to_lowercase()
}

pub struct CityImageCache {
    storage: Storage,
    source: Option<Arc<dyn CityImageSource>>,
    // `None` marks a lookup that found nothing this session
    memo: Mutex<HashMap<String, Option<String>>>,
}

impl CityImageCache {
    /// Loads persisted images. Without a source only known images are served.
    pub fn new(storage: Storage, source: Option<Arc<dyn CityImageSource>>) -> Self {
        let persisted: BTreeMap<String, String> = storage.read_or(keys::CITY_IMAGES, BTreeMap::new());
        let memo = persisted
            .into_iter()
            .map(|(name, url)| (name, Some(url)))
            .collect();
        Self {
            storage,
            source,
            memo: Mutex::new(memo),
        }
    }

    /// Known image for `name`, without any lookup.
    pub fn get(&self, name: &str) -> Option<String> {
        self.memo.lock().get(&image_key(name)).cloned().flatten()
    }

    /// Image for `name`, looked up once and remembered.
    pub async fn fetch(&self, name: &str) -> Option<String> {
        let key = image_key(name);
        if key.is_empty() {
            return None;
        }
        let known = self.memo.lock().get(&key).cloned();
        if let Some(known) = known {
            return known;
        }
        let source = self.source.as_ref()?;

        let found = source.fetch_city_image(name).await;
        tracing::debug!("Image lookup for '{}': {}", key, found.as_deref().unwrap_or("none"));

        let mut memo = self.memo.lock();
        memo.insert(key, found.clone());
        if found.is_some() {
            let persisted: BTreeMap<&String, &String> = memo
                .iter()
                .filter_map(|(name, url)| url.as_ref().map(|url| (name, url)))
                .collect();
            self.storage.write(keys::CITY_IMAGES, &persisted);
        }
        found
    }
}
