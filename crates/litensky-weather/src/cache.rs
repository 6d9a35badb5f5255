//! Persistent weather cache keyed by rounded coordinates.
//!
//! The whole map lives under one storage key. Entries older than
//! `CACHE_DURATION` are dropped lazily when read. Every storage failure
//! degrades to a miss; the cache is never a source of hard failure.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use litensky_core::{keys, Storage};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::types::WeatherPayload;

/// How long a fetched payload stays fresh.
pub const CACHE_DURATION: Duration = Duration::from_secs(3 * 60 * 60);

/// Cache key for a coordinate: both axes rounded to 4 decimals (~11 m).
pub fn cache_key(latitude: f64, longitude: f64) -> String {
    format!("{:.4},{:.4}", latitude, longitude)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherCacheEntry {
    pub data: WeatherPayload,
    /// Epoch milliseconds when the entry was written
    pub timestamp: i64,
}

impl WeatherCacheEntry {
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        let age_ms = now.timestamp_millis() - self.timestamp;
        age_ms < CACHE_DURATION.as_millis() as i64
    }
}

type CacheMap = BTreeMap<String, WeatherCacheEntry>;

#[derive(Debug)]
pub struct WeatherCache {
    storage: Storage,
    // Serializes read-modify-write of the persisted map
    write_lock: Mutex<()>,
}

impl WeatherCache {
    pub fn new(storage: Storage) -> Self {
        Self {
            storage,
            write_lock: Mutex::new(()),
        }
    }

    /// Fresh payload for the coordinate, or `None`.
    pub fn get(&self, latitude: f64, longitude: f64) -> Option<WeatherPayload> {
        self.get_at(latitude, longitude, Utc::now())
    }

    pub fn get_at(
        &self,
        latitude: f64,
        longitude: f64,
        now: DateTime<Utc>,
    ) -> Option<WeatherPayload> {
        let key = cache_key(latitude, longitude);
        let _guard = self.write_lock.lock();
        let mut map = self.load();

        let entry = map.get(&key)?;
        if entry.is_fresh_at(now) {
            return Some(entry.data.clone());
        }

        tracing::debug!("Weather cache entry {} expired", key);
        map.remove(&key);
        self.storage.write(keys::WEATHER_CACHE, &map);
        None
    }

    /// Store a payload for the coordinate, stamped now.
    pub fn set(&self, latitude: f64, longitude: f64, payload: WeatherPayload) {
        self.set_at(latitude, longitude, payload, Utc::now());
    }

    pub fn set_at(
        &self,
        latitude: f64,
        longitude: f64,
        payload: WeatherPayload,
        now: DateTime<Utc>,
    ) {
        let key = cache_key(latitude, longitude);
        let _guard = self.write_lock.lock();
        let mut map = self.load();
        map.insert(
            key,
            WeatherCacheEntry {
                data: payload,
                timestamp: now.timestamp_millis(),
            },
        );
        self.storage.write(keys::WEATHER_CACHE, &map);
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let _guard = self.write_lock.lock();
        let mut map = self.load();
        let before = map.len();
        map.retain(|_, entry| entry.is_fresh_at(now));
        let removed = before - map.len();
        if removed > 0 {
            tracing::debug!("Purged {} expired weather cache entries", removed);
            self.storage.write(keys::WEATHER_CACHE, &map);
        }
        removed
    }

    /// Number of stored entries, fresh or not.
    pub fn len(&self) -> usize {
        self.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn load(&self) -> CacheMap {
        self.storage.read_or(keys::WEATHER_CACHE, CacheMap::new())
    }
}
