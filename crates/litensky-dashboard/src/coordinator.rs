//! Per-city weather resolution: cache first, then the weather source, with
//! at most one request in flight per cache key.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use litensky_weather::{cache_key, City, WeatherCache, WeatherPayload, WeatherSource};
use parking_lot::Mutex;
use tokio::sync::OnceCell;
use tokio::task::JoinSet;

/// What the view shows for one tracked city.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherSlot {
    /// No result yet
    Loading,
    /// Settled; `None` means the fetch failed
    Ready(Option<WeatherPayload>),
}

impl WeatherSlot {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn payload(&self) -> Option<&WeatherPayload> {
        match self {
            Self::Ready(payload) => payload.as_ref(),
            Self::Loading => None,
        }
    }
}

type InFlight = Arc<OnceCell<Option<WeatherPayload>>>;

pub struct WeatherCoordinator {
    source: Arc<dyn WeatherSource>,
    cache: Arc<WeatherCache>,
    in_flight: Mutex<HashMap<String, InFlight>>,
    slots: Mutex<HashMap<String, WeatherSlot>>,
}

impl WeatherCoordinator {
    pub fn new(source: Arc<dyn WeatherSource>, cache: Arc<WeatherCache>) -> Self {
        Self {
            source,
            cache,
            in_flight: Mutex::new(HashMap::new()),
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn cache(&self) -> &Arc<WeatherCache> {
        &self.cache
    }

    /// Set the cities that have a slot. Slots of cities no longer listed are
    /// forgotten; new ones start from the cache, or as loading.
    pub fn track(&self, cities: &[City], now: DateTime<Utc>) {
        self.retain(cities);

        let mut slots = self.slots.lock();
        for city in cities {
            let key = cache_key(city.latitude, city.longitude);
            if slots.contains_key(&key) {
                continue;
            }
            let slot = match self.cache.get_at(city.latitude, city.longitude, now) {
                Some(payload) => WeatherSlot::Ready(Some(payload)),
                None => WeatherSlot::Loading,
            };
            slots.insert(key, slot);
        }
    }

    /// Forget slots of cities not in `cities` without adding any.
    pub fn retain(&self, cities: &[City]) {
        let keys: HashSet<String> = cities
            .iter()
            .map(|c| cache_key(c.latitude, c.longitude))
            .collect();
        self.slots.lock().retain(|key, _| keys.contains(key));
    }

    /// Current slot for `city`, `None` when it is not tracked.
    pub fn slot(&self, city: &City) -> Option<WeatherSlot> {
        self.slots
            .lock()
            .get(&cache_key(city.latitude, city.longitude))
            .cloned()
    }

    pub fn is_tracked(&self, city: &City) -> bool {
        self.slots
            .lock()
            .contains_key(&cache_key(city.latitude, city.longitude))
    }

    /// Weather for `city`: a fresh cache entry, else one fetch shared by every
    /// concurrent caller for the same key. Failures resolve to `None`.
    pub async fn resolve(&self, city: &City, now: DateTime<Utc>) -> Option<WeatherPayload> {
        let key = cache_key(city.latitude, city.longitude);

        if let Some(payload) = self.cache.get_at(city.latitude, city.longitude, now) {
            tracing::debug!("Weather cache hit for {} ({})", city.name, key);
            self.settle(&key, Some(payload.clone()));
            return Some(payload);
        }

        let cell = self
            .in_flight
            .lock()
            .entry(key.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let result = cell
            .get_or_init(|| self.fetch(city, &key, now))
            .await
            .clone();

        {
            let mut in_flight = self.in_flight.lock();
            if in_flight.get(&key).is_some_and(|c| Arc::ptr_eq(c, &cell)) {
                in_flight.remove(&key);
            }
        }

        self.settle(&key, result.clone());
        result
    }

    /// Resolve every city concurrently. Returns how many ended with data.
    pub async fn resolve_all(self: &Arc<Self>, cities: &[City], now: DateTime<Utc>) -> usize {
        let mut tasks = JoinSet::new();
        for city in cities {
            let coordinator = Arc::clone(self);
            let city = city.clone();
            tasks.spawn(async move { coordinator.resolve(&city, now).await.is_some() });
        }

        let mut resolved = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(true) => resolved += 1,
                Ok(false) => {}
                Err(e) => tracing::warn!("Weather task failed: {}", e),
            }
        }
        tracing::debug!("Resolved weather for {} of {} cities", resolved, cities.len());
        resolved
    }

    /// The cache entry is stamped when the response arrives: `now` plus the
    /// time spent fetching.
    async fn fetch(&self, city: &City, key: &str, now: DateTime<Utc>) -> Option<WeatherPayload> {
        tracing::debug!("Fetching weather for {} ({})", city.name, key);
        let started = Instant::now();
        match self.source.fetch_weather(city.latitude, city.longitude).await {
            Ok(payload) => {
                let elapsed = chrono::Duration::from_std(started.elapsed())
                    .unwrap_or_else(|_| chrono::Duration::zero());
                self.cache
                    .set_at(city.latitude, city.longitude, payload.clone(), now + elapsed);
                Some(payload)
            }
            Err(e) => {
                tracing::warn!("Weather unavailable for {}: {}", city.name, e);
                None
            }
        }
    }

    /// Write a result into the slot for `key` if that key is still tracked.
    fn settle(&self, key: &str, result: Option<WeatherPayload>) {
        let mut slots = self.slots.lock();
        match slots.get_mut(key) {
            Some(slot) => *slot = WeatherSlot::Ready(result),
            None => tracing::debug!("Discarding weather for untracked {}", key),
        }
    }
}
