//! Application-state owner.
//!
//! Selection transitions run synchronously under one lock and are written
//! through to storage after the in-memory change. Network work (weather,
//! location, images) is async and never blocks a transition.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use litensky_core::{keys, Storage};
use litensky_weather::{
    classify, is_same_city, City, CityImageSource, LocationResolver, RecentCity, WeatherCache,
    WeatherSource,
};
use parking_lot::Mutex;
use tokio::sync::OnceCell;

use crate::coordinator::{WeatherCoordinator, WeatherSlot};
use crate::images::CityImageCache;
use crate::recents::RecentCities;
use crate::settings::{Settings, TemperatureUnit};
use crate::view::CityWeatherView;

/// Collaborators a dashboard is built from.
pub struct DashboardDeps {
    pub storage: Storage,
    pub weather: Arc<dyn WeatherSource>,
    pub location: Arc<dyn LocationResolver>,
    /// `None` disables image lookups; known images are still served
    pub images: Option<Arc<dyn CityImageSource>>,
}

pub struct Dashboard {
    storage: Storage,
    state: Mutex<RecentCities>,
    settings: Mutex<Settings>,
    coordinator: Arc<WeatherCoordinator>,
    images: CityImageCache,
    location: Arc<dyn LocationResolver>,
    resolved_location: OnceCell<Option<City>>,
}

impl Dashboard {
    /// Build from persisted state. Missing or unreadable values fall back to
    /// an empty selection and default settings.
    pub fn load(deps: DashboardDeps) -> Self {
        let storage = deps.storage;
        let selected: Option<City> = storage.read(keys::CITY);
        let recents: Vec<RecentCity> = storage.read_or(keys::RECENT_CITIES, Vec::new());
        let settings: Settings = storage.read_or(keys::SETTINGS, Settings::default());

        let mut state = RecentCities::load(selected, recents);
        let images = CityImageCache::new(storage.clone(), deps.images);
        if let Some(selected) = state.selected().cloned() {
            if let Some(url) = images.get(&selected.name) {
                state.set_city_image(&selected, url);
            }
        }

        let cache = Arc::new(WeatherCache::new(storage.clone()));
        let purged = cache.purge_expired(Utc::now());
        if purged > 0 {
            tracing::info!("Dropped {} expired weather cache entries", purged);
        }

        tracing::info!(
            "Dashboard loaded: selected={}, {} recent cities, unit={:?}",
            state.selected().map_or("none", |c| c.name.as_str()),
            state.recents().len(),
            settings.unit
        );

        let coordinator = Arc::new(WeatherCoordinator::new(deps.weather, cache));
        coordinator.track(&visible_cities(&state), Utc::now());

        Self {
            storage,
            state: Mutex::new(state),
            settings: Mutex::new(settings),
            coordinator,
            images,
            location: deps.location,
            resolved_location: OnceCell::new(),
        }
    }

    pub fn selected_city(&self) -> Option<City> {
        self.state.lock().selected().cloned()
    }

    pub fn recent_cities(&self) -> Vec<RecentCity> {
        self.state.lock().recents().to_vec()
    }

    pub fn current_location(&self) -> Option<City> {
        self.state.lock().current_location().cloned()
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.settings.lock().unit
    }

    pub fn coordinator(&self) -> &Arc<WeatherCoordinator> {
        &self.coordinator
    }

    pub fn select_city(&self, city: City) {
        self.transition(|state| state.select_city(city));
    }

    pub fn remove_city(&self, city: &City) {
        self.transition(|state| state.remove_city(city));
    }

    pub fn clear_recent_cities(&self) {
        self.transition(|state| {
            state.clear_recent_cities();
            true
        });
    }

    pub fn reconcile_current_location(&self, resolved: City) {
        self.transition(|state| state.reconcile_current_location(resolved));
    }

    /// Run the location resolver, once per dashboard. Later calls return the
    /// first outcome without resolving again.
    pub async fn resolve_current_location(&self) -> Option<City> {
        let resolved = self
            .resolved_location
            .get_or_init(|| async {
                let city = self.location.resolve_current_location().await;
                if city.is_none() {
                    tracing::info!("Current location unavailable for this session");
                }
                city
            })
            .await
            .clone();

        if let Some(city) = &resolved {
            self.reconcile_current_location(city.clone());
        }
        resolved
    }

    /// Selected city plus every recent city other than it.
    pub fn tracked_cities(&self) -> Vec<City> {
        visible_cities(&self.state.lock())
    }

    /// Track the visible cities and resolve their weather concurrently.
    /// Returns how many cities have data.
    pub async fn refresh_weather(&self) -> usize {
        self.refresh_weather_at(Utc::now()).await
    }

    pub async fn refresh_weather_at(&self, now: DateTime<Utc>) -> usize {
        let cities = self.tracked_cities();
        self.coordinator.track(&cities, now);
        self.coordinator.resolve_all(&cities, now).await
    }

    /// Look up background images for visible cities that lack one.
    pub async fn refresh_city_images(&self) {
        let missing: Vec<City> = {
            let state = self.state.lock();
            let selected = state
                .selected()
                .filter(|_| state.selected_image().is_none())
                .cloned();
            selected
                .into_iter()
                .chain(
                    state
                        .recents()
                        .iter()
                        .filter(|r| r.city_image.is_none())
                        .map(|r| r.city.clone()),
                )
                .collect()
        };

        for city in missing {
            if let Some(url) = self.images.fetch(&city.name).await {
                self.transition(|state| state.set_city_image(&city, url));
            }
        }
    }

    pub fn selected_view(&self, now: DateTime<Utc>) -> Option<CityWeatherView> {
        let (city, image, is_current) = {
            let state = self.state.lock();
            let city = state.selected()?.clone();
            let is_current = state.is_current_location(&city);
            (city, state.selected_image().map(String::from), is_current)
        };
        Some(self.view_for(city, image, is_current, now))
    }

    /// Views for the recents list, never including the selected city.
    pub fn recent_views(&self, now: DateTime<Utc>) -> Vec<CityWeatherView> {
        let entries: Vec<(RecentCity, bool)> = {
            let state = self.state.lock();
            let selected = state.selected();
            state
                .recents()
                .iter()
                .filter(|r| !selected.is_some_and(|s| is_same_city(s, &r.city)))
                .map(|r| (r.clone(), state.is_current_location(&r.city)))
                .collect()
        };

        entries
            .into_iter()
            .map(|(recent, is_current)| self.view_for(recent.city, recent.city_image, is_current, now))
            .collect()
    }

    pub fn set_unit(&self, unit: TemperatureUnit) {
        let mut settings = self.settings.lock();
        settings.unit = unit;
        self.storage.write(keys::SETTINGS, &*settings);
    }

    fn view_for(
        &self,
        city: City,
        image: Option<String>,
        is_current: bool,
        now: DateTime<Utc>,
    ) -> CityWeatherView {
        let (weather_data, is_loading) = match self.coordinator.slot(&city) {
            Some(WeatherSlot::Loading) => (None, true),
            Some(WeatherSlot::Ready(payload)) => (payload, false),
            None => (
                self.coordinator
                    .cache()
                    .get_at(city.latitude, city.longitude, now),
                false,
            ),
        };
        let city_image = image.or_else(|| self.images.get(&city.name));
        let day_period = classify(city.latitude, city.longitude, now);

        CityWeatherView {
            city,
            city_image,
            weather_data,
            day_period,
            is_loading,
            is_current,
        }
    }

    /// Apply a transition; persist selection and recents if it changed.
    /// Cities that just became visible read as loading until resolved.
    fn transition(&self, apply: impl FnOnce(&mut RecentCities) -> bool) {
        let mut state = self.state.lock();
        if !apply(&mut *state) {
            return;
        }
        match state.selected() {
            Some(city) => self.storage.write(keys::CITY, city),
            None => self.storage.remove(keys::CITY),
        }
        self.storage.write(keys::RECENT_CITIES, state.recents());
        self.coordinator.track(&visible_cities(&state), Utc::now());
    }
}

fn visible_cities(state: &RecentCities) -> Vec<City> {
    let selected = state.selected().cloned();
    let mut cities: Vec<City> = selected.iter().cloned().collect();
    cities.extend(
        state
            .recents()
            .iter()
            .filter(|r| !selected.as_ref().is_some_and(|s| is_same_city(s, &r.city)))
            .map(|r| r.city.clone()),
    );
    cities
}
