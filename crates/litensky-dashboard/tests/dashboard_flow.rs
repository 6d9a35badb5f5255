//! End-to-end dashboard behaviour with in-process collaborators.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use litensky_core::{keys, SqliteStore, Storage};
use litensky_dashboard::{Dashboard, DashboardDeps, TemperatureUnit, WeatherCoordinator};
use litensky_weather::{
    City, CityImageSource, GeoPoint, LocationResolver, Observation, RecentCity, WeatherCache,
    WeatherError, WeatherPayload, WeatherSource, WeatherValues,
};
use tokio::sync::Semaphore;

fn payload(latitude: f64, longitude: f64, temperature: f64) -> WeatherPayload {
    WeatherPayload {
        data: Observation {
            time: Utc.with_ymd_and_hms(2024, 6, 21, 12, 0, 0).unwrap(),
            values: WeatherValues {
                temperature,
                weather_code: 4200,
                rain_intensity: 2.5,
                cloud_cover: 80.0,
                ..Default::default()
            },
        },
        location: GeoPoint {
            lat: latitude,
            lon: longitude,
        },
    }
}

/// Counts calls and holds each one until the gate hands out a permit.
struct GatedWeather {
    calls: AtomicUsize,
    gate: Semaphore,
}

impl GatedWeather {
    fn open() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            gate: Semaphore::new(Semaphore::MAX_PERMITS),
        })
    }

    fn closed() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            gate: Semaphore::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherSource for GatedWeather {
    async fn fetch_weather(&self, latitude: f64, longitude: f64) -> Result<WeatherPayload, WeatherError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _permit = self.gate.acquire().await.unwrap();
        Ok(payload(latitude, longitude, 21.0))
    }
}

struct Here(Option<City>);

#[async_trait]
impl LocationResolver for Here {
    async fn resolve_current_location(&self) -> Option<City> {
        self.0.clone()
    }
}

struct Images;

#[async_trait]
impl CityImageSource for Images {
    async fn fetch_city_image(&self, name: &str) -> Option<String> {
        Some(format!("https://img.example/{}.jpg", name.to_lowercase()))
    }
}

fn london() -> City {
    City::new("London", 51.5072, -0.1276)
}

fn paris() -> City {
    City::new("Paris", 48.8566, 2.3522)
}

fn tokyo() -> City {
    City::new("Tokyo", 35.6762, 139.6503)
}

fn dashboard(storage: Storage, weather: Arc<GatedWeather>, here: Option<City>) -> Dashboard {
    Dashboard::load(DashboardDeps {
        storage,
        weather,
        location: Arc::new(Here(here)),
        images: Some(Arc::new(Images)),
    })
}

async fn wait_for_calls(source: &GatedWeather, expected: usize) {
    for _ in 0..200 {
        if source.calls() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("expected {} weather calls, saw {}", expected, source.calls());
}

#[tokio::test]
async fn test_refresh_fills_views_and_reuses_cache() {
    let source = GatedWeather::open();
    let dash = dashboard(Storage::in_memory(), source.clone(), Some(paris()));
    dash.select_city(london());
    dash.resolve_current_location().await;
    dash.select_city(tokyo());

    assert_eq!(dash.refresh_weather().await, 3);
    assert_eq!(source.calls(), 3);

    let now = Utc::now();
    let selected = dash.selected_view(now).unwrap();
    assert_eq!(selected.city.name, "Tokyo");
    assert_eq!(selected.temperature(TemperatureUnit::Imperial), Some(70));
    assert_eq!(selected.effects().rain, 0.5);

    let names: Vec<String> = dash.recent_views(now).into_iter().map(|v| v.city.name).collect();
    assert_eq!(names, vec!["Paris".to_string(), "London".to_string()]);

    assert_eq!(dash.refresh_weather().await, 3);
    assert_eq!(source.calls(), 3);
}

#[tokio::test]
async fn test_concurrent_requests_share_one_fetch() {
    let source = GatedWeather::closed();
    let cache = Arc::new(WeatherCache::new(Storage::in_memory()));
    let coordinator = Arc::new(WeatherCoordinator::new(source.clone(), cache));
    let now = Utc::now();
    let oslo = City::new("Oslo", 59.9139, 10.7522);
    let nearby = City::new("Oslo S", 59.91391, 10.75221);

    let pending = {
        let coordinator = Arc::clone(&coordinator);
        let cities = vec![oslo.clone(), nearby.clone(), oslo.clone()];
        tokio::spawn(async move { coordinator.resolve_all(&cities, now).await })
    };

    wait_for_calls(&source, 1).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    source.gate.add_permits(10);

    assert_eq!(pending.await.unwrap(), 3);
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn test_late_response_does_not_resurrect_removed_city() {
    let source = GatedWeather::closed();
    let dash = Arc::new(dashboard(Storage::in_memory(), source.clone(), None));
    dash.select_city(paris());
    dash.select_city(london());

    let refresh = {
        let dash = Arc::clone(&dash);
        tokio::spawn(async move { dash.refresh_weather().await })
    };
    wait_for_calls(&source, 2).await;

    let now = Utc::now();
    assert!(dash.recent_views(now)[0].is_loading);

    dash.remove_city(&paris());
    source.gate.add_permits(10);
    refresh.await.unwrap();

    assert!(dash.recent_views(now).is_empty());
    assert!(dash.coordinator().slot(&paris()).is_none());
    assert!(dash.recent_cities().is_empty());
    assert!(dash.selected_view(now).unwrap().weather_data.is_some());
}

#[tokio::test]
async fn test_images_are_attached_and_persisted() {
    let storage = Storage::in_memory();
    let dash = dashboard(storage.clone(), GatedWeather::open(), None);
    dash.select_city(paris());
    dash.select_city(london());

    dash.refresh_city_images().await;

    let now = Utc::now();
    assert_eq!(
        dash.selected_view(now).unwrap().city_image.as_deref(),
        Some("https://img.example/london.jpg")
    );
    let recents: Vec<RecentCity> = storage.read(keys::RECENT_CITIES).unwrap();
    assert_eq!(recents[0].city_image.as_deref(), Some("https://img.example/paris.jpg"));

    let reloaded = dashboard(storage, GatedWeather::open(), None);
    assert_eq!(
        reloaded.selected_view(now).unwrap().city_image.as_deref(),
        Some("https://img.example/london.jpg")
    );
}

#[tokio::test]
async fn test_state_and_weather_survive_restart_on_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("litensky.db");

    let first = GatedWeather::open();
    {
        let storage = Storage::new(Arc::new(SqliteStore::open(&path).unwrap()));
        let dash = dashboard(storage, first.clone(), Some(paris()));
        dash.resolve_current_location().await;
        dash.select_city(tokyo());
        dash.refresh_weather().await;
    }
    assert_eq!(first.calls(), 2);

    let second = GatedWeather::open();
    let storage = Storage::new(Arc::new(SqliteStore::open(&path).unwrap()));
    let dash = dashboard(storage, second.clone(), None);

    assert_eq!(dash.selected_city().unwrap().name, "Tokyo");
    assert_eq!(dash.recent_cities()[0].city.name, "Paris");
    assert_eq!(dash.refresh_weather().await, 2);
    assert_eq!(second.calls(), 0);
}

#[tokio::test]
async fn test_clear_returns_to_current_location() {
    let dash = dashboard(Storage::in_memory(), GatedWeather::open(), Some(paris()));
    dash.resolve_current_location().await;
    dash.select_city(london());
    dash.select_city(tokyo());
    assert_eq!(dash.recent_cities().len(), 2);

    dash.clear_recent_cities();

    assert!(dash.recent_cities().is_empty());
    let selected = dash.selected_view(Utc::now()).unwrap();
    assert_eq!(selected.city.name, "Paris");
    assert!(selected.is_current);
}
