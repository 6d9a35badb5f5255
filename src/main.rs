use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use litensky_core::{AppError, Config, MemoryStore, SqliteStore, Storage};
use litensky_dashboard::{CityWeatherView, Dashboard, DashboardDeps, DayPeriodTicker, TemperatureUnit, DEFAULT_TICK_INTERVAL};
use litensky_weather::{ChainedLocationResolver, City, CityImageSource, TomorrowProvider, WikiImageProvider};

fn open_storage(config: &Config) -> Storage {
    let path = config.database_path();
    if let Err(e) = std::fs::create_dir_all(&config.config_dir) {
        tracing::warn!("Cannot create {}: {}", config.config_dir.display(), e);
    }
    match SqliteStore::open(&path) {
        Ok(store) => Storage::new(Arc::new(store)),
        Err(e) => {
            tracing::warn!("{} - state will not be kept between runs", e.user_message());
            Storage::new(Arc::new(MemoryStore::new()))
        }
    }
}

/// `litensky [NAME LATITUDE LONGITUDE]`
fn city_from_args() -> Result<Option<City>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [] => Ok(None),
        [name, latitude, longitude] => {
            let latitude: f64 = latitude.parse().context("Invalid latitude")?;
            let longitude: f64 = longitude.parse().context("Invalid longitude")?;
            Ok(Some(City::new(name.as_str(), latitude, longitude)))
        }
        _ => anyhow::bail!("Usage: litensky [NAME LATITUDE LONGITUDE]"),
    }
}

fn print_view(view: &CityWeatherView, unit: TemperatureUnit) {
    let marker = if view.is_current { " (current location)" } else { "" };
    let weather = match (view.temperature(unit), view.description()) {
        (Some(temperature), Some(description)) => {
            format!("{}{} {}", temperature, unit.symbol(), description)
        }
        _ if view.is_loading => "loading".to_string(),
        _ => "no data".to_string(),
    };
    println!("  {}{}: {} [{}]", view.city.name, marker, weather, view.day_period);
}

#[tokio::main]
async fn main() -> Result<()> {
    litensky_core::init()?;

    let (config, _) = Config::load_validated()?;
    let requested = city_from_args()?;

    let location_timeout = Duration::from_secs(config.location.timeout_secs);
    let images: Option<Arc<dyn CityImageSource>> = if config.images.enabled {
        Some(Arc::new(WikiImageProvider::new(&config.images, location_timeout)?))
    } else {
        None
    };

    let dashboard = Dashboard::load(DashboardDeps {
        storage: open_storage(&config),
        weather: Arc::new(TomorrowProvider::new(&config.weather).map_err(AppError::from)?),
        location: Arc::new(
            ChainedLocationResolver::from_config(&config.location).map_err(AppError::from)?,
        ),
        images,
    });

    tracing::info!("LitenSky started");

    if let Some(city) = requested {
        dashboard.select_city(city);
    }
    dashboard.resolve_current_location().await;

    let resolved = dashboard.refresh_weather().await;
    tracing::info!("Weather available for {} cities", resolved);
    dashboard.refresh_city_images().await;

    let now = Utc::now();
    let unit = dashboard.unit();

    println!("LitenSky");
    match dashboard.selected_view(now) {
        Some(view) => {
            let ticker = DayPeriodTicker::spawn(&view.city, DEFAULT_TICK_INTERVAL);
            println!("Selected:");
            print_view(&view, unit);
            println!("  day period now: {}", ticker.period());
        }
        None => println!("No city selected"),
    }

    let recents = dashboard.recent_views(now);
    if !recents.is_empty() {
        println!("Recent cities:");
        for view in &recents {
            print_view(view, unit);
        }
    }

    Ok(())
}
