//! Dashboard state for LitenSky
//!
//! Owns the selection and recents list, coordinates per-city weather
//! fetches and produces the view models the presentation layer draws.

pub mod coordinator;
pub mod dashboard;
pub mod images;
pub mod recents;
pub mod settings;
pub mod ticker;
pub mod view;

pub use coordinator::{WeatherCoordinator, WeatherSlot};
pub use dashboard::{Dashboard, DashboardDeps};
pub use images::CityImageCache;
pub use recents::RecentCities;
pub use settings::{convert_temperature, Settings, TemperatureUnit};
pub use ticker::{DayPeriodTicker, DEFAULT_TICK_INTERVAL};
pub use view::CityWeatherView;
