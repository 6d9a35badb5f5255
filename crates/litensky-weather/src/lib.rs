//! Weather domain for LitenSky
//!
//! City identity, the persistent weather cache, day-period classification
//! and the HTTP collaborators (weather, location, city imagery).

pub mod cache;
pub mod city;
pub mod daylight;
pub mod effects;
pub mod geocode;
pub mod image;
pub mod location;
pub mod provider;
pub mod retry;
pub mod types;

pub use cache::{cache_key, WeatherCache, WeatherCacheEntry, CACHE_DURATION};
pub use city::{add_city_to_recents, is_same_city, position_of, MAX_RECENT_CITIES};
pub use daylight::{classify, solar_times, Crossing, SolarTimes};
pub use effects::AmbientEffects;
pub use geocode::ReverseGeocoder;
pub use image::{CityImageSource, WikiImageProvider};
pub use location::{
    ChainedLocationResolver, FixedLocation, IpLocation, LocationResolver, LocationSource,
    Position, FALLBACK_CITY_NAME,
};
pub use provider::{TomorrowProvider, WeatherSource};
pub use retry::RetryConfig;
pub use types::*;
