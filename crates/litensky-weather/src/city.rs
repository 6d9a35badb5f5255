//! City identity and recents-list helpers.

use crate::types::{City, RecentCity};

/// Maximum number of cities kept in the recents list.
pub const MAX_RECENT_CITIES: usize = 20;

/// Coordinates closer than this (degrees, both axes) are the same point (~11 m).
const SAME_POINT_DEGREES: f64 = 0.0001;

/// Same-named cities closer than this (degrees, both axes) are one place (~55 km).
const SAME_NAME_DEGREES: f64 = 0.5;

/// Are two cities the same place?
///
/// Either the coordinates coincide, or the names match case-insensitively and
/// the coordinates are loosely close. The second rule absorbs geocoder jitter
/// without merging distinct same-named cities far apart.
pub fn is_same_city(a: &City, b: &City) -> bool {
    let d_lat = (a.latitude - b.latitude).abs();
    let d_lon = (a.longitude - b.longitude).abs();

    if d_lat < SAME_POINT_DEGREES && d_lon < SAME_POINT_DEGREES {
        return true;
    }

    d_lat < SAME_NAME_DEGREES
        && d_lon < SAME_NAME_DEGREES
        && a.name.to_lowercase() == b.name.to_lowercase()
}

/// Put `city` at the front of `cities`, removing duplicates first.
///
/// When `current_location` is given and differs from `city`, it is pinned in
/// front: `[current, city, ...rest]`.
pub fn add_city_to_recents(
    cities: &[RecentCity],
    city: RecentCity,
    current_location: Option<&RecentCity>,
) -> Vec<RecentCity> {
    let rest: Vec<RecentCity> = cities
        .iter()
        .filter(|c| {
            !is_same_city(&c.city, &city.city)
                && current_location.map_or(true, |cur| !is_same_city(&c.city, &cur.city))
        })
        .cloned()
        .collect();

    let mut result = Vec::with_capacity(cities.len() + 2);
    match current_location {
        Some(current) if !is_same_city(&city.city, &current.city) => {
            result.push(current.clone());
            result.push(city);
        }
        _ => result.push(city),
    }
    result.extend(rest);
    result
}

/// Index of the entry matching `city`, if any.
pub fn position_of(cities: &[RecentCity], city: &City) -> Option<usize> {
    cities.iter().position(|c| is_same_city(&c.city, city))
}
