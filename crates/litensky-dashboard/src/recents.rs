//! Selection state: the selected city, the current-location city and the
//! recents list.
//!
//! Invariants kept by every transition:
//! - the selected city never appears in the recents list
//! - the list holds at most `MAX_RECENT_CITIES` entries, no two of them the same city
//! - once the current location is known it sits at index 0 unless it is selected

use litensky_weather::{add_city_to_recents, is_same_city, position_of, City, RecentCity, MAX_RECENT_CITIES};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecentCities {
    selected: Option<City>,
    selected_image: Option<String>,
    current_location: Option<City>,
    recents: Vec<RecentCity>,
}

impl RecentCities {
    /// Initial state from persisted values. Entries matching the stored
    /// selection, blank names and duplicates are dropped; the rest is
    /// truncated to the list bound.
    pub fn load(stored_selected: Option<City>, stored_recents: Vec<RecentCity>) -> Self {
        let selected = stored_selected.filter(|c| !c.has_blank_name());

        let mut recents: Vec<RecentCity> = Vec::with_capacity(stored_recents.len());
        for entry in stored_recents {
            if entry.city.has_blank_name() {
                continue;
            }
            if selected.as_ref().is_some_and(|s| is_same_city(s, &entry.city)) {
                continue;
            }
            if position_of(&recents, &entry.city).is_some() {
                continue;
            }
            recents.push(entry);
        }
        recents.truncate(MAX_RECENT_CITIES);

        Self {
            selected,
            selected_image: None,
            current_location: None,
            recents,
        }
    }

    pub fn selected(&self) -> Option<&City> {
        self.selected.as_ref()
    }

    pub fn selected_image(&self) -> Option<&str> {
        self.selected_image.as_deref()
    }

    pub fn current_location(&self) -> Option<&City> {
        self.current_location.as_ref()
    }

    pub fn recents(&self) -> &[RecentCity] {
        &self.recents
    }

    pub fn is_current_location(&self, city: &City) -> bool {
        self.current_location
            .as_ref()
            .is_some_and(|current| is_same_city(current, city))
    }

    /// Make `city` the selection. The previous selection moves into the
    /// recents list, behind the current-location city when that is known.
    ///
    /// Returns false (and changes nothing) when the name is blank.
    pub fn select_city(&mut self, city: City) -> bool {
        if city.has_blank_name() {
            tracing::debug!("Ignoring selection of a city with a blank name");
            return false;
        }

        let previous = self.selected.take();
        let previous_image = self.selected_image.take();

        let mut image = self
            .recents
            .iter()
            .find(|c| is_same_city(&c.city, &city))
            .and_then(|c| c.city_image.clone());
        self.recents.retain(|c| !is_same_city(&c.city, &city));

        match previous {
            Some(previous) if !is_same_city(&previous, &city) => {
                let pin = self
                    .current_location
                    .as_ref()
                    .filter(|current| !is_same_city(current, &city))
                    .map(|current| self.pinned_entry(current));
                let demoted = RecentCity::with_image(previous, previous_image);
                self.recents = add_city_to_recents(&self.recents, demoted, pin.as_ref());
            }
            Some(_) => image = image.or(previous_image),
            None => {}
        }

        self.recents.truncate(MAX_RECENT_CITIES);
        tracing::debug!("Selected {} ({} recent cities)", city.name, self.recents.len());
        self.selected = Some(city);
        self.selected_image = image;
        true
    }

    /// Drop `city` from the recents list. The current-location entry is
    /// protected. Returns whether the list changed.
    pub fn remove_city(&mut self, city: &City) -> bool {
        if self.is_current_location(city) {
            tracing::debug!("Not removing current location {}", city.name);
            return false;
        }
        let before = self.recents.len();
        self.recents.retain(|c| !is_same_city(&c.city, city));
        before != self.recents.len()
    }

    /// Record the resolved current location. Only the first call has any
    /// effect. Selects the city when nothing is selected yet, otherwise pins
    /// it at the head of the recents list.
    pub fn reconcile_current_location(&mut self, resolved: City) -> bool {
        if let Some(existing) = &self.current_location {
            tracing::debug!(
                "Current location already settled as {}, ignoring {}",
                existing.name,
                resolved.name
            );
            return false;
        }
        self.current_location = Some(resolved.clone());

        let selected_matches = self
            .selected
            .as_ref()
            .map(|s| is_same_city(s, &resolved));

        match selected_matches {
            None => {
                self.select_city(resolved);
            }
            Some(true) => {
                self.recents.retain(|c| !is_same_city(&c.city, &resolved));
            }
            Some(false) => {
                let already_first = self
                    .recents
                    .first()
                    .is_some_and(|c| is_same_city(&c.city, &resolved));
                if !already_first {
                    let pinned = self.pinned_entry(&resolved);
                    self.recents.retain(|c| !is_same_city(&c.city, &resolved));
                    self.recents.insert(0, pinned);
                    self.recents.truncate(MAX_RECENT_CITIES);
                }
            }
        }
        true
    }

    /// Empty the recents list. A known current location becomes the selection.
    pub fn clear_recent_cities(&mut self) {
        self.recents.clear();
        if let Some(current) = self.current_location.clone() {
            let already_selected = self
                .selected
                .as_ref()
                .is_some_and(|s| is_same_city(s, &current));
            if !already_selected {
                self.selected = Some(current);
                self.selected_image = None;
            }
        }
    }

    /// Attach a background image to every record of `city`. Returns whether
    /// anything changed.
    pub fn set_city_image(&mut self, city: &City, url: String) -> bool {
        let mut changed = false;
        for entry in self.recents.iter_mut().filter(|c| is_same_city(&c.city, city)) {
            if entry.city_image.as_deref() != Some(url.as_str()) {
                entry.city_image = Some(url.clone());
                changed = true;
            }
        }
        if self.selected.as_ref().is_some_and(|s| is_same_city(s, city))
            && self.selected_image.as_deref() != Some(url.as_str())
        {
            self.selected_image = Some(url);
            changed = true;
        }
        changed
    }

    /// Entry for `city`, keeping an image already known for it.
    fn pinned_entry(&self, city: &City) -> RecentCity {
        let image = self
            .recents
            .iter()
            .find(|c| is_same_city(&c.city, city))
            .and_then(|c| c.city_image.clone());
        RecentCity::with_image(city.clone(), image)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    fn new_york() -> City {
        City::new("New York", 40.7128, -74.006)
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

    fn names(state: &RecentCities) -> Vec<&str> {
        state.recents().iter().map(|c| c.city.name.as_str()).collect()
    }

    fn assert_invariants(state: &RecentCities) {
        assert!(state.recents().len() <= MAX_RECENT_CITIES);
        if let Some(selected) = state.selected() {
            assert!(
                position_of(state.recents(), selected).is_none(),
                "selected {} present in recents {:?}",
                selected.name,
                names(state)
            );
        }
        for (i, a) in state.recents().iter().enumerate() {
            for b in &state.recents()[i + 1..] {
                assert!(!is_same_city(&a.city, &b.city), "duplicate {}", a.city.name);
            }
        }
        if let Some(current) = state.current_location() {
            let selected_is_current = state.selected().is_some_and(|s| is_same_city(s, current));
            if !selected_is_current {
                assert!(is_same_city(&state.recents()[0].city, current));
            }
        }
    }

    #[test]
    fn test_first_selection_leaves_recents_empty() {
        let mut state = RecentCities::default();
        assert!(state.select_city(new_york()));

        assert!(state.recents().is_empty());
        assert_eq!(state.selected().unwrap().name, "New York");
    }

    #[test]
    fn test_previous_selection_moves_to_recents() {
        let mut state = RecentCities::default();
        state.select_city(new_york());
        state.select_city(london());

        assert_eq!(names(&state), vec!["New York"]);
        assert_eq!(state.selected().unwrap().name, "London");
    }

    #[test]
    fn test_selecting_away_from_current_location_keeps_single_entry() {
        let mut state = RecentCities::default();
        state.reconcile_current_location(paris());
        assert_eq!(state.selected().unwrap().name, "Paris");

        state.select_city(tokyo());

        assert_eq!(names(&state), vec!["Paris"]);
        assert_eq!(state.selected().unwrap().name, "Tokyo");
        assert_invariants(&state);
    }

    #[test]
    fn test_blank_name_is_ignored() {
        let mut state = RecentCities::default();
        state.select_city(london());
        assert!(!state.select_city(City::new("   ", 1.0, 1.0)));
        assert_eq!(state.selected().unwrap().name, "London");
        assert!(state.recents().is_empty());
    }

    #[test]
    fn test_reselecting_recent_moves_it_out_of_list() {
        let mut state = RecentCities::default();
        state.select_city(new_york());
        state.select_city(london());
        state.select_city(tokyo());
        assert_eq!(names(&state), vec!["London", "New York"]);

        state.select_city(City::new("new york", 40.71, -74.0));
        assert_eq!(names(&state), vec!["Tokyo", "London"]);
        assert_invariants(&state);
    }

    #[test]
    fn test_previous_goes_behind_current_location() {
        let mut state = RecentCities::default();
        state.select_city(london());
        state.reconcile_current_location(paris());
        assert_eq!(names(&state), vec!["Paris"]);

        state.select_city(tokyo());
        assert_eq!(names(&state), vec!["Paris", "London"]);

        state.select_city(new_york());
        assert_eq!(names(&state), vec!["Paris", "Tokyo", "London"]);
        assert_invariants(&state);
    }

    #[test]
    fn test_selecting_current_location_hides_it_until_left() {
        let mut state = RecentCities::default();
        state.select_city(london());
        state.reconcile_current_location(paris());

        state.select_city(paris());
        assert_eq!(names(&state), vec!["London"]);
        assert_invariants(&state);

        state.select_city(tokyo());
        assert_eq!(names(&state), vec!["Paris", "London"]);
        assert_invariants(&state);
    }

    #[test]
    fn test_remove_current_location_is_noop() {
        let mut state = RecentCities::default();
        state.select_city(london());
        state.reconcile_current_location(paris());
        let before = state.clone();

        assert!(!state.remove_city(&City::new("PARIS", 48.86, 2.35)));
        assert_eq!(state, before);
    }

    #[test]
    fn test_remove_city() {
        let mut state = RecentCities::default();
        state.select_city(new_york());
        state.select_city(london());
        state.select_city(tokyo());

        assert!(state.remove_city(&new_york()));
        assert_eq!(names(&state), vec!["London"]);
        assert!(!state.remove_city(&new_york()));
    }

    #[test]
    fn test_reconcile_is_settled_once() {
        let mut state = RecentCities::default();
        state.select_city(london());
        assert!(state.reconcile_current_location(paris()));
        assert!(!state.reconcile_current_location(tokyo()));

        assert_eq!(state.current_location().unwrap().name, "Paris");
        assert_eq!(names(&state), vec!["Paris"]);
    }

    #[test]
    fn test_reconcile_carries_existing_image() {
        let mut state = RecentCities::load(
            Some(london()),
            vec![
                RecentCity::from(tokyo()),
                RecentCity::with_image(paris(), Some("https://img/paris.jpg".into())),
            ],
        );
        state.reconcile_current_location(City::new("Paris", 48.857, 2.352));

        assert_eq!(names(&state), vec!["Paris", "Tokyo"]);
        assert_eq!(state.recents()[0].city_image.as_deref(), Some("https://img/paris.jpg"));
    }

    #[test]
    fn test_reconcile_when_already_first_changes_nothing() {
        let mut state = RecentCities::load(
            Some(london()),
            vec![RecentCity::from(paris()), RecentCity::from(tokyo())],
        );
        state.reconcile_current_location(paris());
        assert_eq!(names(&state), vec!["Paris", "Tokyo"]);
    }

    #[test]
    fn test_reconcile_of_selected_city_does_not_list_it() {
        let mut state = RecentCities::default();
        state.select_city(paris());
        state.reconcile_current_location(City::new("Paris", 48.8567, 2.3523));

        assert!(state.recents().is_empty());
        assert!(state.is_current_location(&paris()));
        assert_invariants(&state);
    }

    #[test]
    fn test_reconcile_and_select_commute() {
        for initial in [None, Some(london())] {
            let mut a = RecentCities::default();
            let mut b = RecentCities::default();
            if let Some(city) = &initial {
                a.select_city(city.clone());
                b.select_city(city.clone());
            }

            a.reconcile_current_location(paris());
            a.select_city(tokyo());

            b.select_city(tokyo());
            b.reconcile_current_location(paris());

            assert_eq!(a.selected(), b.selected());
            assert_eq!(names(&a), names(&b));
            assert_invariants(&a);
            assert_invariants(&b);
        }
    }

    #[test]
    fn test_list_is_bounded() {
        let mut state = RecentCities::default();
        state.reconcile_current_location(paris());
        for i in 0..40 {
            state.select_city(City::new(format!("City {}", i), i as f64, i as f64 * 2.0));
            assert_invariants(&state);
        }
        assert_eq!(state.recents().len(), MAX_RECENT_CITIES);
        assert_eq!(state.recents()[0].city.name, "Paris");
        assert_eq!(state.recents()[1].city.name, "City 38");
    }

    #[test]
    fn test_arbitrary_sequences_keep_invariants() {
        let pool = [new_york(), london(), paris(), tokyo(), City::new("Lima", -12.0464, -77.0428)];
        let mut state = RecentCities::default();
        // Deterministic pseudo-random walk over the pool
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        for step in 0..500 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let city = pool[(seed % pool.len() as u64) as usize].clone();
            match seed % 7 {
                0 => {
                    state.remove_city(&city);
                }
                1 if step > 100 => {
                    state.reconcile_current_location(city);
                }
                2 => state.clear_recent_cities(),
                _ => {
                    state.select_city(city);
                }
            }
            assert_invariants(&state);
        }
    }

    #[test]
    fn test_load_filters_selected_and_duplicates() {
        let stored: Vec<RecentCity> = vec![
            london().into(),
            tokyo().into(),
            City::new("TOKYO", 35.7, 139.7).into(),
            City::new("", 0.0, 0.0).into(),
            paris().into(),
        ];
        let state = RecentCities::load(Some(City::new("london", 51.5, -0.12)), stored);

        assert_eq!(names(&state), vec!["Tokyo", "Paris"]);
        assert_invariants(&state);
    }

    #[test]
    fn test_load_truncates() {
        let stored: Vec<RecentCity> = (0..30)
            .map(|i| City::new(format!("City {}", i), i as f64, 0.0).into())
            .collect();
        let state = RecentCities::load(None, stored);
        assert_eq!(state.recents().len(), MAX_RECENT_CITIES);
        assert_eq!(state.recents()[19].city.name, "City 19");
    }

    #[test]
    fn test_clear_selects_current_location() {
        let mut state = RecentCities::default();
        state.select_city(london());
        state.reconcile_current_location(paris());
        state.select_city(tokyo());

        state.clear_recent_cities();

        assert!(state.recents().is_empty());
        assert_eq!(state.selected().unwrap().name, "Paris");
        assert_invariants(&state);
    }

    #[test]
    fn test_clear_without_current_location_keeps_selection() {
        let mut state = RecentCities::default();
        state.select_city(london());
        state.select_city(tokyo());

        state.clear_recent_cities();
        assert!(state.recents().is_empty());
        assert_eq!(state.selected().unwrap().name, "Tokyo");
    }

    #[test]
    fn test_images_follow_the_city() {
        let mut state = RecentCities::default();
        state.select_city(london());
        assert!(state.set_city_image(&london(), "https://img/london.jpg".into()));
        assert!(!state.set_city_image(&london(), "https://img/london.jpg".into()));
        assert_eq!(state.selected_image(), Some("https://img/london.jpg"));

        state.select_city(tokyo());
        assert_eq!(state.recents()[0].city_image.as_deref(), Some("https://img/london.jpg"));
        assert!(state.selected_image().is_none());

        state.select_city(london());
        assert_eq!(state.selected_image(), Some("https://img/london.jpg"));
    }
}
