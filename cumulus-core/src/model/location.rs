use std::collections::HashMap;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// A place weather can be requested for.
///
/// Created by geocoding/search; providers that resolve location-specific
/// artifacts (e.g. a forecast grid cell) cache them in `parameters` keyed by
/// source id. The cached entry is only trusted while `coordinates_changed`
/// is false; moving the pin invalidates every cached artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// IANA timezone identifier, e.g. "Europe/Oslo".
    pub timezone: String,
    /// Display name from geocoding, e.g. "Bergen".
    pub name: String,
    /// ISO 3166-1 alpha-2 country code, uppercase.
    pub country_code: String,
    /// First-level administrative division, when geocoding resolves one.
    pub admin: Option<String>,
    /// Per-source resolution artifacts, keyed by source id then artifact name.
    #[serde(default)]
    pub parameters: HashMap<String, HashMap<String, String>>,
    /// Set by the caller when coordinates were edited since the last refresh.
    #[serde(default)]
    pub coordinates_changed: bool,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, timezone: &str) -> Self {
        Self {
            latitude,
            longitude,
            timezone: timezone.to_owned(),
            name: String::new(),
            country_code: String::new(),
            admin: None,
            parameters: HashMap::new(),
            coordinates_changed: false,
        }
    }

    /// Parse the stored timezone identifier, falling back to UTC when the
    /// identifier is unknown to the tz database.
    pub fn tz(&self) -> Tz {
        self.timezone.parse().unwrap_or(Tz::UTC)
    }

    /// Cached artifacts for `source_id`, or `None` when absent or stale.
    pub fn source_parameters(&self, source_id: &str) -> Option<&HashMap<String, String>> {
        if self.coordinates_changed {
            return None;
        }
        self.parameters.get(source_id)
    }

    /// Copy-on-write update: returns a new Location carrying the resolved
    /// artifacts for `source_id`. Providers never mutate a Location in place.
    pub fn with_source_parameters(
        &self,
        source_id: &str,
        params: HashMap<String, String>,
    ) -> Self {
        let mut updated = self.clone();
        updated.parameters.insert(source_id.to_owned(), params);
        updated.coordinates_changed = false;
        updated
    }

    pub fn is_in_country(&self, code: &str) -> bool {
        self.country_code.eq_ignore_ascii_case(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bergen() -> Location {
        let mut loc = Location::new(60.39, 5.32, "Europe/Oslo");
        loc.name = "Bergen".to_owned();
        loc.country_code = "NO".to_owned();
        loc
    }

    #[test]
    fn unknown_timezone_falls_back_to_utc() {
        let loc = Location::new(0.0, 0.0, "Not/AZone");
        assert_eq!(loc.tz(), Tz::UTC);
    }

    #[test]
    fn stale_coordinates_hide_cached_parameters() {
        let loc = bergen().with_source_parameters(
            "nws",
            HashMap::from([("gridId".to_owned(), "ABC".to_owned())]),
        );
        assert!(loc.source_parameters("nws").is_some());

        let mut moved = loc.clone();
        moved.coordinates_changed = true;
        assert!(moved.source_parameters("nws").is_none());
    }

    #[test]
    fn with_source_parameters_does_not_touch_the_original() {
        let loc = bergen();
        let _updated = loc.with_source_parameters("nws", HashMap::new());
        assert!(loc.parameters.is_empty());
    }
}
