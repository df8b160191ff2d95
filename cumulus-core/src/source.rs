//! Source contract and capability model.
//!
//! A source is one vendor integration: static metadata, two pure capability
//! functions the orchestrator may call for every candidate on every refresh,
//! and the async fetch itself. Sources are immutable after construction and
//! shared read-only across concurrent requests.

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::model::{Location, WeatherFragment};

/// One independently requestable category of weather data.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Forecast,
    Current,
    AirQuality,
    Alert,
    Minutely,
    Normals,
    Pollen,
    ReverseGeocoding,
}

impl Feature {
    pub const ALL: &[Self] = &[
        Self::Forecast,
        Self::Current,
        Self::AirQuality,
        Self::Alert,
        Self::Minutely,
        Self::Normals,
        Self::Pollen,
        Self::ReverseGeocoding,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::Forecast => "forecast",
            Self::Current => "current",
            Self::AirQuality => "air_quality",
            Self::Alert => "alert",
            Self::Minutely => "minutely",
            Self::Normals => "normals",
            Self::Pollen => "pollen",
            Self::ReverseGeocoding => "reverse_geocoding",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.id() == id)
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Self-reported ranking of a source for one feature at one location.
/// `None` excludes the source from automatic selection even when
/// `supports_feature` returns true.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    None,
    Low,
    High,
    Highest,
}

/// What one source call produced: the canonical fragment, per-feature
/// failures for the endpoints that went wrong inside a combined call, plus
/// (copy-on-write) any location artifacts the source resolved along the way.
#[derive(Debug, Clone, Default)]
pub struct SourceOutput {
    pub fragment: WeatherFragment,
    /// Features this call could not serve (one vendor endpoint may fail
    /// while another succeeds).
    pub failures: std::collections::BTreeMap<Feature, ProviderError>,
    /// Replaces `Location.parameters[source_id]` when present. Sources never
    /// mutate the Location they were handed.
    pub resolved_parameters: Option<HashMap<String, String>>,
}

/// One vendor integration. Static per build, stateless after construction;
/// per-call state such as API keys is read from configuration at build time.
#[async_trait]
pub trait WeatherSource: Send + Sync + std::fmt::Debug {
    /// Stable lowercase id, unique across all sources, used as map key.
    fn id(&self) -> &'static str;

    fn name(&self) -> &'static str;

    fn continent(&self) -> &'static str;

    fn privacy_policy_url(&self) -> &'static str;

    /// Features this source can ever serve, with attribution strings.
    fn supported_features(&self) -> &'static [(Feature, &'static str)];

    /// Pure function of (location, feature): no network, no mutable state.
    fn supports_feature(&self, location: &Location, feature: Feature) -> bool;

    /// Pure function of (location, feature).
    fn feature_priority(&self, location: &Location, feature: Feature) -> Priority;

    /// Fetch and normalize the requested features. Sections outside
    /// `features` must be absent in the returned fragment.
    async fn request_weather(
        &self,
        location: &Location,
        features: &BTreeSet<Feature>,
    ) -> Result<SourceOutput, ProviderError>;

    /// Resolve vendor-specific location artifacts (e.g. a grid cell id).
    /// Sources without such artifacts keep the default.
    async fn resolve_location_parameters(
        &self,
        _location: &Location,
    ) -> Result<Option<HashMap<String, String>>, ProviderError> {
        Ok(None)
    }

    /// Reverse-geocode coordinates into a Location. Only meaningful for
    /// sources declaring [`Feature::ReverseGeocoding`].
    async fn reverse_geocode(
        &self,
        _latitude: f64,
        _longitude: f64,
    ) -> Result<Location, ProviderError> {
        Err(ProviderError::invalid_data(
            "source does not implement reverse geocoding",
        ))
    }

    /// Whether the source declares `feature` at all, location aside.
    fn declares_feature(&self, feature: Feature) -> bool {
        self.supported_features().iter().any(|(f, _)| *f == feature)
    }

    /// Attribution string for `feature`, when declared.
    fn attribution(&self, feature: Feature) -> Option<&'static str> {
        self.supported_features()
            .iter()
            .find(|(f, _)| *f == feature)
            .map(|(_, a)| *a)
    }
}

/// Explicit registry value constructed once at startup and passed into the
/// orchestrator; there is no global source state.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn WeatherSource>>,
}

impl SourceRegistry {
    pub fn new(sources: Vec<Arc<dyn WeatherSource>>) -> Self {
        let mut registry = Self { sources };
        // Selection must be invariant to construction order.
        registry.sources.sort_by_key(|s| s.id());
        registry
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn WeatherSource>> {
        self.sources.iter().find(|s| s.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn WeatherSource>> {
        self.sources.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Pick the source for `feature` at `location`: highest priority wins,
    /// equal priorities break toward the lexicographically smaller id.
    /// `Priority::None` excludes a source even when it claims support.
    pub fn select(&self, location: &Location, feature: Feature) -> Option<Arc<dyn WeatherSource>> {
        self.sources
            .iter()
            .filter(|s| {
                s.supports_feature(location, feature)
                    && s.feature_priority(location, feature) > Priority::None
            })
            .max_by_key(|s| (s.feature_priority(location, feature), Reverse(s.id())))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct FakeSource {
        id: &'static str,
        priority: Priority,
        supports: bool,
    }

    #[async_trait]
    impl WeatherSource for FakeSource {
        fn id(&self) -> &'static str {
            self.id
        }
        fn name(&self) -> &'static str {
            "Fake"
        }
        fn continent(&self) -> &'static str {
            "Worldwide"
        }
        fn privacy_policy_url(&self) -> &'static str {
            "https://example.com/privacy"
        }
        fn supported_features(&self) -> &'static [(Feature, &'static str)] {
            &[(Feature::Forecast, "Fake data")]
        }
        fn supports_feature(&self, _location: &Location, _feature: Feature) -> bool {
            self.supports
        }
        fn feature_priority(&self, _location: &Location, _feature: Feature) -> Priority {
            self.priority
        }
        async fn request_weather(
            &self,
            _location: &Location,
            _features: &BTreeSet<Feature>,
        ) -> Result<SourceOutput, ProviderError> {
            Ok(SourceOutput::default())
        }
    }

    fn fake(id: &'static str, priority: Priority) -> Arc<dyn WeatherSource> {
        Arc::new(FakeSource {
            id,
            priority,
            supports: true,
        })
    }

    fn somewhere() -> Location {
        Location::new(48.85, 2.35, "Europe/Paris")
    }

    #[test]
    fn priority_tiers_order() {
        assert!(Priority::None < Priority::Low);
        assert!(Priority::Low < Priority::High);
        assert!(Priority::High < Priority::Highest);
    }

    #[test]
    fn highest_priority_wins() {
        let registry = SourceRegistry::new(vec![
            fake("alpha", Priority::Low),
            fake("beta", Priority::Highest),
        ]);
        let picked = registry.select(&somewhere(), Feature::Forecast).unwrap();
        assert_eq!(picked.id(), "beta");
    }

    #[test]
    fn equal_priority_breaks_toward_smaller_id() {
        let registry = SourceRegistry::new(vec![
            fake("zulu", Priority::Highest),
            fake("alpha", Priority::Highest),
        ]);
        for _ in 0..10 {
            let picked = registry.select(&somewhere(), Feature::Forecast).unwrap();
            assert_eq!(picked.id(), "alpha");
        }
    }

    #[test]
    fn selection_is_invariant_to_registration_order() {
        let forward = SourceRegistry::new(vec![
            fake("alpha", Priority::High),
            fake("beta", Priority::High),
        ]);
        let backward = SourceRegistry::new(vec![
            fake("beta", Priority::High),
            fake("alpha", Priority::High),
        ]);
        let loc = somewhere();
        assert_eq!(
            forward.select(&loc, Feature::Forecast).unwrap().id(),
            backward.select(&loc, Feature::Forecast).unwrap().id(),
        );
    }

    #[test]
    fn priority_none_excludes_even_when_supported() {
        let registry = SourceRegistry::new(vec![Arc::new(FakeSource {
            id: "alpha",
            priority: Priority::None,
            supports: true,
        }) as Arc<dyn WeatherSource>]);
        assert!(registry.select(&somewhere(), Feature::Forecast).is_none());
    }

    #[test]
    fn unsupported_feature_yields_no_selection() {
        let registry = SourceRegistry::new(vec![Arc::new(FakeSource {
            id: "alpha",
            priority: Priority::Highest,
            supports: false,
        }) as Arc<dyn WeatherSource>]);
        assert!(registry.select(&somewhere(), Feature::Forecast).is_none());
    }
}
