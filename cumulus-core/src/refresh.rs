//! Fetch orchestration and merge.
//!
//! For one (location, requested-feature-set) pair: select a source per
//! feature, fan out one concurrent call per selected source, then fold the
//! fragments feature-by-feature into a single [`Weather`] aggregate with
//! explicit per-feature failure accounting. There is no retry here; retries
//! are a caller concern.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::error::{ProviderError, RefreshError};
use crate::model::{Location, Weather};
use crate::source::{Feature, SourceOutput, SourceRegistry, WeatherSource};

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of a refresh: the aggregate plus the (copy-on-write) location,
/// updated when a source resolved new location parameters.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub weather: Weather,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct Orchestrator {
    registry: SourceRegistry,
    call_timeout: Duration,
}

impl Orchestrator {
    pub fn new(registry: SourceRegistry) -> Self {
        Self {
            registry,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_call_timeout(registry: SourceRegistry, call_timeout: Duration) -> Self {
        Self {
            registry,
            call_timeout,
        }
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Per-feature selection, grouped by source so one source answering
    /// several features gets a single combined call.
    fn plan(
        &self,
        location: &Location,
        features: &BTreeSet<Feature>,
    ) -> (
        BTreeMap<&'static str, (Arc<dyn WeatherSource>, BTreeSet<Feature>)>,
        BTreeMap<Feature, ProviderError>,
    ) {
        let mut calls: BTreeMap<&'static str, (Arc<dyn WeatherSource>, BTreeSet<Feature>)> =
            BTreeMap::new();
        let mut failed: BTreeMap<Feature, ProviderError> = BTreeMap::new();

        for feature in features {
            match self.registry.select(location, *feature) {
                Some(source) => {
                    debug!(feature = %feature, source = source.id(), "selected source");
                    calls
                        .entry(source.id())
                        .or_insert_with(|| (source.clone(), BTreeSet::new()))
                        .1
                        .insert(*feature);
                }
                None => {
                    failed.insert(*feature, ProviderError::NoEligibleSource);
                }
            }
        }

        (calls, failed)
    }

    /// Fetch and merge. The request succeeds when at least one feature
    /// succeeded; it fails only when every requested feature failed, in
    /// which case the caller should fall back to its cached aggregate.
    ///
    /// Dropping the returned future aborts every outstanding source call
    /// (the JoinSet aborts its tasks on drop), without affecting requests
    /// for other locations.
    pub async fn refresh(
        &self,
        location: &Location,
        features: &BTreeSet<Feature>,
    ) -> Result<RefreshOutcome, RefreshError> {
        // The aggregate carries weather sections only; reverse geocoding
        // goes through `reverse_geocode`.
        let requested: BTreeSet<Feature> = features
            .iter()
            .copied()
            .filter(|f| *f != Feature::ReverseGeocoding)
            .collect();
        if requested.is_empty() {
            return Err(RefreshError::NoEligibleSource);
        }

        let (calls, mut failed_features) = self.plan(location, &requested);
        if calls.is_empty() {
            return Err(RefreshError::NoEligibleSource);
        }

        let mut join_set: JoinSet<(
            &'static str,
            BTreeSet<Feature>,
            Result<SourceOutput, ProviderError>,
        )> = JoinSet::new();
        for (source_id, (source, source_features)) in calls {
            let location = location.clone();
            let features = source_features.clone();
            let timeout = self.call_timeout;
            join_set.spawn(async move {
                let result =
                    match tokio::time::timeout(timeout, source.request_weather(&location, &features))
                        .await
                    {
                        Ok(result) => result,
                        Err(_) => Err(ProviderError::Timeout),
                    };
                (source_id, features, result)
            });
        }

        // Fan-in barrier: collect every outcome before merging.
        let mut outputs: BTreeMap<&'static str, SourceOutput> = BTreeMap::new();
        let mut assignments: BTreeMap<Feature, &'static str> = BTreeMap::new();
        let mut call_errors: BTreeMap<&'static str, ProviderError> = BTreeMap::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((source_id, source_features, result)) => {
                    for feature in &source_features {
                        assignments.insert(*feature, source_id);
                    }
                    match result {
                        Ok(output) => {
                            outputs.insert(source_id, output);
                        }
                        Err(err) => {
                            warn!(source = source_id, %err, "source call failed");
                            call_errors.insert(source_id, err);
                        }
                    }
                }
                Err(join_err) => {
                    // A panicked source task must not sink the request.
                    warn!(%join_err, "source task aborted");
                }
            }
        }

        // Merge in fixed feature order so identical inputs always produce
        // identical aggregates.
        let mut weather = Weather::default();
        let mut updated_location = location.clone();
        for feature in &requested {
            if failed_features.contains_key(feature) {
                continue;
            }
            let Some(source_id) = assignments.get(feature) else {
                failed_features.insert(
                    *feature,
                    ProviderError::invalid_data("source task produced no result"),
                );
                continue;
            };
            if let Some(err) = call_errors.get(source_id) {
                failed_features.insert(*feature, err.clone());
                continue;
            }
            let Some(output) = outputs.get_mut(source_id) else {
                continue;
            };
            if let Some(err) = output.failures.get(feature) {
                failed_features.insert(*feature, err.clone());
                continue;
            }
            let mut fragment = std::mem::take(&mut output.fragment);
            weather.fragment.take_feature(*feature, &mut fragment);
            output.fragment = fragment;
        }

        for (source_id, output) in &outputs {
            if let Some(params) = &output.resolved_parameters {
                updated_location =
                    updated_location.with_source_parameters(source_id, params.clone());
            }
        }

        if failed_features.len() == requested.len() {
            return Err(RefreshError::AllFeaturesFailed(failed_features));
        }

        weather.failed_features = failed_features;
        Ok(RefreshOutcome {
            weather,
            location: updated_location,
        })
    }

    /// Resolve coordinates into a Location through the best source
    /// declaring reverse geocoding.
    pub async fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Location, RefreshError> {
        let probe = Location::new(latitude, longitude, "UTC");
        let source = self
            .registry
            .select(&probe, Feature::ReverseGeocoding)
            .ok_or(RefreshError::NoEligibleSource)?;
        source
            .reverse_geocode(latitude, longitude)
            .await
            .map_err(|err| {
                RefreshError::AllFeaturesFailed(BTreeMap::from([(
                    Feature::ReverseGeocoding,
                    err,
                )]))
            })
    }
}
