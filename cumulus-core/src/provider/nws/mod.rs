//! NOAA National Weather Service: forecast, current conditions and alerts
//! for the United States. Gridpoint forecasts need a resolved grid cell
//! (office id + x/y), cached on the Location as source parameters.

mod convert;
mod dto;

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::ProviderError;
use crate::model::Location;
use crate::provider::common::classify_status;
use crate::source::{Feature, Priority, SourceOutput, WeatherSource};

use dto::{NwsAlertsResponse, NwsForecastResponse, NwsPointsResponse};

const API_BASE: &str = "https://api.weather.gov";
const USER_AGENT: &str = "cumulus/0.1 weather-aggregator";

const PARAM_GRID_ID: &str = "gridId";
const PARAM_GRID_X: &str = "gridX";
const PARAM_GRID_Y: &str = "gridY";

#[derive(Debug, Clone)]
pub struct NwsSource {
    http: Client,
    base: String,
}

impl Default for NwsSource {
    fn default() -> Self {
        Self::new()
    }
}

impl NwsSource {
    pub fn new() -> Self {
        Self::with_base(API_BASE)
    }

    /// Base-URL override used by tests against a local mock server.
    pub fn with_base(base: &str) -> Self {
        Self {
            http: Client::builder()
                .user_agent(USER_AGENT)
                .build()
                .unwrap_or_default(),
            base: base.trim_end_matches('/').to_owned(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<T, ProviderError> {
        let res = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::network(&e))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| ProviderError::network(&e))?;

        if !status.is_success() {
            // The points endpoint answers 404 for coordinates outside the
            // forecast grid.
            if status.as_u16() == 404 {
                return Err(ProviderError::OutOfCoverage {
                    source_id: "nws".to_owned(),
                });
            }
            return Err(classify_status(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(ProviderError::parse)
    }

    async fn resolve_grid(
        &self,
        location: &Location,
    ) -> Result<HashMap<String, String>, ProviderError> {
        let url = format!(
            "{}/points/{:.4},{:.4}",
            self.base, location.latitude, location.longitude
        );
        let resp: NwsPointsResponse = self.get_json(&url).await?;
        let props = resp.properties.ok_or_else(|| {
            ProviderError::invalid_data("points response has no properties block")
        })?;
        match (props.grid_id, props.grid_x, props.grid_y) {
            (Some(grid_id), Some(x), Some(y)) => Ok(HashMap::from([
                (PARAM_GRID_ID.to_owned(), grid_id),
                (PARAM_GRID_X.to_owned(), x.to_string()),
                (PARAM_GRID_Y.to_owned(), y.to_string()),
            ])),
            _ => Err(ProviderError::invalid_data(
                "points response is missing grid coordinates",
            )),
        }
    }

    fn grid_from(params: &HashMap<String, String>) -> Option<(String, String, String)> {
        Some((
            params.get(PARAM_GRID_ID)?.clone(),
            params.get(PARAM_GRID_X)?.clone(),
            params.get(PARAM_GRID_Y)?.clone(),
        ))
    }
}

#[async_trait]
impl WeatherSource for NwsSource {
    fn id(&self) -> &'static str {
        "nws"
    }

    fn name(&self) -> &'static str {
        "National Weather Service"
    }

    fn continent(&self) -> &'static str {
        "North America"
    }

    fn privacy_policy_url(&self) -> &'static str {
        "https://www.weather.gov/privacy"
    }

    fn supported_features(&self) -> &'static [(Feature, &'static str)] {
        &[
            (Feature::Forecast, "National Weather Service (NOAA)"),
            (Feature::Current, "National Weather Service (NOAA)"),
            (Feature::Alert, "National Weather Service (NOAA)"),
        ]
    }

    fn supports_feature(&self, location: &Location, feature: Feature) -> bool {
        self.declares_feature(feature) && location.is_in_country("US")
    }

    fn feature_priority(&self, location: &Location, feature: Feature) -> Priority {
        if !self.supports_feature(location, feature) {
            return Priority::None;
        }
        match feature {
            Feature::Alert => Priority::Highest,
            _ => Priority::High,
        }
    }

    async fn resolve_location_parameters(
        &self,
        location: &Location,
    ) -> Result<Option<HashMap<String, String>>, ProviderError> {
        self.resolve_grid(location).await.map(Some)
    }

    async fn request_weather(
        &self,
        location: &Location,
        features: &BTreeSet<Feature>,
    ) -> Result<SourceOutput, ProviderError> {
        let forecast_features: BTreeSet<Feature> = features
            .iter()
            .copied()
            .filter(|f| matches!(f, Feature::Forecast | Feature::Current))
            .collect();
        let wants_alerts = features.contains(&Feature::Alert);

        let mut output = SourceOutput::default();

        // Grid parameters are only needed for the gridpoint endpoints.
        let grid = if forecast_features.is_empty() {
            None
        } else {
            match location.source_parameters(self.id()).and_then(Self::grid_from) {
                Some(grid) => Some(grid),
                None => match self.resolve_grid(location).await {
                    Ok(params) => {
                        let grid = Self::grid_from(&params);
                        output.resolved_parameters = Some(params);
                        grid
                    }
                    Err(err) => {
                        debug!(source = self.id(), %err, "grid resolution failed");
                        for feature in &forecast_features {
                            output.failures.insert(*feature, err.clone());
                        }
                        None
                    }
                },
            }
        };

        let forecast_call = async {
            let Some((grid_id, x, y)) = grid.as_ref() else {
                return None;
            };
            let twelve_url = format!("{}/gridpoints/{grid_id}/{x},{y}/forecast", self.base);
            let hourly_url = format!("{}/gridpoints/{grid_id}/{x},{y}/forecast/hourly", self.base);
            let (twelve, hourly) = tokio::join!(
                self.get_json::<NwsForecastResponse>(&twelve_url),
                self.get_json::<NwsForecastResponse>(&hourly_url),
            );
            Some(twelve.and_then(|t| hourly.map(|h| (t, h))))
        };

        let alerts_call = async {
            if !wants_alerts {
                return None;
            }
            let url = format!(
                "{}/alerts/active?point={:.4},{:.4}",
                self.base, location.latitude, location.longitude
            );
            Some(self.get_json::<NwsAlertsResponse>(&url).await)
        };

        let (forecast_res, alerts_res) = tokio::join!(forecast_call, alerts_call);

        if let Some(res) = forecast_res {
            let converted = res.and_then(|(twelve, hourly)| {
                convert::convert_forecast(&twelve, &hourly, location, &forecast_features)
            });
            match converted {
                Ok(mut fragment) => {
                    for feature in &forecast_features {
                        output.fragment.take_feature(*feature, &mut fragment);
                    }
                }
                Err(err) => {
                    debug!(source = self.id(), %err, "gridpoint forecast failed");
                    for feature in &forecast_features {
                        output.failures.insert(*feature, err.clone());
                    }
                }
            }
        }

        if let Some(res) = alerts_res {
            match res.and_then(|resp| convert::convert_alerts(&resp)) {
                Ok(mut fragment) => {
                    output.fragment.take_feature(Feature::Alert, &mut fragment);
                }
                Err(err) => {
                    debug!(source = self.id(), %err, "alerts endpoint failed");
                    output.failures.insert(Feature::Alert, err);
                }
            }
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn denver() -> Location {
        let mut loc = Location::new(39.74, -104.99, "America/Denver");
        loc.country_code = "US".to_owned();
        loc
    }

    #[test]
    fn coverage_is_us_only() {
        let source = NwsSource::new();
        assert!(source.supports_feature(&denver(), Feature::Forecast));
        let mut oslo = Location::new(59.91, 10.75, "Europe/Oslo");
        oslo.country_code = "NO".to_owned();
        assert!(!source.supports_feature(&oslo, Feature::Forecast));
        assert_eq!(
            source.feature_priority(&oslo, Feature::Forecast),
            Priority::None
        );
    }

    #[test]
    fn alerts_rank_highest_at_home() {
        let source = NwsSource::new();
        assert_eq!(
            source.feature_priority(&denver(), Feature::Alert),
            Priority::Highest
        );
        assert_eq!(
            source.feature_priority(&denver(), Feature::Forecast),
            Priority::High
        );
    }

    #[test]
    fn grid_params_round_trip_through_the_location() {
        let params = HashMap::from([
            (PARAM_GRID_ID.to_owned(), "BOU".to_owned()),
            (PARAM_GRID_X.to_owned(), "62".to_owned()),
            (PARAM_GRID_Y.to_owned(), "61".to_owned()),
        ]);
        let loc = denver().with_source_parameters("nws", params);
        let grid = NwsSource::grid_from(loc.source_parameters("nws").unwrap()).unwrap();
        assert_eq!(grid, ("BOU".to_owned(), "62".to_owned(), "61".to_owned()));
    }
}
