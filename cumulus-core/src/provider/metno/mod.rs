//! MET Norway: worldwide forecast, Nordic nowcast (minutely precipitation)
//! and Norwegian weather alerts. No API key, but the terms of service
//! require an identifying User-Agent.

mod convert;
mod dto;

use std::collections::BTreeSet;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::ProviderError;
use crate::model::Location;
use crate::provider::common::classify_status;
use crate::source::{Feature, Priority, SourceOutput, WeatherSource};

use dto::{MetAlertsResponse, MetForecastResponse};

const FORECAST_ENDPOINT: &str = "https://api.met.no/weatherapi/locationforecast/2.0/compact";
const NOWCAST_ENDPOINT: &str = "https://api.met.no/weatherapi/nowcast/2.0/complete";
const ALERTS_ENDPOINT: &str = "https://api.met.no/weatherapi/metalerts/2.0/current.json";

const USER_AGENT: &str = "cumulus/0.1 weather-aggregator";

/// Nowcast radar coverage: the Nordics.
fn in_nordics(location: &Location) -> bool {
    (52.3..=80.0).contains(&location.latitude) && (-10.0..=35.0).contains(&location.longitude)
}

#[derive(Debug, Clone)]
pub struct MetNoSource {
    http: Client,
    forecast_endpoint: String,
    nowcast_endpoint: String,
    alerts_endpoint: String,
}

impl Default for MetNoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MetNoSource {
    pub fn new() -> Self {
        Self {
            http: Client::builder()
                .user_agent(USER_AGENT)
                .build()
                .unwrap_or_default(),
            forecast_endpoint: FORECAST_ENDPOINT.to_owned(),
            nowcast_endpoint: NOWCAST_ENDPOINT.to_owned(),
            alerts_endpoint: ALERTS_ENDPOINT.to_owned(),
        }
    }

    /// Endpoint override used by tests against a local mock server.
    pub fn with_endpoints(forecast: &str, nowcast: &str, alerts: &str) -> Self {
        Self {
            forecast_endpoint: forecast.to_owned(),
            nowcast_endpoint: nowcast.to_owned(),
            alerts_endpoint: alerts.to_owned(),
            ..Self::new()
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        location: &Location,
    ) -> Result<T, ProviderError> {
        let res = self
            .http
            .get(url)
            .query(&[
                ("lat", format!("{:.4}", location.latitude)),
                ("lon", format!("{:.4}", location.longitude)),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::network(&e))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| ProviderError::network(&e))?;

        if !status.is_success() {
            return Err(classify_status(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(ProviderError::parse)
    }
}

#[async_trait]
impl WeatherSource for MetNoSource {
    fn id(&self) -> &'static str {
        "metno"
    }

    fn name(&self) -> &'static str {
        "MET Norway"
    }

    fn continent(&self) -> &'static str {
        "Europe"
    }

    fn privacy_policy_url(&self) -> &'static str {
        "https://www.met.no/en/About-us/privacy"
    }

    fn supported_features(&self) -> &'static [(Feature, &'static str)] {
        &[
            (Feature::Forecast, "MET Norway (NLOD / CC BY 4.0)"),
            (Feature::Current, "MET Norway (NLOD / CC BY 4.0)"),
            (Feature::Minutely, "MET Norway Nowcast"),
            (Feature::Alert, "MET Norway MetAlerts"),
        ]
    }

    fn supports_feature(&self, location: &Location, feature: Feature) -> bool {
        match feature {
            Feature::Forecast | Feature::Current => true,
            Feature::Minutely => in_nordics(location),
            Feature::Alert => location.is_in_country("NO"),
            _ => false,
        }
    }

    fn feature_priority(&self, location: &Location, feature: Feature) -> Priority {
        if !self.supports_feature(location, feature) {
            return Priority::None;
        }
        match feature {
            // National service at home, worldwide model elsewhere.
            _ if location.is_in_country("NO") => Priority::Highest,
            Feature::Minutely => Priority::High,
            _ => Priority::Low,
        }
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
        let wants_nowcast = features.contains(&Feature::Minutely);
        let wants_alerts = features.contains(&Feature::Alert);

        let (forecast_res, nowcast_res, alerts_res) = tokio::join!(
            async {
                if forecast_features.is_empty() {
                    None
                } else {
                    Some(
                        self.get_json::<MetForecastResponse>(&self.forecast_endpoint, location)
                            .await,
                    )
                }
            },
            async {
                if wants_nowcast {
                    Some(
                        self.get_json::<MetForecastResponse>(&self.nowcast_endpoint, location)
                            .await,
                    )
                } else {
                    None
                }
            },
            async {
                if wants_alerts {
                    Some(
                        self.get_json::<MetAlertsResponse>(&self.alerts_endpoint, location)
                            .await,
                    )
                } else {
                    None
                }
            },
        );

        let mut output = SourceOutput::default();

        if let Some(res) = forecast_res {
            let converted =
                res.and_then(|resp| convert::convert_forecast(&resp, location, &forecast_features));
            match converted {
                Ok(mut fragment) => {
                    for feature in &forecast_features {
                        output.fragment.take_feature(*feature, &mut fragment);
                    }
                }
                Err(err) => {
                    debug!(source = self.id(), %err, "locationforecast failed");
                    for feature in &forecast_features {
                        output.failures.insert(*feature, err.clone());
                    }
                }
            }
        }

        if let Some(res) = nowcast_res {
            match res.and_then(|resp| convert::convert_nowcast(&resp)) {
                Ok(mut fragment) => {
                    output
                        .fragment
                        .take_feature(Feature::Minutely, &mut fragment);
                }
                Err(err) => {
                    debug!(source = self.id(), %err, "nowcast failed");
                    output.failures.insert(Feature::Minutely, err);
                }
            }
        }

        if let Some(res) = alerts_res {
            match res.and_then(|resp| convert::convert_alerts(&resp)) {
                Ok(mut fragment) => {
                    output.fragment.take_feature(Feature::Alert, &mut fragment);
                }
                Err(err) => {
                    debug!(source = self.id(), %err, "metalerts failed");
                    output.failures.insert(Feature::Alert, err);
                }
            }
        }

        Ok(output)
    }
}
