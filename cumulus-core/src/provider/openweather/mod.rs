//! OpenWeather: worldwide forecast, current conditions and alerts via
//! One Call 3.0, plus reverse geocoding. Requires an API key; a missing key
//! is a configuration error the caller must resolve, never retried here.

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

use dto::{OwGeocodingEntry, OwOneCallResponse};

const ONE_CALL_ENDPOINT: &str = "https://api.openweathermap.org/data/3.0/onecall";
const REVERSE_GEO_ENDPOINT: &str = "https://api.openweathermap.org/geo/1.0/reverse";

#[derive(Debug, Clone)]
pub struct OpenWeatherSource {
    http: Client,
    api_key: Option<String>,
    one_call_endpoint: String,
    reverse_geo_endpoint: String,
}

impl OpenWeatherSource {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            http: Client::new(),
            api_key,
            one_call_endpoint: ONE_CALL_ENDPOINT.to_owned(),
            reverse_geo_endpoint: REVERSE_GEO_ENDPOINT.to_owned(),
        }
    }

    /// Endpoint override used by tests against a local mock server.
    pub fn with_endpoints(api_key: Option<String>, one_call: &str, reverse_geo: &str) -> Self {
        Self {
            one_call_endpoint: one_call.to_owned(),
            reverse_geo_endpoint: reverse_geo.to_owned(),
            ..Self::new(api_key)
        }
    }

    fn key(&self) -> Result<&str, ProviderError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ProviderError::MissingApiKey {
                source_id: "openweather".to_owned(),
            })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let res = self
            .http
            .get(url)
            .query(query)
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
impl WeatherSource for OpenWeatherSource {
    fn id(&self) -> &'static str {
        "openweather"
    }

    fn name(&self) -> &'static str {
        "OpenWeather"
    }

    fn continent(&self) -> &'static str {
        "Worldwide"
    }

    fn privacy_policy_url(&self) -> &'static str {
        "https://openweather.co.uk/privacy-policy"
    }

    fn supported_features(&self) -> &'static [(Feature, &'static str)] {
        &[
            (Feature::Forecast, "OpenWeather"),
            (Feature::Current, "OpenWeather"),
            (Feature::Alert, "OpenWeather"),
            (Feature::ReverseGeocoding, "OpenWeather"),
        ]
    }

    fn supports_feature(&self, _location: &Location, feature: Feature) -> bool {
        self.declares_feature(feature)
    }

    fn feature_priority(&self, location: &Location, feature: Feature) -> Priority {
        if !self.supports_feature(location, feature) {
            return Priority::None;
        }
        Priority::Low
    }

    async fn request_weather(
        &self,
        location: &Location,
        features: &BTreeSet<Feature>,
    ) -> Result<SourceOutput, ProviderError> {
        // One endpoint covers every feature: a missing key or a failed call
        // fails them all together.
        let key = self.key()?;

        let wanted: BTreeSet<Feature> = features
            .iter()
            .copied()
            .filter(|f| matches!(f, Feature::Forecast | Feature::Current | Feature::Alert))
            .collect();

        let mut exclude = vec!["minutely"];
        if !wanted.contains(&Feature::Current) {
            exclude.push("current");
        }
        if !wanted.contains(&Feature::Forecast) {
            exclude.extend(["hourly", "daily"]);
        }
        if !wanted.contains(&Feature::Alert) {
            exclude.push("alerts");
        }

        let query = vec![
            ("lat", location.latitude.to_string()),
            ("lon", location.longitude.to_string()),
            ("appid", key.to_owned()),
            ("units", "metric".to_owned()),
            ("exclude", exclude.join(",")),
        ];
        let resp: OwOneCallResponse = self.get_json(&self.one_call_endpoint, &query).await?;

        let mut converted = convert::convert_one_call(&resp, &wanted)?;
        let mut output = SourceOutput::default();
        for feature in &wanted {
            output.fragment.take_feature(*feature, &mut converted);
        }
        Ok(output)
    }

    async fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Location, ProviderError> {
        let key = self.key()?;

        let geo_query = vec![
            ("lat", latitude.to_string()),
            ("lon", longitude.to_string()),
            ("limit", "1".to_owned()),
            ("appid", key.to_owned()),
        ];
        let entries: Vec<OwGeocodingEntry> = self
            .get_json(&self.reverse_geo_endpoint, &geo_query)
            .await?;
        let entry = entries
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::invalid_data("reverse geocoding returned no match"))?;

        // The geocoding API carries no timezone; One Call does.
        let tz_query = vec![
            ("lat", latitude.to_string()),
            ("lon", longitude.to_string()),
            ("appid", key.to_owned()),
            (
                "exclude",
                "current,minutely,hourly,daily,alerts".to_owned(),
            ),
        ];
        let one_call: OwOneCallResponse = self.get_json(&self.one_call_endpoint, &tz_query).await?;
        let timezone = one_call.timezone.unwrap_or_else(|| "UTC".to_owned());

        debug!(source = self.id(), name = ?entry.name, "reverse geocoded");

        let mut resolved = Location::new(latitude, longitude, &timezone);
        resolved.name = entry.name.unwrap_or_default();
        resolved.country_code = entry.country.unwrap_or_default().to_ascii_uppercase();
        resolved.admin = entry.state;
        Ok(resolved)
    }
}
