//! Forward geocoding: resolve a place name into coordinates and a timezone.
//! Uses the Open-Meteo geocoding API, which is free and keyless.

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::ProviderError;
use crate::model::Location;
use crate::provider::common::classify_status;

const GEOCODING_ENDPOINT: &str = "https://geocoding-api.open-meteo.com/v1/search";

#[derive(Debug, Clone, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Vec<GeocodingEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeocodingEntry {
    name: Option<String>,
    latitude: f64,
    longitude: f64,
    timezone: Option<String>,
    country_code: Option<String>,
    admin1: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Geocoder {
    http: Client,
    endpoint: String,
}

impl Default for Geocoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Geocoder {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
            endpoint: GEOCODING_ENDPOINT.to_owned(),
        }
    }

    /// Endpoint override used by tests against a local mock server.
    pub fn with_endpoint(endpoint: &str) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.to_owned(),
        }
    }

    /// Resolve a free-text place name to the best-matching location.
    pub async fn search(&self, query: &str) -> Result<Location, ProviderError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ProviderError::invalid_data("empty search query"));
        }

        let res = self
            .http
            .get(&self.endpoint)
            .query(&[("name", query), ("count", "1"), ("language", "en")])
            .send()
            .await
            .map_err(|e| ProviderError::network(&e))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| ProviderError::network(&e))?;
        if !status.is_success() {
            return Err(classify_status(status.as_u16(), &body));
        }

        let parsed: GeocodingResponse = serde_json::from_str(&body).map_err(ProviderError::parse)?;
        let entry = parsed.results.into_iter().next().ok_or_else(|| {
            ProviderError::invalid_data(format!("no geocoding match for '{query}'"))
        })?;

        debug!(name = ?entry.name, tz = ?entry.timezone, "geocoded");

        let timezone = entry.timezone.unwrap_or_else(|| "UTC".to_owned());
        let mut location = Location::new(entry.latitude, entry.longitude, &timezone);
        location.name = entry.name.unwrap_or_else(|| query.to_owned());
        location.country_code = entry.country_code.unwrap_or_default().to_ascii_uppercase();
        location.admin = entry.admin1;
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn search_resolves_name_and_timezone() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("name", "Oslo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{
                    "name": "Oslo",
                    "latitude": 59.9139,
                    "longitude": 10.7522,
                    "timezone": "Europe/Oslo",
                    "country_code": "no",
                    "admin1": "Oslo"
                }]
            })))
            .mount(&server)
            .await;

        let geocoder = Geocoder::with_endpoint(&server.uri());
        let location = geocoder.search("Oslo").await.unwrap();

        assert_eq!(location.name, "Oslo");
        assert_eq!(location.country_code, "NO");
        assert_eq!(location.timezone, "Europe/Oslo");
        assert!((location.latitude - 59.9139).abs() < 1e-9);
    }

    #[tokio::test]
    async fn search_with_no_match_is_invalid_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let geocoder = Geocoder::with_endpoint(&server.uri());
        let err = geocoder.search("Nowhereville").await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidData { .. }));
    }

    #[tokio::test]
    async fn empty_query_is_rejected_without_a_request() {
        let geocoder = Geocoder::with_endpoint("http://127.0.0.1:9");
        let err = geocoder.search("   ").await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidData { .. }));
    }
}
