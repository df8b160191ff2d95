//! Open-Meteo: worldwide forecast, current conditions, 15-minutely
//! precipitation, air quality, pollen (Europe), and seasonal normals.
//! No API key required.

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

use dto::{OmAirQualityResponse, OmClimateResponse, OmForecastResponse};

const FORECAST_ENDPOINT: &str = "https://api.open-meteo.com/v1/forecast";
const AIR_QUALITY_ENDPOINT: &str = "https://air-quality-api.open-meteo.com/v1/air-quality";
const ARCHIVE_ENDPOINT: &str = "https://archive-api.open-meteo.com/v1/archive";

/// Pollen variables are only modelled for the European CAMS domain.
fn in_europe(location: &Location) -> bool {
    (34.0..=72.0).contains(&location.latitude) && (-25.0..=45.0).contains(&location.longitude)
}

#[derive(Debug, Clone)]
pub struct OpenMeteoSource {
    http: Client,
    forecast_endpoint: String,
    air_quality_endpoint: String,
    archive_endpoint: String,
}

impl Default for OpenMeteoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenMeteoSource {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
            forecast_endpoint: FORECAST_ENDPOINT.to_owned(),
            air_quality_endpoint: AIR_QUALITY_ENDPOINT.to_owned(),
            archive_endpoint: ARCHIVE_ENDPOINT.to_owned(),
        }
    }

    /// Endpoint override used by tests against a local mock server.
    pub fn with_endpoints(forecast: &str, air_quality: &str, archive: &str) -> Self {
        Self {
            http: Client::new(),
            forecast_endpoint: forecast.to_owned(),
            air_quality_endpoint: air_quality.to_owned(),
            archive_endpoint: archive.to_owned(),
        }
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

    async fn fetch_forecast(
        &self,
        location: &Location,
        features: &BTreeSet<Feature>,
    ) -> Result<OmForecastResponse, ProviderError> {
        let mut query = vec![
            ("latitude", location.latitude.to_string()),
            ("longitude", location.longitude.to_string()),
            ("timeformat", "unixtime".to_owned()),
            ("timezone", "UTC".to_owned()),
        ];
        if features.contains(&Feature::Forecast) {
            query.push((
                "hourly",
                "temperature_2m,apparent_temperature,relative_humidity_2m,precipitation,\
                 precipitation_probability,weather_code,wind_speed_10m,wind_direction_10m,\
                 wind_gusts_10m"
                    .to_owned(),
            ));
            query.push((
                "daily",
                "weather_code,temperature_2m_max,temperature_2m_min,precipitation_sum,\
                 precipitation_probability_max,wind_speed_10m_max,uv_index_max"
                    .to_owned(),
            ));
        }
        if features.contains(&Feature::Current) {
            query.push((
                "current",
                "temperature_2m,apparent_temperature,relative_humidity_2m,weather_code,\
                 surface_pressure,cloud_cover,visibility,wind_speed_10m,wind_direction_10m,\
                 wind_gusts_10m,uv_index"
                    .to_owned(),
            ));
        }
        if features.contains(&Feature::Minutely) {
            query.push(("minutely_15", "precipitation".to_owned()));
        }
        self.get_json(&self.forecast_endpoint, &query).await
    }

    async fn fetch_air_quality(
        &self,
        location: &Location,
        features: &BTreeSet<Feature>,
    ) -> Result<OmAirQualityResponse, ProviderError> {
        let mut vars: Vec<&str> = Vec::new();
        if features.contains(&Feature::AirQuality) {
            vars.extend([
                "pm2_5",
                "pm10",
                "sulphur_dioxide",
                "nitrogen_dioxide",
                "ozone",
                "carbon_monoxide",
            ]);
        }
        if features.contains(&Feature::Pollen) {
            vars.extend([
                "alder_pollen",
                "birch_pollen",
                "grass_pollen",
                "mugwort_pollen",
                "olive_pollen",
                "ragweed_pollen",
            ]);
        }
        let query = vec![
            ("latitude", location.latitude.to_string()),
            ("longitude", location.longitude.to_string()),
            ("current", vars.join(",")),
        ];
        self.get_json(&self.air_quality_endpoint, &query).await
    }

    /// Seasonal averages approximated from last year's reanalysis archive
    /// for the current month.
    async fn fetch_normals(&self, location: &Location) -> Result<OmClimateResponse, ProviderError> {
        use chrono::Datelike;
        let today = chrono::Utc::now().date_naive();
        let year = today.year() - 1;
        let month = today.month();
        let month_start = chrono::NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| ProviderError::parse("could not build archive window"))?;
        let month_end = month_start
            .checked_add_months(chrono::Months::new(1))
            .and_then(|d| d.pred_opt())
            .ok_or_else(|| ProviderError::parse("could not build archive window"))?;

        let query = vec![
            ("latitude", location.latitude.to_string()),
            ("longitude", location.longitude.to_string()),
            ("start_date", month_start.format("%Y-%m-%d").to_string()),
            ("end_date", month_end.format("%Y-%m-%d").to_string()),
            ("daily", "temperature_2m_max,temperature_2m_min".to_owned()),
            ("timeformat", "unixtime".to_owned()),
            ("timezone", "UTC".to_owned()),
        ];
        self.get_json(&self.archive_endpoint, &query).await
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoSource {
    fn id(&self) -> &'static str {
        "openmeteo"
    }

    fn name(&self) -> &'static str {
        "Open-Meteo"
    }

    fn continent(&self) -> &'static str {
        "Worldwide"
    }

    fn privacy_policy_url(&self) -> &'static str {
        "https://open-meteo.com/en/terms"
    }

    fn supported_features(&self) -> &'static [(Feature, &'static str)] {
        &[
            (Feature::Forecast, "Open-Meteo (CC BY 4.0)"),
            (Feature::Current, "Open-Meteo (CC BY 4.0)"),
            (Feature::Minutely, "Open-Meteo (CC BY 4.0)"),
            (Feature::AirQuality, "Open-Meteo / CAMS"),
            (Feature::Pollen, "Open-Meteo / CAMS"),
            (Feature::Normals, "Open-Meteo / Copernicus ERA5"),
        ]
    }

    fn supports_feature(&self, location: &Location, feature: Feature) -> bool {
        match feature {
            Feature::Pollen => in_europe(location),
            _ => self.declares_feature(feature),
        }
    }

    fn feature_priority(&self, location: &Location, feature: Feature) -> Priority {
        if !self.supports_feature(location, feature) {
            return Priority::None;
        }
        // Worldwide fallback tier; national services outrank it at home.
        Priority::Low
    }

    async fn request_weather(
        &self,
        location: &Location,
        features: &BTreeSet<Feature>,
    ) -> Result<SourceOutput, ProviderError> {
        let forecast_features: BTreeSet<Feature> = features
            .iter()
            .copied()
            .filter(|f| matches!(f, Feature::Forecast | Feature::Current | Feature::Minutely))
            .collect();
        let air_features: BTreeSet<Feature> = features
            .iter()
            .copied()
            .filter(|f| matches!(f, Feature::AirQuality | Feature::Pollen))
            .collect();
        let wants_normals = features.contains(&Feature::Normals);

        // Independent vendor endpoints; one failing must not sink the rest.
        let (forecast_res, air_res, normals_res) = tokio::join!(
            async {
                if forecast_features.is_empty() {
                    None
                } else {
                    Some(self.fetch_forecast(location, &forecast_features).await)
                }
            },
            async {
                if air_features.is_empty() {
                    None
                } else {
                    Some(self.fetch_air_quality(location, &air_features).await)
                }
            },
            async {
                if wants_normals {
                    Some(self.fetch_normals(location).await)
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
                    debug!(source = self.id(), %err, "forecast endpoint failed");
                    for feature in &forecast_features {
                        output.failures.insert(*feature, err.clone());
                    }
                }
            }
        }

        if let Some(res) = air_res {
            let converted = res.and_then(|resp| convert::convert_air_quality(&resp, &air_features));
            match converted {
                Ok(mut fragment) => {
                    for feature in &air_features {
                        output.fragment.take_feature(*feature, &mut fragment);
                    }
                }
                Err(err) => {
                    debug!(source = self.id(), %err, "air quality endpoint failed");
                    for feature in &air_features {
                        output.failures.insert(*feature, err.clone());
                    }
                }
            }
        }

        if let Some(res) = normals_res {
            match res.and_then(|resp| convert::convert_normals(&resp)) {
                Ok(mut fragment) => {
                    output.fragment.take_feature(Feature::Normals, &mut fragment);
                }
                Err(err) => {
                    debug!(source = self.id(), %err, "archive endpoint failed");
                    output.failures.insert(Feature::Normals, err);
                }
            }
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pollen_is_gated_to_europe() {
        let source = OpenMeteoSource::new();
        let oslo = Location::new(59.91, 10.75, "Europe/Oslo");
        let denver = Location::new(39.74, -104.99, "America/Denver");
        assert!(source.supports_feature(&oslo, Feature::Pollen));
        assert!(!source.supports_feature(&denver, Feature::Pollen));
        assert_eq!(
            source.feature_priority(&denver, Feature::Pollen),
            Priority::None
        );
    }

    #[test]
    fn forecast_is_worldwide_low_priority() {
        let source = OpenMeteoSource::new();
        let denver = Location::new(39.74, -104.99, "America/Denver");
        assert_eq!(
            source.feature_priority(&denver, Feature::Forecast),
            Priority::Low
        );
    }

    #[test]
    fn alerts_are_not_declared() {
        let source = OpenMeteoSource::new();
        let oslo = Location::new(59.91, 10.75, "Europe/Oslo");
        assert!(!source.supports_feature(&oslo, Feature::Alert));
    }
}
