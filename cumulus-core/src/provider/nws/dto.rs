//! api.weather.gov wire schemas: points, gridpoint forecasts and alerts.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct NwsPointsResponse {
    pub properties: Option<NwsPointsProperties>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NwsPointsProperties {
    pub grid_id: Option<String>,
    pub grid_x: Option<i64>,
    pub grid_y: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NwsForecastResponse {
    pub properties: Option<NwsForecastProperties>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NwsForecastProperties {
    pub periods: Vec<NwsPeriod>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NwsPeriod {
    pub start_time: String,
    pub is_daytime: Option<bool>,
    pub temperature: Option<f64>,
    /// "F" or "C".
    pub temperature_unit: Option<String>,
    /// e.g. "10 mph" or "5 to 15 mph".
    pub wind_speed: Option<String>,
    /// Compass point, e.g. "NW".
    pub wind_direction: Option<String>,
    pub short_forecast: Option<String>,
    pub probability_of_precipitation: Option<NwsQuantitativeValue>,
    pub relative_humidity: Option<NwsQuantitativeValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NwsQuantitativeValue {
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NwsAlertsResponse {
    pub features: Option<Vec<NwsAlertFeature>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NwsAlertFeature {
    pub properties: Option<NwsAlertProperties>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NwsAlertProperties {
    pub id: Option<String>,
    pub event: Option<String>,
    pub onset: Option<String>,
    pub ends: Option<String>,
    pub expires: Option<String>,
    pub headline: Option<String>,
    pub description: Option<String>,
    /// "Extreme" / "Severe" / "Moderate" / "Minor" / "Unknown".
    pub severity: Option<String>,
    pub sender_name: Option<String>,
}
