//! MET Norway wire schemas: Locationforecast 2.0 compact, Nowcast 2.0 and
//! MetAlerts 2.0. Timestamps are RFC 3339 strings.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct MetForecastResponse {
    pub properties: Option<MetProperties>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetProperties {
    pub timeseries: Vec<MetTimeStep>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetTimeStep {
    pub time: String,
    pub data: MetStepData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetStepData {
    pub instant: Option<MetInstant>,
    pub next_1_hours: Option<MetNextHours>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetInstant {
    pub details: Option<MetInstantDetails>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetInstantDetails {
    pub air_temperature: Option<f64>,
    pub relative_humidity: Option<f64>,
    pub air_pressure_at_sea_level: Option<f64>,
    pub cloud_area_fraction: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_speed_of_gust: Option<f64>,
    pub wind_from_direction: Option<f64>,
    pub dew_point_temperature: Option<f64>,
    /// Nowcast only, mm/h.
    pub precipitation_rate: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetNextHours {
    pub summary: Option<MetSummary>,
    pub details: Option<MetNextDetails>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetSummary {
    pub symbol_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetNextDetails {
    pub precipitation_amount: Option<f64>,
    pub probability_of_precipitation: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetAlertsResponse {
    pub features: Option<Vec<MetAlertFeature>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetAlertFeature {
    pub properties: Option<MetAlertProperties>,
    pub when: Option<MetAlertWhen>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetAlertProperties {
    pub id: Option<String>,
    pub event: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// CAP severity: "Minor" / "Moderate" / "Severe" / "Extreme".
    pub severity: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetAlertWhen {
    /// [start, end] as RFC 3339 strings.
    pub interval: Option<Vec<String>>,
}
