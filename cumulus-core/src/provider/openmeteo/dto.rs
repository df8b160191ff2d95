//! Open-Meteo wire schema (timeformat=unixtime).
//!
//! Parallel arrays: `time[i]` pairs with the i-th entry of every variable
//! array. Any variable may be missing wholesale or hold nulls per slot.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct OmForecastResponse {
    pub current: Option<OmCurrent>,
    pub hourly: Option<OmHourly>,
    pub daily: Option<OmDaily>,
    pub minutely_15: Option<OmMinutely>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OmCurrent {
    pub time: i64,
    pub temperature_2m: Option<f64>,
    pub apparent_temperature: Option<f64>,
    pub relative_humidity_2m: Option<f64>,
    pub weather_code: Option<i64>,
    pub surface_pressure: Option<f64>,
    pub cloud_cover: Option<f64>,
    pub visibility: Option<f64>,
    pub wind_speed_10m: Option<f64>,
    pub wind_direction_10m: Option<f64>,
    pub wind_gusts_10m: Option<f64>,
    pub uv_index: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OmHourly {
    pub time: Vec<i64>,
    pub temperature_2m: Option<Vec<Option<f64>>>,
    pub apparent_temperature: Option<Vec<Option<f64>>>,
    pub relative_humidity_2m: Option<Vec<Option<f64>>>,
    pub precipitation: Option<Vec<Option<f64>>>,
    pub precipitation_probability: Option<Vec<Option<f64>>>,
    pub weather_code: Option<Vec<Option<i64>>>,
    pub wind_speed_10m: Option<Vec<Option<f64>>>,
    pub wind_direction_10m: Option<Vec<Option<f64>>>,
    pub wind_gusts_10m: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OmDaily {
    pub time: Vec<i64>,
    pub weather_code: Option<Vec<Option<i64>>>,
    pub temperature_2m_max: Option<Vec<Option<f64>>>,
    pub temperature_2m_min: Option<Vec<Option<f64>>>,
    pub precipitation_sum: Option<Vec<Option<f64>>>,
    pub precipitation_probability_max: Option<Vec<Option<f64>>>,
    pub wind_speed_10m_max: Option<Vec<Option<f64>>>,
    pub uv_index_max: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OmMinutely {
    pub time: Vec<i64>,
    pub precipitation: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OmAirQualityResponse {
    pub current: Option<OmAirQualityCurrent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OmAirQualityCurrent {
    pub pm2_5: Option<f64>,
    pub pm10: Option<f64>,
    pub sulphur_dioxide: Option<f64>,
    pub nitrogen_dioxide: Option<f64>,
    pub ozone: Option<f64>,
    pub carbon_monoxide: Option<f64>,
    pub alder_pollen: Option<f64>,
    pub birch_pollen: Option<f64>,
    pub grass_pollen: Option<f64>,
    pub mugwort_pollen: Option<f64>,
    pub olive_pollen: Option<f64>,
    pub ragweed_pollen: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OmClimateResponse {
    pub daily: Option<OmClimateDaily>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OmClimateDaily {
    pub time: Vec<i64>,
    pub temperature_2m_max: Option<Vec<Option<f64>>>,
    pub temperature_2m_min: Option<Vec<Option<f64>>>,
}
