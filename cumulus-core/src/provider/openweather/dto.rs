//! OpenWeather wire schemas: One Call 3.0 and the reverse geocoding API.
//! Timestamps are unix seconds; units are metric when requested so.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct OwOneCallResponse {
    pub timezone: Option<String>,
    pub current: Option<OwCurrent>,
    pub hourly: Option<Vec<OwHourly>>,
    pub daily: Option<Vec<OwDaily>>,
    pub alerts: Option<Vec<OwAlert>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwCurrent {
    pub dt: i64,
    pub temp: Option<f64>,
    pub feels_like: Option<f64>,
    pub pressure: Option<f64>,
    pub humidity: Option<f64>,
    pub dew_point: Option<f64>,
    pub clouds: Option<f64>,
    pub uvi: Option<f64>,
    /// Meters.
    pub visibility: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_deg: Option<f64>,
    pub wind_gust: Option<f64>,
    #[serde(default)]
    pub weather: Vec<OwWeather>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwWeather {
    pub id: Option<i64>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwHourly {
    pub dt: i64,
    pub temp: Option<f64>,
    pub feels_like: Option<f64>,
    pub humidity: Option<f64>,
    /// Probability 0..1.
    pub pop: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_deg: Option<f64>,
    pub wind_gust: Option<f64>,
    pub rain: Option<OwPrecipVolume>,
    pub snow: Option<OwPrecipVolume>,
    #[serde(default)]
    pub weather: Vec<OwWeather>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwPrecipVolume {
    #[serde(rename = "1h")]
    pub one_hour: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwDaily {
    pub dt: i64,
    pub temp: Option<OwDailyTemp>,
    pub pop: Option<f64>,
    /// Daily totals in mm.
    pub rain: Option<f64>,
    pub snow: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_deg: Option<f64>,
    pub uvi: Option<f64>,
    #[serde(default)]
    pub weather: Vec<OwWeather>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwDailyTemp {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwAlert {
    pub sender_name: Option<String>,
    pub event: Option<String>,
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwGeocodingEntry {
    pub name: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
}
