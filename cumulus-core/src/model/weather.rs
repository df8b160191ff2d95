use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::source::Feature;
use crate::units::{
    Distance, PollutantConcentration, Precipitation, Pressure, Ratio, Speed, Temperature,
};

use super::Alert;

/// Vendor-neutral sky/precipitation condition code. Every converter owns a
/// total mapping from its vendor taxonomy into this set; unmapped vendor
/// codes resolve to `Unknown`, never to a guessed default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCode {
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Haze,
    Rain,
    Sleet,
    Snow,
    Hail,
    Thunder,
    Thunderstorm,
    Wind,
    #[default]
    Unknown,
}

impl WeatherCode {
    pub fn description(self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::PartlyCloudy => "Partly cloudy",
            Self::Cloudy => "Cloudy",
            Self::Fog => "Fog",
            Self::Haze => "Haze",
            Self::Rain => "Rain",
            Self::Sleet => "Sleet",
            Self::Snow => "Snow",
            Self::Hail => "Hail",
            Self::Thunder => "Thunder",
            Self::Thunderstorm => "Thunderstorm",
            Self::Wind => "Windy",
            Self::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Wind {
    pub speed: Option<Speed>,
    /// Meteorological degrees: the direction the wind blows from.
    pub direction_degrees: Option<u16>,
    pub gusts: Option<Speed>,
}

/// Observed or nowcast conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Current {
    pub weather_code: Option<WeatherCode>,
    pub weather_text: Option<String>,
    pub temperature: Option<Temperature>,
    pub feels_like: Option<Temperature>,
    pub wind: Option<Wind>,
    pub relative_humidity: Option<Ratio>,
    pub dew_point: Option<Temperature>,
    pub pressure: Option<Pressure>,
    pub cloud_cover: Option<Ratio>,
    pub visibility: Option<Distance>,
    pub uv_index: Option<f64>,
    pub observation_time: Option<DateTime<Utc>>,
}

/// One half of a forecast day (06:00–17:59 local is day, the rest night).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HalfDay {
    pub weather_code: Option<WeatherCode>,
    pub temperature: Option<Temperature>,
    pub precipitation: Option<Precipitation>,
    pub precipitation_probability: Option<Ratio>,
    pub wind: Option<Wind>,
}

/// One calendar day in the location's timezone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Daily {
    pub date: NaiveDate,
    pub day: HalfDay,
    pub night: HalfDay,
    pub uv_index: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hourly {
    pub time: DateTime<Utc>,
    pub weather_code: Option<WeatherCode>,
    pub temperature: Option<Temperature>,
    pub feels_like: Option<Temperature>,
    pub precipitation: Option<Precipitation>,
    pub precipitation_probability: Option<Ratio>,
    pub wind: Option<Wind>,
    pub relative_humidity: Option<Ratio>,
}

/// One nowcast slot; `interval_minutes` is carried per entry because vendors
/// disagree on the grid (1-minute nowcasts versus 15-minute series).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Minutely {
    pub time: DateTime<Utc>,
    pub interval_minutes: u32,
    pub precipitation_intensity: Option<Precipitation>,
}

/// Long-term seasonal averages for the current month, distinct from forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Normals {
    /// 1–12.
    pub month: u32,
    pub daytime_temperature: Option<Temperature>,
    pub nighttime_temperature: Option<Temperature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AirQuality {
    pub pm25: Option<PollutantConcentration>,
    pub pm10: Option<PollutantConcentration>,
    pub so2: Option<PollutantConcentration>,
    pub no2: Option<PollutantConcentration>,
    pub o3: Option<PollutantConcentration>,
    pub co: Option<PollutantConcentration>,
}

impl AirQuality {
    pub fn is_empty(&self) -> bool {
        self.pm25.is_none()
            && self.pm10.is_none()
            && self.so2.is_none()
            && self.no2.is_none()
            && self.o3.is_none()
            && self.co.is_none()
    }
}

/// Pollen grain counts per cubic meter, by species group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Pollen {
    pub alder: Option<u32>,
    pub birch: Option<u32>,
    pub grass: Option<u32>,
    pub mugwort: Option<u32>,
    pub olive: Option<u32>,
    pub ragweed: Option<u32>,
}

impl Pollen {
    pub fn is_empty(&self) -> bool {
        self.alder.is_none()
            && self.birch.is_none()
            && self.grass.is_none()
            && self.mugwort.is_none()
            && self.olive.is_none()
            && self.ragweed.is_none()
    }
}

/// A partial canonical result covering only the features a converter was
/// asked to produce. Sections outside the request stay `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WeatherFragment {
    pub current: Option<Current>,
    pub daily_forecast: Option<Vec<Daily>>,
    pub hourly_forecast: Option<Vec<Hourly>>,
    pub minutely_forecast: Option<Vec<Minutely>>,
    /// Deduplicated by alert id, ordered by (start, id).
    pub alert_list: Option<Vec<Alert>>,
    pub normals: Option<Normals>,
    pub air_quality: Option<AirQuality>,
    pub pollen: Option<Pollen>,
}

impl WeatherFragment {
    /// Move `feature`'s section (if any) out of `other` into `self`.
    pub(crate) fn take_feature(&mut self, feature: Feature, other: &mut Self) {
        match feature {
            Feature::Current => self.current = other.current.take(),
            Feature::Forecast => {
                self.daily_forecast = other.daily_forecast.take();
                self.hourly_forecast = other.hourly_forecast.take();
            }
            Feature::Minutely => self.minutely_forecast = other.minutely_forecast.take(),
            Feature::Alert => self.alert_list = other.alert_list.take(),
            Feature::Normals => self.normals = other.normals.take(),
            Feature::AirQuality => self.air_quality = other.air_quality.take(),
            Feature::Pollen => self.pollen = other.pollen.take(),
            // Reverse geocoding is a lookup, not a weather section.
            Feature::ReverseGeocoding => {}
        }
    }
}

/// The merged aggregate handed to consumers, with explicit per-feature
/// failure accounting. A failed feature leaves its section absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Weather {
    #[serde(flatten)]
    pub fragment: WeatherFragment,
    pub failed_features: BTreeMap<Feature, ProviderError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_is_the_default_weather_code() {
        assert_eq!(WeatherCode::default(), WeatherCode::Unknown);
    }

    #[test]
    fn empty_air_quality_is_detected() {
        assert!(AirQuality::default().is_empty());
        let aq = AirQuality {
            pm25: PollutantConcentration::from_micrograms_per_cubic_meter(12.0).ok(),
            ..Default::default()
        };
        assert!(!aq.is_empty());
    }

    #[test]
    fn take_feature_moves_only_the_requested_section() {
        let mut from = WeatherFragment {
            current: Some(Current::default()),
            air_quality: Some(AirQuality::default()),
            ..Default::default()
        };
        let mut into = WeatherFragment::default();
        into.take_feature(Feature::Current, &mut from);
        assert!(into.current.is_some());
        assert!(into.air_quality.is_none());
        assert!(from.air_quality.is_some());
    }
}
