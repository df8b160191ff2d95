//! Pure transforms from the OpenWeather One Call schema into canonical
//! fragments.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::error::ProviderError;
use crate::model::{
    Alert, AlertSeverity, Current, Daily, HalfDay, Hourly, WeatherCode, WeatherFragment, Wind,
};
use crate::provider::common::sort_dedup_alerts;
use crate::source::Feature;
use crate::units::{
    Distance, DistanceUnit, Precipitation, PrecipitationUnit, Pressure, PressureUnit, Ratio,
    Speed, SpeedUnit, Temperature, TemperatureUnit,
};

use super::dto::{OwHourly, OwOneCallResponse, OwWeather};

/// OpenWeather has been observed padding absent fields with large negative
/// sentinels instead of omitting them. Documented vendor heuristic, not a
/// general rule: magnitudes of 9999 and beyond read as "absent".
fn ow_f64(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.abs() < 9999.0)
}

/// Condition-id groups per the One Call documentation. Unmapped ids resolve
/// to Unknown.
pub(super) fn map_condition_id(id: i64) -> WeatherCode {
    match id {
        200..=232 => WeatherCode::Thunderstorm,
        511 | 611..=616 => WeatherCode::Sleet,
        300..=321 | 500..=531 => WeatherCode::Rain,
        600..=602 | 620..=622 => WeatherCode::Snow,
        701 | 741 => WeatherCode::Fog,
        711 | 721 | 731 | 751 | 761 | 762 => WeatherCode::Haze,
        771 | 781 => WeatherCode::Wind,
        800 => WeatherCode::Clear,
        801 | 802 => WeatherCode::PartlyCloudy,
        803 | 804 => WeatherCode::Cloudy,
        _ => WeatherCode::Unknown,
    }
}

fn instant(unix: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(unix, 0)
}

fn condition(weather: &[OwWeather]) -> Option<WeatherCode> {
    weather.first().and_then(|w| w.id).map(map_condition_id)
}

fn wind(speed: Option<f64>, deg: Option<f64>, gust: Option<f64>) -> Option<Wind> {
    let wind = Wind {
        speed: ow_f64(speed).and_then(|v| Speed::checked(v, SpeedUnit::MeterPerSecond)),
        direction_degrees: ow_f64(deg)
            .filter(|d| (0.0..=360.0).contains(d))
            .map(|d| (d.round() as u16) % 360),
        gusts: ow_f64(gust).and_then(|v| Speed::checked(v, SpeedUnit::MeterPerSecond)),
    };
    (wind.speed.is_some() || wind.gusts.is_some()).then_some(wind)
}

fn probability(pop: Option<f64>) -> Option<Ratio> {
    ow_f64(pop)
        .filter(|p| (0.0..=1.0).contains(p))
        .and_then(|p| Ratio::from_fraction(p).ok())
}

fn convert_hour(hour: &OwHourly) -> Option<Hourly> {
    let time = instant(hour.dt)?;
    let rain = hour.rain.as_ref().and_then(|r| r.one_hour).unwrap_or(0.0);
    let snow = hour.snow.as_ref().and_then(|s| s.one_hour).unwrap_or(0.0);
    let total = ow_f64(Some(rain + snow)).filter(|v| *v > 0.0);
    Some(Hourly {
        time,
        weather_code: condition(&hour.weather),
        temperature: ow_f64(hour.temp)
            .and_then(|v| Temperature::checked(v, TemperatureUnit::Celsius)),
        feels_like: ow_f64(hour.feels_like)
            .and_then(|v| Temperature::checked(v, TemperatureUnit::Celsius)),
        precipitation: total
            .and_then(|v| Precipitation::checked_hourly(v, PrecipitationUnit::Millimeter)),
        precipitation_probability: probability(hour.pop),
        wind: wind(hour.wind_speed, hour.wind_deg, hour.wind_gust),
        relative_humidity: ow_f64(hour.humidity).and_then(Ratio::checked_percent),
    })
}

/// Convert a One Call response for the requested subset of
/// {Forecast, Current, Alert}.
pub(super) fn convert_one_call(
    resp: &OwOneCallResponse,
    features: &BTreeSet<Feature>,
) -> Result<WeatherFragment, ProviderError> {
    let mut fragment = WeatherFragment::default();

    if features.contains(&Feature::Current) {
        let current = resp
            .current
            .as_ref()
            .ok_or_else(|| ProviderError::invalid_data("one call response has no current block"))?;
        let code = condition(&current.weather);
        fragment.current = Some(Current {
            weather_code: code,
            weather_text: current
                .weather
                .first()
                .and_then(|w| w.description.clone())
                .or_else(|| code.map(|c| c.description().to_owned())),
            temperature: ow_f64(current.temp)
                .and_then(|v| Temperature::checked(v, TemperatureUnit::Celsius)),
            feels_like: ow_f64(current.feels_like)
                .and_then(|v| Temperature::checked(v, TemperatureUnit::Celsius)),
            wind: wind(current.wind_speed, current.wind_deg, current.wind_gust),
            relative_humidity: ow_f64(current.humidity).and_then(Ratio::checked_percent),
            dew_point: ow_f64(current.dew_point)
                .and_then(|v| Temperature::checked(v, TemperatureUnit::Celsius)),
            pressure: ow_f64(current.pressure)
                .and_then(|v| Pressure::checked(v, PressureUnit::Hectopascal)),
            cloud_cover: ow_f64(current.clouds).and_then(Ratio::checked_percent),
            visibility: ow_f64(current.visibility)
                .and_then(|v| Distance::checked_visibility(v, DistanceUnit::Meter)),
            uv_index: ow_f64(current.uvi).filter(|v| (0.0..=20.0).contains(v)),
            observation_time: instant(current.dt),
        });
    }

    if features.contains(&Feature::Forecast) {
        let hourly = resp
            .hourly
            .as_deref()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ProviderError::invalid_data("one call response has no hourly series"))?;
        let daily = resp
            .daily
            .as_deref()
            .filter(|d| !d.is_empty())
            .ok_or_else(|| ProviderError::invalid_data("one call response has no daily series"))?;

        fragment.hourly_forecast = Some(hourly.iter().filter_map(convert_hour).collect());

        let mut days = Vec::with_capacity(daily.len());
        for entry in daily {
            let Some(date) = instant(entry.dt).map(|t| t.date_naive()) else {
                continue;
            };
            let code = condition(&entry.weather);
            let rain = ow_f64(entry.rain).unwrap_or(0.0);
            let snow = ow_f64(entry.snow).unwrap_or(0.0);
            let precipitation = (rain + snow > 0.0)
                .then(|| Precipitation::from_millimeters(rain + snow).ok())
                .flatten();
            days.push(Daily {
                date,
                day: HalfDay {
                    weather_code: code,
                    temperature: entry
                        .temp
                        .as_ref()
                        .and_then(|t| ow_f64(t.max))
                        .and_then(|v| Temperature::checked(v, TemperatureUnit::Celsius)),
                    precipitation,
                    precipitation_probability: probability(entry.pop),
                    wind: wind(entry.wind_speed, entry.wind_deg, None),
                },
                night: HalfDay {
                    weather_code: code,
                    temperature: entry
                        .temp
                        .as_ref()
                        .and_then(|t| ow_f64(t.min))
                        .and_then(|v| Temperature::checked(v, TemperatureUnit::Celsius)),
                    precipitation: None,
                    precipitation_probability: None,
                    wind: None,
                },
                uv_index: ow_f64(entry.uvi).filter(|v| (0.0..=20.0).contains(v)),
            });
        }
        fragment.daily_forecast = Some(days);
    }

    if features.contains(&Feature::Alert) {
        let mut alerts: Vec<Alert> = Vec::new();
        for alert in resp.alerts.as_deref().unwrap_or_default() {
            let event = alert.event.as_deref().unwrap_or("alert");
            let start = alert.start.and_then(instant);
            let end = alert.end.and_then(instant);
            // One Call alerts carry no id or severity of their own.
            let severity = AlertSeverity::Unknown;
            alerts.push(Alert {
                id: Alert::derive_id(event, start),
                start,
                end,
                headline: event.to_owned(),
                description: alert.description.clone(),
                severity,
                source: alert.sender_name.clone(),
                color: severity.default_color(),
            });
        }
        sort_dedup_alerts(&mut alerts);
        fragment.alert_list = Some(alerts);
    }

    Ok(fragment)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_call_json() -> OwOneCallResponse {
        serde_json::from_str(
            r#"{
                "timezone": "Europe/Madrid",
                "current": {
                    "dt": 1717243200,
                    "temp": 24.1,
                    "feels_like": 23.4,
                    "pressure": 1014,
                    "humidity": 48,
                    "dew_point": 12.4,
                    "clouds": 20,
                    "uvi": 6.1,
                    "visibility": 10000,
                    "wind_speed": 3.6,
                    "wind_deg": 140,
                    "weather": [{"id": 801, "description": "few clouds"}]
                },
                "hourly": [
                    {
                        "dt": 1717243200,
                        "temp": 24.1,
                        "humidity": 48,
                        "pop": 0.2,
                        "wind_speed": 3.6,
                        "wind_deg": 140,
                        "rain": {"1h": 0.4},
                        "weather": [{"id": 500, "description": "light rain"}]
                    },
                    {
                        "dt": 1717246800,
                        "temp": -9999.0,
                        "humidity": 50,
                        "pop": 0.0,
                        "wind_speed": 2.8,
                        "weather": [{"id": 800, "description": "clear sky"}]
                    }
                ],
                "daily": [
                    {
                        "dt": 1717250400,
                        "temp": {"min": 15.2, "max": 26.7},
                        "pop": 0.35,
                        "rain": 1.2,
                        "wind_speed": 4.8,
                        "wind_deg": 150,
                        "uvi": 7.0,
                        "weather": [{"id": 500, "description": "light rain"}]
                    }
                ],
                "alerts": [
                    {
                        "sender_name": "AEMET",
                        "event": "Heat warning",
                        "start": 1717243200,
                        "end": 1717286400,
                        "description": "High temperatures expected."
                    }
                ]
            }"#,
        )
        .unwrap()
    }

    fn all_features() -> BTreeSet<Feature> {
        BTreeSet::from([Feature::Forecast, Feature::Current, Feature::Alert])
    }

    #[test]
    fn sentinel_values_read_as_absent() {
        let fragment = convert_one_call(&one_call_json(), &all_features()).unwrap();
        let hours = fragment.hourly_forecast.unwrap();
        assert!(hours[1].temperature.is_none());
        assert!(hours[0].temperature.is_some());
    }

    #[test]
    fn condition_ids_map_to_canonical_codes() {
        assert_eq!(map_condition_id(212), WeatherCode::Thunderstorm);
        assert_eq!(map_condition_id(511), WeatherCode::Sleet);
        assert_eq!(map_condition_id(602), WeatherCode::Snow);
        assert_eq!(map_condition_id(801), WeatherCode::PartlyCloudy);
        assert_eq!(map_condition_id(9000), WeatherCode::Unknown);
    }

    #[test]
    fn pop_fraction_becomes_a_percent_ratio() {
        let fragment = convert_one_call(&one_call_json(), &all_features()).unwrap();
        let hours = fragment.hourly_forecast.unwrap();
        assert_eq!(
            hours[0].precipitation_probability.unwrap().to_percent(),
            20.0
        );
    }

    #[test]
    fn alerts_without_vendor_ids_get_derived_ones() {
        let a = convert_one_call(&one_call_json(), &all_features()).unwrap();
        let b = convert_one_call(&one_call_json(), &all_features()).unwrap();
        let alerts_a = a.alert_list.clone().unwrap();
        assert_eq!(a, b);
        assert_eq!(alerts_a[0].id, "heat-warning-1717243200");
        assert_eq!(alerts_a[0].severity, AlertSeverity::Unknown);
    }

    #[test]
    fn missing_series_fails_forecast_feature_only() {
        let resp: OwOneCallResponse = serde_json::from_str(
            r#"{"current": {"dt": 1717243200, "temp": 20.0, "weather": []}}"#,
        )
        .unwrap();
        assert!(convert_one_call(&resp, &BTreeSet::from([Feature::Current])).is_ok());
        assert!(matches!(
            convert_one_call(&resp, &BTreeSet::from([Feature::Forecast])).unwrap_err(),
            ProviderError::InvalidData { .. }
        ));
    }

    #[test]
    fn daily_split_keeps_max_for_day_min_for_night() {
        let fragment = convert_one_call(&one_call_json(), &all_features()).unwrap();
        let daily = fragment.daily_forecast.unwrap();
        assert_eq!(
            daily[0].day.temperature.unwrap(),
            Temperature::from_celsius(26.7).unwrap()
        );
        assert_eq!(
            daily[0].night.temperature.unwrap(),
            Temperature::from_celsius(15.2).unwrap()
        );
    }
}
