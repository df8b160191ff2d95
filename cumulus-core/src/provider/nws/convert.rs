//! Pure transforms from the api.weather.gov schemas into canonical fragments.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::error::ProviderError;
use crate::model::{
    Alert, AlertSeverity, Current, Daily, HalfDay, Hourly, Location, WeatherCode, WeatherFragment,
    Wind,
};
use crate::provider::common::sort_dedup_alerts;
use crate::source::Feature;
use crate::units::{Ratio, Speed, SpeedUnit, Temperature, TemperatureUnit};

use super::dto::{NwsAlertsResponse, NwsForecastResponse, NwsPeriod};

/// Keyword mapping over the free-text short forecast. Order matters: the
/// most specific phenomena are checked first; no keyword means Unknown.
pub(super) fn map_short_forecast(text: &str) -> WeatherCode {
    let lower = text.to_ascii_lowercase();
    if lower.contains("thunder") {
        WeatherCode::Thunderstorm
    } else if lower.contains("sleet") || lower.contains("freezing") || lower.contains("ice") {
        WeatherCode::Sleet
    } else if lower.contains("snow") || lower.contains("flurries") || lower.contains("blizzard") {
        WeatherCode::Snow
    } else if lower.contains("hail") {
        WeatherCode::Hail
    } else if lower.contains("rain") || lower.contains("shower") || lower.contains("drizzle") {
        WeatherCode::Rain
    } else if lower.contains("fog") {
        WeatherCode::Fog
    } else if lower.contains("haze") || lower.contains("smoke") || lower.contains("dust") {
        WeatherCode::Haze
    } else if lower.contains("windy") || lower.contains("breezy") || lower.contains("blustery") {
        WeatherCode::Wind
    } else if lower.contains("partly") {
        WeatherCode::PartlyCloudy
    } else if lower.contains("cloudy") || lower.contains("overcast") {
        WeatherCode::Cloudy
    } else if lower.contains("sunny") || lower.contains("clear") || lower.contains("fair") {
        WeatherCode::Clear
    } else {
        WeatherCode::Unknown
    }
}

fn parse_time(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn parse_temperature(period: &NwsPeriod) -> Option<Temperature> {
    let unit = match period.temperature_unit.as_deref() {
        Some("C") => TemperatureUnit::Celsius,
        // The API defaults to Fahrenheit.
        _ => TemperatureUnit::Fahrenheit,
    };
    period
        .temperature
        .and_then(|v| Temperature::checked(v, unit))
}

/// "5 to 15 mph" reads as the upper bound; a malformed string is absent.
pub(super) fn parse_wind_speed(raw: &str) -> Option<Speed> {
    let lower = raw.to_ascii_lowercase();
    let unit = if lower.ends_with("km/h") {
        SpeedUnit::KilometerPerHour
    } else if lower.ends_with("mph") {
        SpeedUnit::MilePerHour
    } else {
        return None;
    };
    let value = lower
        .split_whitespace()
        .rev()
        .find_map(|token| token.parse::<f64>().ok())?;
    Speed::checked(value, unit)
}

pub(super) fn compass_to_degrees(raw: &str) -> Option<u16> {
    let deg = match raw.trim().to_ascii_uppercase().as_str() {
        "N" => 0,
        "NNE" => 22,
        "NE" => 45,
        "ENE" => 67,
        "E" => 90,
        "ESE" => 112,
        "SE" => 135,
        "SSE" => 157,
        "S" => 180,
        "SSW" => 202,
        "SW" => 225,
        "WSW" => 247,
        "W" => 270,
        "WNW" => 292,
        "NW" => 315,
        "NNW" => 337,
        _ => return None,
    };
    Some(deg)
}

fn wind_from(period: &NwsPeriod) -> Option<Wind> {
    let speed = period.wind_speed.as_deref().and_then(parse_wind_speed);
    speed.map(|speed| Wind {
        speed: Some(speed),
        direction_degrees: period.wind_direction.as_deref().and_then(compass_to_degrees),
        gusts: None,
    })
}

fn convert_hourly_period(period: &NwsPeriod) -> Option<Hourly> {
    let time = parse_time(&period.start_time)?;
    Some(Hourly {
        time,
        weather_code: period.short_forecast.as_deref().map(map_short_forecast),
        temperature: parse_temperature(period),
        feels_like: None,
        precipitation: None,
        precipitation_probability: period
            .probability_of_precipitation
            .as_ref()
            .and_then(|q| q.value)
            .and_then(Ratio::checked_percent),
        wind: wind_from(period),
        relative_humidity: period
            .relative_humidity
            .as_ref()
            .and_then(|q| q.value)
            .and_then(Ratio::checked_percent),
    })
}

fn convert_half_day(period: &NwsPeriod) -> HalfDay {
    HalfDay {
        weather_code: period.short_forecast.as_deref().map(map_short_forecast),
        temperature: parse_temperature(period),
        precipitation: None,
        precipitation_probability: period
            .probability_of_precipitation
            .as_ref()
            .and_then(|q| q.value)
            .and_then(Ratio::checked_percent),
        wind: wind_from(period),
    }
}

/// Convert the pair of gridpoint responses for the requested subset of
/// {Forecast, Current}. The 12-hour periods map straight onto day/night
/// halves; current conditions are the first hourly period.
pub(super) fn convert_forecast(
    twelve_hour: &NwsForecastResponse,
    hourly: &NwsForecastResponse,
    location: &Location,
    features: &BTreeSet<Feature>,
) -> Result<WeatherFragment, ProviderError> {
    let hourly_periods = hourly
        .properties
        .as_ref()
        .map(|p| p.periods.as_slice())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ProviderError::invalid_data("hourly forecast has no periods"))?;

    let mut fragment = WeatherFragment::default();

    if features.contains(&Feature::Current) {
        let first = &hourly_periods[0];
        let code = first.short_forecast.as_deref().map(map_short_forecast);
        fragment.current = Some(Current {
            weather_code: code,
            weather_text: first.short_forecast.clone(),
            temperature: parse_temperature(first),
            feels_like: None,
            wind: wind_from(first),
            relative_humidity: first
                .relative_humidity
                .as_ref()
                .and_then(|q| q.value)
                .and_then(Ratio::checked_percent),
            dew_point: None,
            pressure: None,
            cloud_cover: None,
            visibility: None,
            uv_index: None,
            observation_time: parse_time(&first.start_time),
        });
    }

    if features.contains(&Feature::Forecast) {
        let twelve = twelve_hour
            .properties
            .as_ref()
            .map(|p| p.periods.as_slice())
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ProviderError::invalid_data("12-hour forecast has no periods"))?;

        let tz = location.tz();
        let mut days: Vec<Daily> = Vec::new();
        for period in twelve {
            let Some(start) = parse_time(&period.start_time) else {
                continue;
            };
            let local_date = start.with_timezone(&tz).date_naive();
            let daytime = period.is_daytime.unwrap_or(true);
            let half = convert_half_day(period);

            match days.last_mut() {
                Some(day) if day.date == local_date => {
                    if daytime {
                        day.day = half;
                    } else {
                        day.night = half;
                    }
                }
                _ => {
                    let mut day = Daily {
                        date: local_date,
                        day: HalfDay::default(),
                        night: HalfDay::default(),
                        uv_index: None,
                    };
                    if daytime {
                        day.day = half;
                    } else {
                        day.night = half;
                    }
                    days.push(day);
                }
            }
        }
        if days.is_empty() {
            return Err(ProviderError::invalid_data(
                "12-hour forecast contained no usable periods",
            ));
        }

        fragment.daily_forecast = Some(days);
        fragment.hourly_forecast = Some(
            hourly_periods
                .iter()
                .filter_map(convert_hourly_period)
                .collect(),
        );
    }

    Ok(fragment)
}

fn map_severity(raw: Option<&str>) -> AlertSeverity {
    match raw {
        Some(s) if s.eq_ignore_ascii_case("minor") => AlertSeverity::Minor,
        Some(s) if s.eq_ignore_ascii_case("moderate") => AlertSeverity::Moderate,
        Some(s) if s.eq_ignore_ascii_case("severe") => AlertSeverity::Severe,
        Some(s) if s.eq_ignore_ascii_case("extreme") => AlertSeverity::Extreme,
        _ => AlertSeverity::Unknown,
    }
}

pub(super) fn convert_alerts(resp: &NwsAlertsResponse) -> Result<WeatherFragment, ProviderError> {
    let mut alerts: Vec<Alert> = Vec::new();
    for feature in resp.features.as_deref().unwrap_or_default() {
        let Some(props) = feature.properties.as_ref() else {
            continue;
        };
        let event = props.event.as_deref().unwrap_or("alert");
        let start = props.onset.as_deref().and_then(parse_time);
        let end = props
            .ends
            .as_deref()
            .or(props.expires.as_deref())
            .and_then(parse_time);
        let severity = map_severity(props.severity.as_deref());
        let id = props
            .id
            .clone()
            .unwrap_or_else(|| Alert::derive_id(event, start));
        alerts.push(Alert {
            id,
            start,
            end,
            headline: props
                .headline
                .clone()
                .unwrap_or_else(|| event.to_owned()),
            description: props.description.clone(),
            severity,
            source: props.sender_name.clone(),
            color: severity.default_color(),
        });
    }

    sort_dedup_alerts(&mut alerts);

    Ok(WeatherFragment {
        alert_list: Some(alerts),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn twelve_hour_json() -> NwsForecastResponse {
        serde_json::from_str(
            r#"{"properties": {"periods": [
                {
                    "startTime": "2024-06-01T06:00:00-06:00",
                    "isDaytime": true,
                    "temperature": 78,
                    "temperatureUnit": "F",
                    "windSpeed": "5 to 15 mph",
                    "windDirection": "NW",
                    "shortForecast": "Partly Sunny then Slight Chance Showers",
                    "probabilityOfPrecipitation": {"value": 30}
                },
                {
                    "startTime": "2024-06-01T18:00:00-06:00",
                    "isDaytime": false,
                    "temperature": 55,
                    "temperatureUnit": "F",
                    "windSpeed": "10 mph",
                    "windDirection": "N",
                    "shortForecast": "Mostly Clear",
                    "probabilityOfPrecipitation": {"value": 10}
                }
            ]}}"#,
        )
        .unwrap()
    }

    fn hourly_json() -> NwsForecastResponse {
        serde_json::from_str(
            r#"{"properties": {"periods": [
                {
                    "startTime": "2024-06-01T06:00:00-06:00",
                    "temperature": 61,
                    "temperatureUnit": "F",
                    "windSpeed": "5 mph",
                    "windDirection": "NNW",
                    "shortForecast": "Sunny",
                    "probabilityOfPrecipitation": {"value": 5},
                    "relativeHumidity": {"value": 65}
                }
            ]}}"#,
        )
        .unwrap()
    }

    fn denver() -> Location {
        let mut loc = Location::new(39.74, -104.99, "America/Denver");
        loc.country_code = "US".to_owned();
        loc
    }

    #[test]
    fn twelve_hour_periods_pair_into_day_and_night() {
        let fragment = convert_forecast(
            &twelve_hour_json(),
            &hourly_json(),
            &denver(),
            &BTreeSet::from([Feature::Forecast]),
        )
        .unwrap();
        let daily = fragment.daily_forecast.unwrap();
        assert_eq!(daily.len(), 1);
        let day = &daily[0];
        assert_eq!(
            day.date,
            chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
        );
        // 78 °F converts at the boundary; no vendor unit leaks through.
        assert!((day.day.temperature.unwrap().to_f64(TemperatureUnit::Celsius) - 25.6).abs() < 0.1);
        assert_eq!(day.day.weather_code, Some(WeatherCode::Rain));
        assert_eq!(day.night.weather_code, Some(WeatherCode::Clear));
    }

    #[test]
    fn ranged_wind_speed_reads_the_upper_bound() {
        let speed = parse_wind_speed("5 to 15 mph").unwrap();
        assert!((speed.to_f64(SpeedUnit::MilePerHour) - 15.0).abs() < 0.05);
        assert!(parse_wind_speed("calm").is_none());
    }

    #[test]
    fn compass_points_map_to_degrees() {
        assert_eq!(compass_to_degrees("N"), Some(0));
        assert_eq!(compass_to_degrees("wsw"), Some(247));
        assert_eq!(compass_to_degrees("??"), None);
    }

    #[test]
    fn current_is_the_first_hourly_period() {
        let fragment = convert_forecast(
            &twelve_hour_json(),
            &hourly_json(),
            &denver(),
            &BTreeSet::from([Feature::Current]),
        )
        .unwrap();
        let current = fragment.current.unwrap();
        assert_eq!(current.weather_text.as_deref(), Some("Sunny"));
        assert_eq!(current.relative_humidity.unwrap().to_percent(), 65.0);
        assert!(fragment.daily_forecast.is_none());
    }

    #[test]
    fn alert_severity_and_attribution_survive() {
        let resp: NwsAlertsResponse = serde_json::from_str(
            r#"{"features": [{
                "properties": {
                    "id": "urn:oid:2.49.0.1.840.0.abc",
                    "event": "Severe Thunderstorm Warning",
                    "onset": "2024-06-01T15:00:00-06:00",
                    "ends": "2024-06-01T16:00:00-06:00",
                    "headline": "Severe Thunderstorm Warning until 4 PM",
                    "description": "Quarter size hail possible.",
                    "severity": "Severe",
                    "senderName": "NWS Denver CO"
                }
            }]}"#,
        )
        .unwrap();
        let alerts = convert_alerts(&resp).unwrap().alert_list.unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::Severe);
        assert_eq!(alerts[0].source.as_deref(), Some("NWS Denver CO"));
        assert_eq!(alerts[0].id, "urn:oid:2.49.0.1.840.0.abc");
    }

    #[test]
    fn missing_hourly_periods_is_invalid_data() {
        let empty: NwsForecastResponse =
            serde_json::from_str(r#"{"properties": {"periods": []}}"#).unwrap();
        let err = convert_forecast(
            &twelve_hour_json(),
            &empty,
            &denver(),
            &BTreeSet::from([Feature::Forecast]),
        )
        .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidData { .. }));
    }
}
