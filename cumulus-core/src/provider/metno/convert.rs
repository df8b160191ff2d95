//! Pure transforms from the MET Norway wire schemas into canonical fragments.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::error::ProviderError;
use crate::model::{
    Alert, AlertSeverity, Current, Hourly, Location, Minutely, WeatherCode, WeatherFragment, Wind,
};
use crate::provider::common::{bucket_hourly_into_daily, sort_dedup_alerts};
use crate::source::Feature;
use crate::units::{
    Precipitation, PrecipitationUnit, Pressure, PressureUnit, Ratio, Speed, SpeedUnit, Temperature,
    TemperatureUnit,
};

use super::dto::{MetAlertsResponse, MetForecastResponse, MetInstantDetails, MetTimeStep};

/// Symbol codes carry a `_day`/`_night`/`_polartwilight` suffix; the stem
/// identifies the condition. Unmapped stems resolve to Unknown.
pub(super) fn map_symbol_code(symbol: &str) -> WeatherCode {
    let stem = symbol
        .split_once('_')
        .map_or(symbol, |(stem, _)| stem);
    if stem.contains("thunder") {
        return WeatherCode::Thunderstorm;
    }
    match stem {
        "clearsky" | "fair" => WeatherCode::Clear,
        "partlycloudy" => WeatherCode::PartlyCloudy,
        "cloudy" => WeatherCode::Cloudy,
        "fog" => WeatherCode::Fog,
        s if s.contains("sleet") => WeatherCode::Sleet,
        s if s.contains("snow") => WeatherCode::Snow,
        s if s.contains("rain") => WeatherCode::Rain,
        _ => WeatherCode::Unknown,
    }
}

fn parse_time(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn wind_from(details: &MetInstantDetails) -> Option<Wind> {
    let wind = Wind {
        speed: details
            .wind_speed
            .and_then(|v| Speed::checked(v, SpeedUnit::MeterPerSecond)),
        direction_degrees: details
            .wind_from_direction
            .filter(|d| (0.0..=360.0).contains(d))
            .map(|d| (d.round() as u16) % 360),
        gusts: details
            .wind_speed_of_gust
            .and_then(|v| Speed::checked(v, SpeedUnit::MeterPerSecond)),
    };
    (wind.speed.is_some() || wind.gusts.is_some()).then_some(wind)
}

fn convert_step(step: &MetTimeStep) -> Result<Hourly, ProviderError> {
    let time = parse_time(&step.time).ok_or_else(|| {
        ProviderError::parse(format!("timeseries step has invalid time '{}'", step.time))
    })?;
    let details = step.data.instant.as_ref().and_then(|i| i.details.as_ref());
    let next = step.data.next_1_hours.as_ref();

    Ok(Hourly {
        time,
        weather_code: next
            .and_then(|n| n.summary.as_ref())
            .and_then(|s| s.symbol_code.as_deref())
            .map(map_symbol_code),
        temperature: details
            .and_then(|d| d.air_temperature)
            .and_then(|v| Temperature::checked(v, TemperatureUnit::Celsius)),
        feels_like: None,
        precipitation: next
            .and_then(|n| n.details.as_ref())
            .and_then(|d| d.precipitation_amount)
            .and_then(|v| Precipitation::checked_hourly(v, PrecipitationUnit::Millimeter)),
        precipitation_probability: next
            .and_then(|n| n.details.as_ref())
            .and_then(|d| d.probability_of_precipitation)
            .and_then(Ratio::checked_percent),
        wind: details.and_then(wind_from),
        relative_humidity: details
            .and_then(|d| d.relative_humidity)
            .and_then(Ratio::checked_percent),
    })
}

/// Convert a Locationforecast response for the requested subset of
/// {Forecast, Current}. Current conditions are the first timeseries step.
pub(super) fn convert_forecast(
    resp: &MetForecastResponse,
    location: &Location,
    features: &BTreeSet<Feature>,
) -> Result<WeatherFragment, ProviderError> {
    let steps = resp
        .properties
        .as_ref()
        .map(|p| p.timeseries.as_slice())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ProviderError::invalid_data("locationforecast has no timeseries"))?;

    let mut fragment = WeatherFragment::default();

    if features.contains(&Feature::Current) {
        let first = &steps[0];
        let details = first.data.instant.as_ref().and_then(|i| i.details.as_ref());
        let code = first
            .data
            .next_1_hours
            .as_ref()
            .and_then(|n| n.summary.as_ref())
            .and_then(|s| s.symbol_code.as_deref())
            .map(map_symbol_code);
        fragment.current = Some(Current {
            weather_code: code,
            weather_text: code.map(|c| c.description().to_owned()),
            temperature: details
                .and_then(|d| d.air_temperature)
                .and_then(|v| Temperature::checked(v, TemperatureUnit::Celsius)),
            feels_like: None,
            wind: details.and_then(wind_from),
            relative_humidity: details
                .and_then(|d| d.relative_humidity)
                .and_then(Ratio::checked_percent),
            dew_point: details
                .and_then(|d| d.dew_point_temperature)
                .and_then(|v| Temperature::checked(v, TemperatureUnit::Celsius)),
            pressure: details
                .and_then(|d| d.air_pressure_at_sea_level)
                .and_then(|v| Pressure::checked(v, PressureUnit::Hectopascal)),
            cloud_cover: details
                .and_then(|d| d.cloud_area_fraction)
                .and_then(Ratio::checked_percent),
            visibility: None,
            uv_index: None,
            observation_time: parse_time(&first.time),
        });
    }

    if features.contains(&Feature::Forecast) {
        // A malformed step timestamp is structural for that entry only.
        let hours: Vec<Hourly> = steps.iter().filter_map(|s| convert_step(s).ok()).collect();
        if hours.is_empty() {
            return Err(ProviderError::invalid_data(
                "locationforecast timeseries contained no usable steps",
            ));
        }
        fragment.daily_forecast = Some(bucket_hourly_into_daily(&hours, location.tz()));
        fragment.hourly_forecast = Some(hours);
    }

    Ok(fragment)
}

/// Convert a Nowcast response into the minutely section (5-minute grid).
pub(super) fn convert_nowcast(resp: &MetForecastResponse) -> Result<WeatherFragment, ProviderError> {
    let steps = resp
        .properties
        .as_ref()
        .map(|p| p.timeseries.as_slice())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ProviderError::invalid_data("nowcast has no timeseries"))?;

    let entries: Vec<Minutely> = steps
        .iter()
        .filter_map(|step| {
            let time = parse_time(&step.time)?;
            let rate = step
                .data
                .instant
                .as_ref()
                .and_then(|i| i.details.as_ref())
                .and_then(|d| d.precipitation_rate);
            Some(Minutely {
                time,
                interval_minutes: 5,
                precipitation_intensity: rate
                    .and_then(|v| Precipitation::checked_hourly(v, PrecipitationUnit::Millimeter)),
            })
        })
        .collect();

    if entries.is_empty() {
        return Err(ProviderError::invalid_data(
            "nowcast timeseries contained no usable steps",
        ));
    }

    Ok(WeatherFragment {
        minutely_forecast: Some(entries),
        ..Default::default()
    })
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

/// Convert a MetAlerts response. Alerts are deduplicated by id and ordered
/// by (start, id) so refreshes are stable.
pub(super) fn convert_alerts(resp: &MetAlertsResponse) -> Result<WeatherFragment, ProviderError> {
    let mut alerts: Vec<Alert> = Vec::new();
    for feature in resp.features.as_deref().unwrap_or_default() {
        let Some(props) = feature.properties.as_ref() else {
            continue;
        };
        let interval = feature.when.as_ref().and_then(|w| w.interval.as_deref());
        let start = interval
            .and_then(|i| i.first())
            .and_then(|raw| parse_time(raw));
        let end = interval
            .and_then(|i| i.get(1))
            .and_then(|raw| parse_time(raw));
        let event = props.event.as_deref().unwrap_or("alert");
        let severity = map_severity(props.severity.as_deref());
        let id = props
            .id
            .clone()
            .unwrap_or_else(|| Alert::derive_id(event, start));
        alerts.push(Alert {
            id,
            start,
            end,
            headline: props.title.clone().unwrap_or_else(|| event.to_owned()),
            description: props.description.clone(),
            severity,
            source: Some("MET Norway".to_owned()),
            color: severity.default_color(),
        });
    }

    sort_dedup_alerts(&mut alerts);

    Ok(WeatherFragment {
        alert_list: Some(alerts),
        ..Default::default()
    })
}
