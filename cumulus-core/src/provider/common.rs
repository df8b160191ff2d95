//! Helpers shared by the per-vendor converters.

use std::collections::HashSet;

use chrono::Timelike;
use chrono_tz::Tz;

use crate::error::ProviderError;
use crate::model::{Alert, Daily, HalfDay, Hourly, WeatherCode, Wind};
use crate::units::Ratio;

/// Local hours 06:00–17:59 belong to the day half; the rest to the night.
const DAY_START_HOUR: u32 = 6;
const DAY_END_HOUR: u32 = 17;

/// Map a non-success HTTP status onto the error taxonomy.
pub(crate) fn classify_status(status: u16, body: &str) -> ProviderError {
    match status {
        401 | 403 => ProviderError::Unauthorized { status },
        409 | 429 => ProviderError::RateLimited { status },
        _ => ProviderError::HttpStatus {
            status,
            body: truncate_body(body),
        },
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_owned(),
    }
}

/// Order alerts by (start, id) and keep one entry per id. Vendors may carry
/// several versions of the same event in one payload, under the same id but
/// with different start instants; the earliest version wins.
pub(crate) fn sort_dedup_alerts(alerts: &mut Vec<Alert>) {
    alerts.sort_by(|a, b| (a.start, &a.id).cmp(&(b.start, &b.id)));
    let mut seen = HashSet::new();
    alerts.retain(|a| seen.insert(a.id.clone()));
}

/// Ranking used when one condition code must represent several hours.
fn code_severity(code: WeatherCode) -> u8 {
    match code {
        WeatherCode::Thunderstorm => 12,
        WeatherCode::Thunder => 11,
        WeatherCode::Hail => 10,
        WeatherCode::Snow => 9,
        WeatherCode::Sleet => 8,
        WeatherCode::Rain => 7,
        WeatherCode::Wind => 6,
        WeatherCode::Fog => 5,
        WeatherCode::Haze => 4,
        WeatherCode::Cloudy => 3,
        WeatherCode::PartlyCloudy => 2,
        WeatherCode::Clear => 1,
        WeatherCode::Unknown => 0,
    }
}

fn build_half_day(hours: &[&Hourly], daytime: bool) -> HalfDay {
    let weather_code = hours
        .iter()
        .filter_map(|h| h.weather_code)
        .max_by_key(|c| code_severity(*c));

    // Daytime high, nighttime low.
    let temperature = if daytime {
        hours.iter().filter_map(|h| h.temperature).max()
    } else {
        hours.iter().filter_map(|h| h.temperature).min()
    };

    let precipitation = hours
        .iter()
        .filter_map(|h| h.precipitation)
        .reduce(|a, b| a.saturating_add(b));

    let precipitation_probability: Option<Ratio> = hours
        .iter()
        .filter_map(|h| h.precipitation_probability)
        .max();

    let wind: Option<Wind> = hours
        .iter()
        .filter_map(|h| h.wind.as_ref())
        .max_by_key(|w| w.speed)
        .cloned();

    HalfDay {
        weather_code,
        temperature,
        precipitation,
        precipitation_probability,
        wind,
    }
}

/// Derive daily entries from an hourly series by grouping on the location's
/// local calendar day. The trailing partial day is dropped so an incomplete
/// bucket can never present a misleading daily extreme.
pub(crate) fn bucket_hourly_into_daily(hourly: &[Hourly], tz: Tz) -> Vec<Daily> {
    let mut buckets: Vec<(chrono::NaiveDate, Vec<&Hourly>)> = Vec::new();
    for hour in hourly {
        let local_date = hour.time.with_timezone(&tz).date_naive();
        match buckets.last_mut() {
            Some((date, hours)) if *date == local_date => hours.push(hour),
            _ => buckets.push((local_date, vec![hour])),
        }
    }

    // A trailing bucket that stops before the last local hour is partial.
    if let Some((_, hours)) = buckets.last()
        && let Some(last) = hours.last()
        && last.time.with_timezone(&tz).hour() != 23
    {
        buckets.pop();
    }

    buckets
        .into_iter()
        .map(|(date, hours)| {
            let day_hours: Vec<&Hourly> = hours
                .iter()
                .copied()
                .filter(|h| {
                    let hour = h.time.with_timezone(&tz).hour();
                    (DAY_START_HOUR..=DAY_END_HOUR).contains(&hour)
                })
                .collect();
            let night_hours: Vec<&Hourly> = hours
                .iter()
                .copied()
                .filter(|h| {
                    let hour = h.time.with_timezone(&tz).hour();
                    !(DAY_START_HOUR..=DAY_END_HOUR).contains(&hour)
                })
                .collect();

            Daily {
                date,
                day: build_half_day(&day_hours, true),
                night: build_half_day(&night_hours, false),
                uv_index: None,
            }
        })
        .collect()
}
