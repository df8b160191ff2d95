//! Pure transforms from the Open-Meteo wire schema into canonical fragments.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Utc};

use crate::error::ProviderError;
use crate::model::{
    AirQuality, Current, Daily, HalfDay, Hourly, Location, Minutely, Normals, Pollen, WeatherCode,
    WeatherFragment, Wind,
};
use crate::provider::common::bucket_hourly_into_daily;
use crate::source::Feature;
use crate::units::{
    Distance, DistanceUnit, PollutantConcentration, PollutantConcentrationUnit, Precipitation,
    PrecipitationUnit, Pressure, PressureUnit, Ratio, Speed, SpeedUnit, Temperature,
    TemperatureUnit,
};

use super::dto::{OmAirQualityResponse, OmClimateResponse, OmForecastResponse};

/// WMO 4677 code -> canonical condition. Unmapped codes resolve to Unknown.
pub(super) fn map_weather_code(code: i64) -> WeatherCode {
    match code {
        0 | 1 => WeatherCode::Clear,
        2 => WeatherCode::PartlyCloudy,
        3 => WeatherCode::Cloudy,
        45 | 48 => WeatherCode::Fog,
        51 | 53 | 55 | 61 | 63 | 65 | 80 | 81 | 82 => WeatherCode::Rain,
        56 | 57 | 66 | 67 => WeatherCode::Sleet,
        71 | 73 | 75 | 77 | 85 | 86 => WeatherCode::Snow,
        95 => WeatherCode::Thunderstorm,
        96 | 99 => WeatherCode::Hail,
        _ => WeatherCode::Unknown,
    }
}

/// Value of a parallel-array variable at slot `i`.
fn slot(series: &Option<Vec<Option<f64>>>, i: usize) -> Option<f64> {
    series.as_ref().and_then(|v| v.get(i).copied().flatten())
}

fn slot_i64(series: &Option<Vec<Option<i64>>>, i: usize) -> Option<i64> {
    series.as_ref().and_then(|v| v.get(i).copied().flatten())
}

fn instant(unix: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(unix, 0)
}

fn direction(degrees: Option<f64>) -> Option<u16> {
    degrees
        .filter(|d| (0.0..=360.0).contains(d))
        .map(|d| (d.round() as u16) % 360)
}

fn wind_from(speed_kmh: Option<f64>, dir: Option<f64>, gusts_kmh: Option<f64>) -> Option<Wind> {
    let wind = Wind {
        speed: speed_kmh.and_then(|v| Speed::checked(v, SpeedUnit::KilometerPerHour)),
        direction_degrees: direction(dir),
        gusts: gusts_kmh.and_then(|v| Speed::checked(v, SpeedUnit::KilometerPerHour)),
    };
    (wind.speed.is_some() || wind.gusts.is_some()).then_some(wind)
}

/// Convert a forecast-endpoint response for the requested subset of
/// {Forecast, Current, Minutely}. Sections outside the request stay absent.
pub(super) fn convert_forecast(
    resp: &OmForecastResponse,
    location: &Location,
    features: &BTreeSet<Feature>,
) -> Result<WeatherFragment, ProviderError> {
    let mut fragment = WeatherFragment::default();

    if features.contains(&Feature::Forecast) {
        let hourly = resp
            .hourly
            .as_ref()
            .filter(|h| !h.time.is_empty())
            .ok_or_else(|| ProviderError::invalid_data("forecast response has no hourly series"))?;

        let mut hours = Vec::with_capacity(hourly.time.len());
        for (i, unix) in hourly.time.iter().enumerate() {
            // The timestamp is structurally required; other fields degrade
            // to absent individually.
            let Some(time) = instant(*unix) else {
                return Err(ProviderError::parse(format!(
                    "hourly entry {i} has invalid timestamp {unix}"
                )));
            };
            hours.push(Hourly {
                time,
                weather_code: slot_i64(&hourly.weather_code, i).map(map_weather_code),
                temperature: slot(&hourly.temperature_2m, i)
                    .and_then(|v| Temperature::checked(v, TemperatureUnit::Celsius)),
                feels_like: slot(&hourly.apparent_temperature, i)
                    .and_then(|v| Temperature::checked(v, TemperatureUnit::Celsius)),
                precipitation: slot(&hourly.precipitation, i)
                    .and_then(|v| Precipitation::checked_hourly(v, PrecipitationUnit::Millimeter)),
                precipitation_probability: slot(&hourly.precipitation_probability, i)
                    .and_then(Ratio::checked_percent),
                wind: wind_from(
                    slot(&hourly.wind_speed_10m, i),
                    slot(&hourly.wind_direction_10m, i),
                    slot(&hourly.wind_gusts_10m, i),
                ),
                relative_humidity: slot(&hourly.relative_humidity_2m, i)
                    .and_then(Ratio::checked_percent),
            });
        }

        let daily = match resp.daily.as_ref().filter(|d| !d.time.is_empty()) {
            Some(daily) => convert_native_daily(daily)?,
            None => bucket_hourly_into_daily(&hours, location.tz()),
        };

        fragment.hourly_forecast = Some(hours);
        fragment.daily_forecast = Some(daily);
    }

    if features.contains(&Feature::Current) {
        let current = resp
            .current
            .as_ref()
            .ok_or_else(|| ProviderError::invalid_data("response has no current block"))?;
        fragment.current = Some(Current {
            weather_code: current.weather_code.map(map_weather_code),
            weather_text: current
                .weather_code
                .map(|c| map_weather_code(c).description().to_owned()),
            temperature: current
                .temperature_2m
                .and_then(|v| Temperature::checked(v, TemperatureUnit::Celsius)),
            feels_like: current
                .apparent_temperature
                .and_then(|v| Temperature::checked(v, TemperatureUnit::Celsius)),
            wind: wind_from(
                current.wind_speed_10m,
                current.wind_direction_10m,
                current.wind_gusts_10m,
            ),
            relative_humidity: current.relative_humidity_2m.and_then(Ratio::checked_percent),
            dew_point: None,
            pressure: current
                .surface_pressure
                .and_then(|v| Pressure::checked(v, PressureUnit::Hectopascal)),
            cloud_cover: current.cloud_cover.and_then(Ratio::checked_percent),
            visibility: current
                .visibility
                .and_then(|v| Distance::checked_visibility(v, DistanceUnit::Meter)),
            uv_index: current.uv_index.filter(|v| (0.0..=20.0).contains(v)),
            observation_time: instant(current.time),
        });
    }

    if features.contains(&Feature::Minutely) {
        let minutely = resp
            .minutely_15
            .as_ref()
            .filter(|m| !m.time.is_empty())
            .ok_or_else(|| ProviderError::invalid_data("response has no minutely_15 series"))?;
        let mut entries = Vec::with_capacity(minutely.time.len());
        for (i, unix) in minutely.time.iter().enumerate() {
            let Some(time) = instant(*unix) else {
                continue;
            };
            entries.push(Minutely {
                time,
                interval_minutes: 15,
                precipitation_intensity: slot(&minutely.precipitation, i)
                    .and_then(|v| Precipitation::checked_hourly(v, PrecipitationUnit::Millimeter)),
            });
        }
        fragment.minutely_forecast = Some(entries);
    }

    Ok(fragment)
}

fn convert_native_daily(daily: &super::dto::OmDaily) -> Result<Vec<Daily>, ProviderError> {
    let mut out = Vec::with_capacity(daily.time.len());
    for (i, unix) in daily.time.iter().enumerate() {
        let Some(date) = instant(*unix).map(|t| t.date_naive()) else {
            return Err(ProviderError::parse(format!(
                "daily entry {i} has invalid timestamp {unix}"
            )));
        };
        let code = slot_i64(&daily.weather_code, i).map(map_weather_code);
        out.push(Daily {
            date,
            day: HalfDay {
                weather_code: code,
                temperature: slot(&daily.temperature_2m_max, i)
                    .and_then(|v| Temperature::checked(v, TemperatureUnit::Celsius)),
                precipitation: slot(&daily.precipitation_sum, i)
                    .and_then(|v| Precipitation::from_millimeters(v).ok()),
                precipitation_probability: slot(&daily.precipitation_probability_max, i)
                    .and_then(Ratio::checked_percent),
                wind: wind_from(slot(&daily.wind_speed_10m_max, i), None, None),
            },
            night: HalfDay {
                weather_code: code,
                temperature: slot(&daily.temperature_2m_min, i)
                    .and_then(|v| Temperature::checked(v, TemperatureUnit::Celsius)),
                precipitation: None,
                precipitation_probability: None,
                wind: None,
            },
            uv_index: slot(&daily.uv_index_max, i).filter(|v| (0.0..=20.0).contains(v)),
        });
    }
    Ok(out)
}

fn grains(value: Option<f64>) -> Option<u32> {
    value.filter(|v| (0.0..=10_000.0).contains(v)).map(|v| v.round() as u32)
}

/// Convert an air-quality-endpoint response for the requested subset of
/// {AirQuality, Pollen}.
pub(super) fn convert_air_quality(
    resp: &OmAirQualityResponse,
    features: &BTreeSet<Feature>,
) -> Result<WeatherFragment, ProviderError> {
    let current = resp
        .current
        .as_ref()
        .ok_or_else(|| ProviderError::invalid_data("air quality response has no current block"))?;

    let ug = |v: Option<f64>| {
        v.and_then(|v| {
            PollutantConcentration::checked(v, PollutantConcentrationUnit::MicrogramPerCubicMeter)
        })
    };

    let mut fragment = WeatherFragment::default();

    if features.contains(&Feature::AirQuality) {
        let air_quality = AirQuality {
            pm25: ug(current.pm2_5),
            pm10: ug(current.pm10),
            so2: ug(current.sulphur_dioxide),
            no2: ug(current.nitrogen_dioxide),
            o3: ug(current.ozone),
            co: ug(current.carbon_monoxide),
        };
        if air_quality.is_empty() {
            return Err(ProviderError::invalid_data(
                "air quality response carries no pollutant values",
            ));
        }
        fragment.air_quality = Some(air_quality);
    }

    if features.contains(&Feature::Pollen) {
        let pollen = Pollen {
            alder: grains(current.alder_pollen),
            birch: grains(current.birch_pollen),
            grass: grains(current.grass_pollen),
            mugwort: grains(current.mugwort_pollen),
            olive: grains(current.olive_pollen),
            ragweed: grains(current.ragweed_pollen),
        };
        if pollen.is_empty() {
            return Err(ProviderError::invalid_data(
                "air quality response carries no pollen values",
            ));
        }
        fragment.pollen = Some(pollen);
    }

    Ok(fragment)
}

/// Derive monthly normals from a climate-endpoint response. The month comes
/// from the response's own timestamps, never from the wall clock.
pub(super) fn convert_normals(resp: &OmClimateResponse) -> Result<WeatherFragment, ProviderError> {
    let daily = resp
        .daily
        .as_ref()
        .filter(|d| !d.time.is_empty())
        .ok_or_else(|| ProviderError::invalid_data("climate response has no daily series"))?;

    let month = instant(daily.time[0])
        .map(|t| t.month())
        .ok_or_else(|| ProviderError::parse("climate series has an invalid first timestamp"))?;

    let mean = |series: &Option<Vec<Option<f64>>>| -> Option<Temperature> {
        let values: Vec<f64> = series
            .as_ref()?
            .iter()
            .flatten()
            .copied()
            .filter(|v| !v.is_nan())
            .collect();
        if values.is_empty() {
            return None;
        }
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        Temperature::checked(mean, TemperatureUnit::Celsius)
    };

    let normals = Normals {
        month,
        daytime_temperature: mean(&daily.temperature_2m_max),
        nighttime_temperature: mean(&daily.temperature_2m_min),
    };
    if normals.daytime_temperature.is_none() && normals.nighttime_temperature.is_none() {
        return Err(ProviderError::invalid_data(
            "climate response carries no temperature values",
        ));
    }

    Ok(WeatherFragment {
        normals: Some(normals),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::PrecipitationUnit;

    fn forecast_json() -> OmForecastResponse {
        serde_json::from_str(
            r#"{
                "current": {
                    "time": 1717243200,
                    "temperature_2m": 17.3,
                    "apparent_temperature": 16.1,
                    "relative_humidity_2m": 71,
                    "weather_code": 61,
                    "surface_pressure": 1009.2,
                    "cloud_cover": 80,
                    "visibility": 24140.0,
                    "wind_speed_10m": 14.8,
                    "wind_direction_10m": 212,
                    "wind_gusts_10m": 33.5,
                    "uv_index": 3.2
                },
                "hourly": {
                    "time": [1717243200, 1717246800, 1717250400],
                    "temperature_2m": [17.3, 17.9, null],
                    "precipitation": [0.0, 1.4, 999.0],
                    "precipitation_probability": [10, 55, 60],
                    "weather_code": [3, 61, 1234],
                    "wind_speed_10m": [14.8, 16.2, 15.0],
                    "wind_direction_10m": [212, 220, 215]
                },
                "daily": {
                    "time": [1717200000],
                    "weather_code": [61],
                    "temperature_2m_max": [19.4],
                    "temperature_2m_min": [11.2],
                    "precipitation_sum": [4.2],
                    "precipitation_probability_max": [65]
                },
                "minutely_15": {
                    "time": [1717243200, 1717244100],
                    "precipitation": [0.1, 0.3]
                }
            }"#,
        )
        .unwrap()
    }

    fn oslo() -> Location {
        Location::new(59.91, 10.75, "Europe/Oslo")
    }

    fn all_forecast_features() -> BTreeSet<Feature> {
        BTreeSet::from([Feature::Forecast, Feature::Current, Feature::Minutely])
    }

    #[test]
    fn converts_only_requested_sections() {
        let fragment = convert_forecast(
            &forecast_json(),
            &oslo(),
            &BTreeSet::from([Feature::Forecast]),
        )
        .unwrap();
        assert!(fragment.hourly_forecast.is_some());
        assert!(fragment.daily_forecast.is_some());
        assert!(fragment.current.is_none());
        assert!(fragment.minutely_forecast.is_none());
    }

    #[test]
    fn malformed_slots_become_absent_not_fatal() {
        let fragment =
            convert_forecast(&forecast_json(), &oslo(), &all_forecast_features()).unwrap();
        let hours = fragment.hourly_forecast.unwrap();
        assert_eq!(hours.len(), 3);
        // null temperature slot.
        assert!(hours[2].temperature.is_none());
        // 999 mm/h fails the plausibility gate.
        assert!(hours[2].precipitation.is_none());
        assert_eq!(
            hours[1].precipitation.unwrap(),
            Precipitation::from_millimeters(1.4).unwrap()
        );
    }

    #[test]
    fn unmapped_vendor_code_resolves_to_unknown() {
        let fragment =
            convert_forecast(&forecast_json(), &oslo(), &all_forecast_features()).unwrap();
        let hours = fragment.hourly_forecast.unwrap();
        assert_eq!(hours[2].weather_code, Some(WeatherCode::Unknown));
        assert_eq!(hours[1].weather_code, Some(WeatherCode::Rain));
    }

    #[test]
    fn empty_hourly_series_is_invalid_data() {
        let resp: OmForecastResponse =
            serde_json::from_str(r#"{"hourly": {"time": []}}"#).unwrap();
        let err =
            convert_forecast(&resp, &oslo(), &BTreeSet::from([Feature::Forecast])).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidData { .. }));
    }

    #[test]
    fn conversion_is_idempotent() {
        let resp = forecast_json();
        let a = convert_forecast(&resp, &oslo(), &all_forecast_features()).unwrap();
        let b = convert_forecast(&resp, &oslo(), &all_forecast_features()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn minutely_interval_is_fifteen_minutes() {
        let fragment =
            convert_forecast(&forecast_json(), &oslo(), &all_forecast_features()).unwrap();
        let minutely = fragment.minutely_forecast.unwrap();
        assert_eq!(minutely[0].interval_minutes, 15);
        assert_eq!(
            minutely[1].precipitation_intensity.unwrap(),
            Precipitation::from_unit(0.3, PrecipitationUnit::Millimeter).unwrap()
        );
    }

    #[test]
    fn air_quality_and_pollen_split_by_request() {
        let resp: OmAirQualityResponse = serde_json::from_str(
            r#"{"current": {"pm2_5": 8.4, "pm10": 14.0, "ozone": 61.0, "birch_pollen": 42.7}}"#,
        )
        .unwrap();

        let aq_only =
            convert_air_quality(&resp, &BTreeSet::from([Feature::AirQuality])).unwrap();
        assert!(aq_only.air_quality.is_some());
        assert!(aq_only.pollen.is_none());

        let pollen_only = convert_air_quality(&resp, &BTreeSet::from([Feature::Pollen])).unwrap();
        assert_eq!(pollen_only.pollen.unwrap().birch, Some(43));
    }

    #[test]
    fn normals_month_comes_from_response_timestamps() {
        let resp: OmClimateResponse = serde_json::from_str(
            r#"{"daily": {
                "time": [1717243200, 1717329600],
                "temperature_2m_max": [20.0, 22.0],
                "temperature_2m_min": [10.0, 12.0]
            }}"#,
        )
        .unwrap();
        let fragment = convert_normals(&resp).unwrap();
        let normals = fragment.normals.unwrap();
        assert_eq!(normals.month, 6);
        assert_eq!(
            normals.daytime_temperature.unwrap(),
            Temperature::from_celsius(21.0).unwrap()
        );
    }
}
