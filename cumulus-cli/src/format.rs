//! Human-friendly rendering of the merged aggregate, in the display units
//! resolved from preferences and the location's country.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use cumulus_core::config::UnitPreferences;
use cumulus_core::model::{AlertSeverity, Current, Daily, Location, Weather};
use cumulus_core::units::{
    DistanceUnit, PrecipitationUnit, PressureUnit, SpeedUnit, TemperatureUnit,
};

struct DisplayUnits {
    temperature: TemperatureUnit,
    precipitation: PrecipitationUnit,
    pressure: PressureUnit,
    speed: SpeedUnit,
    distance: DistanceUnit,
}

impl DisplayUnits {
    fn resolve(prefs: &UnitPreferences, region: &str) -> Self {
        Self {
            temperature: prefs.temperature_unit(region),
            precipitation: prefs.precipitation_unit(region),
            pressure: prefs.pressure_unit(region),
            speed: prefs.speed_unit(region),
            distance: prefs.distance_unit(region),
        }
    }
}

fn severity_label(severity: AlertSeverity) -> &'static str {
    match severity {
        AlertSeverity::Unknown => "unknown",
        AlertSeverity::Minor => "minor",
        AlertSeverity::Moderate => "moderate",
        AlertSeverity::Severe => "SEVERE",
        AlertSeverity::Extreme => "EXTREME",
    }
}

fn local_time(time: DateTime<Utc>, location: &Location) -> String {
    time.with_timezone(&location.tz())
        .format("%a %H:%M")
        .to_string()
}

fn push_current(out: &mut String, current: &Current, units: &DisplayUnits) {
    let _ = writeln!(out, "Now:");
    if let Some(text) = &current.weather_text {
        let _ = writeln!(out, "  {text}");
    }
    if let Some(t) = current.temperature {
        let mut line = format!("  {}", t.format(units.temperature, 1));
        if let Some(feels) = current.feels_like {
            let _ = write!(line, " (feels like {})", feels.format(units.temperature, 1));
        }
        let _ = writeln!(out, "{line}");
    }
    if let Some(wind) = &current.wind
        && let Some(speed) = wind.speed
    {
        let mut line = format!("  wind {}", speed.format(units.speed, 0));
        if let Some(deg) = wind.direction_degrees {
            let _ = write!(line, " from {deg}°");
        }
        if let Some(gusts) = wind.gusts {
            let _ = write!(line, ", gusts {}", gusts.format(units.speed, 0));
        }
        let _ = writeln!(out, "{line}");
    }
    if let Some(humidity) = current.relative_humidity {
        let _ = writeln!(out, "  humidity {}", humidity.format_percent(0));
    }
    if let Some(pressure) = current.pressure {
        let _ = writeln!(out, "  pressure {}", pressure.format(units.pressure, 0));
    }
    if let Some(visibility) = current.visibility {
        let _ = writeln!(out, "  visibility {}", visibility.format(units.distance, 1));
    }
    if let Some(uv) = current.uv_index {
        let _ = writeln!(out, "  UV index {uv:.0}");
    }
}

fn push_daily(out: &mut String, days: &[Daily], units: &DisplayUnits) {
    let _ = writeln!(out, "Forecast:");
    for day in days.iter().take(7) {
        let mut line = format!("  {}", day.date.format("%a %d %b"));
        if let Some(code) = day.day.weather_code {
            let _ = write!(line, "  {}", code.description());
        }
        match (day.day.temperature, day.night.temperature) {
            (Some(high), Some(low)) => {
                let _ = write!(
                    line,
                    "  {} / {}",
                    high.format(units.temperature, 0),
                    low.format(units.temperature, 0)
                );
            }
            (Some(high), None) => {
                let _ = write!(line, "  high {}", high.format(units.temperature, 0));
            }
            (None, Some(low)) => {
                let _ = write!(line, "  low {}", low.format(units.temperature, 0));
            }
            (None, None) => {}
        }
        if let Some(precip) = day.day.precipitation {
            let _ = write!(line, "  {}", precip.format(units.precipitation, 1));
        }
        if let Some(prob) = day.day.precipitation_probability {
            let _ = write!(line, " ({})", prob.format_percent(0));
        }
        let _ = writeln!(out, "{line}");
    }
}

/// Render the aggregate as a plain-text report.
pub fn render(weather: &Weather, location: &Location, prefs: &UnitPreferences) -> String {
    let units = DisplayUnits::resolve(prefs, &location.country_code);
    let mut out = String::new();

    if location.name.is_empty() {
        let _ = writeln!(out, "{:.4}, {:.4}", location.latitude, location.longitude);
    } else {
        let mut header = location.name.clone();
        if let Some(admin) = &location.admin {
            let _ = write!(header, ", {admin}");
        }
        if !location.country_code.is_empty() {
            let _ = write!(header, " ({})", location.country_code);
        }
        let _ = writeln!(out, "{header}");
    }
    let _ = writeln!(out);

    if let Some(alerts) = &weather.fragment.alert_list
        && !alerts.is_empty()
    {
        let _ = writeln!(out, "Alerts:");
        for alert in alerts {
            let mut line = format!("  [{}] {}", severity_label(alert.severity), alert.headline);
            if let Some(start) = alert.start {
                let _ = write!(line, " (from {})", local_time(start, location));
            }
            if let Some(source) = &alert.source {
                let _ = write!(line, " [{source}]");
            }
            let _ = writeln!(out, "{line}");
        }
        let _ = writeln!(out);
    }

    if let Some(current) = &weather.fragment.current {
        push_current(&mut out, current, &units);
        let _ = writeln!(out);
    }

    if let Some(minutely) = &weather.fragment.minutely_forecast
        && !minutely.is_empty()
    {
        let intensities: Vec<f64> = minutely
            .iter()
            .filter_map(|m| m.precipitation_intensity)
            .map(|p| p.to_f64(units.precipitation))
            .collect();
        if intensities.iter().any(|v| *v > 0.0) {
            let _ = writeln!(
                out,
                "Precipitation expected within the next {} minutes",
                minutely.len() as u32 * minutely[0].interval_minutes
            );
            let _ = writeln!(out);
        }
    }

    if let Some(days) = &weather.fragment.daily_forecast
        && !days.is_empty()
    {
        push_daily(&mut out, days, &units);
        let _ = writeln!(out);
    }

    if let Some(aq) = &weather.fragment.air_quality
        && !aq.is_empty()
    {
        let _ = writeln!(out, "Air quality:");
        let unit = cumulus_core::units::PollutantConcentrationUnit::MicrogramPerCubicMeter;
        for (label, value) in [
            ("PM2.5", aq.pm25),
            ("PM10", aq.pm10),
            ("O3", aq.o3),
            ("NO2", aq.no2),
            ("SO2", aq.so2),
            ("CO", aq.co),
        ] {
            if let Some(value) = value {
                let _ = writeln!(out, "  {label:<6} {}", value.format(unit, 1));
            }
        }
        let _ = writeln!(out);
    }

    if let Some(normals) = &weather.fragment.normals {
        let mut line = format!("Seasonal normals (month {}):", normals.month);
        if let Some(day) = normals.daytime_temperature {
            let _ = write!(line, " day {}", day.format(units.temperature, 0));
        }
        if let Some(night) = normals.nighttime_temperature {
            let _ = write!(line, " night {}", night.format(units.temperature, 0));
        }
        let _ = writeln!(out, "{line}");
        let _ = writeln!(out);
    }

    if !weather.failed_features.is_empty() {
        let _ = writeln!(out, "Unavailable:");
        for (feature, err) in &weather.failed_features {
            let _ = writeln!(out, "  {feature}: {err}");
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cumulus_core::model::WeatherCode;
    use cumulus_core::units::Temperature;

    fn oslo() -> Location {
        let mut location = Location::new(59.91, 10.75, "Europe/Oslo");
        location.name = "Oslo".to_owned();
        location.country_code = "NO".to_owned();
        location
    }

    #[test]
    fn renders_current_block_in_metric_for_norway() {
        let mut weather = Weather::default();
        weather.fragment.current = Some(Current {
            weather_code: Some(WeatherCode::Rain),
            weather_text: Some("Rain".to_owned()),
            temperature: Temperature::from_celsius(8.5).ok(),
            ..Default::default()
        });

        let text = render(&weather, &oslo(), &UnitPreferences::default());
        assert!(text.contains("Oslo"));
        assert!(text.contains("8.5 °C"));
    }

    #[test]
    fn honors_an_explicit_unit_preference() {
        let mut weather = Weather::default();
        weather.fragment.current = Some(Current {
            temperature: Temperature::from_celsius(0.0).ok(),
            ..Default::default()
        });
        let prefs = UnitPreferences {
            temperature: Some("f".to_owned()),
            ..Default::default()
        };

        let text = render(&weather, &oslo(), &prefs);
        assert!(text.contains("32.0 °F"));
    }

    #[test]
    fn failed_features_are_listed() {
        let mut weather = Weather::default();
        weather.failed_features.insert(
            cumulus_core::source::Feature::Alert,
            cumulus_core::ProviderError::Timeout,
        );

        let text = render(&weather, &oslo(), &UnitPreferences::default());
        assert!(text.contains("Unavailable:"));
        assert!(text.contains("alert"));
    }

    #[test]
    fn nameless_location_falls_back_to_coordinates() {
        let location = Location::new(10.0, 20.0, "UTC");
        let text = render(&Weather::default(), &location, &UnitPreferences::default());
        assert!(text.contains("10.0000, 20.0000"));
    }
}
