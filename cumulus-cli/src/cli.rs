use std::collections::BTreeSet;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};

use cumulus_core::source::Feature;
use cumulus_core::{Config, Geocoder, Orchestrator, default_registry};

use crate::format;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "cumulus", version, about = "Multi-source weather aggregator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific source.
    Configure {
        /// Source short name, e.g. "openweather".
        source: String,
    },

    /// List the registered sources and what each can serve.
    Sources,

    /// Show weather for a place name or a coordinate pair.
    Show {
        /// Place name, e.g. "Oslo" or "Denver, CO". Ignored when
        /// coordinates are given.
        place: Option<String>,

        /// Latitude in decimal degrees; requires --lon.
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude in decimal degrees; requires --lat.
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Comma-separated feature ids, e.g. "forecast,current,alert".
        #[arg(long, value_delimiter = ',')]
        features: Vec<String>,
    },
}

fn parse_features(raw: &[String]) -> Result<BTreeSet<Feature>> {
    if raw.is_empty() {
        return Ok(BTreeSet::from([
            Feature::Forecast,
            Feature::Current,
            Feature::Alert,
        ]));
    }
    raw.iter()
        .map(|id| {
            Feature::from_id(id.trim()).ok_or_else(|| {
                let known: Vec<&str> = Feature::ALL.iter().map(|f| f.id()).collect();
                anyhow!("unknown feature '{id}', expected one of: {}", known.join(", "))
            })
        })
        .collect()
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure { source } => configure(&source),
            Command::Sources => {
                sources();
                Ok(())
            }
            Command::Show {
                place,
                lat,
                lon,
                features,
            } => show(place, lat, lon, &features).await,
        }
    }
}

fn configure(source: &str) -> Result<()> {
    let mut config = Config::load()?;

    let registry = default_registry(&config);
    if !registry.iter().any(|s| s.id() == source) {
        let known: Vec<&str> = registry.iter().map(|s| s.id()).collect();
        bail!("unknown source '{source}', expected one of: {}", known.join(", "));
    }

    let api_key = inquire::Password::new(&format!("API key for {source}:"))
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    config.upsert_source_api_key(source, api_key);
    config.save()?;

    println!(
        "Saved credentials for '{source}' to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}

fn sources() {
    let config = Config::load().unwrap_or_default();
    let registry = default_registry(&config);

    for source in registry.iter() {
        println!("{} ({}, {})", source.id(), source.name(), source.continent());
        for (feature, attribution) in source.supported_features() {
            println!("  {feature:<18} {attribution}");
        }
        println!("  privacy: {}", source.privacy_policy_url());
        println!();
    }
}

async fn show(
    place: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    features: &[String],
) -> Result<()> {
    let config = Config::load()?;
    let features = parse_features(features)?;

    let registry = default_registry(&config);
    let orchestrator = match config.call_timeout() {
        Some(timeout) => Orchestrator::with_call_timeout(registry, timeout),
        None => Orchestrator::new(registry),
    };

    let location = match (lat, lon) {
        (Some(lat), Some(lon)) => {
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                bail!("coordinates out of range: lat {lat}, lon {lon}");
            }
            match orchestrator.reverse_geocode(lat, lon).await {
                Ok(resolved) => resolved,
                // No source can name the place; coordinates still work.
                Err(_) => cumulus_core::Location::new(lat, lon, "UTC"),
            }
        }
        _ => {
            let place = place.ok_or_else(|| anyhow!("give a place name or --lat/--lon"))?;
            Geocoder::new()
                .search(&place)
                .await
                .with_context(|| format!("Could not resolve '{place}'"))?
        }
    };

    let outcome = orchestrator
        .refresh(&location, &features)
        .await
        .with_context(|| format!("Could not fetch weather for {}", location.name))?;

    print!(
        "{}",
        format::render(&outcome.weather, &outcome.location, &config.units)
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_feature_set_covers_the_basics() {
        let features = parse_features(&[]).unwrap();
        assert!(features.contains(&Feature::Forecast));
        assert!(features.contains(&Feature::Current));
        assert!(features.contains(&Feature::Alert));
    }

    #[test]
    fn feature_ids_parse_and_dedupe() {
        let raw = vec!["forecast".to_owned(), " forecast ".to_owned(), "pollen".to_owned()];
        let features = parse_features(&raw).unwrap();
        assert_eq!(features.len(), 2);
    }

    #[test]
    fn unknown_feature_id_is_an_error() {
        let err = parse_features(&["tides".to_owned()]).unwrap_err();
        assert!(err.to_string().contains("tides"));
    }

    #[test]
    fn cli_parses_coordinates() {
        let cli = Cli::parse_from(["cumulus", "show", "--lat", "59.91", "--lon", "10.75"]);
        match cli.command {
            Command::Show { lat, lon, .. } => {
                assert_eq!(lat, Some(59.91));
                assert_eq!(lon, Some(10.75));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
