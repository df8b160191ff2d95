//! Core library for the `cumulus` CLI.
//!
//! This crate defines:
//! - Integral-storage physical quantity types and unit conversion
//! - The canonical weather domain model (aggregate, fragments, alerts)
//! - The source abstraction, capability/priority model and registry
//! - Vendor integrations (Open-Meteo, MET Norway, NWS, OpenWeather)
//! - The fetch orchestrator that merges per-feature fragments
//! - Configuration & credentials handling
//!
//! It is used by `cumulus-cli`, but can also be reused by other binaries or
//! services.

pub mod config;
pub mod error;
pub mod geocode;
pub mod model;
pub mod provider;
pub mod refresh;
pub mod source;
pub mod units;

pub use config::Config;
pub use error::{ProviderError, RefreshError};
pub use geocode::Geocoder;
pub use model::{Location, Weather, WeatherFragment};
pub use provider::default_registry;
pub use refresh::{Orchestrator, RefreshOutcome};
pub use source::{Feature, Priority, SourceRegistry, WeatherSource};
