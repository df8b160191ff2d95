//! Vendor integrations. One module per source: wire DTOs, a pure converter
//! and the fetch implementation of [`crate::source::WeatherSource`].

pub(crate) mod common;

pub mod metno;
pub mod nws;
pub mod openmeteo;
pub mod openweather;

use std::sync::Arc;

use crate::config::Config;
use crate::source::{SourceRegistry, WeatherSource};

pub use metno::MetNoSource;
pub use nws::NwsSource;
pub use openmeteo::OpenMeteoSource;
pub use openweather::OpenWeatherSource;

/// Build the registry of all shipped sources from configuration. Sources
/// needing credentials are registered regardless; calling them without a
/// key surfaces the configuration error for that feature.
pub fn default_registry(config: &Config) -> SourceRegistry {
    SourceRegistry::new(vec![
        Arc::new(OpenMeteoSource::new()) as Arc<dyn WeatherSource>,
        Arc::new(MetNoSource::new()),
        Arc::new(NwsSource::new()),
        Arc::new(OpenWeatherSource::new(
            config.source_api_key("openweather").map(str::to_owned),
        )),
    ])
}
