//! Physical-quantity value types.
//!
//! Every quantity is an immutable wrapper around one integral storage value
//! (e.g. precipitation in micrometers, pressure in pascals) so that repeated
//! conversion can never accumulate floating-point drift. Conversions pivot
//! through a declared reference unit: storage -> reference -> target.
//!
//! Each unit enum carries a canonical `id()` string used for serialization
//! and config files, a display `label()`, a decimal-precision cap, and a
//! locale-default lookup keyed by ISO region code.

mod distance;
mod pollutant;
mod precipitation;
mod pressure;
mod ratio;
mod speed;
mod temperature;

pub use distance::{Distance, DistanceUnit};
pub use pollutant::{PollutantConcentration, PollutantConcentrationUnit};
pub use precipitation::{Precipitation, PrecipitationUnit};
pub use pressure::{Pressure, PressureUnit};
pub use ratio::Ratio;
pub use speed::{Speed, SpeedUnit};
pub use temperature::{Temperature, TemperatureUnit};

/// Errors local to quantity construction and parsing. Callers treat both as
/// "field absent", never as fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitError {
    #[error("cannot construct a quantity from NaN")]
    InvalidQuantity,
    #[error("malformed numeric value '{0}'")]
    Parse(String),
}

/// Parse a vendor-supplied numeric string.
pub(crate) fn parse_numeric(raw: &str) -> Result<f64, UnitError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| UnitError::Parse(raw.to_owned()))
}

/// Render `value` with `decimals` fraction digits and a unit label.
/// `decimals` is already clamped by the caller to the unit's cap.
pub(crate) fn format_value(value: f64, decimals: u8, label: &str) -> String {
    format!("{value:.prec$} {label}", prec = decimals as usize)
}
