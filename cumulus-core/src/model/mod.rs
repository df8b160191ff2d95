//! Canonical domain model.
//!
//! The single shape every provider output is normalized into and every
//! consumer reads. Physical fields are quantity value types from
//! [`crate::units`], never bare numbers; optional sections mean "not
//! requested or not supported", never "zero value".

mod alert;
mod location;
mod weather;

pub use alert::{Alert, AlertSeverity};
pub use location::Location;
pub use weather::{
    AirQuality, Current, Daily, HalfDay, Hourly, Minutely, Normals, Pollen, Weather, WeatherCode,
    WeatherFragment, Wind,
};
