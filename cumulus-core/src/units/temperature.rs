use serde::{Deserialize, Serialize};

use super::{UnitError, format_value, parse_numeric};

/// Storage: tenths of a degree Celsius.
const STORAGE_PER_CELSIUS: f64 = 10.0;

/// Vendor values outside this range (in reference °C) are rejected as garbage.
const PLAUSIBLE_CELSIUS: std::ops::RangeInclusive<f64> = -90.0..=60.0;

/// An air temperature, stored as integral deci-degrees Celsius.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Temperature(i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureUnit {
    /// Reference unit.
    #[default]
    Celsius,
    Fahrenheit,
    Kelvin,
}

impl TemperatureUnit {
    pub const ALL: &[Self] = &[Self::Celsius, Self::Fahrenheit, Self::Kelvin];

    /// Canonical id used in serialized form and config files.
    pub fn id(self) -> &'static str {
        match self {
            Self::Celsius => "c",
            Self::Fahrenheit => "f",
            Self::Kelvin => "k",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
            Self::Kelvin => "K",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|u| u.id() == id)
    }

    pub fn convert_to_reference(self, value: f64) -> f64 {
        match self {
            Self::Celsius => value,
            Self::Fahrenheit => (value - 32.0) / 1.8,
            Self::Kelvin => value - 273.15,
        }
    }

    pub fn convert_from_reference(self, celsius: f64) -> f64 {
        match self {
            Self::Celsius => celsius,
            Self::Fahrenheit => celsius * 1.8 + 32.0,
            Self::Kelvin => celsius + 273.15,
        }
    }

    /// Maximum useful fraction digits for this unit.
    pub fn max_decimals(self) -> u8 {
        1
    }

    /// Locale default by ISO 3166 region code.
    pub fn default_for_region(region: &str) -> Self {
        match region {
            "US" | "BS" | "BZ" | "KY" | "PW" => Self::Fahrenheit,
            _ => Self::Celsius,
        }
    }
}

impl Temperature {
    /// Construct from a value expressed in `unit`. NaN is rejected.
    pub fn from_unit(value: f64, unit: TemperatureUnit) -> Result<Self, UnitError> {
        if value.is_nan() {
            return Err(UnitError::InvalidQuantity);
        }
        let celsius = unit.convert_to_reference(value);
        Ok(Self((celsius * STORAGE_PER_CELSIUS).round() as i64))
    }

    pub fn from_celsius(value: f64) -> Result<Self, UnitError> {
        Self::from_unit(value, TemperatureUnit::Celsius)
    }

    /// Plausibility gate for vendor data: out-of-range values become `None`,
    /// never clamped.
    pub fn checked(value: f64, unit: TemperatureUnit) -> Option<Self> {
        let celsius = unit.convert_to_reference(value);
        if !PLAUSIBLE_CELSIUS.contains(&celsius) {
            return None;
        }
        Self::from_unit(value, unit).ok()
    }

    pub fn to_f64(self, unit: TemperatureUnit) -> f64 {
        unit.convert_from_reference(self.0 as f64 / STORAGE_PER_CELSIUS)
    }

    pub fn parse(raw: &str, unit: TemperatureUnit) -> Result<Self, UnitError> {
        Self::from_unit(parse_numeric(raw)?, unit)
    }

    /// Format in `unit` with at most `decimals` fraction digits; requests
    /// above the unit's cap clamp silently.
    pub fn format(self, unit: TemperatureUnit, decimals: u8) -> String {
        let decimals = decimals.min(unit.max_decimals());
        format_value(self.to_f64(unit), decimals, unit.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_storage() {
        for unit in TemperatureUnit::ALL.iter().copied() {
            for value in [-40.0, 0.0, 21.5, 98.6, 310.0] {
                let t = Temperature::from_unit(value, unit).unwrap();
                assert!(
                    (t.to_f64(unit) - value).abs() < 0.1,
                    "{value} {unit:?} did not round-trip"
                );
            }
        }
    }

    #[test]
    fn reference_conversions_are_inverses() {
        for unit in TemperatureUnit::ALL.iter().copied() {
            for value in [-89.2, -17.78, 0.0, 36.6, 56.7] {
                let back = unit.convert_from_reference(unit.convert_to_reference(value));
                assert!((back - value).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn freezing_point_across_units() {
        let t = Temperature::from_celsius(0.0).unwrap();
        assert_eq!(t.to_f64(TemperatureUnit::Fahrenheit), 32.0);
        assert_eq!(t.to_f64(TemperatureUnit::Kelvin), 273.15);
    }

    #[test]
    fn nan_is_rejected() {
        assert_eq!(
            Temperature::from_celsius(f64::NAN).unwrap_err(),
            UnitError::InvalidQuantity
        );
    }

    #[test]
    fn checked_rejects_implausible_values() {
        assert!(Temperature::checked(-120.0, TemperatureUnit::Celsius).is_none());
        assert!(Temperature::checked(80.0, TemperatureUnit::Celsius).is_none());
        assert!(Temperature::checked(21.0, TemperatureUnit::Celsius).is_some());
    }

    #[test]
    fn formatting_clamps_decimals_to_cap() {
        let t = Temperature::from_celsius(21.743).unwrap();
        assert_eq!(t.format(TemperatureUnit::Celsius, 5), "21.7 °C");
        assert_eq!(t.format(TemperatureUnit::Celsius, 0), "22 °C");
    }

    #[test]
    fn region_defaults() {
        assert_eq!(
            TemperatureUnit::default_for_region("US"),
            TemperatureUnit::Fahrenheit
        );
        assert_eq!(
            TemperatureUnit::default_for_region("DE"),
            TemperatureUnit::Celsius
        );
    }
}
