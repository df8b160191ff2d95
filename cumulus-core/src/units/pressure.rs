use serde::{Deserialize, Serialize};

use super::{UnitError, format_value, parse_numeric};

/// Storage: pascals.
const STORAGE_PER_HECTOPASCAL: f64 = 100.0;

/// Plausible surface pressure range in reference hPa. The extremes ever
/// recorded at sea level are roughly 870 and 1084 hPa.
const PLAUSIBLE_HPA: std::ops::RangeInclusive<f64> = 800.0..=1100.0;

/// Atmospheric pressure, stored as integral pascals.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Pressure(i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PressureUnit {
    /// Reference unit.
    #[default]
    Hectopascal,
    /// Numerically identical to hPa, kept as a distinct display label.
    Millibar,
    Kilopascal,
    Atmosphere,
    MillimeterOfMercury,
    InchOfMercury,
}

impl PressureUnit {
    pub const ALL: &[Self] = &[
        Self::Hectopascal,
        Self::Millibar,
        Self::Kilopascal,
        Self::Atmosphere,
        Self::MillimeterOfMercury,
        Self::InchOfMercury,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::Hectopascal => "hpa",
            Self::Millibar => "mb",
            Self::Kilopascal => "kpa",
            Self::Atmosphere => "atm",
            Self::MillimeterOfMercury => "mmhg",
            Self::InchOfMercury => "inhg",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Hectopascal => "hPa",
            Self::Millibar => "mb",
            Self::Kilopascal => "kPa",
            Self::Atmosphere => "atm",
            Self::MillimeterOfMercury => "mmHg",
            Self::InchOfMercury => "inHg",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|u| u.id() == id)
    }

    pub fn convert_to_reference(self, value: f64) -> f64 {
        match self {
            Self::Hectopascal | Self::Millibar => value,
            Self::Kilopascal => value * 10.0,
            Self::Atmosphere => value * 1013.25,
            Self::MillimeterOfMercury => value * 1.333_223_684,
            Self::InchOfMercury => value * 33.863_886_67,
        }
    }

    pub fn convert_from_reference(self, hectopascals: f64) -> f64 {
        match self {
            Self::Hectopascal | Self::Millibar => hectopascals,
            Self::Kilopascal => hectopascals / 10.0,
            Self::Atmosphere => hectopascals / 1013.25,
            Self::MillimeterOfMercury => hectopascals / 1.333_223_684,
            Self::InchOfMercury => hectopascals / 33.863_886_67,
        }
    }

    pub fn max_decimals(self) -> u8 {
        match self {
            Self::Hectopascal | Self::Millibar | Self::MillimeterOfMercury => 1,
            Self::Kilopascal | Self::InchOfMercury => 2,
            Self::Atmosphere => 3,
        }
    }

    pub fn default_for_region(region: &str) -> Self {
        match region {
            "US" => Self::InchOfMercury,
            "RU" | "BY" | "KZ" => Self::MillimeterOfMercury,
            _ => Self::Hectopascal,
        }
    }
}

impl Pressure {
    pub fn from_unit(value: f64, unit: PressureUnit) -> Result<Self, UnitError> {
        if value.is_nan() {
            return Err(UnitError::InvalidQuantity);
        }
        let hpa = unit.convert_to_reference(value);
        Ok(Self((hpa * STORAGE_PER_HECTOPASCAL).round() as i64))
    }

    pub fn from_hectopascals(value: f64) -> Result<Self, UnitError> {
        Self::from_unit(value, PressureUnit::Hectopascal)
    }

    /// Plausibility gate for vendor surface-pressure data.
    pub fn checked(value: f64, unit: PressureUnit) -> Option<Self> {
        let hpa = unit.convert_to_reference(value);
        if !PLAUSIBLE_HPA.contains(&hpa) {
            return None;
        }
        Self::from_unit(value, unit).ok()
    }

    pub fn to_f64(self, unit: PressureUnit) -> f64 {
        unit.convert_from_reference(self.0 as f64 / STORAGE_PER_HECTOPASCAL)
    }

    /// Raw storage value in pascals.
    pub fn pascals(self) -> i64 {
        self.0
    }

    pub fn parse(raw: &str, unit: PressureUnit) -> Result<Self, UnitError> {
        Self::from_unit(parse_numeric(raw)?, unit)
    }

    pub fn format(self, unit: PressureUnit, decimals: u8) -> String {
        let decimals = decimals.min(unit.max_decimals());
        format_value(self.to_f64(unit), decimals, unit.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_atmosphere_stores_as_pascals() {
        let p = Pressure::from_hectopascals(1013.25).unwrap();
        assert_eq!(p.pascals(), 101_325);
        assert!((p.to_f64(PressureUnit::Atmosphere) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn round_trips_through_storage() {
        for unit in PressureUnit::ALL.iter().copied() {
            let sample = unit.convert_from_reference(1002.4);
            let p = Pressure::from_unit(sample, unit).unwrap();
            assert!((p.to_f64(unit) - sample).abs() < 0.01);
        }
    }

    #[test]
    fn reference_conversions_are_inverses() {
        for unit in PressureUnit::ALL.iter().copied() {
            for value in [0.5, 29.92, 760.0, 1013.25] {
                let back = unit.convert_from_reference(unit.convert_to_reference(value));
                assert!((back - value).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn checked_rejects_implausible_values() {
        assert!(Pressure::checked(0.0, PressureUnit::Hectopascal).is_none());
        assert!(Pressure::checked(1200.0, PressureUnit::Hectopascal).is_none());
        assert!(Pressure::checked(1013.0, PressureUnit::Hectopascal).is_some());
    }
}
