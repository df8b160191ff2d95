use serde::{Deserialize, Serialize};

use super::{UnitError, format_value, parse_numeric};

/// Storage: micrometers. 5.0 mm stores as 5000.
const STORAGE_PER_MILLIMETER: f64 = 1000.0;

/// Hourly amounts above this (reference mm) are vendor garbage; the world
/// record hourly rainfall is ~305 mm.
const PLAUSIBLE_HOURLY_MM: std::ops::RangeInclusive<f64> = 0.0..=500.0;

/// A precipitation amount, stored as integral micrometers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Precipitation(i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PrecipitationUnit {
    /// Reference unit.
    #[default]
    Millimeter,
    Centimeter,
    Inch,
    /// 1 l/m² is exactly 1 mm of water column.
    LiterPerSquareMeter,
}

impl PrecipitationUnit {
    pub const ALL: &[Self] = &[
        Self::Millimeter,
        Self::Centimeter,
        Self::Inch,
        Self::LiterPerSquareMeter,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::Millimeter => "mm",
            Self::Centimeter => "cm",
            Self::Inch => "in",
            Self::LiterPerSquareMeter => "lpsqm",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Millimeter => "mm",
            Self::Centimeter => "cm",
            Self::Inch => "in",
            Self::LiterPerSquareMeter => "l/m²",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|u| u.id() == id)
    }

    pub fn convert_to_reference(self, value: f64) -> f64 {
        match self {
            Self::Millimeter | Self::LiterPerSquareMeter => value,
            Self::Centimeter => value * 10.0,
            Self::Inch => value * 25.4,
        }
    }

    pub fn convert_from_reference(self, millimeters: f64) -> f64 {
        match self {
            Self::Millimeter | Self::LiterPerSquareMeter => millimeters,
            Self::Centimeter => millimeters / 10.0,
            Self::Inch => millimeters / 25.4,
        }
    }

    pub fn max_decimals(self) -> u8 {
        match self {
            Self::Millimeter | Self::LiterPerSquareMeter => 1,
            Self::Centimeter | Self::Inch => 2,
        }
    }

    pub fn default_for_region(region: &str) -> Self {
        match region {
            "US" => Self::Inch,
            _ => Self::Millimeter,
        }
    }
}

impl Precipitation {
    pub fn from_unit(value: f64, unit: PrecipitationUnit) -> Result<Self, UnitError> {
        if value.is_nan() {
            return Err(UnitError::InvalidQuantity);
        }
        let mm = unit.convert_to_reference(value);
        Ok(Self((mm * STORAGE_PER_MILLIMETER).round() as i64))
    }

    pub fn from_millimeters(value: f64) -> Result<Self, UnitError> {
        Self::from_unit(value, PrecipitationUnit::Millimeter)
    }

    /// Plausibility gate for a single hourly amount.
    pub fn checked_hourly(value: f64, unit: PrecipitationUnit) -> Option<Self> {
        let mm = unit.convert_to_reference(value);
        if !PLAUSIBLE_HOURLY_MM.contains(&mm) {
            return None;
        }
        Self::from_unit(value, unit).ok()
    }

    pub fn to_f64(self, unit: PrecipitationUnit) -> f64 {
        unit.convert_from_reference(self.0 as f64 / STORAGE_PER_MILLIMETER)
    }

    /// Raw storage value in micrometers.
    pub fn micrometers(self) -> i64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub fn parse(raw: &str, unit: PrecipitationUnit) -> Result<Self, UnitError> {
        Self::from_unit(parse_numeric(raw)?, unit)
    }

    pub fn format(self, unit: PrecipitationUnit, decimals: u8) -> String {
        let decimals = decimals.min(unit.max_decimals());
        format_value(self.to_f64(unit), decimals, unit.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_millimeters_stores_as_5000_micrometers() {
        let p = Precipitation::from_millimeters(5.0).unwrap();
        assert_eq!(p.micrometers(), 5000);
        assert_eq!(p.to_f64(PrecipitationUnit::Millimeter), 5.0);
        assert_eq!(p.to_f64(PrecipitationUnit::Centimeter), 0.5);
    }

    #[test]
    fn round_trips_through_storage() {
        for unit in PrecipitationUnit::ALL.iter().copied() {
            for value in [0.0, 0.2, 1.0, 12.7, 120.0] {
                let p = Precipitation::from_unit(value, unit).unwrap();
                assert!((p.to_f64(unit) - value).abs() < 0.01);
            }
        }
    }

    #[test]
    fn reference_conversions_are_inverses() {
        for unit in PrecipitationUnit::ALL.iter().copied() {
            for value in [0.0, 0.04, 2.5, 98.0] {
                let back = unit.convert_from_reference(unit.convert_to_reference(value));
                assert!((back - value).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn checked_hourly_rejects_spikes() {
        assert!(Precipitation::checked_hourly(600.0, PrecipitationUnit::Millimeter).is_none());
        assert!(Precipitation::checked_hourly(-1.0, PrecipitationUnit::Millimeter).is_none());
        assert!(Precipitation::checked_hourly(12.0, PrecipitationUnit::Millimeter).is_some());
    }

    #[test]
    fn sums_saturate() {
        let a = Precipitation::from_millimeters(3.0).unwrap();
        let b = Precipitation::from_millimeters(1.5).unwrap();
        assert_eq!(
            a.saturating_add(b).to_f64(PrecipitationUnit::Millimeter),
            4.5
        );
    }

    #[test]
    fn formatting() {
        let p = Precipitation::from_millimeters(5.25).unwrap();
        assert_eq!(p.format(PrecipitationUnit::Millimeter, 1), "5.2 mm");
        assert_eq!(p.format(PrecipitationUnit::Centimeter, 2), "0.53 cm");
    }
}
