use serde::{Deserialize, Serialize};

use super::{UnitError, format_value, parse_numeric};

/// Storage: whole meters; sub-meter precision is meaningless for visibility.
const PLAUSIBLE_VISIBILITY_M: std::ops::RangeInclusive<f64> = 0.0..=200_000.0;

/// A distance (visibility, ceiling), stored as integral meters.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Distance(i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DistanceUnit {
    /// Reference unit.
    #[default]
    Meter,
    Kilometer,
    Mile,
    NauticalMile,
    Foot,
}

impl DistanceUnit {
    pub const ALL: &[Self] = &[
        Self::Meter,
        Self::Kilometer,
        Self::Mile,
        Self::NauticalMile,
        Self::Foot,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::Meter => "m",
            Self::Kilometer => "km",
            Self::Mile => "mi",
            Self::NauticalMile => "nmi",
            Self::Foot => "ft",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Meter => "m",
            Self::Kilometer => "km",
            Self::Mile => "mi",
            Self::NauticalMile => "nmi",
            Self::Foot => "ft",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|u| u.id() == id)
    }

    pub fn convert_to_reference(self, value: f64) -> f64 {
        match self {
            Self::Meter => value,
            Self::Kilometer => value * 1000.0,
            Self::Mile => value * 1609.344,
            Self::NauticalMile => value * 1852.0,
            Self::Foot => value * 0.3048,
        }
    }

    pub fn convert_from_reference(self, meters: f64) -> f64 {
        match self {
            Self::Meter => meters,
            Self::Kilometer => meters / 1000.0,
            Self::Mile => meters / 1609.344,
            Self::NauticalMile => meters / 1852.0,
            Self::Foot => meters / 0.3048,
        }
    }

    pub fn max_decimals(self) -> u8 {
        match self {
            Self::Meter | Self::Foot => 0,
            Self::Kilometer | Self::Mile | Self::NauticalMile => 1,
        }
    }

    pub fn default_for_region(region: &str) -> Self {
        match region {
            "US" | "GB" => Self::Mile,
            _ => Self::Kilometer,
        }
    }
}

impl Distance {
    pub fn from_unit(value: f64, unit: DistanceUnit) -> Result<Self, UnitError> {
        if value.is_nan() {
            return Err(UnitError::InvalidQuantity);
        }
        Ok(Self(unit.convert_to_reference(value).round() as i64))
    }

    pub fn from_meters(value: f64) -> Result<Self, UnitError> {
        Self::from_unit(value, DistanceUnit::Meter)
    }

    /// Plausibility gate for vendor visibility data.
    pub fn checked_visibility(value: f64, unit: DistanceUnit) -> Option<Self> {
        let meters = unit.convert_to_reference(value);
        if !PLAUSIBLE_VISIBILITY_M.contains(&meters) {
            return None;
        }
        Self::from_unit(value, unit).ok()
    }

    pub fn to_f64(self, unit: DistanceUnit) -> f64 {
        unit.convert_from_reference(self.0 as f64)
    }

    pub fn meters(self) -> i64 {
        self.0
    }

    pub fn parse(raw: &str, unit: DistanceUnit) -> Result<Self, UnitError> {
        Self::from_unit(parse_numeric(raw)?, unit)
    }

    pub fn format(self, unit: DistanceUnit, decimals: u8) -> String {
        let decimals = decimals.min(unit.max_decimals());
        format_value(self.to_f64(unit), decimals, unit.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kilometers_store_as_meters() {
        let d = Distance::from_unit(9.6, DistanceUnit::Kilometer).unwrap();
        assert_eq!(d.meters(), 9600);
        assert_eq!(d.to_f64(DistanceUnit::Kilometer), 9.6);
    }

    #[test]
    fn reference_conversions_are_inverses() {
        for unit in DistanceUnit::ALL.iter().copied() {
            for value in [0.0, 0.25, 10.0, 6000.0] {
                let back = unit.convert_from_reference(unit.convert_to_reference(value));
                assert!((back - value).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn checked_visibility_rejects_garbage() {
        assert!(Distance::checked_visibility(-5.0, DistanceUnit::Kilometer).is_none());
        assert!(Distance::checked_visibility(900.0, DistanceUnit::Kilometer).is_none());
        assert!(Distance::checked_visibility(10.0, DistanceUnit::Kilometer).is_some());
    }
}
