use serde::{Deserialize, Serialize};

use super::{UnitError, format_value, parse_numeric};

/// Storage: centimeters per second.
const STORAGE_PER_METER_PER_SECOND: f64 = 100.0;

/// Plausible wind-speed range in reference m/s. The strongest gust ever
/// measured at the surface was ~113 m/s.
const PLAUSIBLE_MPS: std::ops::RangeInclusive<f64> = 0.0..=130.0;

/// A wind or gust speed, stored as integral centimeters per second.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Speed(i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpeedUnit {
    /// Reference unit.
    #[default]
    MeterPerSecond,
    KilometerPerHour,
    MilePerHour,
    Knot,
    FootPerSecond,
}

impl SpeedUnit {
    pub const ALL: &[Self] = &[
        Self::MeterPerSecond,
        Self::KilometerPerHour,
        Self::MilePerHour,
        Self::Knot,
        Self::FootPerSecond,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::MeterPerSecond => "mps",
            Self::KilometerPerHour => "kph",
            Self::MilePerHour => "mph",
            Self::Knot => "kt",
            Self::FootPerSecond => "ftps",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::MeterPerSecond => "m/s",
            Self::KilometerPerHour => "km/h",
            Self::MilePerHour => "mph",
            Self::Knot => "kt",
            Self::FootPerSecond => "ft/s",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|u| u.id() == id)
    }

    pub fn convert_to_reference(self, value: f64) -> f64 {
        match self {
            Self::MeterPerSecond => value,
            Self::KilometerPerHour => value / 3.6,
            Self::MilePerHour => value * 0.447_04,
            Self::Knot => value * 0.514_444_444,
            Self::FootPerSecond => value * 0.3048,
        }
    }

    pub fn convert_from_reference(self, mps: f64) -> f64 {
        match self {
            Self::MeterPerSecond => mps,
            Self::KilometerPerHour => mps * 3.6,
            Self::MilePerHour => mps / 0.447_04,
            Self::Knot => mps / 0.514_444_444,
            Self::FootPerSecond => mps / 0.3048,
        }
    }

    pub fn max_decimals(self) -> u8 {
        1
    }

    pub fn default_for_region(region: &str) -> Self {
        match region {
            "US" | "GB" => Self::MilePerHour,
            "NO" | "SE" | "FI" | "DK" | "IS" => Self::MeterPerSecond,
            _ => Self::KilometerPerHour,
        }
    }
}

impl Speed {
    pub fn from_unit(value: f64, unit: SpeedUnit) -> Result<Self, UnitError> {
        if value.is_nan() {
            return Err(UnitError::InvalidQuantity);
        }
        let mps = unit.convert_to_reference(value);
        Ok(Self((mps * STORAGE_PER_METER_PER_SECOND).round() as i64))
    }

    pub fn from_meters_per_second(value: f64) -> Result<Self, UnitError> {
        Self::from_unit(value, SpeedUnit::MeterPerSecond)
    }

    /// Plausibility gate for vendor wind data.
    pub fn checked(value: f64, unit: SpeedUnit) -> Option<Self> {
        let mps = unit.convert_to_reference(value);
        if !PLAUSIBLE_MPS.contains(&mps) {
            return None;
        }
        Self::from_unit(value, unit).ok()
    }

    pub fn to_f64(self, unit: SpeedUnit) -> f64 {
        unit.convert_from_reference(self.0 as f64 / STORAGE_PER_METER_PER_SECOND)
    }

    pub fn parse(raw: &str, unit: SpeedUnit) -> Result<Self, UnitError> {
        Self::from_unit(parse_numeric(raw)?, unit)
    }

    pub fn format(self, unit: SpeedUnit, decimals: u8) -> String {
        let decimals = decimals.min(unit.max_decimals());
        format_value(self.to_f64(unit), decimals, unit.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kmh_converts_through_storage() {
        let s = Speed::from_unit(36.0, SpeedUnit::KilometerPerHour).unwrap();
        assert_eq!(s.to_f64(SpeedUnit::MeterPerSecond), 10.0);
    }

    #[test]
    fn round_trips_through_storage() {
        for unit in SpeedUnit::ALL.iter().copied() {
            for value in [0.0, 3.4, 17.2, 55.0] {
                let s = Speed::from_unit(value, unit).unwrap();
                assert!((s.to_f64(unit) - value).abs() < 0.05);
            }
        }
    }

    #[test]
    fn reference_conversions_are_inverses() {
        for unit in SpeedUnit::ALL.iter().copied() {
            for value in [0.0, 1.0, 12.5, 80.0] {
                let back = unit.convert_from_reference(unit.convert_to_reference(value));
                assert!((back - value).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn checked_rejects_negative_and_absurd_speeds() {
        assert!(Speed::checked(-2.0, SpeedUnit::MeterPerSecond).is_none());
        assert!(Speed::checked(200.0, SpeedUnit::MeterPerSecond).is_none());
        assert!(Speed::checked(25.0, SpeedUnit::MeterPerSecond).is_some());
    }
}
