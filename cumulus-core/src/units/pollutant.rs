use serde::{Deserialize, Serialize};

use super::{UnitError, format_value, parse_numeric};

/// Storage: tenths of a microgram per cubic meter.
const STORAGE_PER_UG_M3: f64 = 10.0;

/// Plausible pollutant range in reference µg/m³; severe pollution episodes
/// top out well below this ceiling.
const PLAUSIBLE_UG_M3: std::ops::RangeInclusive<f64> = 0.0..=50_000.0;

/// A pollutant mass concentration, stored as integral tenths of µg/m³.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct PollutantConcentration(i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PollutantConcentrationUnit {
    /// Reference unit.
    #[default]
    MicrogramPerCubicMeter,
    MilligramPerCubicMeter,
}

impl PollutantConcentrationUnit {
    pub const ALL: &[Self] = &[
        Self::MicrogramPerCubicMeter,
        Self::MilligramPerCubicMeter,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::MicrogramPerCubicMeter => "ugpcum",
            Self::MilligramPerCubicMeter => "mgpcum",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::MicrogramPerCubicMeter => "µg/m³",
            Self::MilligramPerCubicMeter => "mg/m³",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|u| u.id() == id)
    }

    pub fn convert_to_reference(self, value: f64) -> f64 {
        match self {
            Self::MicrogramPerCubicMeter => value,
            Self::MilligramPerCubicMeter => value * 1000.0,
        }
    }

    pub fn convert_from_reference(self, micrograms: f64) -> f64 {
        match self {
            Self::MicrogramPerCubicMeter => micrograms,
            Self::MilligramPerCubicMeter => micrograms / 1000.0,
        }
    }

    pub fn max_decimals(self) -> u8 {
        match self {
            Self::MicrogramPerCubicMeter => 1,
            Self::MilligramPerCubicMeter => 3,
        }
    }
}

impl PollutantConcentration {
    pub fn from_unit(value: f64, unit: PollutantConcentrationUnit) -> Result<Self, UnitError> {
        if value.is_nan() {
            return Err(UnitError::InvalidQuantity);
        }
        let ug = unit.convert_to_reference(value);
        Ok(Self((ug * STORAGE_PER_UG_M3).round() as i64))
    }

    pub fn from_micrograms_per_cubic_meter(value: f64) -> Result<Self, UnitError> {
        Self::from_unit(value, PollutantConcentrationUnit::MicrogramPerCubicMeter)
    }

    /// Plausibility gate for vendor air-quality data.
    pub fn checked(value: f64, unit: PollutantConcentrationUnit) -> Option<Self> {
        let ug = unit.convert_to_reference(value);
        if !PLAUSIBLE_UG_M3.contains(&ug) {
            return None;
        }
        Self::from_unit(value, unit).ok()
    }

    pub fn to_f64(self, unit: PollutantConcentrationUnit) -> f64 {
        unit.convert_from_reference(self.0 as f64 / STORAGE_PER_UG_M3)
    }

    pub fn parse(raw: &str, unit: PollutantConcentrationUnit) -> Result<Self, UnitError> {
        Self::from_unit(parse_numeric(raw)?, unit)
    }

    pub fn format(self, unit: PollutantConcentrationUnit, decimals: u8) -> String {
        let decimals = decimals.min(unit.max_decimals());
        format_value(self.to_f64(unit), decimals, unit.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_storage() {
        let c = PollutantConcentration::from_micrograms_per_cubic_meter(35.4).unwrap();
        assert_eq!(
            c.to_f64(PollutantConcentrationUnit::MicrogramPerCubicMeter),
            35.4
        );
        assert!(
            (c.to_f64(PollutantConcentrationUnit::MilligramPerCubicMeter) - 0.0354).abs() < 1e-9
        );
    }

    #[test]
    fn reference_conversions_are_inverses() {
        for unit in PollutantConcentrationUnit::ALL.iter().copied() {
            for value in [0.0, 12.5, 180.0] {
                let back = unit.convert_from_reference(unit.convert_to_reference(value));
                assert!((back - value).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn checked_rejects_negative_concentration() {
        assert!(
            PollutantConcentration::checked(
                -1.0,
                PollutantConcentrationUnit::MicrogramPerCubicMeter
            )
            .is_none()
        );
    }
}
