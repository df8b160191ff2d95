use serde::{Deserialize, Serialize};

use super::{UnitError, format_value, parse_numeric};

/// Storage: tenths of a percent (permille).
const STORAGE_PER_PERCENT: f64 = 10.0;

/// A dimensionless ratio (humidity, cloud cover, precipitation probability),
/// stored as integral tenths of a percent. Construction only rejects NaN;
/// the 0–100 % plausibility gate for vendor data lives in `checked_percent`.
/// There is no display-unit choice beyond percent versus plain fraction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Ratio(i64);

impl Ratio {
    /// Construct from a percentage. NaN is rejected; range gating is the
    /// caller's concern (see `checked_percent`).
    pub fn from_percent(value: f64) -> Result<Self, UnitError> {
        if value.is_nan() {
            return Err(UnitError::InvalidQuantity);
        }
        Ok(Self((value * STORAGE_PER_PERCENT).round() as i64))
    }

    pub fn from_fraction(value: f64) -> Result<Self, UnitError> {
        Self::from_percent(value * 100.0)
    }

    /// Plausibility gate: percentages outside 0–100 become `None`.
    pub fn checked_percent(value: f64) -> Option<Self> {
        if !(0.0..=100.0).contains(&value) {
            return None;
        }
        Self::from_percent(value).ok()
    }

    pub fn to_percent(self) -> f64 {
        self.0 as f64 / STORAGE_PER_PERCENT
    }

    pub fn to_fraction(self) -> f64 {
        self.to_percent() / 100.0
    }

    pub fn parse_percent(raw: &str) -> Result<Self, UnitError> {
        Self::from_percent(parse_numeric(raw)?)
    }

    pub fn format_percent(self, decimals: u8) -> String {
        // Sub-percent precision is never meaningful for these fields.
        let decimals = decimals.min(1);
        format_value(self.to_percent(), decimals, "%")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_and_fraction_agree() {
        let r = Ratio::from_fraction(0.62).unwrap();
        assert_eq!(r.to_percent(), 62.0);
        assert_eq!(r.to_fraction(), 0.62);
    }

    #[test]
    fn checked_percent_rejects_out_of_range() {
        assert!(Ratio::checked_percent(-1.0).is_none());
        assert!(Ratio::checked_percent(101.0).is_none());
        assert!(Ratio::checked_percent(55.0).is_some());
    }

    #[test]
    fn construction_rejects_only_nan() {
        // Range gating is checked_percent's job, not the constructor's.
        assert_eq!(Ratio::from_percent(250.0).unwrap().to_percent(), 250.0);
        assert_eq!(
            Ratio::from_percent(f64::NAN).unwrap_err(),
            UnitError::InvalidQuantity
        );
    }

    #[test]
    fn formats_with_clamped_decimals() {
        let r = Ratio::from_percent(87.3).unwrap();
        assert_eq!(r.format_percent(4), "87.3 %");
        assert_eq!(r.format_percent(0), "87 %");
    }
}
