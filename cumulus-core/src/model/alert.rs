use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity ladder shared by every vendor's alert taxonomy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    #[default]
    Unknown,
    Minor,
    Moderate,
    Severe,
    Extreme,
}

impl AlertSeverity {
    /// Display color as 0xRRGGBB, used when the vendor supplies none.
    /// Deterministic per severity so refreshes never recolor an alert.
    pub fn default_color(self) -> u32 {
        match self {
            Self::Unknown => 0x6B7280,
            Self::Minor => 0xF9D71C,
            Self::Moderate => 0xF97316,
            Self::Severe => 0xDC2626,
            Self::Extreme => 0x7F1D1D,
        }
    }
}

/// One weather warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Stable across refreshes for the same underlying event.
    pub id: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub headline: String,
    pub description: Option<String>,
    pub severity: AlertSeverity,
    /// Issuing authority, e.g. "NWS Seattle".
    pub source: Option<String>,
    /// 0xRRGGBB display color.
    pub color: u32,
}

impl Alert {
    /// Derive a stable id from fields that do not move between refreshes of
    /// the same event. Never derived from wall-clock "now".
    pub fn derive_id(event: &str, start: Option<DateTime<Utc>>) -> String {
        match start {
            Some(start) => format!("{}-{}", slug(event), start.timestamp()),
            None => slug(event),
        }
    }
}

fn slug(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn severity_orders_from_unknown_to_extreme() {
        assert!(AlertSeverity::Unknown < AlertSeverity::Minor);
        assert!(AlertSeverity::Minor < AlertSeverity::Moderate);
        assert!(AlertSeverity::Moderate < AlertSeverity::Severe);
        assert!(AlertSeverity::Severe < AlertSeverity::Extreme);
    }

    #[test]
    fn derived_ids_are_stable() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let a = Alert::derive_id("Gale Warning", Some(start));
        let b = Alert::derive_id("Gale Warning", Some(start));
        assert_eq!(a, b);
        assert_eq!(a, "gale-warning-1709294400");
    }

    #[test]
    fn derived_ids_distinguish_events() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert_ne!(
            Alert::derive_id("Gale Warning", Some(start)),
            Alert::derive_id("Flood Warning", Some(start))
        );
    }
}
