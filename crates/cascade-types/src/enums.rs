//! Enumeration types for the risk engine.
//!
//! All enums serialize as `snake_case` strings, which is the form the
//! dashboard and the polling alert unit expect on the wire.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Infrastructure
// ---------------------------------------------------------------------------

/// Category of an infrastructure node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum NodeKind {
    /// Generation plants, substations, and grid interconnects.
    #[serde(alias = "power_grid")]
    Power,
    /// Cell towers, exchanges, and communication centers.
    #[serde(alias = "telecom_tower")]
    Telecom,
    /// Roads, rail, and transit hubs.
    Transport,
    /// Treatment plants, pumping stations, and reservoirs.
    #[serde(alias = "water_system")]
    Water,
    /// Hospitals and clinics.
    #[serde(alias = "healthcare", alias = "hospital")]
    Medical,
    /// Bridges and other single-span crossings.
    #[serde(alias = "transport_bridge")]
    Bridge,
    /// Anything not covered above.
    Other,
}

// ---------------------------------------------------------------------------
// Hazards
// ---------------------------------------------------------------------------

/// Type of a detected or injected hazard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum HazardKind {
    /// Riverine, coastal, or flash flooding.
    Flood,
    /// Urban or wildland fire.
    Fire,
    /// Seismic event.
    Earthquake,
    /// Cyclone, hurricane, or typhoon.
    Cyclone,
    /// Landslide or mudslide.
    Landslide,
    /// Synthetic event used to exercise the alert hardware.
    Test,
}

impl HazardKind {
    /// Every recognized hazard kind, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Flood,
        Self::Fire,
        Self::Earthquake,
        Self::Cyclone,
        Self::Landslide,
        Self::Test,
    ];

    /// Wire name of this hazard kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Flood => "flood",
            Self::Fire => "fire",
            Self::Earthquake => "earthquake",
            Self::Cyclone => "cyclone",
            Self::Landslide => "landslide",
            Self::Test => "test",
        }
    }

    /// Radius in meters affected by a full-severity event of this kind.
    ///
    /// Used when an injection omits the radius: the effective radius is this
    /// value scaled by the event's severity.
    pub const fn base_radius_m(self) -> f64 {
        match self {
            Self::Flood => 5_000.0,
            Self::Fire => 2_000.0,
            Self::Earthquake => 10_000.0,
            Self::Cyclone => 15_000.0,
            Self::Landslide => 1_000.0,
            Self::Test => 3_000.0,
        }
    }
}

impl core::fmt::Display for HazardKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a hazard type string is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized hazard type `{0}`")]
pub struct UnknownHazardKind(pub String);

impl core::str::FromStr for HazardKind {
    type Err = UnknownHazardKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == needle)
            .ok_or_else(|| UnknownHazardKind(s.to_owned()))
    }
}

// ---------------------------------------------------------------------------
// Risk classification
// ---------------------------------------------------------------------------

/// Lower bound of [`RiskLevel::Low`].
pub const LOW_RISK: f64 = 0.3;
/// Lower bound of [`RiskLevel::Medium`].
pub const MEDIUM_RISK: f64 = 0.6;
/// Lower bound of [`RiskLevel::High`].
pub const HIGH_RISK: f64 = 0.8;
/// Lower bound of [`RiskLevel::Critical`].
pub const CRITICAL_RISK: f64 = 0.95;

/// Discrete risk classification of a score in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum RiskLevel {
    /// Below 0.3.
    Safe,
    /// 0.3 up to 0.6.
    Low,
    /// 0.6 up to 0.8.
    Medium,
    /// 0.8 up to 0.95.
    High,
    /// 0.95 and above.
    Critical,
}

impl RiskLevel {
    /// Classify a score. Total over all inputs: `NaN` and negatives are
    /// treated as safe, anything above 1 as critical.
    pub fn from_score(score: f64) -> Self {
        if score >= CRITICAL_RISK {
            Self::Critical
        } else if score >= HIGH_RISK {
            Self::High
        } else if score >= MEDIUM_RISK {
            Self::Medium
        } else if score >= LOW_RISK {
            Self::Low
        } else {
            Self::Safe
        }
    }

    /// Wire name of this level.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Whether this level calls for the audible alarm.
    pub const fn is_high_or_above(self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }
}

impl core::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Actuation intent sent to the physical alert unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum HardwareAction {
    /// Green light, silence.
    None,
    /// Red light; buzzer depends on the trigger flags.
    Alarm,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn hazard_kind_parses_case_insensitively() {
        assert_eq!("Flood".parse::<HazardKind>().ok(), Some(HazardKind::Flood));
        assert_eq!(" test ".parse::<HazardKind>().ok(), Some(HazardKind::Test));
        assert!("tsunami".parse::<HazardKind>().is_err());
    }

    #[test]
    fn unknown_hazard_kind_names_the_input() {
        let err = "Tsunami".parse::<HazardKind>().unwrap_err();
        assert_eq!(err, UnknownHazardKind("Tsunami".to_owned()));
        assert_eq!(err.to_string(), "unrecognized hazard type `Tsunami`");
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn risk_level_boundaries() {
        assert_eq!(RiskLevel::from_score(0.0), RiskLevel::Safe);
        assert_eq!(RiskLevel::from_score(0.299), RiskLevel::Safe);
        assert_eq!(RiskLevel::from_score(0.3), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.6), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.8), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(0.95), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(1.0), RiskLevel::Critical);
    }

    #[test]
    fn risk_level_is_total() {
        assert_eq!(RiskLevel::from_score(f64::NAN), RiskLevel::Safe);
        assert_eq!(RiskLevel::from_score(-1.0), RiskLevel::Safe);
        assert_eq!(RiskLevel::from_score(7.0), RiskLevel::Critical);
    }

    #[test]
    fn node_kind_accepts_legacy_aliases() {
        let kind: Result<NodeKind, _> = serde_json::from_str("\"healthcare\"");
        assert_eq!(kind.ok(), Some(NodeKind::Medical));
        let kind: Result<NodeKind, _> = serde_json::from_str("\"power\"");
        assert_eq!(kind.ok(), Some(NodeKind::Power));
    }

    #[test]
    fn enums_serialize_snake_case() {
        let json = serde_json::to_string(&HardwareAction::Alarm).ok();
        assert_eq!(json.as_deref(), Some("\"alarm\""));
        let json = serde_json::to_string(&RiskLevel::Critical).ok();
        assert_eq!(json.as_deref(), Some("\"critical\""));
    }
}
