//! Alert derivation: risk snapshot in, actuation intent out.
//!
//! [`derive`] is pure and total. Any snapshot, including an empty one or
//! one holding out-of-range values, maps to exactly one of the five risk
//! levels and a well-formed trigger.

use cascade_types::{
    AlertDecision, HardwareAction, HardwareTrigger, NodeId, RiskLevel, RiskSnapshot,
};

/// Derive the alert decision for a snapshot.
///
/// | Level          | Action  | Red | Green | Buzzer | Pulse |
/// |----------------|---------|-----|-------|--------|-------|
/// | safe, low      | `none`  | off | on    | off    | off   |
/// | medium         | `alarm` | on  | off   | off    | off   |
/// | high, critical | `alarm` | on  | off   | on     | on    |
///
/// Intensity is `floor(score * 255)` at every level.
pub fn derive(snapshot: &RiskSnapshot) -> AlertDecision {
    let score = sanitize(snapshot.max_risk());
    let risk_level = RiskLevel::from_score(score);

    AlertDecision {
        aggregate_risk_score: score,
        risk_level,
        hardware_action: action_for(risk_level),
        hardware_trigger: trigger_for(risk_level, score),
        message: compose_message(snapshot, risk_level, score),
    }
}

/// Actuation intent for a level.
pub const fn action_for(level: RiskLevel) -> HardwareAction {
    match level {
        RiskLevel::Safe | RiskLevel::Low => HardwareAction::None,
        RiskLevel::Medium | RiskLevel::High | RiskLevel::Critical => HardwareAction::Alarm,
    }
}

/// Trigger flags for a level and score.
pub fn trigger_for(level: RiskLevel, score: f64) -> HardwareTrigger {
    let alarm = matches!(action_for(level), HardwareAction::Alarm);
    let audible = level.is_high_or_above();
    HardwareTrigger {
        buzzer: audible,
        red_led: alarm,
        green_led: !alarm,
        pulse: audible,
        intensity: intensity(score),
    }
}

/// Linear map of `[0, 1]` onto `0..=255`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn intensity(score: f64) -> u8 {
    // Clamped to 0..=255 before the cast.
    (sanitize(score) * 255.0).floor().clamp(0.0, 255.0) as u8
}

fn sanitize(score: f64) -> f64 {
    if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) }
}

/// Highest-risk node, lowest id on ties.
fn hottest_node(snapshot: &RiskSnapshot) -> Option<(&NodeId, f64)> {
    snapshot
        .nodes
        .iter()
        .fold(None, |best: Option<(&NodeId, f64)>, (id, node)| match best {
            Some((_, top)) if node.risk <= top => best,
            _ => Some((id, node.risk)),
        })
}

fn compose_message(snapshot: &RiskSnapshot, level: RiskLevel, score: f64) -> String {
    let hottest = hottest_node(snapshot);
    match level {
        RiskLevel::Safe => "All monitored infrastructure within normal risk".to_owned(),
        RiskLevel::Low => match hottest {
            Some((id, risk)) => format!("Low risk: monitoring {id} ({risk:.2})"),
            None => "Low risk".to_owned(),
        },
        RiskLevel::Medium => match hottest {
            Some((id, risk)) => format!("Medium risk: {id} at {risk:.2}, prepare response"),
            None => format!("Medium risk ({score:.2})"),
        },
        RiskLevel::High | RiskLevel::Critical => {
            let mut message = format!(
                "{} risk {score:.2}: {} critical node(s)",
                if level == RiskLevel::Critical { "CRITICAL" } else { "HIGH" },
                snapshot.critical_nodes.len()
            );
            if let Some(next) = &snapshot.next_failure_prediction {
                message.push_str(&format!(
                    ", {} may fail in ~{} min",
                    next.node_id, next.estimated_time_minutes
                ));
            }
            message
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use cascade_types::{FailurePrediction, NodeRisk};

    use super::*;

    fn snapshot_with(risks: &[(&str, f64)]) -> RiskSnapshot {
        let nodes: BTreeMap<NodeId, NodeRisk> = risks
            .iter()
            .map(|&(id, risk)| {
                (
                    NodeId::from(id),
                    NodeRisk {
                        risk,
                        level: RiskLevel::from_score(risk),
                    },
                )
            })
            .collect();
        RiskSnapshot {
            nodes,
            ..RiskSnapshot::empty()
        }
    }

    #[test]
    fn derive_is_total_over_unit_interval() {
        for step in 0..=1000 {
            let score = f64::from(step) / 1000.0;
            let decision = derive(&snapshot_with(&[("n", score)]));
            assert!((decision.aggregate_risk_score - score).abs() < 1e-12);
            assert!(matches!(
                decision.risk_level,
                RiskLevel::Safe
                    | RiskLevel::Low
                    | RiskLevel::Medium
                    | RiskLevel::High
                    | RiskLevel::Critical
            ));
            assert_ne!(
                decision.hardware_trigger.red_led,
                decision.hardware_trigger.green_led
            );
        }
    }

    #[test]
    fn empty_snapshot_is_safe() {
        let decision = derive(&RiskSnapshot::empty());
        assert_eq!(decision.risk_level, RiskLevel::Safe);
        assert_eq!(decision.hardware_action, HardwareAction::None);
        assert!(decision.hardware_trigger.green_led);
        assert_eq!(decision.hardware_trigger.intensity, 0);
    }

    #[test]
    fn out_of_range_inputs_are_clamped() {
        let decision = derive(&snapshot_with(&[("n", f64::NAN)]));
        assert_eq!(decision.risk_level, RiskLevel::Safe);
        let decision = derive(&snapshot_with(&[("n", 3.0)]));
        assert_eq!(decision.risk_level, RiskLevel::Critical);
        assert_eq!(decision.hardware_trigger.intensity, 255);
    }

    #[test]
    fn medium_is_steady_red_without_buzzer() {
        let decision = derive(&snapshot_with(&[("a", 0.1), ("b", 0.65)]));
        assert_eq!(decision.risk_level, RiskLevel::Medium);
        assert_eq!(decision.hardware_action, HardwareAction::Alarm);
        let trigger = decision.hardware_trigger;
        assert!(trigger.red_led);
        assert!(!trigger.green_led);
        assert!(!trigger.buzzer);
        assert!(!trigger.pulse);
        assert!(decision.message.contains('b'));
    }

    #[test]
    fn high_sounds_pulsing_buzzer() {
        let mut snapshot = snapshot_with(&[("grid", 0.85), ("hospital", 0.7)]);
        snapshot.critical_nodes = vec![NodeId::from("grid")];
        snapshot.next_failure_prediction = Some(FailurePrediction {
            node_id: NodeId::from("hospital"),
            probability: 0.7,
            estimated_time_minutes: 15,
        });

        let decision = derive(&snapshot);
        assert_eq!(decision.risk_level, RiskLevel::High);
        let trigger = decision.hardware_trigger;
        assert!(trigger.buzzer && trigger.pulse && trigger.red_led);
        assert!(!trigger.green_led);
        assert_eq!(trigger.intensity, 216);
        assert!(decision.message.contains("hospital may fail in ~15 min"));
    }

    #[test]
    fn safe_and_low_keep_green() {
        for score in [0.0, 0.29, 0.3, 0.59] {
            let decision = derive(&snapshot_with(&[("n", score)]));
            assert_eq!(decision.hardware_action, HardwareAction::None);
            assert!(decision.hardware_trigger.green_led);
            assert!(!decision.hardware_trigger.buzzer);
        }
    }

    #[test]
    fn intensity_is_linear() {
        assert_eq!(intensity(0.0), 0);
        assert_eq!(intensity(0.5), 127);
        assert_eq!(intensity(1.0), 255);
    }

    #[test]
    fn derive_is_deterministic() {
        let snapshot = snapshot_with(&[("a", 0.97), ("b", 0.97)]);
        assert_eq!(derive(&snapshot), derive(&snapshot));
        assert!(derive(&snapshot).message.starts_with("CRITICAL"));
    }
}
