//! Risk propagation over the infrastructure dependency graph.
//!
//! A run has three stages:
//!
//! 1. **Seed** -- every active hazard contributes
//!    `effective_severity * proximity_factor(distance, radius)` to the
//!    nodes inside its radius; contributions to the same node combine by
//!    probabilistic OR.
//! 2. **Relax** -- Gauss-Seidel passes in node id order lift each node to
//!    `max(own, source * weight * (1 - base_risk))` over its inbound
//!    edges until the largest change in a pass is within epsilon. The
//!    pass cap bounds the loop on cyclic graphs.
//! 3. **Summarize** -- cascade timeline, critical nodes, and the
//!    next-failure prediction are read off the relaxed values. A node's
//!    timeline offset is the moment its hazard first reaches the elevated
//!    threshold, which can be earlier than the arrival of the path that
//!    ends up strongest.
//!
//! The hazard-induced component is what propagates; a node's reported
//! risk is `max(base_risk, hazard)`. With no active events the snapshot
//! therefore equals each node's base risk and the timeline is empty.
//!
//! Everything here is a pure function of its inputs. Iteration order is
//! fixed by node id, so identical inputs give bit-identical snapshots.

use std::cmp::{Ordering, Reverse};
use std::collections::BTreeSet;

use cascade_graph::{InfrastructureGraph, distance_m};
use cascade_types::{
    CascadeStep, FailurePrediction, GeoPoint, HazardEvent, NodeId, NodeRisk, RiskLevel,
    RiskSnapshot,
};

use crate::config::PropagationConfig;

/// Relaxation did not settle.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PropagationError {
    /// The pass cap was reached while values were still moving.
    #[error("propagation did not converge within {passes} passes (last change {residual:e})")]
    NotConverged {
        /// Passes executed.
        passes: u32,
        /// Largest risk increase in the final pass.
        residual: f64,
    },
}

/// Linear spatial decay: 1 at the epicenter, 0 at and beyond the radius.
pub fn proximity_factor(distance_m: f64, radius_m: f64) -> f64 {
    if !(distance_m.is_finite() && radius_m.is_finite()) || distance_m > radius_m {
        return 0.0;
    }
    if radius_m <= 0.0 {
        return if distance_m <= 0.0 { 1.0 } else { 0.0 };
    }
    (1.0 - distance_m / radius_m).clamp(0.0, 1.0)
}

/// Probabilistic OR: `1 - prod(1 - s)`.
///
/// Inputs are clamped to `[0, 1]`, so the result is too, and it never
/// decreases when any input increases.
pub fn combine_seeds(seeds: impl IntoIterator<Item = f64>) -> f64 {
    let miss = seeds
        .into_iter()
        .map(|s| if s.is_nan() { 0.0 } else { s.clamp(0.0, 1.0) })
        .fold(1.0, |acc, s| acc * (1.0 - s));
    (1.0 - miss).clamp(0.0, 1.0)
}

/// Seed contribution of one event at one location.
pub fn event_seed(event: &HazardEvent, at: GeoPoint) -> f64 {
    let proximity = proximity_factor(distance_m(event.epicenter, at), event.radius_m);
    if proximity <= 0.0 {
        return 0.0;
    }
    event.effective_severity.clamp(0.0, 1.0) * proximity
}

/// Per-node hazard seeds in node id order.
pub fn seed_risks(graph: &InfrastructureGraph, events: &[HazardEvent]) -> Vec<f64> {
    graph
        .iterate_nodes()
        .map(|node| combine_seeds(events.iter().map(|e| event_seed(e, node.location))))
        .collect()
}

/// One Gauss-Seidel sweep over `hazard`. Returns the largest increase.
fn relax_pass(graph: &InfrastructureGraph, hazard: &mut [f64]) -> f64 {
    let mut max_delta: f64 = 0.0;

    for (pos, node) in graph.iterate_nodes().enumerate() {
        let attenuation = 1.0 - node.base_risk;
        for (src, edge) in graph.inbound_at(pos) {
            let Some(&upstream) = hazard.get(src) else {
                continue;
            };
            let candidate = upstream * edge.propagation_weight * attenuation;
            let Some(current) = hazard.get_mut(pos) else {
                continue;
            };
            if candidate > *current {
                max_delta = max_delta.max(candidate - *current);
                *current = candidate;
            }
        }
    }

    max_delta
}

/// Earliest minute at which each node's hazard reaches `threshold`.
///
/// Seeds at or above the threshold cross at minute 0. Otherwise a node
/// crosses when the first path delivering at least `threshold` arrives,
/// at the cumulative delay of that path.
///
/// Labels `(minute, value, node)` are settled in arrival order, strongest
/// first within a minute. A label is settled only if it beats every value
/// already settled at its node, so settled values rise strictly and
/// cycles cannot re-enter. Values only shrink along a path, so a label
/// below the threshold is never extended. With `follow_edges` off only
/// the seeds are considered.
fn first_crossings(
    graph: &InfrastructureGraph,
    seeds: &[f64],
    threshold: f64,
    follow_edges: bool,
) -> Vec<Option<u32>> {
    let reaches = |value: f64| value > 0.0 && value >= threshold;
    let mut first: Vec<Option<u32>> = vec![None; seeds.len()];
    let mut settled = vec![0.0_f64; seeds.len()];

    // Non-negative floats order like their bit patterns.
    let mut queue: BTreeSet<(u32, Reverse<u64>, usize)> = seeds
        .iter()
        .enumerate()
        .filter(|&(_, &seed)| reaches(seed))
        .map(|(pos, seed)| (0, Reverse(seed.to_bits()), pos))
        .collect();

    while let Some((minute, Reverse(bits), pos)) = queue.pop_first() {
        let value = f64::from_bits(bits);
        let (Some(best), Some(crossed)) = (settled.get_mut(pos), first.get_mut(pos)) else {
            continue;
        };
        if value <= *best {
            continue;
        }
        *best = value;
        if crossed.is_none() {
            *crossed = Some(minute);
        }

        if !follow_edges {
            continue;
        }
        for (dst, edge) in graph.outbound_at(pos) {
            let Some(target) = graph.node_at(dst) else {
                continue;
            };
            let carried = value * edge.propagation_weight * (1.0 - target.base_risk);
            if reaches(carried) && settled.get(dst).is_some_and(|&b| carried > b) {
                let arrival = minute.saturating_add(edge.propagation_delay_minutes);
                queue.insert((arrival, Reverse(carried.to_bits()), dst));
            }
        }
    }

    first
}

/// Run seeding and relaxation.
///
/// # Errors
///
/// Returns [`PropagationError::NotConverged`] if the pass cap
/// (`max_passes`, defaulting to the node count) is reached before a pass
/// changes nothing beyond `convergence_epsilon`.
pub fn propagate(
    graph: &InfrastructureGraph,
    events: &[HazardEvent],
    config: &PropagationConfig,
) -> Result<RiskSnapshot, PropagationError> {
    let cap = pass_cap(graph, config);
    let seeds = seed_risks(graph, events);
    let mut hazard = seeds.clone();
    let mut passes: u32 = 0;

    loop {
        let delta = relax_pass(graph, &mut hazard);
        passes = passes.saturating_add(1);

        if delta <= config.convergence_epsilon {
            tracing::debug!(passes, "Propagation converged");
            let crossings = first_crossings(graph, &seeds, config.elevated_threshold, true);
            return Ok(summarize(graph, &hazard, &crossings, config, true, passes));
        }
        if passes >= cap {
            return Err(PropagationError::NotConverged {
                passes,
                residual: delta,
            });
        }
    }
}

/// Snapshot built from seeds alone, with no relaxation.
pub fn seed_only_snapshot(
    graph: &InfrastructureGraph,
    events: &[HazardEvent],
    config: &PropagationConfig,
    passes: u32,
) -> RiskSnapshot {
    let seeds = seed_risks(graph, events);
    let crossings = first_crossings(graph, &seeds, config.elevated_threshold, false);
    summarize(graph, &seeds, &crossings, config, false, passes)
}

/// [`propagate`], falling back to [`seed_only_snapshot`] on failure.
///
/// Always returns a usable snapshot; a convergence failure is logged at
/// error level and reported through `converged = false`.
pub fn assess(
    graph: &InfrastructureGraph,
    events: &[HazardEvent],
    config: &PropagationConfig,
) -> RiskSnapshot {
    match propagate(graph, events, config) {
        Ok(snapshot) => snapshot,
        Err(err) => {
            let PropagationError::NotConverged { passes, .. } = err;
            tracing::error!(
                error = %err,
                nodes = graph.node_count(),
                events = events.len(),
                "Propagation failed, publishing seed-only snapshot"
            );
            seed_only_snapshot(graph, events, config, passes)
        }
    }
}

fn pass_cap(graph: &InfrastructureGraph, config: &PropagationConfig) -> u32 {
    config
        .max_passes
        .unwrap_or_else(|| u32::try_from(graph.node_count()).unwrap_or(u32::MAX))
        .max(1)
}

fn summarize(
    graph: &InfrastructureGraph,
    hazard: &[f64],
    crossings: &[Option<u32>],
    config: &PropagationConfig,
    converged: bool,
    passes: u32,
) -> RiskSnapshot {
    let mut snapshot = RiskSnapshot {
        converged,
        passes,
        ..RiskSnapshot::empty()
    };

    for (pos, node) in graph.iterate_nodes().enumerate() {
        let own = hazard.get(pos).copied().unwrap_or(0.0);
        let risk = node.base_risk.max(own).clamp(0.0, 1.0);
        snapshot.nodes.insert(
            node.id.clone(),
            NodeRisk {
                risk,
                level: RiskLevel::from_score(risk),
            },
        );

        if let Some(&Some(offset)) = crossings.get(pos) {
            snapshot.cascade_timeline.push(CascadeStep {
                node_id: node.id.clone(),
                projected_risk: risk,
                time_offset_minutes: offset,
            });
        }
    }

    snapshot.cascade_timeline.sort_by(|a, b| {
        a.time_offset_minutes
            .cmp(&b.time_offset_minutes)
            .then_with(|| a.node_id.cmp(&b.node_id))
    });

    let mut critical: Vec<(&NodeId, f64)> = snapshot
        .nodes
        .iter()
        .filter(|(_, r)| r.risk >= config.critical_threshold)
        .map(|(id, r)| (id, r.risk))
        .collect();
    critical.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    snapshot.critical_nodes = critical.into_iter().map(|(id, _)| id.clone()).collect();

    snapshot.next_failure_prediction = predict_next_failure(&snapshot, config);
    snapshot
}

/// The non-critical node most likely to fail soonest.
///
/// Candidates have risk in `[prediction_threshold, critical_threshold)`.
/// The winner maximizes `risk / minutes`, where minutes is the node's
/// timeline offset (at least 1) or the default horizon when the node is
/// not on the timeline. Ties go to the lower node id.
fn predict_next_failure(
    snapshot: &RiskSnapshot,
    config: &PropagationConfig,
) -> Option<FailurePrediction> {
    let mut best: Option<(f64, FailurePrediction)> = None;

    for (id, node) in &snapshot.nodes {
        if node.risk < config.prediction_threshold || node.risk >= config.critical_threshold {
            continue;
        }
        let minutes = snapshot
            .cascade_timeline
            .iter()
            .find(|step| step.node_id == *id)
            .map_or(config.default_failure_horizon_minutes, |step| {
                step.time_offset_minutes
            });
        let urgency = node.risk / f64::from(minutes.max(1));

        if best.as_ref().is_none_or(|(top, _)| urgency > *top) {
            best = Some((
                urgency,
                FailurePrediction {
                    node_id: id.clone(),
                    probability: node.risk,
                    estimated_time_minutes: minutes,
                },
            ));
        }
    }

    best.map(|(_, prediction)| prediction)
}
