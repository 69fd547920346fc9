//! Active hazard events: validation, injection, clearing, and decay.
//!
//! The store is plain owned state with no interior locking; the engine
//! wraps it in its single-writer session. Events are kept in injection
//! order so that seeding visits them in the same order on every run.

use chrono::{DateTime, Utc};

use cascade_types::{GeoPoint, HazardEvent, HazardEventId, HazardKind, InjectHazardRequest};

use crate::config::DecayConfig;
use crate::error::SessionError;

/// Smallest radius assigned to an event, in meters.
const MIN_RADIUS_M: f64 = 1.0;

/// What a clear call targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearTarget {
    /// Every active event.
    All,
    /// A single event.
    One(HazardEventId),
    /// Something that cannot name an event; clears nothing.
    Unknown(String),
}

impl ClearTarget {
    /// Interpret a caller-supplied target. `"all"` (any case) selects
    /// every event; anything that is not a valid event id is kept as
    /// [`ClearTarget::Unknown`] so clearing it is a no-op.
    pub fn parse(target: &str) -> Self {
        let target = target.trim();
        if target.eq_ignore_ascii_case("all") {
            return Self::All;
        }
        target
            .parse::<HazardEventId>()
            .map_or_else(|_| Self::Unknown(target.to_owned()), Self::One)
    }
}

/// Result of one decay tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecayOutcome {
    /// Events whose effective severity changed.
    pub decayed: usize,
    /// Events dropped as negligible.
    pub removed: Vec<HazardEventId>,
}

impl DecayOutcome {
    /// Whether the tick changed anything that affects risk.
    pub fn changed(&self) -> bool {
        self.decayed > 0 || !self.removed.is_empty()
    }
}

/// Validate an injection request and build the event it describes.
///
/// # Errors
///
/// Returns [`SessionError::Validation`] naming the field for a missing or
/// unrecognized `type`, a `severity` outside `[0, 1]`, a missing or
/// out-of-range `location`, or a non-positive `radius`.
pub fn build_event(
    request: &InjectHazardRequest,
    detected_at: DateTime<Utc>,
) -> Result<HazardEvent, SessionError> {
    let kind: HazardKind = request
        .kind
        .as_deref()
        .ok_or_else(|| SessionError::validation("type", "missing"))?
        .parse()
        .map_err(|e| SessionError::validation("type", format!("{e}")))?;

    let severity = request
        .severity
        .ok_or_else(|| SessionError::validation("severity", "missing"))?;
    if !(0.0..=1.0).contains(&severity) {
        return Err(SessionError::validation(
            "severity",
            format!("{severity} is outside 0..=1"),
        ));
    }

    let epicenter: GeoPoint = request
        .location
        .ok_or_else(|| SessionError::validation("location", "missing"))?;
    if !epicenter.is_valid() {
        return Err(SessionError::validation(
            "location",
            format!(
                "({}, {}) is outside lat -90..=90, lon -180..=180",
                epicenter.lat, epicenter.lon
            ),
        ));
    }

    let radius_m = match request.radius {
        Some(r) if r.is_finite() && r > 0.0 => r,
        Some(r) => {
            return Err(SessionError::validation(
                "radius",
                format!("{r} is not a positive distance"),
            ));
        }
        None => default_radius_m(kind, severity),
    };

    Ok(HazardEvent {
        id: HazardEventId::new(),
        kind,
        severity,
        effective_severity: severity,
        epicenter,
        radius_m,
        detected_at,
    })
}

/// Radius used when a request omits one: the kind's base radius scaled
/// by severity.
pub fn default_radius_m(kind: HazardKind, severity: f64) -> f64 {
    (kind.base_radius_m() * severity).max(MIN_RADIUS_M)
}

/// Effective severity after `elapsed_seconds` of exponential decay.
pub fn decayed_severity(severity: f64, elapsed_seconds: f64, half_life_seconds: f64) -> f64 {
    if elapsed_seconds <= 0.0 {
        return severity;
    }
    severity * 0.5_f64.powf(elapsed_seconds / half_life_seconds)
}

/// The live set of hazard events.
#[derive(Debug, Clone, Default)]
pub struct EventStore {
    events: Vec<HazardEvent>,
}

impl EventStore {
    /// Empty store.
    pub const fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Validate and add an event.
    ///
    /// # Errors
    ///
    /// See [`build_event`]. The store is unchanged on error.
    pub fn inject(
        &mut self,
        request: &InjectHazardRequest,
        now: DateTime<Utc>,
    ) -> Result<HazardEventId, SessionError> {
        let event = build_event(request, now)?;
        let id = event.id;
        tracing::info!(
            event_id = %id,
            kind = %event.kind,
            severity = event.severity,
            radius_m = event.radius_m,
            lat = event.epicenter.lat,
            lon = event.epicenter.lon,
            "Hazard event injected"
        );
        self.events.push(event);
        Ok(id)
    }

    /// Remove the targeted events. Returns how many were removed; an
    /// unknown target removes nothing.
    pub fn clear(&mut self, target: &ClearTarget) -> usize {
        let before = self.events.len();
        match target {
            ClearTarget::All => self.events.clear(),
            ClearTarget::One(id) => self.events.retain(|e| e.id != *id),
            ClearTarget::Unknown(raw) => {
                tracing::debug!(target = %raw, "Clear target names no event");
            }
        }
        let removed = before.saturating_sub(self.events.len());
        if removed > 0 {
            tracing::info!(
                cleared = removed,
                remaining = self.events.len(),
                "Hazard events cleared"
            );
        }
        removed
    }

    /// Apply decay as of `now` and drop negligible events.
    pub fn tick_at(&mut self, now: DateTime<Utc>, config: &DecayConfig) -> DecayOutcome {
        let mut outcome = DecayOutcome::default();

        for event in &mut self.events {
            let elapsed = (now - event.detected_at)
                .to_std()
                .map_or(0.0, |d| d.as_secs_f64());
            let effective = decayed_severity(event.severity, elapsed, config.half_life_seconds);
            if (effective - event.effective_severity).abs() > f64::EPSILON {
                event.effective_severity = effective;
                outcome.decayed = outcome.decayed.saturating_add(1);
            }
        }

        self.events.retain(|event| {
            if event.effective_severity < config.negligible_severity {
                tracing::info!(
                    event_id = %event.id,
                    kind = %event.kind,
                    effective_severity = event.effective_severity,
                    "Hazard event decayed below threshold, removing"
                );
                outcome.removed.push(event.id);
                false
            } else {
                true
            }
        });

        outcome
    }

    /// Active events in injection order.
    pub fn active(&self) -> &[HazardEvent] {
        &self.events
    }

    /// Number of active events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no events are active.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
