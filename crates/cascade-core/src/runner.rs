//! Periodic hazard decay loop.
//!
//! [`run_decay_loop`] drives [`RiskEngine::tick`] on a fixed period until
//! its shutdown future resolves. Each tick is awaited inline, and missed
//! periods are skipped rather than queued, so ticks never overlap and a
//! slow tick cannot cause a burst of catch-up ticks.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::engine::RiskEngine;

/// Counters reported when the loop stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecayLoopSummary {
    /// Ticks executed.
    pub ticks: u64,
    /// Ticks that changed state and published.
    pub publications: u64,
    /// Events removed as negligible.
    pub events_expired: u64,
}

/// Run decay ticks every `period` until `shutdown` completes.
pub async fn run_decay_loop<F>(
    engine: Arc<RiskEngine>,
    period: Duration,
    shutdown: F,
) -> DecayLoopSummary
where
    F: Future<Output = ()> + Send,
{
    let mut summary = DecayLoopSummary::default();
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick of a tokio interval fires immediately.
    interval.tick().await;

    info!(
        period_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX),
        half_life_seconds = engine.decay_config().half_life_seconds,
        "Decay loop starting"
    );

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            () = &mut shutdown => {
                break;
            }
            _ = interval.tick() => {
                let outcome = engine.tick().await;
                summary.ticks = summary.ticks.saturating_add(1);
                if outcome.changed() {
                    summary.publications = summary.publications.saturating_add(1);
                }
                let expired = u64::try_from(outcome.removed.len()).unwrap_or(u64::MAX);
                summary.events_expired = summary.events_expired.saturating_add(expired);
                debug!(
                    tick = summary.ticks,
                    decayed = outcome.decayed,
                    expired,
                    "Decay tick complete"
                );
            }
        }
    }

    info!(
        ticks = summary.ticks,
        publications = summary.publications,
        events_expired = summary.events_expired,
        "Decay loop stopped"
    );
    summary
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cascade_graph::create_demo_region;
    use cascade_types::{GeoPoint, InjectHazardRequest};

    use super::*;
    use crate::config::EngineConfig;

    fn engine_with_fast_decay() -> Arc<RiskEngine> {
        let config = EngineConfig::parse(
            "decay:\n  tick_interval_ms: 10\n  half_life_seconds: 0.01\n",
        )
        .unwrap();
        Arc::new(RiskEngine::new(create_demo_region().unwrap(), &config))
    }

    #[tokio::test]
    async fn stops_on_shutdown_signal() {
        let engine = engine_with_fast_decay();
        let summary = run_decay_loop(engine, Duration::from_millis(10), async {}).await;
        assert_eq!(summary.ticks, 0);
    }

    #[tokio::test]
    async fn decays_events_away() {
        let engine = engine_with_fast_decay();
        engine
            .inject(&InjectHazardRequest {
                kind: Some("fire".to_owned()),
                severity: Some(0.9),
                location: Some(GeoPoint::new(28.6139, 77.2090)),
                radius: None,
            })
            .await
            .unwrap();

        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(run_decay_loop(
            Arc::clone(&engine),
            Duration::from_millis(10),
            async move {
                let _ = stop_rx.await;
            },
        ));

        // A 10 ms half-life takes the event below 0.01 within ~70 ms.
        let mut watch = engine.watch();
        tokio::time::timeout(Duration::from_secs(5), async {
            while !watch.borrow_and_update().active_events.is_empty() {
                watch.changed().await.unwrap();
            }
        })
        .await
        .unwrap();

        stop_tx.send(()).unwrap();
        let summary = handle.await.unwrap();
        assert!(summary.ticks >= 1);
        assert_eq!(summary.events_expired, 1);
        assert!(engine.get_snapshot().active_events.is_empty());
    }
}
