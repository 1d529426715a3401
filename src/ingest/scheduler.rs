// src/ingest/scheduler.rs
use std::sync::Arc;

use metrics::counter;
use tokio::task::JoinHandle;

use crate::ingest::{types::Source, IngestEngine};

#[derive(Clone, Copy, Debug)]
pub struct IngestSchedulerCfg {
    pub interval_secs: u64,
}

impl Default for IngestSchedulerCfg {
    fn default() -> Self {
        Self { interval_secs: 300 }
    }
}

/// Spawn the background poll loop. Run-to-completion per tick; a slow
/// tick delays the next one rather than overlapping it.
pub fn spawn_poll_scheduler(
    engine: Arc<IngestEngine>,
    sources: Vec<Source>,
    cfg: IngestSchedulerCfg,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(cfg.interval_secs));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let report = engine.ingest_once(&sources).await;
            counter!("ingest_runs_total").increment(1);
            tracing::info!(
                target: "ingest",
                raw = report.raw_count,
                articles = report.article_count,
                errors = report.error_count,
                "poll tick"
            );
        }
    })
}
