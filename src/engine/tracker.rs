//! Run driver: one fetch → select → summarize → persist cycle, repeated
//! on a fixed interval until shutdown.
//!
//! The driver alternates between two phases: `Running` (one cycle in
//! progress) and `Idle` (sleeping until the next cycle). The interval is
//! measured from the end of a cycle, so the real period is the interval
//! plus the cycle's duration. Errors inside a cycle are logged and the
//! driver moves on to the next one.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::engine::fetcher::HolderFetcher;
use crate::engine::reporter::{breakdown_lines, distribution_lines, summarize};
use crate::engine::selector::select_winners;
use crate::events::EventSink;
use crate::indexer::AccountIndex;
use crate::storage::ResultStore;
use crate::types::{LastRun, RunSummary, TierDistribution, TierTable, TrackerError, WinnerSet};

/// Driver phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Running => write!(f, "running"),
        }
    }
}

/// Why a cycle stopped before drawing winners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The scan succeeded but found nobody holding the token.
    NoHolders,
    /// The scan failed; the message carries the index error.
    ScanFailed(String),
}

/// Result of a single cycle.
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    /// No holders: nothing was written and selection and reporting did
    /// not run.
    Skipped(SkipReason),
    Completed {
        winners: WinnerSet,
        summary: RunSummary,
        last_run: LastRun,
    },
}

impl CycleOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, CycleOutcome::Completed { .. })
    }
}

/// Orchestrates tracker cycles.
pub struct Tracker {
    config: AppConfig,
    tiers: TierTable,
    index: Box<dyn AccountIndex>,
    store: ResultStore,
    events: Arc<dyn EventSink>,
}

impl Tracker {
    pub fn new(
        config: AppConfig,
        index: Box<dyn AccountIndex>,
        store: ResultStore,
        events: Arc<dyn EventSink>,
    ) -> Result<Self, TrackerError> {
        let tiers = config.validate()?;
        Ok(Self {
            config,
            tiers,
            index,
            store,
            events,
        })
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Sleep between the end of one cycle and the start of the next.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.config.tracker.interval_secs)
    }

    fn emit(&self, line: &str) {
        self.events.emit(line);
    }

    /// Run one complete cycle.
    ///
    /// A failed scan is not an error here: it is logged and reported as
    /// [`SkipReason::ScanFailed`]. Errors come from persistence only.
    pub async fn run_cycle(&self) -> Result<CycleOutcome> {
        let cycle_id = Uuid::new_v4();
        self.run_cycle_inner()
            .instrument(info_span!("cycle", id = %cycle_id))
            .await
    }

    async fn run_cycle_inner(&self) -> Result<CycleOutcome> {
        let started_at = Utc::now();
        let timer = Instant::now();

        self.emit(&format!(
            "----- Token Tracker Run: {} -----",
            started_at.format("%Y-%m-%d %H:%M:%S")
        ));
        info!("Starting token tracker run");

        // 1. Fetch and classify holders
        let fetcher = HolderFetcher::new(
            self.index.as_ref(),
            &self.config.token,
            &self.tiers,
            self.config.indexer.page_size,
        );
        let holders = match fetcher.fetch_holders().await {
            Ok(scan) => scan.holders,
            Err(e) => {
                self.emit(&format!(
                    "Error scanning token holders from {}: {e}",
                    self.index.name()
                ));
                self.emit("No holders found, stopping tracking sequence");
                return Ok(CycleOutcome::Skipped(SkipReason::ScanFailed(e.to_string())));
            }
        };

        if holders.is_empty() {
            self.emit("No holders found, stopping tracking sequence");
            return Ok(CycleOutcome::Skipped(SkipReason::NoHolders));
        }

        let dist = TierDistribution::from_holders(&holders, &self.tiers);
        self.store.save_holders(&holders)?;
        self.store.save_tier_summary(&dist)?;

        self.emit(&format!("Finished scanning token mint: {}", self.config.token.mint));
        for line in distribution_lines(&dist, &self.tiers) {
            self.emit(&line);
        }

        // 2. Draw winners
        let winners = select_winners(&holders, &self.tiers.quotas(), &mut rand::thread_rng());
        self.store.save_winners(&winners)?;

        // 3. Summarize
        let summary = summarize(&self.tiers, &winners);
        if self.store.save_run_summary(&summary)? {
            debug!("Run summary persisted");
        }
        for line in breakdown_lines(&summary, &winners) {
            self.emit(&line);
        }

        // 4. Record the run
        let completed_at = Utc::now();
        let duration_seconds = timer.elapsed().as_secs_f64();
        let last_run = LastRun {
            last_run_at: started_at,
            completed_at,
            duration_seconds,
            next_run_at: next_run_after(completed_at, self.interval()),
        };
        self.store.save_last_run(&last_run)?;

        info!(
            holders = holders.len(),
            winners = summary.total_winners,
            duration = format!("{duration_seconds:.2}s"),
            "Token tracking complete"
        );
        self.emit(&format!(
            "Next run scheduled at: {}",
            last_run.next_run_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        Ok(CycleOutcome::Completed {
            winners,
            summary,
            last_run,
        })
    }

    /// Run cycles until `shutdown` resolves. Returns the number of cycles
    /// that ran to completion (successfully or not).
    ///
    /// The first cycle starts immediately. `shutdown` is raced against both
    /// the in-flight cycle and the idle sleep.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<u64>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        info!(
            name = %self.config.tracker.name,
            mint = %self.config.token.mint,
            interval_secs = self.config.tracker.interval_secs,
            "Token Tracker starting up"
        );
        match self.store.load_last_run() {
            Ok(Some(prev)) => info!(
                last_run_at = %prev.last_run_at,
                duration_seconds = prev.duration_seconds,
                "Previous run found"
            ),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Could not read previous run marker"),
        }

        let mut cycles = 0u64;
        loop {
            debug!(phase = %Phase::Running, "Phase change");
            tokio::select! {
                biased;
                outcome = self.run_cycle() => {
                    cycles += 1;
                    match outcome {
                        Ok(CycleOutcome::Completed { .. }) => {}
                        Ok(CycleOutcome::Skipped(reason)) => {
                            info!(reason = ?reason, "Cycle skipped");
                        }
                        Err(e) => {
                            self.emit(&format!("Error in token tracking sequence: {e:#}"));
                        }
                    }
                }
                _ = &mut shutdown => {
                    info!("Shutdown signal received during cycle");
                    break;
                }
            }

            debug!(phase = %Phase::Idle, "Phase change");
            self.emit(&format!(
                "Waiting {} seconds for next run...",
                self.config.tracker.interval_secs
            ));
            tokio::select! {
                biased;
                _ = tokio::time::sleep(self.interval()) => {}
                _ = &mut shutdown => break,
            }
        }

        self.emit("Token Tracker shutting down...");
        Ok(cycles)
    }
}

/// Scheduled start of the next cycle.
pub fn next_run_after(completed_at: DateTime<Utc>, interval: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(interval)
        .ok()
        .and_then(|d| completed_at.checked_add_signed(d))
        .unwrap_or(completed_at)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
