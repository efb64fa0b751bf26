//! Persistence layer.
//!
//! Writes each cycle's artifacts as pretty-printed JSON files in the
//! configured output directory. Every file is overwritten, never
//! appended; the last-run marker is the only file read back.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::OutputConfig;
use crate::types::{HolderRecord, LastRun, RunSummary, TierDistribution, WinnerSet};

/// File-backed store for per-cycle results.
#[derive(Debug, Clone)]
pub struct ResultStore {
    cfg: OutputConfig,
}

impl ResultStore {
    /// Create the store, creating the output directory if needed.
    pub fn new(cfg: &OutputConfig) -> Result<Self> {
        std::fs::create_dir_all(&cfg.dir)
            .with_context(|| format!("Failed to create output dir {}", cfg.dir.display()))?;
        Ok(Self { cfg: cfg.clone() })
    }

    pub fn dir(&self) -> &Path {
        &self.cfg.dir
    }

    pub fn holders_path(&self) -> PathBuf {
        self.cfg.dir.join(&self.cfg.holders_file)
    }

    pub fn tier_summary_path(&self) -> PathBuf {
        self.cfg.dir.join(&self.cfg.tier_summary_file)
    }

    pub fn winners_path(&self) -> PathBuf {
        self.cfg.dir.join(&self.cfg.winners_file)
    }

    pub fn last_run_path(&self) -> PathBuf {
        self.cfg.dir.join(&self.cfg.last_run_file)
    }

    /// `None` when run summary persistence is disabled.
    pub fn run_summary_path(&self) -> Option<PathBuf> {
        self.cfg.run_summary_file.as_ref().map(|f| self.cfg.dir.join(f))
    }

    /// Save the sorted holder list.
    pub fn save_holders(&self, holders: &[HolderRecord]) -> Result<()> {
        write_json(&self.holders_path(), holders)?;
        debug!(count = holders.len(), "Holder list saved");
        Ok(())
    }

    /// Save the tier distribution.
    pub fn save_tier_summary(&self, dist: &TierDistribution) -> Result<()> {
        write_json(&self.tier_summary_path(), dist)?;
        debug!(total = dist.total_wallets, "Tier summary saved");
        Ok(())
    }

    /// Save the winner mapping.
    pub fn save_winners(&self, winners: &WinnerSet) -> Result<()> {
        write_json(&self.winners_path(), winners)?;
        debug!(total = winners.total_winners(), "Winners saved");
        Ok(())
    }

    /// Save the run summary if persistence is enabled. Returns whether a
    /// file was written.
    pub fn save_run_summary(&self, summary: &RunSummary) -> Result<bool> {
        let Some(path) = self.run_summary_path() else {
            return Ok(false);
        };
        write_json(&path, summary)?;
        debug!(total = summary.total_winners, "Run summary saved");
        Ok(true)
    }

    /// Save the last-run marker.
    pub fn save_last_run(&self, marker: &LastRun) -> Result<()> {
        write_json(&self.last_run_path(), marker)?;
        debug!(next_run_at = %marker.next_run_at, "Last-run marker saved");
        Ok(())
    }

    /// Load the last-run marker.
    /// Returns None if no cycle has completed yet.
    pub fn load_last_run(&self) -> Result<Option<LastRun>> {
        let path = self.last_run_path();

        if !path.exists() {
            info!(path = %path.display(), "No previous run recorded");
            return Ok(None);
        }

        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read last run from {}", path.display()))?;
        let marker: LastRun = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse last run from {}", path.display()))?;

        Ok(Some(marker))
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialise {}", path.display()))?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
