//! End-to-end tracker cycles: fetch, classify, draw, persist.

use std::path::PathBuf;
use std::sync::Arc;

use tierdraw::config::AppConfig;
use tierdraw::engine::tracker::{CycleOutcome, SkipReason, Tracker};
use tierdraw::events::MemorySink;
use tierdraw::indexer::TokenAccount;
use tierdraw::storage::ResultStore;
use tierdraw::types::{DrawMethod, UNTIERED};

use crate::mock_index::{account, MockIndex};

/// A tracker writing into its own temp dir, plus handles to inspect it.
struct Harness {
    tracker: Tracker,
    index: MockIndex,
    sink: Arc<MemorySink>,
    dir: PathBuf,
}

impl Harness {
    fn new(index: MockIndex) -> Self {
        Self::with_config(index, |_| {})
    }

    fn with_config(index: MockIndex, tweak: impl FnOnce(&mut AppConfig)) -> Self {
        let mut dir = std::env::temp_dir();
        dir.push(format!("tierdraw_test_cycle_{}", uuid::Uuid::new_v4()));

        let mut cfg = AppConfig::default();
        cfg.output.dir = dir.clone();
        tweak(&mut cfg);

        let store = ResultStore::new(&cfg.output).unwrap();
        let sink = Arc::new(MemorySink::new());
        let tracker = Tracker::new(cfg, Box::new(index.clone()), store, sink.clone()).unwrap();

        Self {
            tracker,
            index,
            sink,
            dir,
        }
    }

    fn read_json(&self, file: &str) -> serde_json::Value {
        let text = std::fs::read_to_string(self.dir.join(file)).unwrap();
        serde_json::from_str(&text).unwrap()
    }

    fn written_files(&self) -> usize {
        std::fs::read_dir(&self.dir).unwrap().count()
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

fn three_holders() -> MockIndex {
    MockIndex::with_pages(vec![
        vec![account("A", 10_000), account("B", 150_000)],
        vec![account("A", 5_000), account("C", 9_999)],
    ])
}

// ---------------------------------------------------------------------------
// Completed cycles
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_cycle_classifies_and_persists_holders() {
    let h = Harness::new(three_holders());
    let outcome = h.tracker.run_cycle().await.unwrap();
    assert!(outcome.is_completed());
    assert_eq!(h.index.calls(), vec![1, 2, 3]);

    let holders = h.read_json("output.json");
    let holders = holders.as_array().unwrap();
    assert_eq!(holders.len(), 3);
    assert_eq!(holders[0]["wallet"], "B");
    assert_eq!(holders[0]["tier"], 2);
    assert_eq!(holders[1]["wallet"], "A");
    assert_eq!(holders[1]["amount"], "15000.00000");
    assert_eq!(holders[1]["tier"], 1);
    assert_eq!(holders[2]["wallet"], "C");
    assert_eq!(holders[2]["tier"], UNTIERED);

    let summary = h.read_json("tier_summary.json");
    assert_eq!(summary["totalWallets"], 3);
    assert_eq!(summary["walletsBelowMinTier"], 1);
    assert_eq!(summary["tiers"][0]["walletCount"], 1);
    assert_eq!(summary["tiers"][0]["percentage"], "33.33%");
    assert_eq!(summary["tiers"][2]["walletCount"], 0);
}

#[tokio::test]
async fn test_cycle_draws_every_holder_of_small_tiers() {
    let h = Harness::new(three_holders());
    let CycleOutcome::Completed {
        winners, summary, ..
    } = h.tracker.run_cycle().await.unwrap()
    else {
        panic!("expected a completed cycle");
    };

    assert_eq!(winners.total_winners(), 2);
    assert_eq!(winners.winners(1)[0].wallet, "A");
    assert_eq!(winners.winners(2)[0].wallet, "B");
    assert_eq!(winners.get(1).unwrap().method, DrawMethod::AllHolders);
    assert!(winners.get(3).is_none());
    assert_eq!(summary.total_winners, 2);
    assert_eq!(summary.tiers.len(), 5);

    let json = h.read_json("winners.json");
    assert_eq!(json["1"][0]["wallet"], "A");
    assert_eq!(json["2"][0]["wallet"], "B");
    assert!(json.get("0").is_none());
    assert!(json.get("3").is_none());

    assert!(h.sink.contains("Total Winners: 2"));
    assert!(h.sink.contains("Tier 1: 1 winners, 15000.00 tokens total"));
}

#[tokio::test]
async fn test_cycle_draws_quota_from_crowded_tier() {
    let accounts = (0..20).map(|i| account(&format!("w{i:02}"), 20_000)).collect();
    let h = Harness::new(MockIndex::with_pages(vec![accounts]));

    let CycleOutcome::Completed { winners, .. } = h.tracker.run_cycle().await.unwrap() else {
        panic!("expected a completed cycle");
    };
    let draw = winners.get(1).unwrap();
    assert_eq!(draw.method, DrawMethod::Random);
    assert_eq!(draw.eligible, 20);
    assert_eq!(draw.winners.len(), 5);
}

#[tokio::test]
async fn test_cycle_writes_last_run_marker() {
    let h = Harness::new(three_holders());
    let CycleOutcome::Completed { last_run, .. } = h.tracker.run_cycle().await.unwrap() else {
        panic!("expected a completed cycle");
    };

    assert!(last_run.completed_at >= last_run.last_run_at);
    assert_eq!(
        last_run.next_run_at,
        last_run.completed_at + chrono::Duration::seconds(600)
    );

    let json = h.read_json("last_run.json");
    assert!(json.get("lastRunAt").is_some());
    assert!(json.get("nextRunAt").is_some());
    assert!(json["durationSeconds"].as_f64().unwrap() >= 0.0);

    let loaded = h.tracker.store().load_last_run().unwrap().unwrap();
    assert_eq!(loaded, last_run);
}

#[tokio::test]
async fn test_run_summary_written_when_configured() {
    let h = Harness::with_config(three_holders(), |cfg| {
        cfg.output.run_summary_file = Some("winners_summary.json".to_string());
    });
    h.tracker.run_cycle().await.unwrap();

    let json = h.read_json("winners_summary.json");
    assert_eq!(json["totalWinners"], 2);
    assert_eq!(json["tiers"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_run_summary_not_written_by_default() {
    let h = Harness::new(three_holders());
    h.tracker.run_cycle().await.unwrap();
    assert!(!h.dir.join("winners_summary.json").exists());
    assert_eq!(h.written_files(), 4);
}

#[tokio::test]
async fn test_balance_between_tiers_is_untiered() {
    let h = Harness::new(MockIndex::with_pages(vec![vec![
        TokenAccount {
            owner: "gap".to_string(),
            amount: 99_999_500_000,
        },
        account("A", 15_000),
    ]]));
    let CycleOutcome::Completed { winners, .. } = h.tracker.run_cycle().await.unwrap() else {
        panic!("expected a completed cycle");
    };

    let holders = h.read_json("output.json");
    assert_eq!(holders[0]["wallet"], "gap");
    assert_eq!(holders[0]["amount"], "99999.50000");
    assert_eq!(holders[0]["tier"], UNTIERED);

    let summary = h.read_json("tier_summary.json");
    assert_eq!(summary["walletsBelowMinTier"], 1);
    assert_eq!(summary["tiers"][0]["walletCount"], 1);
    assert!(winners.winners(1).iter().all(|w| w.wallet != "gap"));
}

// ---------------------------------------------------------------------------
// Skipped cycles
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_empty_index_skips_without_writing() {
    let h = Harness::new(MockIndex::empty());
    let outcome = h.tracker.run_cycle().await.unwrap();

    assert!(matches!(outcome, CycleOutcome::Skipped(SkipReason::NoHolders)));
    assert_eq!(h.written_files(), 0);
    assert!(h.sink.contains("No holders found"));
}

#[tokio::test]
async fn test_failed_scan_skips_without_writing() {
    let index = three_holders();
    index.set_error("service unavailable");
    let h = Harness::new(index);

    let outcome = h.tracker.run_cycle().await.unwrap();
    match outcome {
        CycleOutcome::Skipped(SkipReason::ScanFailed(msg)) => {
            assert!(msg.contains("503"));
        }
        other => panic!("expected a failed scan, got {other:?}"),
    }
    assert_eq!(h.index.calls(), vec![1]);
    assert_eq!(h.written_files(), 0);
    assert!(h.sink.contains("Error scanning token holders"));
}

#[tokio::test]
async fn test_failed_scan_keeps_previous_results() {
    let h = Harness::new(three_holders());
    h.tracker.run_cycle().await.unwrap();
    let before = h.read_json("output.json");

    h.index.set_error("down");
    h.tracker.run_cycle().await.unwrap();
    assert_eq!(h.read_json("output.json"), before);
}

// ---------------------------------------------------------------------------
// Run loop
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_run_until_stops_after_first_cycle() {
    let h = Harness::new(three_holders());
    let cycles = h.tracker.run_until(async {}).await.unwrap();

    assert_eq!(cycles, 1);
    assert!(h.dir.join("winners.json").exists());
    assert!(h.sink.contains("Token Tracker shutting down"));
}

#[tokio::test]
async fn test_run_until_survives_failing_cycle() {
    let h = Harness::new(three_holders());
    // A directory where the holder list should go makes the write fail.
    std::fs::create_dir_all(h.dir.join("output.json")).unwrap();

    assert!(h.tracker.run_cycle().await.is_err());

    let cycles = h.tracker.run_until(async {}).await.unwrap();
    assert_eq!(cycles, 1);
    assert!(h.sink.contains("Error in token tracking sequence"));
    assert!(!h.dir.join("winners.json").exists());
}

#[tokio::test]
async fn test_invalid_tier_table_rejected() {
    let mut cfg = AppConfig::default();
    cfg.tiers.clear();
    let store = ResultStore::new(&cfg.output).unwrap();
    let result = Tracker::new(cfg, Box::new(MockIndex::empty()), store, Arc::new(MemorySink::new()));
    assert!(result.is_err());
}
