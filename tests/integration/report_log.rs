//! Report lines routed through tracing appear once per event.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use tierdraw::config::AppConfig;
use tierdraw::engine::tracker::{CycleOutcome, SkipReason, Tracker};
use tierdraw::events::TracingSink;
use tierdraw::storage::ResultStore;

use crate::mock_index::MockIndex;

/// Collects formatted log output in memory.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

async fn logged_cycle(index: MockIndex) -> (CycleOutcome, String) {
    let mut dir = std::env::temp_dir();
    dir.push(format!("tierdraw_test_log_{}", uuid::Uuid::new_v4()));
    let mut cfg = AppConfig::default();
    cfg.output.dir = dir.clone();

    let store = ResultStore::new(&cfg.output).unwrap();
    let tracker = Tracker::new(cfg, Box::new(index), store, Arc::new(TracingSink)).unwrap();

    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let outcome = tracker.run_cycle().await.unwrap();
    let _ = std::fs::remove_dir_all(&dir);
    (outcome, captured.text())
}

#[tokio::test]
async fn test_empty_scan_logged_once() {
    let (outcome, log) = logged_cycle(MockIndex::empty()).await;
    assert!(matches!(outcome, CycleOutcome::Skipped(SkipReason::NoHolders)));
    assert_eq!(log.matches("No holders found").count(), 1, "log was:\n{log}");
}

#[tokio::test]
async fn test_scan_error_logged_once() {
    let index = MockIndex::empty();
    index.set_error("service unavailable");
    let (outcome, log) = logged_cycle(index).await;
    assert!(matches!(outcome, CycleOutcome::Skipped(SkipReason::ScanFailed(_))));
    assert_eq!(log.matches("Error scanning token holders").count(), 1, "log was:\n{log}");
    assert_eq!(log.matches("No holders found").count(), 1, "log was:\n{log}");
}
