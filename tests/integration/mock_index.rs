//! Mock account index for integration testing.
//!
//! Provides a deterministic `AccountIndex` implementation that serves
//! a fixed set of pages from memory, with no network access.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use tierdraw::indexer::{AccountIndex, IndexError, PageFetch, TokenAccount};

/// A mock token-account index.
///
/// Clones share state, so a test can keep one handle for inspection
/// after boxing another into the tracker.
#[derive(Clone, Default)]
pub struct MockIndex {
    pages: Arc<Mutex<Vec<Vec<TokenAccount>>>>,
    /// If set, all requests fail with an HTTP error carrying this body.
    force_error: Arc<Mutex<Option<String>>>,
    calls: Arc<Mutex<Vec<u32>>>,
}

impl MockIndex {
    /// A mock with no accounts at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A mock serving `pages` in order, then an empty page.
    pub fn with_pages(pages: Vec<Vec<TokenAccount>>) -> Self {
        Self {
            pages: Arc::new(Mutex::new(pages)),
            ..Self::default()
        }
    }

    /// Force all subsequent requests to fail.
    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    /// Page numbers requested so far.
    pub fn calls(&self) -> Vec<u32> {
        self.calls.lock().unwrap().clone()
    }
}

/// A token account holding `tokens` whole tokens at 6 decimals.
pub fn account(owner: &str, tokens: u64) -> TokenAccount {
    TokenAccount {
        owner: owner.to_string(),
        amount: tokens * 1_000_000,
    }
}

#[async_trait]
impl AccountIndex for MockIndex {
    async fn fetch_page(&self, _mint: &str, page: u32, _limit: u32) -> Result<PageFetch, IndexError> {
        self.calls.lock().unwrap().push(page);

        if let Some(msg) = self.force_error.lock().unwrap().clone() {
            return Err(IndexError::Status {
                status: 503,
                body: msg,
            });
        }

        let pages = self.pages.lock().unwrap();
        match pages.get(page as usize - 1) {
            Some(accounts) if !accounts.is_empty() => Ok(PageFetch::Accounts(accounts.clone())),
            _ => Ok(PageFetch::Exhausted),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
