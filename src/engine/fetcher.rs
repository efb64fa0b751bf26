//! Holder fetcher: paginated aggregation of token accounts by owner.
//!
//! Walks the account index page by page until it reports an empty page,
//! sums every account's normalized balance into its owner's total,
//! classifies each owner and returns the list sorted by balance
//! (largest holders first).
//!
//! A failed page aborts the whole scan. Pages fetched before the failure
//! are discarded so a partial holder list is never published.

use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::config::TokenConfig;
use crate::engine::classifier::classify;
use crate::indexer::{AccountIndex, IndexError, PageFetch};
use crate::types::{HolderRecord, TierTable};

/// Result of a complete holder scan.
#[derive(Debug, Clone)]
pub struct HolderScan {
    /// Classified holders, sorted by balance descending.
    pub holders: Vec<HolderRecord>,
    /// Non-empty pages consumed.
    pub pages: u32,
    /// Token accounts seen across all pages.
    pub accounts: usize,
}

/// Convert a raw integer amount to whole tokens: `raw / 10^decimals`.
///
/// Exact; `decimals` must be at most 28, which `AppConfig::validate`
/// guarantees.
pub fn normalize(raw: u64, decimals: u32) -> Decimal {
    Decimal::from_i128_with_scale(i128::from(raw), decimals)
}

/// Turn aggregated owner balances into classified, sorted records.
///
/// Owners with a zero aggregate balance are not holders and are dropped.
/// Ties on balance are ordered by wallet so output is stable across runs.
pub fn build_holders(balances: HashMap<String, Decimal>, tiers: &TierTable) -> Vec<HolderRecord> {
    let mut holders: Vec<HolderRecord> = balances
        .into_iter()
        .filter(|(_, balance)| !balance.is_zero())
        .map(|(wallet, balance)| HolderRecord {
            tier: classify(tiers, balance),
            wallet,
            balance: balance.normalize(),
        })
        .collect();

    holders.sort_by(|a, b| {
        b.balance
            .cmp(&a.balance)
            .then_with(|| a.wallet.cmp(&b.wallet))
    });
    holders
}

/// Pages through an [`AccountIndex`] to build the holder list.
pub struct HolderFetcher<'a> {
    index: &'a dyn AccountIndex,
    token: &'a TokenConfig,
    tiers: &'a TierTable,
    page_size: u32,
}

impl<'a> HolderFetcher<'a> {
    pub fn new(
        index: &'a dyn AccountIndex,
        token: &'a TokenConfig,
        tiers: &'a TierTable,
        page_size: u32,
    ) -> Self {
        Self {
            index,
            token,
            tiers,
            page_size,
        }
    }

    /// Fetch every page and aggregate balances per owner.
    pub async fn fetch_holders(&self) -> Result<HolderScan, IndexError> {
        info!(
            index = self.index.name(),
            mint = %self.token.mint,
            "Scanning for token holders..."
        );

        let mut balances: HashMap<String, Decimal> = HashMap::new();
        let mut page: u32 = 1;
        let mut accounts = 0usize;

        loop {
            debug!(page, "Fetching page");
            let batch = match self
                .index
                .fetch_page(&self.token.mint, page, self.page_size)
                .await?
            {
                PageFetch::Accounts(batch) => batch,
                PageFetch::Exhausted => break,
            };

            accounts += batch.len();
            for account in batch {
                *balances.entry(account.owner).or_insert(Decimal::ZERO) +=
                    normalize(account.amount, self.token.decimals);
            }
            debug!(page, owners = balances.len(), "Page processed");
            page += 1;
        }

        let pages = page - 1;
        let holders = build_holders(balances, self.tiers);

        info!(
            mint = %self.token.mint,
            pages,
            accounts,
            holders = holders.len(),
            "Finished token holder scan"
        );

        Ok(HolderScan {
            holders,
            pages,
            accounts,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
