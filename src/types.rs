//! Shared types for the TIERDRAW tracker.
//!
//! These types form the data model used across all modules: the tier
//! table, classified holder records, per-cycle winner draws, and the
//! summaries written to disk.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::indexer::IndexError;

/// Tier identifier. `0` is reserved for "no tier matched".
pub type TierId = u32;

/// Tier id assigned to holders below the lowest tier's minimum.
pub const UNTIERED: TierId = 0;

// ---------------------------------------------------------------------------
// Tiers
// ---------------------------------------------------------------------------

/// A contiguous balance range with an associated winner quota.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub id: TierId,
    pub name: String,
    /// Inclusive lower bound, in whole tokens.
    pub min: Decimal,
    /// Inclusive upper bound. `None` means unbounded (top tier only).
    #[serde(default)]
    pub max: Option<Decimal>,
    /// Number of winners drawn from this tier each cycle.
    pub winners: usize,
}

impl Tier {
    /// Whether `balance` falls inside this tier's inclusive range.
    pub fn contains(&self, balance: Decimal) -> bool {
        balance >= self.min && self.max.map_or(true, |max| balance <= max)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "{} ({}-{})", self.name, self.min, max),
            None => write!(f, "{} ({}-MAX)", self.name, self.min),
        }
    }
}

/// The validated, immutable tier table.
///
/// Tiers are stored in ascending order of `min` and never overlap.
/// Construct through [`TierTable::new`], which enforces the invariants.
#[derive(Debug, Clone, PartialEq)]
pub struct TierTable {
    tiers: Vec<Tier>,
}

impl TierTable {
    pub fn new(tiers: Vec<Tier>) -> Result<Self, TrackerError> {
        if tiers.is_empty() {
            return Err(TrackerError::Config("at least one tier is required".into()));
        }

        let mut seen = std::collections::HashSet::new();
        for (i, tier) in tiers.iter().enumerate() {
            if tier.id == UNTIERED {
                return Err(TrackerError::Config(format!(
                    "tier '{}' uses reserved id 0",
                    tier.name
                )));
            }
            if !seen.insert(tier.id) {
                return Err(TrackerError::Config(format!("duplicate tier id {}", tier.id)));
            }
            if tier.min < Decimal::ZERO {
                return Err(TrackerError::Config(format!(
                    "tier {} has a negative minimum",
                    tier.id
                )));
            }
            if let Some(max) = tier.max {
                if max < tier.min {
                    return Err(TrackerError::Config(format!(
                        "tier {} has max {} below min {}",
                        tier.id, max, tier.min
                    )));
                }
            }

            let Some(next) = tiers.get(i + 1) else {
                continue;
            };
            if next.min <= tier.min {
                return Err(TrackerError::Config(format!(
                    "tier {} must start above tier {}",
                    next.id, tier.id
                )));
            }
            match tier.max {
                None => {
                    return Err(TrackerError::Config(format!(
                        "only the last tier may be unbounded (tier {})",
                        tier.id
                    )))
                }
                Some(max) if max >= next.min => {
                    return Err(TrackerError::Config(format!(
                        "tier {} overlaps tier {}",
                        tier.id, next.id
                    )))
                }
                Some(_) => {}
            }
        }

        Ok(Self { tiers })
    }

    /// Tiers in ascending order.
    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    /// Lowest balance that qualifies for any tier.
    pub fn floor(&self) -> Decimal {
        self.tiers[0].min
    }

    /// Winner quota per tier id.
    pub fn quotas(&self) -> BTreeMap<TierId, usize> {
        self.tiers.iter().map(|t| (t.id, t.winners)).collect()
    }
}

// ---------------------------------------------------------------------------
// Holders
// ---------------------------------------------------------------------------

/// One owner address with its aggregate balance and assigned tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderRecord {
    pub wallet: String,
    /// Aggregate balance in whole tokens; written as a 5-decimal string.
    #[serde(rename = "amount", with = "amount_5dp")]
    pub balance: Decimal,
    pub tier: TierId,
}

impl HolderRecord {
    pub fn is_tiered(&self) -> bool {
        self.tier != UNTIERED
    }

    /// Balance formatted the way it is written to disk.
    pub fn amount_display(&self) -> String {
        format_amount(self.balance)
    }
}

/// Format a token amount with exactly five decimal places.
pub fn format_amount(amount: Decimal) -> String {
    format!(
        "{:.5}",
        amount.round_dp_with_strategy(5, RoundingStrategy::MidpointAwayFromZero)
    )
}

mod amount_5dp {
    use rust_decimal::{Decimal, RoundingStrategy};
    use serde::{Deserialize, Deserializer, Serializer};
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(value: &Decimal, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_amount(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Decimal, D::Error> {
        let raw = String::deserialize(d)?;
        Decimal::from_str(&raw).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tier distribution (tier summary file)
// ---------------------------------------------------------------------------

/// Holder count for one tier, alongside the tier definition.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierCount {
    #[serde(flatten)]
    pub tier: Tier,
    pub wallet_count: usize,
    /// Share of all holders, e.g. `"12.50%"`.
    pub percentage: String,
}

/// How the scanned holders spread across the tier table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierDistribution {
    pub total_wallets: usize,
    pub wallets_below_min_tier: usize,
    pub tiers: Vec<TierCount>,
}

impl TierDistribution {
    pub fn from_holders(holders: &[HolderRecord], table: &TierTable) -> Self {
        let total_wallets = holders.len();
        let wallets_below_min_tier = holders.iter().filter(|h| !h.is_tiered()).count();

        let tiers = table
            .tiers()
            .iter()
            .map(|tier| {
                let wallet_count = holders.iter().filter(|h| h.tier == tier.id).count();
                TierCount {
                    tier: tier.clone(),
                    wallet_count,
                    percentage: percentage(wallet_count, total_wallets),
                }
            })
            .collect();

        Self {
            total_wallets,
            wallets_below_min_tier,
            tiers,
        }
    }

    /// Share of holders below every tier.
    pub fn below_min_percentage(&self) -> String {
        percentage(self.wallets_below_min_tier, self.total_wallets)
    }
}

/// `count / total` as a two-decimal percentage string. Zero total yields `0.00%`.
pub fn percentage(count: usize, total: usize) -> String {
    if total == 0 {
        return "0.00%".to_string();
    }
    let pct = Decimal::from(count) * Decimal::ONE_HUNDRED / Decimal::from(total);
    format!("{:.2}%", pct.round_dp(2))
}

// ---------------------------------------------------------------------------
// Winners
// ---------------------------------------------------------------------------

/// How a tier's winners were chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawMethod {
    /// The tier had no more holders than its quota; everyone won.
    AllHolders,
    /// `quota` holders sampled uniformly without replacement.
    Random,
}

impl fmt::Display for DrawMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawMethod::AllHolders => write!(f, "all-holders"),
            DrawMethod::Random => write!(f, "random"),
        }
    }
}

/// Winners for a single tier in one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct TierDraw {
    pub tier: TierId,
    pub method: DrawMethod,
    /// Number of holders the tier had when the draw ran.
    pub eligible: usize,
    pub winners: Vec<HolderRecord>,
}

/// Per-tier draws for one cycle, keyed by tier id.
///
/// Serializes as `{ "<tier id>": [HolderRecord, ...] }`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WinnerSet {
    draws: BTreeMap<TierId, TierDraw>,
}

impl WinnerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, draw: TierDraw) {
        self.draws.insert(draw.tier, draw);
    }

    pub fn get(&self, tier: TierId) -> Option<&TierDraw> {
        self.draws.get(&tier)
    }

    /// Winners for `tier`, empty when the tier produced no draw.
    pub fn winners(&self, tier: TierId) -> &[HolderRecord] {
        self.draws
            .get(&tier)
            .map(|d| d.winners.as_slice())
            .unwrap_or(&[])
    }

    pub fn draws(&self) -> impl Iterator<Item = &TierDraw> {
        self.draws.values()
    }

    pub fn total_winners(&self) -> usize {
        self.draws.values().map(|d| d.winners.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    pub fn len(&self) -> usize {
        self.draws.len()
    }
}

impl Serialize for WinnerSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.draws.iter().map(|(id, draw)| (id, &draw.winners)))
    }
}

// ---------------------------------------------------------------------------
// Run summary
// ---------------------------------------------------------------------------

/// Winner count and awarded token total for one tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierWinnerSummary {
    pub id: TierId,
    pub name: String,
    pub winner_count: usize,
    pub total_tokens: Decimal,
}

/// Summary of one cycle's draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub timestamp: DateTime<Utc>,
    pub total_winners: usize,
    pub tiers: Vec<TierWinnerSummary>,
}

/// Marker written after each completed cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastRun {
    pub last_run_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_seconds: f64,
    pub next_run_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for TIERDRAW.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Account index error: {0}")]
    Index(#[from] IndexError),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
