//! Summary reporter: per-tier winner counts and token totals.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::types::{RunSummary, TierDistribution, TierTable, TierWinnerSummary, WinnerSet};

/// Summarize a cycle's winners, stamped with the current time.
pub fn summarize(tiers: &TierTable, winners: &WinnerSet) -> RunSummary {
    summarize_at(tiers, winners, Utc::now())
}

/// Summarize a cycle's winners with an explicit timestamp.
///
/// Every configured tier appears in canonical order, including tiers that
/// produced no winners (reported as zero).
pub fn summarize_at(tiers: &TierTable, winners: &WinnerSet, timestamp: DateTime<Utc>) -> RunSummary {
    let tiers = tiers
        .tiers()
        .iter()
        .map(|tier| {
            let tier_winners = winners.winners(tier.id);
            TierWinnerSummary {
                id: tier.id,
                name: tier.name.clone(),
                winner_count: tier_winners.len(),
                total_tokens: tier_winners.iter().map(|w| w.balance).sum::<Decimal>(),
            }
        })
        .collect();

    RunSummary {
        timestamp,
        total_winners: winners.total_winners(),
        tiers,
    }
}

/// Render the winner breakdown printed after each draw.
pub fn breakdown_lines(summary: &RunSummary, winners: &WinnerSet) -> Vec<String> {
    let mut lines = vec![
        "Winner Selection Summary:".to_string(),
        format!("Total Winners: {}", summary.total_winners),
        "Tier Breakdown:".to_string(),
    ];

    for tier in &summary.tiers {
        lines.push(format!(
            "{}: {} winners, {:.2} tokens total",
            tier.name,
            tier.winner_count,
            tier.total_tokens.round_dp(2)
        ));
    }

    lines.push("Selected Winners:".to_string());
    for draw in winners.draws() {
        lines.push(format!(
            "--- Tier {} Winners ({}, {} of {} holders) ---",
            draw.tier,
            draw.method,
            draw.winners.len(),
            draw.eligible
        ));
        for winner in &draw.winners {
            lines.push(format!(
                "Address: {}, Amount: {}",
                winner.wallet,
                winner.amount_display()
            ));
        }
    }

    lines
}

/// Render the holder distribution printed after each scan.
pub fn distribution_lines(dist: &TierDistribution, tiers: &TierTable) -> Vec<String> {
    let mut lines = vec![
        format!("Total holders: {}", dist.total_wallets),
        "Tier summary:".to_string(),
        format!(
            "Below all tiers (<{}): {} wallets ({})",
            tiers.floor(),
            dist.wallets_below_min_tier,
            dist.below_min_percentage()
        ),
    ];

    for count in &dist.tiers {
        lines.push(format!(
            "{}: {} wallets ({})",
            count.tier, count.wallet_count, count.percentage
        ));
    }

    lines
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
