//! Winner selection.
//!
//! Groups classified holders by tier and draws each tier's quota
//! uniformly at random without replacement. A tier with no more holders
//! than its quota hands the win to every holder instead, and the draw is
//! marked [`DrawMethod::AllHolders`] so it can be told apart from a real
//! random draw.
//!
//! Draws have no memory between cycles: the same wallet can win again
//! next cycle.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;
use tracing::info;

use crate::types::{DrawMethod, HolderRecord, TierDraw, TierId, WinnerSet};

/// Group tiered holders by tier id, preserving input order within a tier.
pub fn group_by_tier(holders: &[HolderRecord]) -> BTreeMap<TierId, Vec<&HolderRecord>> {
    let mut groups: BTreeMap<TierId, Vec<&HolderRecord>> = BTreeMap::new();
    for holder in holders.iter().filter(|h| h.is_tiered()) {
        groups.entry(holder.tier).or_default().push(holder);
    }
    groups
}

/// Draw winners for every tier that has both holders and a non-zero quota.
pub fn select_winners<R: Rng + ?Sized>(
    holders: &[HolderRecord],
    quotas: &BTreeMap<TierId, usize>,
    rng: &mut R,
) -> WinnerSet {
    info!("Selecting winners...");

    let mut winners = WinnerSet::new();

    for (tier_id, tier_holders) in group_by_tier(holders) {
        let Some(&quota) = quotas.get(&tier_id) else {
            continue;
        };
        if quota == 0 {
            continue;
        }

        let eligible = tier_holders.len();
        let (method, picked): (DrawMethod, Vec<HolderRecord>) = if eligible <= quota {
            info!(
                tier = tier_id,
                holders = eligible,
                "Tier {tier_id}: Only {eligible} holders, selected all as winners"
            );
            (
                DrawMethod::AllHolders,
                tier_holders.into_iter().cloned().collect(),
            )
        } else {
            info!(
                tier = tier_id,
                holders = eligible,
                quota,
                "Tier {tier_id}: Selected {quota} winners out of {eligible} holders"
            );
            (
                DrawMethod::Random,
                tier_holders
                    .choose_multiple(rng, quota)
                    .map(|&h| h.clone())
                    .collect(),
            )
        };

        for winner in &picked {
            info!(
                tier = tier_id,
                wallet = %winner.wallet,
                amount = %winner.amount_display(),
                "Tier {tier_id} Winner: {} with {} tokens",
                winner.wallet,
                winner.amount_display()
            );
        }

        winners.insert(TierDraw {
            tier: tier_id,
            method,
            eligible,
            winners: picked,
        });
    }

    winners
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
