//! Tier classification.

use rust_decimal::Decimal;

use crate::types::{TierId, TierTable, UNTIERED};

/// Map a balance to its tier id, or [`UNTIERED`] when no tier contains it.
///
/// Tiers are checked in ascending order and the first inclusive
/// `[min, max]` match wins. A fractional balance between one tier's `max`
/// and the next tier's `min` (99999.5 with the default table) is contained
/// by neither and is untiered.
pub fn classify(table: &TierTable, balance: Decimal) -> TierId {
    table
        .tiers()
        .iter()
        .find(|t| t.contains(balance))
        .map_or(UNTIERED, |t| t.id)
}
