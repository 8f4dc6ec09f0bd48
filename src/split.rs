use crate::domain::{AccountId, Fault, Position, ShareSide, Transaction};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Currency precision in decimal places.
pub const CURRENCY_DP: u32 = 2;

/// Split `value` proportionally across a weight map.
///
/// Each part is `value * weight / total`, rounded to currency precision.
/// The residual between the exact value and the rounded parts is absorbed
/// by the largest-weight share (ties go to the smallest account id), so the
/// parts always sum exactly to `value`. Returns `None` when the total
/// weight is zero and nothing can be distributed.
pub fn split_value(
    value: Decimal,
    shares: &BTreeMap<AccountId, Decimal>,
) -> Option<BTreeMap<AccountId, Decimal>> {
    let total: Decimal = shares.values().copied().sum();
    if total.is_zero() {
        return None;
    }

    let mut parts: BTreeMap<AccountId, Decimal> = BTreeMap::new();
    for (&account, &weight) in shares {
        if weight.is_zero() {
            continue;
        }
        let exact = value * weight / total;
        parts.insert(account, exact.round_dp(CURRENCY_DP));
    }

    let assigned: Decimal = parts.values().copied().sum();
    let residual = value - assigned;
    if !residual.is_zero() {
        let absorber = shares
            .iter()
            .filter(|(_, weight)| !weight.is_zero())
            .max_by(|(a_id, a_w), (b_id, b_w)| a_w.cmp(b_w).then_with(|| b_id.cmp(a_id)))
            .map(|(&id, _)| id)?;
        *parts.get_mut(&absorber)? += residual;
    }

    Some(parts)
}

/// Resolve a transaction's consumption side: each position's price split
/// over its own shares (falling back to the transaction's debitor shares),
/// plus the unclaimed remainder split over the transaction-level shares.
pub fn split_positions(
    transaction: &Transaction,
    positions: &[&Position],
) -> Result<BTreeMap<AccountId, Decimal>, Fault> {
    let mut consumed: BTreeMap<AccountId, Decimal> = BTreeMap::new();
    let mut position_total = Decimal::ZERO;

    for position in positions {
        position_total += position.price;
        if position.price.is_zero() {
            continue;
        }
        let shares = position
            .shares
            .as_ref()
            .unwrap_or(&transaction.debitor_shares);
        let parts = split_value(position.price, shares).ok_or(Fault::EmptyShares {
            transaction: transaction.id,
            side: ShareSide::Debitor,
            value: position.price,
        })?;
        for (account, amount) in parts {
            *consumed.entry(account).or_insert(Decimal::ZERO) += amount;
        }
    }

    if position_total > transaction.value {
        return Err(Fault::PositionsExceedValue {
            transaction: transaction.id,
            position_total,
            value: transaction.value,
        });
    }

    // The remainder no position claims (tax, tip, the unitemized rest)
    // always follows the transaction-level shares, even when every position
    // declares its own.
    let unclaimed = transaction.value - position_total;
    if !unclaimed.is_zero() {
        let parts =
            split_value(unclaimed, &transaction.debitor_shares).ok_or(Fault::EmptyShares {
                transaction: transaction.id,
                side: ShareSide::Debitor,
                value: unclaimed,
            })?;
        for (account, amount) in parts {
            *consumed.entry(account).or_insert(Decimal::ZERO) += amount;
        }
    }

    Ok(consumed)
}
