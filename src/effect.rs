use crate::domain::{AccountId, AccountRegistry, Fault, Position, ShareSide, Transaction};
use crate::split::{split_positions, split_value};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Signed per-account delta produced by resolving one transaction:
/// positive for money paid, negative for money consumed.
pub type BalanceEffect = BTreeMap<AccountId, Decimal>;

/// Verify that every account a transaction or its positions reference is
/// known to the registry.
pub fn check_references(
    registry: &AccountRegistry,
    transaction: &Transaction,
    positions: &[&Position],
) -> Result<(), Fault> {
    let referenced = transaction
        .creditor_shares
        .keys()
        .chain(transaction.debitor_shares.keys());
    for &account in referenced {
        if !registry.contains(account) {
            return Err(Fault::UnknownAccount {
                transaction: transaction.id,
                account,
            });
        }
    }
    for position in positions {
        if let Some(shares) = &position.shares {
            for &account in shares.keys() {
                if !registry.contains(account) {
                    return Err(Fault::UnknownAccount {
                        transaction: transaction.id,
                        account,
                    });
                }
            }
        }
    }
    Ok(())
}

/// Resolve one transaction into its balance effect.
///
/// The creditor split of `value` is added (paid), the position split is
/// subtracted (consumed). Both sides must sum to the declared value; a
/// violation is a conservation fault and the transaction contributes
/// nothing. Work-in-progress transactions yield an empty effect.
pub fn transaction_effect(
    transaction: &Transaction,
    positions: &[&Position],
) -> Result<BalanceEffect, Fault> {
    if transaction.is_wip {
        return Ok(BalanceEffect::new());
    }

    let paid =
        split_value(transaction.value, &transaction.creditor_shares).ok_or(Fault::EmptyShares {
            transaction: transaction.id,
            side: ShareSide::Creditor,
            value: transaction.value,
        })?;
    let consumed = split_positions(transaction, positions)?;

    let paid_total: Decimal = paid.values().copied().sum();
    let consumed_total: Decimal = consumed.values().copied().sum();
    if paid_total != transaction.value || consumed_total != transaction.value {
        return Err(Fault::ValueMismatch {
            transaction: transaction.id,
            value: transaction.value,
            paid: paid_total,
            consumed: consumed_total,
        });
    }

    let mut effect = BalanceEffect::new();
    for (account, amount) in paid {
        *effect.entry(account).or_insert(Decimal::ZERO) += amount;
    }
    for (account, amount) in consumed {
        *effect.entry(account).or_insert(Decimal::ZERO) -= amount;
    }
    Ok(effect)
}
