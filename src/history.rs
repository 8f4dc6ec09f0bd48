use crate::clearing::ResolvedEffect;
use crate::domain::{
    AccountBalance, AccountId, BalanceChangeOrigin, BalanceHistoryEntry, Transaction,
    TransactionId,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Replay one account's balance-changing events in chronological order.
///
/// Emits one entry per non-zero contribution: origin `Transaction` when the
/// transaction touched the account directly, origin `Clearing` when the
/// contribution arrived through a clearing pot (named after the entry
/// account the transaction itself credited or debited). Entries are
/// ascending by billed date, ties broken by transaction id; the running
/// balance is a prefix sum whose final value equals the aggregated balance.
pub fn compute_account_balance_history(
    account_id: AccountId,
    balances: &BTreeMap<AccountId, AccountBalance>,
    transactions: &[Transaction],
    effects: &BTreeMap<TransactionId, ResolvedEffect>,
) -> Vec<BalanceHistoryEntry> {
    if !balances.contains_key(&account_id) {
        return Vec::new();
    }

    let mut changes: Vec<(NaiveDate, TransactionId, BalanceChangeOrigin, Decimal)> = Vec::new();
    for transaction in transactions {
        if transaction.is_wip {
            continue;
        }
        let Some(effect) = effects.get(&transaction.id) else {
            continue;
        };

        if let Some(&delta) = effect.direct.get(&account_id) {
            if !delta.is_zero() {
                changes.push((
                    transaction.billed_at,
                    transaction.id,
                    BalanceChangeOrigin::Transaction(transaction.id),
                    delta,
                ));
            }
        }
        for (&clearing, landed) in &effect.via_clearing {
            if let Some(&delta) = landed.get(&account_id) {
                if !delta.is_zero() {
                    changes.push((
                        transaction.billed_at,
                        transaction.id,
                        BalanceChangeOrigin::Clearing(clearing),
                        delta,
                    ));
                }
            }
        }
    }

    // Stable sort keeps a transaction's direct entry ahead of its clearing
    // entries when dates and ids tie.
    changes.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    let mut running = Decimal::ZERO;
    changes
        .into_iter()
        .map(|(date, _, change_origin, delta)| {
            running += delta;
            BalanceHistoryEntry {
                date,
                balance: running,
                change_origin,
            }
        })
        .collect()
}
