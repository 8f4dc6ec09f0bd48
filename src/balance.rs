use crate::clearing::{ClearingResolver, ResolvedEffect};
use crate::domain::{AccountBalance, AccountId, AccountRegistry, Fault, Position, Transaction, TransactionId};
use crate::effect::{check_references, transaction_effect};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Best-effort result of folding a whole snapshot: final balances, the
/// per-transaction resolved effects (input to the history builder), and
/// every fault encountered on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BalanceComputation {
    pub balances: BTreeMap<AccountId, AccountBalance>,
    pub effects: BTreeMap<TransactionId, ResolvedEffect>,
    pub faults: Vec<Fault>,
}

pub fn positions_by_transaction(
    positions: &[Position],
) -> BTreeMap<TransactionId, Vec<&Position>> {
    let mut out: BTreeMap<TransactionId, Vec<&Position>> = BTreeMap::new();
    for position in positions {
        out.entry(position.transaction_id).or_default().push(position);
    }
    out
}

/// Fold all committed transactions into per-account totals.
///
/// Each transaction's effect is resolved independently (rounding residuals
/// never carry across transactions) and routed through the clearing
/// resolver, so the result is deterministic regardless of processing
/// order. A faulty transaction is excluded and reported, never fatal.
pub fn compute_account_balances(
    registry: &AccountRegistry,
    transactions: &[Transaction],
    positions: &[Position],
) -> BalanceComputation {
    let by_transaction = positions_by_transaction(positions);
    let resolver = ClearingResolver::new(registry);

    let mut balances: BTreeMap<AccountId, AccountBalance> = registry
        .iter()
        .map(|account| (account.id, AccountBalance::default()))
        .collect();
    let mut effects = BTreeMap::new();
    let mut faults: Vec<Fault> = Vec::new();

    for transaction in transactions {
        if transaction.is_wip {
            continue;
        }
        let txn_positions = by_transaction
            .get(&transaction.id)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        if let Err(fault) = check_references(registry, transaction, txn_positions) {
            faults.push(fault);
            continue;
        }

        let effect = match transaction_effect(transaction, txn_positions) {
            Ok(effect) => effect,
            Err(fault) => {
                faults.push(fault);
                continue;
            }
        };

        let (resolved, resolution_faults) = resolver.resolve(&effect);
        for fault in resolution_faults {
            if !faults.contains(&fault) {
                faults.push(fault);
            }
        }

        for (account, delta) in resolved.flattened() {
            let entry = balances.entry(account).or_default();
            if delta > Decimal::ZERO {
                entry.total_paid += delta;
            } else {
                entry.total_consumed -= delta;
            }
        }

        effects.insert(transaction.id, resolved);
    }

    for balance in balances.values_mut() {
        balance.balance = balance.total_paid - balance.total_consumed;
    }

    BalanceComputation {
        balances,
        effects,
        faults,
    }
}
