use crate::clearing::ResolvedEffect;
use crate::domain::{AccountId, AccountRegistry, Transaction};
use clap::ValueEnum;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransactionSortMode {
    Name,
    BilledAt,
    LastChanged,
    Value,
}

/// Comparison function for a sort mode. Name sorts ascending
/// case-insensitively; dates, change timestamps and values sort newest or
/// largest first. All modes fall back to ascending transaction id so the
/// order is total and deterministic.
pub fn transaction_sort_func(
    mode: TransactionSortMode,
) -> fn(&Transaction, &Transaction) -> Ordering {
    match mode {
        TransactionSortMode::Name => by_name,
        TransactionSortMode::BilledAt => by_billed_at,
        TransactionSortMode::LastChanged => by_last_changed,
        TransactionSortMode::Value => by_value,
    }
}

fn by_name(a: &Transaction, b: &Transaction) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.id.cmp(&b.id))
}

fn by_billed_at(a: &Transaction, b: &Transaction) -> Ordering {
    b.billed_at.cmp(&a.billed_at).then_with(|| a.id.cmp(&b.id))
}

fn by_last_changed(a: &Transaction, b: &Transaction) -> Ordering {
    b.last_changed
        .cmp(&a.last_changed)
        .then_with(|| a.id.cmp(&b.id))
}

fn by_value(a: &Transaction, b: &Transaction) -> Ordering {
    b.value.cmp(&a.value).then_with(|| a.id.cmp(&b.id))
}

/// The tag universe of a group: transaction tags plus clearing-account
/// tags, deduplicated and sorted case-insensitively.
pub fn collect_tags(registry: &AccountRegistry, transactions: &[Transaction]) -> Vec<String> {
    let mut set: BTreeSet<String> = transactions
        .iter()
        .flat_map(|t| t.tags.iter().cloned())
        .collect();
    for account in registry.clearing_accounts() {
        set.extend(account.tags.iter().cloned());
    }
    let mut tags: Vec<String> = set.into_iter().collect();
    tags.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()));
    tags
}

/// List-view filter: every requested tag must be present, and a non-empty
/// search term must match the name, description, either date, the value,
/// or the name of any account the transaction's effect touches.
pub fn transaction_matches(
    transaction: &Transaction,
    effect: Option<&ResolvedEffect>,
    account_names: &BTreeMap<AccountId, String>,
    tags: &[String],
    term: &str,
) -> bool {
    for tag in tags {
        if !transaction.tags.iter().any(|t| t == tag) {
            return false;
        }
    }

    if term.is_empty() {
        return true;
    }
    let term = term.to_lowercase();

    if transaction.name.to_lowercase().contains(&term)
        || transaction.description.to_lowercase().contains(&term)
        || transaction.billed_at.to_string().contains(&term)
        || transaction.last_changed.date_naive().to_string().contains(&term)
        || transaction.value.to_string().contains(&term)
    {
        return true;
    }

    let Some(effect) = effect else {
        return false;
    };
    effect.accounts().iter().any(|id| {
        account_names
            .get(id)
            .is_some_and(|name| name.to_lowercase().contains(&term))
    })
}
