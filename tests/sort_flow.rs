use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use splitledger::{
    Account, AccountId, AccountKind, AccountRegistry, Transaction, TransactionId, TransactionKind,
    TransactionSortMode, collect_tags, compute_account_balances, transaction_matches,
    transaction_sort_func,
};
use std::collections::BTreeMap;

fn dec(raw: &str) -> Decimal {
    raw.parse().expect("decimal literal")
}

fn shares(entries: &[(u32, &str)]) -> BTreeMap<AccountId, Decimal> {
    entries
        .iter()
        .map(|(id, weight)| (AccountId(*id), dec(weight)))
        .collect()
}

fn personal(id: u32, name: &str) -> Account {
    Account {
        id: AccountId(id),
        name: name.to_string(),
        description: String::new(),
        tags: Vec::new(),
        kind: AccountKind::Personal,
    }
}

fn transaction(id: u32, name: &str, day: u32, value: &str, tags: &[&str]) -> Transaction {
    Transaction {
        id: TransactionId(id),
        kind: TransactionKind::Purchase,
        name: name.to_string(),
        description: String::new(),
        value: dec(value),
        billed_at: NaiveDate::from_ymd_opt(2026, 3, day).expect("date"),
        last_changed: Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap(),
        creditor_shares: shares(&[(1, "1")]),
        debitor_shares: shares(&[(2, "1")]),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        is_wip: false,
    }
}

fn sorted_ids(mut transactions: Vec<Transaction>, mode: TransactionSortMode) -> Vec<u32> {
    let compare = transaction_sort_func(mode);
    transactions.sort_by(|a, b| compare(a, b));
    transactions.into_iter().map(|t| t.id.0).collect()
}

#[test]
fn name_sorts_ascending_case_insensitively() {
    let transactions = vec![
        transaction(1, "zebra", 1, "10", &[]),
        transaction(2, "Apple", 2, "20", &[]),
        transaction(3, "mango", 3, "30", &[]),
    ];
    assert_eq!(sorted_ids(transactions, TransactionSortMode::Name), vec![2, 3, 1]);
}

#[test]
fn billed_at_sorts_newest_first_with_id_tiebreak() {
    let transactions = vec![
        transaction(4, "a", 5, "10", &[]),
        transaction(2, "b", 9, "20", &[]),
        transaction(3, "c", 5, "30", &[]),
    ];
    assert_eq!(
        sorted_ids(transactions, TransactionSortMode::BilledAt),
        vec![2, 3, 4]
    );
}

#[test]
fn value_sorts_largest_first() {
    let transactions = vec![
        transaction(1, "a", 1, "10", &[]),
        transaction(2, "b", 2, "99.99", &[]),
        transaction(3, "c", 3, "50", &[]),
    ];
    assert_eq!(
        sorted_ids(transactions, TransactionSortMode::Value),
        vec![2, 3, 1]
    );
}

#[test]
fn last_changed_sorts_most_recent_first() {
    let transactions = vec![
        transaction(1, "a", 3, "10", &[]),
        transaction(2, "b", 27, "20", &[]),
        transaction(3, "c", 14, "30", &[]),
    ];
    assert_eq!(
        sorted_ids(transactions, TransactionSortMode::LastChanged),
        vec![2, 3, 1]
    );
}

#[test]
fn tags_are_collected_from_transactions_and_clearing_accounts() {
    let mut pot = personal(10, "pot");
    pot.kind = AccountKind::Clearing {
        shares: shares(&[(1, "1")]),
    };
    pot.tags = vec!["Trip".to_string()];
    let mut ignored = personal(1, "A");
    ignored.tags = vec!["personal-tag".to_string()];

    let registry = AccountRegistry::new([ignored, personal(2, "B"), pot]);
    let transactions = vec![
        transaction(1, "a", 1, "10", &["food", "Trip"]),
        transaction(2, "b", 2, "20", &["drinks"]),
    ];

    let tags = collect_tags(&registry, &transactions);
    assert_eq!(tags, vec!["drinks", "food", "Trip"]);
}

#[test]
fn tag_filter_requires_every_tag() {
    let names = BTreeMap::new();
    let t = transaction(1, "groceries", 1, "10", &["food", "market"]);

    assert!(transaction_matches(&t, None, &names, &[], ""));
    assert!(transaction_matches(&t, None, &names, &["food".into()], ""));
    assert!(!transaction_matches(
        &t,
        None,
        &names,
        &["food".into(), "drinks".into()],
        ""
    ));
}

#[test]
fn search_matches_names_dates_values_and_involved_accounts() {
    let registry = AccountRegistry::new([personal(1, "Anna"), personal(2, "Berta")]);
    let transactions = vec![transaction(1, "Groceries", 14, "42.50", &[])];
    let computation = compute_account_balances(&registry, &transactions, &[]);

    let names: BTreeMap<AccountId, String> = registry
        .iter()
        .map(|a| (a.id, a.name.clone()))
        .collect();
    let effect = computation.effects.get(&TransactionId(1));
    let t = &transactions[0];

    assert!(transaction_matches(t, effect, &names, &[], "grocer"));
    assert!(transaction_matches(t, effect, &names, &[], "2026-03-14"));
    assert!(transaction_matches(t, effect, &names, &[], "42.5"));
    assert!(transaction_matches(t, effect, &names, &[], "berta"));
    assert!(!transaction_matches(t, effect, &names, &[], "nowhere"));
}
