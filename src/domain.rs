use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionId(pub u32);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccountKind {
    Personal,
    Clearing {
        /// Relative redistribution weights: target account -> weight.
        /// Weights need not sum to 1; they are normalized on distribution.
        #[serde(default, deserialize_with = "deserialize_account_id_map")]
        shares: BTreeMap<AccountId, Decimal>,
    },
}

/// `#[serde(flatten)]` buffers the map with plain string keys, which the
/// derived `BTreeMap<AccountId, _>` deserializer rejects; parse them here.
fn deserialize_account_id_map<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<AccountId, Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = BTreeMap::<String, Decimal>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(key, weight)| {
            key.parse::<u32>()
                .map(|id| (AccountId(id), weight))
                .map_err(|_| {
                    serde::de::Error::invalid_type(
                        serde::de::Unexpected::Str(&key),
                        &"an account id as u32",
                    )
                })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub kind: AccountKind,
}

impl Account {
    pub fn is_clearing(&self) -> bool {
        matches!(self.kind, AccountKind::Clearing { .. })
    }

    pub fn clearing_shares(&self) -> Option<&BTreeMap<AccountId, Decimal>> {
        match &self.kind {
            AccountKind::Clearing { shares } => Some(shares),
            AccountKind::Personal => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Purchase,
    Transfer,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Purchase => write!(f, "purchase"),
            Self::Transfer => write!(f, "transfer"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub kind: TransactionKind,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub value: Decimal,

    /// Financial date used for history ordering.
    pub billed_at: NaiveDate,
    pub last_changed: DateTime<Utc>,

    /// Who paid: account -> relative weight.
    pub creditor_shares: BTreeMap<AccountId, Decimal>,
    /// Who benefits: account -> relative weight.
    pub debitor_shares: BTreeMap<AccountId, Decimal>,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Still being edited; contributes nothing to balances until committed.
    #[serde(default)]
    pub is_wip: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub transaction_id: TransactionId,
    pub name: String,
    pub price: Decimal,

    /// Per-item debitor shares; `None` falls back to the parent
    /// transaction's debitor shares.
    #[serde(default)]
    pub shares: Option<BTreeMap<AccountId, Decimal>>,
}

/// Derived totals for one account. `balance = total_paid - total_consumed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountBalance {
    pub balance: Decimal,
    pub total_paid: Decimal,
    pub total_consumed: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum BalanceChangeOrigin {
    Transaction(TransactionId),
    Clearing(AccountId),
}

impl fmt::Display for BalanceChangeOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transaction(id) => write!(f, "transaction:{id}"),
            Self::Clearing(id) => write!(f, "clearing:{id}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceHistoryEntry {
    pub date: NaiveDate,
    /// Running balance after applying this event.
    pub balance: Decimal,
    pub change_origin: BalanceChangeOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareSide {
    Creditor,
    Debitor,
}

impl fmt::Display for ShareSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Creditor => write!(f, "creditor"),
            Self::Debitor => write!(f, "debitor"),
        }
    }
}

/// Structured diagnostics attributed to the transaction or clearing account
/// that caused them. Faults never abort a computation; the offending record
/// is excluded and the fault reported alongside best-effort results.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Fault {
    #[error("clearing account {account} is part of a share cycle")]
    ClearingCycle { account: AccountId },

    #[error("clearing resolution starting at account {account} did not settle within {max_hops} hops")]
    ClearingDepthExceeded { account: AccountId, max_hops: usize },

    #[error("clearing account {account} holds a balance but has no shares to distribute it")]
    EmptyClearingShares { account: AccountId },

    #[error("transaction {transaction} has no {side} shares to distribute {value}")]
    EmptyShares {
        transaction: TransactionId,
        side: ShareSide,
        value: Decimal,
    },

    #[error("positions of transaction {transaction} total {position_total}, exceeding its value {value}")]
    PositionsExceedValue {
        transaction: TransactionId,
        position_total: Decimal,
        value: Decimal,
    },

    #[error("transaction {transaction} resolves to paid {paid} and consumed {consumed}, expected {value} on both sides")]
    ValueMismatch {
        transaction: TransactionId,
        value: Decimal,
        paid: Decimal,
        consumed: Decimal,
    },

    #[error("transaction {transaction} references unknown account {account}")]
    UnknownAccount {
        transaction: TransactionId,
        account: AccountId,
    },

    #[error("clearing account {clearing} distributes to unknown account {target}")]
    UnknownShareTarget {
        clearing: AccountId,
        target: AccountId,
    },
}

/// Immutable account lookup handed to the engine. Lookups are total:
/// a missing id is an explicit `None`, never a panic.
#[derive(Debug, Clone, Default)]
pub struct AccountRegistry {
    accounts: BTreeMap<AccountId, Account>,
}

impl AccountRegistry {
    pub fn new(accounts: impl IntoIterator<Item = Account>) -> Self {
        Self {
            accounts: accounts.into_iter().map(|a| (a.id, a)).collect(),
        }
    }

    pub fn get(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(&id)
    }

    pub fn contains(&self, id: AccountId) -> bool {
        self.accounts.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    pub fn clearing_accounts(&self) -> impl Iterator<Item = &Account> {
        self.iter().filter(|a| a.is_clearing())
    }
}
