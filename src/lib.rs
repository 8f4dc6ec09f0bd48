pub mod balance;
pub mod clearing;
pub mod cli;
pub mod domain;
pub mod effect;
pub mod history;
pub mod snapshot;
pub mod sort;
pub mod split;

pub use balance::{BalanceComputation, compute_account_balances, positions_by_transaction};
pub use clearing::{ClearingResolver, ResolvedEffect};
pub use domain::*;
pub use effect::{BalanceEffect, check_references, transaction_effect};
pub use history::compute_account_balance_history;
pub use snapshot::{GroupSnapshot, load_snapshot};
pub use sort::{TransactionSortMode, collect_tags, transaction_matches, transaction_sort_func};
pub use split::{CURRENCY_DP, split_positions, split_value};
