use crate::sort::TransactionSortMode;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "splitledger")]
#[command(about = "Shared-expense balance engine", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Final balance per account.
    Balance(BalanceArgs),
    /// Chronological balance history for one account.
    History(HistoryArgs),
    /// Sorted, filtered transaction listing.
    Transactions(TransactionsArgs),
    /// Tag universe of the group.
    Tags(TagsArgs),
    /// Report diagnostics; exits non-zero when any fault exists.
    Check(CheckArgs),
}

#[derive(Debug, Args)]
pub struct BalanceArgs {
    /// Path to a group snapshot (JSON).
    pub snapshot: PathBuf,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    pub snapshot: PathBuf,

    /// Account to replay.
    pub account_id: u32,
}

#[derive(Debug, Args)]
pub struct TransactionsArgs {
    pub snapshot: PathBuf,

    #[arg(long, value_enum, default_value = "billed-at")]
    pub sort: TransactionSortMode,

    /// Require each given tag to be present.
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Free-text search over names, descriptions, dates, values and
    /// involved account names.
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Debug, Args)]
pub struct TagsArgs {
    pub snapshot: PathBuf,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    pub snapshot: PathBuf,
}
