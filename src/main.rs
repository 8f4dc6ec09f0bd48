use anyhow::Result;
use clap::Parser;
use std::collections::BTreeMap;

use splitledger::cli::{Cli, Command};
use splitledger::snapshot::{GroupSnapshot, load_snapshot};
use splitledger::{
    AccountId, AccountRegistry, Fault, Transaction, collect_tags, compute_account_balance_history,
    compute_account_balances, transaction_matches, transaction_sort_func,
};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Balance(args) => {
            let GroupSnapshot {
                accounts,
                transactions,
                positions,
            } = load_snapshot(&args.snapshot)?;
            let registry = AccountRegistry::new(accounts);
            let computation = compute_account_balances(&registry, &transactions, &positions);
            report_faults(&computation.faults);

            println!("id\tname\tpaid\tconsumed\tbalance");
            for account in registry.iter() {
                let balance = computation
                    .balances
                    .get(&account.id)
                    .copied()
                    .unwrap_or_default();
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    account.id,
                    account.name,
                    balance.total_paid,
                    balance.total_consumed,
                    balance.balance
                );
            }
        }
        Command::History(args) => {
            let GroupSnapshot {
                accounts,
                transactions,
                positions,
            } = load_snapshot(&args.snapshot)?;
            let registry = AccountRegistry::new(accounts);
            let computation = compute_account_balances(&registry, &transactions, &positions);
            report_faults(&computation.faults);

            let history = compute_account_balance_history(
                AccountId(args.account_id),
                &computation.balances,
                &transactions,
                &computation.effects,
            );
            if history.is_empty() {
                println!("(no history)");
                return Ok(());
            }
            println!("date\tbalance\torigin");
            for entry in history {
                println!("{}\t{}\t{}", entry.date, entry.balance, entry.change_origin);
            }
        }
        Command::Transactions(args) => {
            let GroupSnapshot {
                accounts,
                transactions,
                positions,
            } = load_snapshot(&args.snapshot)?;
            let registry = AccountRegistry::new(accounts);
            let computation = compute_account_balances(&registry, &transactions, &positions);
            report_faults(&computation.faults);

            let account_names: BTreeMap<AccountId, String> = registry
                .iter()
                .map(|account| (account.id, account.name.clone()))
                .collect();
            let term = args.search.as_deref().unwrap_or("");

            let mut listed: Vec<&Transaction> = transactions
                .iter()
                .filter(|t| {
                    transaction_matches(
                        t,
                        computation.effects.get(&t.id),
                        &account_names,
                        &args.tags,
                        term,
                    )
                })
                .collect();
            let compare = transaction_sort_func(args.sort);
            listed.sort_by(|a, b| compare(a, b));

            if listed.is_empty() {
                println!("(no transactions)");
                return Ok(());
            }
            println!("id\tbilled_at\tkind\tname\tvalue");
            for t in listed {
                println!("{}\t{}\t{}\t{}\t{}", t.id, t.billed_at, t.kind, t.name, t.value);
            }
        }
        Command::Tags(args) => {
            let GroupSnapshot {
                accounts,
                transactions,
                ..
            } = load_snapshot(&args.snapshot)?;
            let registry = AccountRegistry::new(accounts);
            let tags = collect_tags(&registry, &transactions);
            if tags.is_empty() {
                println!("(no tags)");
                return Ok(());
            }
            for tag in tags {
                println!("{tag}");
            }
        }
        Command::Check(args) => {
            let GroupSnapshot {
                accounts,
                transactions,
                positions,
            } = load_snapshot(&args.snapshot)?;
            let registry = AccountRegistry::new(accounts);
            let computation = compute_account_balances(&registry, &transactions, &positions);
            if computation.faults.is_empty() {
                println!("ok");
                return Ok(());
            }
            report_faults(&computation.faults);
            std::process::exit(1);
        }
    }

    Ok(())
}

fn report_faults(faults: &[Fault]) {
    for fault in faults {
        eprintln!("fault: {fault}");
    }
}
