use crate::domain::{Account, AccountId, AccountRegistry, Fault};
use crate::effect::BalanceEffect;
use crate::split::split_value;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};

/// One transaction's effect after pushing clearing-held deltas down onto
/// personal accounts, keeping the attribution needed for history entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedEffect {
    /// Deltas that landed directly on an account, plus deltas stuck on a
    /// faulted clearing account (cycle, empty shares) so money is conserved.
    pub direct: BTreeMap<AccountId, Decimal>,
    /// Entry clearing account -> personal account -> delta routed through it.
    pub via_clearing: BTreeMap<AccountId, BTreeMap<AccountId, Decimal>>,
}

impl ResolvedEffect {
    /// Total delta for one account, direct and routed combined.
    pub fn delta(&self, account: AccountId) -> Decimal {
        let direct = self.direct.get(&account).copied().unwrap_or(Decimal::ZERO);
        let routed: Decimal = self
            .via_clearing
            .values()
            .filter_map(|landed| landed.get(&account))
            .copied()
            .sum();
        direct + routed
    }

    /// Every account this effect touches, entry clearing accounts included.
    pub fn accounts(&self) -> BTreeSet<AccountId> {
        let mut out: BTreeSet<AccountId> = self.direct.keys().copied().collect();
        for (&clearing, landed) in &self.via_clearing {
            out.insert(clearing);
            out.extend(landed.keys().copied());
        }
        out
    }

    /// All deltas merged into one map, attribution dropped.
    pub fn flattened(&self) -> BTreeMap<AccountId, Decimal> {
        let mut out = self.direct.clone();
        for landed in self.via_clearing.values() {
            for (&account, &delta) in landed {
                *out.entry(account).or_insert(Decimal::ZERO) += delta;
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.direct.is_empty() && self.via_clearing.is_empty()
    }
}

/// Redistributes clearing-account deltas onto the personal accounts behind
/// them. Built once per registry; cycle detection runs up front so every
/// later resolution is a straight walk down a DAG.
#[derive(Debug)]
pub struct ClearingResolver<'a> {
    registry: &'a AccountRegistry,
    /// Clearing accounts that sit on a share cycle or can reach one.
    cyclic: BTreeSet<AccountId>,
}

impl<'a> ClearingResolver<'a> {
    pub fn new(registry: &'a AccountRegistry) -> Self {
        let mut cyclic = BTreeSet::new();
        let mut safe = BTreeSet::new();
        for account in registry.clearing_accounts() {
            let mut path = BTreeSet::new();
            reaches_cycle(registry, account.id, &mut path, &mut cyclic, &mut safe);
        }
        Self { registry, cyclic }
    }

    /// Clearing accounts excluded from resolution because of a cycle.
    pub fn cyclic_accounts(&self) -> impl Iterator<Item = AccountId> + '_ {
        self.cyclic.iter().copied()
    }

    /// Resolve a raw balance effect so that every delta lands on a personal
    /// account, collecting structural faults along the way. Faulted deltas
    /// stay on their clearing account rather than being dropped.
    pub fn resolve(&self, effect: &BalanceEffect) -> (ResolvedEffect, Vec<Fault>) {
        let mut out = ResolvedEffect::default();
        let mut faults = Vec::new();
        let max_hops = self.registry.len().max(1);

        for (&account, &delta) in effect {
            if delta.is_zero() {
                continue;
            }
            let is_clearing = self
                .registry
                .get(account)
                .is_some_and(Account::is_clearing);
            if is_clearing {
                self.push_down(account, delta, max_hops, &mut out, &mut faults);
            } else {
                *out.direct.entry(account).or_insert(Decimal::ZERO) += delta;
            }
        }

        (out, faults)
    }

    fn push_down(
        &self,
        entry: AccountId,
        delta: Decimal,
        max_hops: usize,
        out: &mut ResolvedEffect,
        faults: &mut Vec<Fault>,
    ) {
        if self.cyclic.contains(&entry) {
            faults.push(Fault::ClearingCycle { account: entry });
            *out.direct.entry(entry).or_insert(Decimal::ZERO) += delta;
            return;
        }

        let mut pending: BTreeMap<AccountId, Decimal> = BTreeMap::from([(entry, delta)]);
        let mut hops = 0;
        while !pending.is_empty() {
            if hops >= max_hops {
                faults.push(Fault::ClearingDepthExceeded {
                    account: entry,
                    max_hops,
                });
                for (holder, rest) in pending {
                    *out.direct.entry(holder).or_insert(Decimal::ZERO) += rest;
                }
                return;
            }
            hops += 1;

            let mut next: BTreeMap<AccountId, Decimal> = BTreeMap::new();
            for (holder, amount) in pending {
                let shares = self
                    .registry
                    .get(holder)
                    .and_then(Account::clearing_shares)
                    .cloned()
                    .unwrap_or_default();

                let mut known: BTreeMap<AccountId, Decimal> = BTreeMap::new();
                let mut dropped_targets = false;
                for (&target, &weight) in &shares {
                    if self.registry.contains(target) {
                        known.insert(target, weight);
                    } else {
                        dropped_targets = true;
                        faults.push(Fault::UnknownShareTarget {
                            clearing: holder,
                            target,
                        });
                    }
                }

                match split_value(amount, &known) {
                    Some(parts) => {
                        for (target, part) in parts {
                            if part.is_zero() {
                                continue;
                            }
                            let target_is_clearing = self
                                .registry
                                .get(target)
                                .is_some_and(Account::is_clearing);
                            if target_is_clearing {
                                *next.entry(target).or_insert(Decimal::ZERO) += part;
                            } else {
                                *out.via_clearing
                                    .entry(entry)
                                    .or_default()
                                    .entry(target)
                                    .or_insert(Decimal::ZERO) += part;
                            }
                        }
                    }
                    None => {
                        // Nothing distributable: either the shares were
                        // empty/zero-weight, or every target was unknown
                        // (already reported above).
                        if !dropped_targets {
                            faults.push(Fault::EmptyClearingShares { account: holder });
                        }
                        *out.direct.entry(holder).or_insert(Decimal::ZERO) += amount;
                    }
                }
            }
            pending = next;
        }
    }
}

/// Depth-first walk over clearing-share edges. Marks accounts that are on
/// a cycle or can reach one; `safe` memoizes fully explored cycle-free
/// accounts so the walk is linear over the share graph.
fn reaches_cycle(
    registry: &AccountRegistry,
    id: AccountId,
    path: &mut BTreeSet<AccountId>,
    cyclic: &mut BTreeSet<AccountId>,
    safe: &mut BTreeSet<AccountId>,
) -> bool {
    if cyclic.contains(&id) {
        return true;
    }
    if safe.contains(&id) {
        return false;
    }
    if !path.insert(id) {
        cyclic.insert(id);
        return true;
    }

    let mut reaches = false;
    if let Some(shares) = registry.get(id).and_then(Account::clearing_shares) {
        for &target in shares.keys() {
            let target_is_clearing = registry.get(target).is_some_and(Account::is_clearing);
            if target_is_clearing && reaches_cycle(registry, target, path, cyclic, safe) {
                reaches = true;
            }
        }
    }

    path.remove(&id);
    if reaches {
        cyclic.insert(id);
    } else {
        safe.insert(id);
    }
    reaches
}
