use crate::domain::{Account, Position, Transaction};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A consistent point-in-time view of one group, assembled by the
/// surrounding application and handed to the engine as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSnapshot {
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub positions: Vec<Position>,
}

pub fn load_snapshot(path: &Path) -> Result<GroupSnapshot> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let snapshot: GroupSnapshot = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(snapshot)
}
