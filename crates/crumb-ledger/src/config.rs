//! Tunables for the ledger engines.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
  /// Read-validate-write attempts before giving up with
  /// `ConcurrentModification`.
  pub max_commit_attempts: u32,
}

impl Default for LedgerConfig {
  fn default() -> Self { Self { max_commit_attempts: 8 } }
}
