//! Runtime server configuration.
//!
//! Layered from an optional TOML file and `CRUMB_*` environment variables,
//! the latter winning. Nested keys use a double underscore, e.g.
//! `CRUMB_LEDGER__MAX_COMMIT_ATTEMPTS=16`; `CRUMB_SUPERVISORS` is a
//! comma-separated list.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
use crumb_core::external::Product;
use crumb_ledger::LedgerConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:        String,
  pub port:        u16,
  pub store_path:  PathBuf,
  /// Actor ids allowed on supervisor routes.
  pub supervisors: Vec<String>,
  pub ledger:      LedgerConfig,
  /// Products known to the ledger, with the unit cost used for wastage.
  pub catalog:     Vec<Product>,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:        "127.0.0.1".to_string(),
      port:        8080,
      store_path:  PathBuf::from("crumb.db"),
      supervisors: Vec::new(),
      ledger:      LedgerConfig::default(),
      catalog:     Vec::new(),
    }
  }
}

impl ServerConfig {
  /// Read `path` (if it exists) and the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let builder = Config::builder()
      .add_source(File::from(path).required(false))
      .add_source(
        Environment::with_prefix("CRUMB")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true)
          .list_separator(",")
          .with_list_parse_key("supervisors"),
      );
    Self::build(builder)
  }

  fn build(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
    builder
      .build()
      .context("failed to read configuration")?
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

#[cfg(test)]
mod tests {
  use config::FileFormat;
  use rust_decimal::Decimal;

  use super::*;

  fn parse(toml: &str) -> ServerConfig {
    ServerConfig::build(
      Config::builder().add_source(File::from_str(toml, FileFormat::Toml)),
    )
    .unwrap()
  }

  #[test]
  fn empty_file_uses_defaults() {
    let cfg = parse("");
    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert_eq!(cfg.ledger.max_commit_attempts, 8);
    assert!(cfg.catalog.is_empty());
  }

  #[test]
  fn full_file() {
    let cfg = parse(
      r#"
        port = 9000
        store_path = "/var/lib/crumb/ledger.db"
        supervisors = ["ate-rosa"]

        [ledger]
        max_commit_attempts = 3

        [[catalog]]
        product_id = "pandesal"
        name = "Pandesal"
        category = "bread"
        unit_cost = "2.50"
      "#,
    );
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.supervisors, ["ate-rosa"]);
    assert_eq!(cfg.ledger.max_commit_attempts, 3);
    assert_eq!(cfg.catalog[0].product_id.as_str(), "pandesal");
    assert_eq!(cfg.catalog[0].unit_cost, Decimal::new(250, 2));
  }
}
