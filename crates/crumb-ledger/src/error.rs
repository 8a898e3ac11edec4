//! Error type for `crumb-ledger`.

use crumb_core::movement::MovementType;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  /// A business-rule or validation failure; nothing was written.
  #[error(transparent)]
  Core(#[from] crumb_core::Error),

  #[error("store error: {0}")]
  Store(#[source] BoxError),

  #[error("catalog error: {0}")]
  Catalog(#[source] BoxError),

  #[error("sales feed error: {0}")]
  Feed(#[source] BoxError),

  /// The record change was committed but its movement could not be
  /// appended. The audit trail is missing this entry.
  #[error("{key}: change committed but its {kind} movement was not recorded: {source}")]
  AuditAppend {
    key:    String,
    kind:   MovementType,
    #[source]
    source: BoxError,
  },
}

impl Error {
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }

  pub fn catalog(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Catalog(Box::new(e))
  }

  pub fn feed(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Feed(Box::new(e))
  }

  /// The domain error, if this is one.
  pub fn as_core(&self) -> Option<&crumb_core::Error> {
    match self {
      Self::Core(e) => Some(e),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
