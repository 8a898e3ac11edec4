//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("missing or invalid actor headers")]
  Unauthorized,

  #[error("{0} may not do this")]
  Forbidden(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Ledger(#[from] crumb_ledger::Error),
}

impl From<crumb_core::Error> for ApiError {
  fn from(e: crumb_core::Error) -> Self { Self::Ledger(e.into()) }
}

impl ApiError {
  fn status_and_kind(&self) -> (StatusCode, &'static str) {
    use crumb_core::Error as Core;
    use crumb_ledger::Error as Ledger;

    match self {
      Self::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
      Self::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
      Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
      Self::Ledger(Ledger::Core(e)) => {
        let status = match e {
          Core::Validation(_) | Core::VarianceRemarksRequired { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
          }
          Core::InsufficientStock { .. }
          | Core::ReversalNotAllowed { .. }
          | Core::ConcurrentModification { .. } => StatusCode::CONFLICT,
          Core::RecordNotFound(_) => StatusCode::NOT_FOUND,
          Core::InvariantViolation(_) | Core::UnknownValue { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
          }
        };
        (status, e.kind())
      }
      Self::Ledger(Ledger::Store(_)) => (StatusCode::INTERNAL_SERVER_ERROR, "store"),
      Self::Ledger(Ledger::Catalog(_)) => {
        (StatusCode::INTERNAL_SERVER_ERROR, "catalog")
      }
      Self::Ledger(Ledger::Feed(_)) => (StatusCode::INTERNAL_SERVER_ERROR, "feed"),
      Self::Ledger(Ledger::AuditAppend { .. }) => {
        (StatusCode::INTERNAL_SERVER_ERROR, "audit_append")
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, kind) = self.status_and_kind();
    if status.is_server_error() {
      tracing::error!(error = %self, kind, "request failed");
    }
    (status, Json(json!({ "error": self.to_string(), "kind": kind })))
      .into_response()
  }
}

pub type ApiResult<T> = Result<T, ApiError>;
