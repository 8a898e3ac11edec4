//! Request actor extractors.
//!
//! Callers identify themselves with `x-actor-id` (required) and
//! `x-actor-name` (optional, defaults to the id). Authentication itself is
//! the job of whatever sits in front of this API.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, request::Parts},
};
use crumb_core::{
  external::{Actor, Catalog, Identity},
  store::LedgerStore,
};

use crate::{AppState, error::ApiError};

pub const ACTOR_ID: &str = "x-actor-id";
pub const ACTOR_NAME: &str = "x-actor-name";

/// The actor a request is attributed to.
pub struct RequestActor(pub Actor);

/// An actor on the configured supervisor list.
pub struct Supervisor(pub Actor);

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
  headers
    .get(name)
    .and_then(|v| v.to_str().ok())
    .map(str::trim)
    .filter(|v| !v.is_empty())
}

pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, ApiError> {
  let id = header(headers, ACTOR_ID).ok_or(ApiError::Unauthorized)?;
  let name = header(headers, ACTOR_NAME).unwrap_or(id);
  Ok(Actor::new(id, name))
}

impl Identity for RequestActor {
  fn current_actor(&self) -> Actor { self.0.clone() }
}

impl Identity for Supervisor {
  fn current_actor(&self) -> Actor { self.0.clone() }
}

impl<St> FromRequestParts<St> for RequestActor
where
  St: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &St,
  ) -> Result<Self, Self::Rejection> {
    Ok(Self(actor_from_headers(&parts.headers)?))
  }
}

impl<S, C> FromRequestParts<AppState<S, C>> for Supervisor
where
  S: LedgerStore + 'static,
  C: Catalog + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, C>,
  ) -> Result<Self, Self::Rejection> {
    let actor = actor_from_headers(&parts.headers)?;
    if !state.supervisors.contains(&actor.id) {
      tracing::warn!(actor = %actor.id, path = %parts.uri.path(), "supervisor route refused");
      return Err(ApiError::Forbidden(actor.id));
    }
    Ok(Self(actor))
  }
}

#[cfg(test)]
mod tests {
  use axum::{body::Body, http::Request};

  use super::*;

  async fn extract(req: Request<Body>) -> Result<RequestActor, ApiError> {
    let (mut parts, _) = req.into_parts();
    RequestActor::from_request_parts(&mut parts, &()).await
  }

  #[tokio::test]
  async fn id_and_name() {
    let req = Request::builder()
      .header(ACTOR_ID, "cashier-2")
      .header(ACTOR_NAME, "Lorna")
      .body(Body::empty())
      .unwrap();
    let actor = extract(req).await.unwrap().current_actor();
    assert_eq!(actor, Actor::new("cashier-2", "Lorna"));
  }

  #[tokio::test]
  async fn name_defaults_to_id() {
    let req = Request::builder()
      .header(ACTOR_ID, "cashier-2")
      .body(Body::empty())
      .unwrap();
    let actor = extract(req).await.unwrap().current_actor();
    assert_eq!(actor.display_name, "cashier-2");
  }

  #[tokio::test]
  async fn missing_or_blank_id() {
    let req = Request::builder().body(Body::empty()).unwrap();
    assert!(matches!(extract(req).await, Err(ApiError::Unauthorized)));

    let req = Request::builder()
      .header(ACTOR_ID, "   ")
      .body(Body::empty())
      .unwrap();
    assert!(matches!(extract(req).await, Err(ApiError::Unauthorized)));
  }
}
