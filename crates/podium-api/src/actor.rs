//! The acting user of a request.
//!
//! Authentication happens upstream; the identity layer forwards the
//! verified user id in the `x-actor-id` header and this crate trusts it.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::ApiError;

pub const ACTOR_HEADER: &str = "x-actor-id";

/// Extractor for the verified actor id. Rejects with
/// [`ApiError::MissingActor`] when the header is absent or not a UUID.
#[derive(Debug, Clone, Copy)]
pub struct Actor(pub Uuid);

impl<S: Send + Sync> FromRequestParts<S> for Actor {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    parts
      .headers
      .get(ACTOR_HEADER)
      .and_then(|v| v.to_str().ok())
      .and_then(|v| Uuid::parse_str(v.trim()).ok())
      .map(Actor)
      .ok_or(ApiError::MissingActor)
  }
}
