//! JSON REST API for Podium.
//!
//! Exposes an axum [`Router`] backed by any
//! [`podium_core::store::ClinicalStore`]. Authentication and TLS are the
//! caller's responsibility; write endpoints expect the verified user id in
//! the [`actor::ACTOR_HEADER`] header.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", podium_api::api_router(store.clone()))
//! ```

pub mod actor;
pub mod athletes;
pub mod disciplines;
pub mod encounters;
pub mod error;
pub mod tracking;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use podium_core::store::ClinicalStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: ClinicalStore + 'static,
{
  Router::new()
    // Disciplines
    .route("/disciplines", get(disciplines::list::<S>).post(disciplines::create::<S>))
    // Athletes
    .route("/athletes", get(athletes::list::<S>).post(athletes::create::<S>))
    .route("/athletes/{id}", get(athletes::get_one::<S>).put(athletes::update::<S>))
    .route("/athletes/{id}/history", get(athletes::history::<S>))
    // Encounters
    .route("/encounters", get(encounters::list::<S>).post(encounters::create::<S>))
    .route("/encounters/{id}", get(encounters::get_one::<S>))
    // Tracking records
    .route("/tracking/{kind}", post(tracking::create::<S>))
    .route("/tracking/{kind}/{athlete_id}", get(tracking::list::<S>))
    .with_state(store)
}
