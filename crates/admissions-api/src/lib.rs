//! JSON REST API for admissions records.
//!
//! Exposes an axum [`Router`] backed by any
//! [`admissions_core::store::AdmissionsStore`]. Serving the media directory,
//! TLS, and auth are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", admissions_api::api_router(store.clone(), media.clone()))
//! ```

pub mod applicants;
pub mod applications;
pub mod error;
pub mod extract;
pub mod media;
pub mod payload;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use admissions_core::store::AdmissionsStore;
use axum::{Router, routing::get};

pub use error::ApiError;
pub use media::MediaStore;

/// Shared handler state.
pub struct AppState<S> {
  pub store: Arc<S>,
  pub media: Arc<MediaStore>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), media: Arc::clone(&self.media) }
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, media: Arc<MediaStore>) -> Router<()>
where
  S: AdmissionsStore + 'static,
{
  Router::new()
    // Applicants
    .route("/applicants", get(applicants::list::<S>).post(applicants::create::<S>))
    .route(
      "/applicants/{id}",
      get(applicants::get_one::<S>)
        .put(applicants::replace::<S>)
        .patch(applicants::patch::<S>)
        .delete(applicants::delete::<S>),
    )
    // Applications
    .route("/applications", get(applications::list::<S>).post(applications::create::<S>))
    .route("/applications/summary", get(applications::summary::<S>))
    .route(
      "/applications/{id}",
      get(applications::get_one::<S>)
        .put(applications::replace::<S>)
        .patch(applications::patch::<S>)
        .delete(applications::delete::<S>),
    )
    .with_state(AppState { store, media })
}
