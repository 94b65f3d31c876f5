//! HTTP route handlers.

pub mod admin;
pub mod catalog;
pub mod health;
pub mod material;
pub mod profile;
pub mod progress;

use axum::Router;

use crate::state::AppState;

/// All application routes, without middleware layers.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(catalog::router())
        .merge(profile::router())
        .merge(material::router())
        .merge(progress::router())
        .merge(admin::router())
}
