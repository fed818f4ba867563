//! HTTP route handlers.

pub mod fallback;
pub mod health;
pub mod metrics;
pub mod seo;

use axum::Router;

use crate::state::AppState;

/// All kernel routes, with the JSON fallback for everything else.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(metrics::router())
        .merge(seo::router())
        .fallback(fallback::not_found)
}
