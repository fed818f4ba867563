//! Portico Kernel Library
//!
//! Locale-aware access gate for web applications, plus the kernel routes the
//! `portico` binary serves behind it. The gate is host-agnostic: embed
//! [`AccessGate`] directly, or use [`app`] to get an axum router with the gate
//! already in front.

pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod session;
pub mod state;

use axum::Router;

pub use config::Config;
pub use error::{AppError, AppResult, ConfigError};
pub use middleware::{
    AccessGate, GateConfig, GateDecision, LocaleSet, PrefixStrategy, PublicPaths, RedirectReason,
    ResolvedLocale, RouteClass,
};
pub use session::{JwtSessionValidator, SessionClaims, SessionValidator};
pub use state::AppState;

/// Build the application router with the access gate in front.
///
/// The kernel routes are mounted as the fallback service of an otherwise
/// empty router so the gate runs before routing and locale rewrites are
/// routed on the rewritten path.
pub fn app(state: AppState) -> Router {
    let routes = routes::router().with_state(state.clone());

    Router::new()
        .fallback_service(routes)
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::access_gate,
        ))
}
