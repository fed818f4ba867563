//! Application state shared across all handlers.

use std::sync::Arc;

use crate::config::Config;
use crate::error::ConfigError;
use crate::metrics::Metrics;
use crate::middleware::AccessGate;
use crate::session::{JwtSessionValidator, SessionValidator};

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Startup configuration.
    config: Config,

    /// Access gate run in front of every route.
    gate: AccessGate,

    /// Prometheus metrics.
    metrics: Metrics,
}

impl AppState {
    /// Build state with the JWT session validator keyed by `AUTH_SECRET`.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let validator =
            JwtSessionValidator::new(config.auth_secret.as_bytes(), &config.session_cookie);
        Self::with_validator(config, Arc::new(validator))
    }

    /// Build state with a custom session validator.
    pub fn with_validator(
        config: &Config,
        validator: Arc<dyn SessionValidator>,
    ) -> Result<Self, ConfigError> {
        let gate = AccessGate::new(config.gate_config()?, validator);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config: config.clone(),
                gate,
                metrics: Metrics::new(),
            }),
        })
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn gate(&self) -> &AccessGate {
        &self.inner.gate
    }

    pub fn metrics(&self) -> &Metrics {
        &self.inner.metrics
    }
}
