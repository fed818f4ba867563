//! Session gate for protected paths.
//!
//! Asks the [`SessionValidator`] whether the request carries a valid session
//! and, when it does not, builds the sign-in redirect that brings the user
//! back to where they were going.

use std::sync::Arc;

use axum::http::{HeaderMap, Uri};

use crate::session::{SessionClaims, SessionValidator};

/// Query parameter carrying the post-sign-in destination.
pub const CALLBACK_PARAM: &str = "callbackUrl";

/// Gate in front of protected paths.
#[derive(Clone)]
pub struct SessionGate {
    validator: Arc<dyn SessionValidator>,
    sign_in_path: String,
}

impl SessionGate {
    pub fn new(validator: Arc<dyn SessionValidator>, sign_in_path: impl Into<String>) -> Self {
        Self {
            validator,
            sign_in_path: sign_in_path.into(),
        }
    }

    pub fn sign_in_path(&self) -> &str {
        &self.sign_in_path
    }

    /// Claims of the session carried by `headers`, if it is valid.
    ///
    /// Takes headers only, so the gate's future stays `Send`.
    pub async fn check(&self, headers: &HeaderMap) -> Option<SessionClaims> {
        self.validator.validate(headers).await
    }

    pub async fn has_session(&self, headers: &HeaderMap) -> bool {
        self.check(headers).await.is_some()
    }

    /// Location of the sign-in redirect for a request to `uri`.
    ///
    /// The original path and query are percent-encoded into `callbackUrl`.
    pub fn sign_in_location(&self, uri: &Uri) -> String {
        let destination = uri.path_and_query().map_or("/", |pq| pq.as_str());
        let separator = if self.sign_in_path.contains('?') {
            '&'
        } else {
            '?'
        };

        format!(
            "{}{separator}{CALLBACK_PARAM}={}",
            self.sign_in_path,
            urlencoding::encode(destination)
        )
    }
}
