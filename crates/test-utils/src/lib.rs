//! Portico test utilities.
//!
//! Helpers for integration testing: session token fixtures and a
//! map-backed environment for configuration tests.

use std::collections::HashMap;

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Serialize;

/// Signing secret used by test configurations (32 bytes).
pub const TEST_SECRET: &str = "portico-test-secret-0123456789ab";

/// Session cookie name used by test configurations.
pub const TEST_SESSION_COOKIE: &str = "session-token";

/// Create a session token fixture for `subject`, valid for one hour.
pub fn test_session(subject: &str) -> TestSession {
    let now = chrono::Utc::now().timestamp();
    TestSession {
        sub: subject.to_string(),
        name: None,
        email: None,
        iat: now,
        exp: now + 3600,
    }
}

/// A session token builder for creating test fixtures.
#[derive(Debug, Clone, Serialize)]
pub struct TestSession {
    pub sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

impl TestSession {
    /// Set the display name.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Set the email address.
    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    /// Make the token already expired.
    pub fn expired(mut self) -> Self {
        self.exp = self.iat - 60;
        self
    }

    /// Sign with HS256 using `secret`.
    ///
    /// # Panics
    ///
    /// Panics if encoding fails, which only happens for unserializable claims.
    #[allow(clippy::expect_used)]
    pub fn sign(&self, secret: &str) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("failed to sign test session")
    }

    /// Sign with [`TEST_SECRET`] and format as a `Cookie` header value.
    pub fn cookie(&self) -> String {
        format!("{TEST_SESSION_COOKIE}={}", self.sign(TEST_SECRET))
    }
}

/// A map-backed stand-in for the process environment.
#[derive(Debug, Clone, Default)]
pub struct TestEnv {
    vars: HashMap<String, String>,
}

impl TestEnv {
    /// Minimal environment: just the signing secret.
    pub fn new() -> Self {
        Self::default().set("AUTH_SECRET", TEST_SECRET)
    }

    /// Set a variable.
    pub fn set(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_string(), value.to_string());
        self
    }

    /// Remove a variable.
    pub fn unset(mut self, key: &str) -> Self {
        self.vars.remove(key);
        self
    }

    /// Lookup closure suitable for `Config::from_lookup`.
    pub fn lookup(&self) -> impl Fn(&str) -> Option<String> + '_ {
        |key| self.vars.get(key).cloned()
    }
}
