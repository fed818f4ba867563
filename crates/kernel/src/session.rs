//! Session token validation.
//!
//! Sessions are HS256-signed JWTs issued by the identity provider and carried
//! in a cookie (or, for API clients, an `Authorization: Bearer` header).
//! The gate only cares whether a valid token exists; the decoded claims are
//! handed to downstream handlers as a request extension.

use async_trait::async_trait;
use axum::http::{HeaderMap, header};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Prefix browsers require for cookies set with `Secure` over HTTPS.
pub const SECURE_COOKIE_PREFIX: &str = "__Secure-";

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user ID at the identity provider).
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    /// Issued at (Unix timestamp).
    #[serde(default)]
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
}

/// Authentication collaborator consulted by the session gate.
///
/// Returns the session's claims when the request carries a valid,
/// unexpired token. Missing, malformed, expired, and wrongly signed tokens
/// all yield `None`; callers cannot and should not tell them apart.
#[async_trait]
pub trait SessionValidator: Send + Sync {
    async fn validate(&self, headers: &HeaderMap) -> Option<SessionClaims>;
}

/// Validates JWT session tokens signed with a shared secret.
#[derive(Clone)]
pub struct JwtSessionValidator {
    decoding_key: DecodingKey,
    validation: Validation,
    cookie_name: String,
    secure_cookie_name: String,
}

impl JwtSessionValidator {
    /// Create a validator for tokens signed with `secret`, read from the
    /// `cookie_name` cookie (or its `__Secure-` variant).
    pub fn new(secret: &[u8], cookie_name: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            cookie_name: cookie_name.to_string(),
            secure_cookie_name: format!("{SECURE_COOKIE_PREFIX}{cookie_name}"),
        }
    }

    /// Pull the raw token from the request headers.
    ///
    /// The secure cookie wins over the plain one; the bearer header is only
    /// consulted when neither cookie is present.
    pub fn extract_token(&self, headers: &HeaderMap) -> Option<String> {
        let jar = CookieJar::from_headers(headers);
        if let Some(cookie) = jar
            .get(&self.secure_cookie_name)
            .or_else(|| jar.get(&self.cookie_name))
        {
            return Some(cookie.value().to_string());
        }

        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|t| t.trim().to_string())
    }

    /// Verify a raw token and return its claims.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
        let data = jsonwebtoken::decode::<SessionClaims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }
}

impl std::fmt::Debug for JwtSessionValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSessionValidator")
            .field("cookie_name", &self.cookie_name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SessionValidator for JwtSessionValidator {
    async fn validate(&self, headers: &HeaderMap) -> Option<SessionClaims> {
        let token = self.extract_token(headers)?;
        if token.is_empty() {
            return None;
        }

        match self.verify(&token) {
            Ok(claims) => Some(claims),
            Err(e) => {
                debug!(error = %e, "rejecting session token");
                None
            }
        }
    }
}
