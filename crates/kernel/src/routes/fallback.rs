//! Fallback for paths no kernel route handles.
//!
//! Reports what the gate resolved for the request, which makes locale
//! rewrites and session claims observable from the outside.

use axum::Json;
use axum::extract::Extension;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::middleware::ResolvedLocale;
use crate::session::SessionClaims;

#[derive(Serialize)]
struct NotFoundResponse {
    error: &'static str,
    locale: Option<String>,
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<String>,
}

/// Handler for unrouted paths.
pub async fn not_found(
    uri: Uri,
    locale: Option<Extension<ResolvedLocale>>,
    claims: Option<Extension<SessionClaims>>,
) -> Response {
    let body = NotFoundResponse {
        error: "not found",
        locale: locale.map(|Extension(ResolvedLocale(code))| code),
        path: uri.path().to_string(),
        user: claims.map(|Extension(claims)| claims.sub),
    };

    (StatusCode::NOT_FOUND, Json(body)).into_response()
}
