#![allow(clippy::unwrap_used, clippy::expect_used)]
//! End-to-end tests for the access gate in front of the kernel routes.
//!
//! Unrouted paths land in the JSON fallback, which echoes the path the
//! router saw, the resolved locale, and the session subject. That makes the
//! gate's rewrites and session checks visible from the response.

use axum::http::StatusCode;
use serde_json::json;

mod common;
use common::{TestApp, location, response_json, response_text};
use portico_test_utils::{TEST_SECRET, TestEnv, test_session};

// -------------------------------------------------------------------------
// Public paths
// -------------------------------------------------------------------------

#[tokio::test]
async fn prefixed_public_path_passes_with_its_locale() {
    let app = TestApp::new();

    let response = app.get("/zh/data-fetching/extra").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response_json(response).await,
        json!({"error": "not found", "locale": "zh", "path": "/zh/data-fetching/extra"})
    );
}

#[tokio::test]
async fn bare_locale_root_is_public() {
    let app = TestApp::new();

    let response = app.get("/en").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response_json(response).await;
    assert_eq!(body["locale"], "en");
    assert_eq!(body["path"], "/en");
}

#[tokio::test]
async fn unprefixed_public_path_is_rewritten_to_default_locale() {
    let app = TestApp::new();

    let response = app.get("/data-fetching?page=2").await;
    assert!(location(&response).is_none());
    let body = response_json(response).await;
    assert_eq!(body["locale"], "en");
    assert_eq!(body["path"], "/en/data-fetching");
}

#[tokio::test]
async fn root_is_rewritten_to_default_locale() {
    let app = TestApp::new();

    let body = response_json(app.get("/").await).await;
    assert_eq!(body["path"], "/en");
}

#[tokio::test]
async fn unlocalized_api_path_keeps_its_path() {
    let app = TestApp::new();

    let body = response_json(app.get("/api/proxy-demo").await).await;
    assert_eq!(body["locale"], "en");
    assert_eq!(body["path"], "/api/proxy-demo");
}

// -------------------------------------------------------------------------
// Protected paths
// -------------------------------------------------------------------------

#[tokio::test]
async fn protected_path_without_session_redirects_to_sign_in() {
    let app = TestApp::new();

    let response = app.get("/en/dashboard").await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location(&response).unwrap(),
        "/api/auth/signin?callbackUrl=%2Fen%2Fdashboard"
    );
}

#[tokio::test]
async fn callback_keeps_the_unqualified_destination() {
    let app = TestApp::new();

    let response = app.get("/profile?tab=keys").await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location(&response).unwrap(),
        "/api/auth/signin?callbackUrl=%2Fprofile%3Ftab%3Dkeys"
    );
}

#[tokio::test]
async fn protected_path_with_session_reaches_handler() {
    let app = TestApp::new();
    let cookie = test_session("user-1").with_name("Ada").cookie();

    let response = app.get_with_cookie("/en/dashboard", &cookie).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response_json(response).await,
        json!({"error": "not found", "locale": "en", "path": "/en/dashboard", "user": "user-1"})
    );
}

#[tokio::test]
async fn unprefixed_protected_path_with_session_is_localized() {
    let app = TestApp::new();
    let cookie = test_session("user-1").cookie();

    let body = response_json(app.get_with_cookie("/dashboard", &cookie).await).await;
    assert_eq!(body["path"], "/en/dashboard");
    assert_eq!(body["user"], "user-1");
}

#[tokio::test]
async fn expired_session_is_treated_as_missing() {
    let app = TestApp::new();
    let cookie = test_session("user-1").expired().cookie();

    let response = app.get_with_cookie("/en/dashboard", &cookie).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
}

#[tokio::test]
async fn session_signed_with_other_secret_is_rejected() {
    let app = TestApp::new();
    let token = test_session("user-1").sign("another-secret-that-is-long-enough!");
    let cookie = format!("session-token={token}");

    let response = app.get_with_cookie("/en/dashboard", &cookie).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
}

#[tokio::test]
async fn secure_cookie_name_is_accepted() {
    let app = TestApp::new();
    let token = test_session("user-2").sign(TEST_SECRET);
    let cookie = format!("__Secure-session-token={token}");

    let body = response_json(app.get_with_cookie("/zh/profile", &cookie).await).await;
    assert_eq!(body["user"], "user-2");
    assert_eq!(body["locale"], "zh");
}

#[tokio::test]
async fn configured_sign_in_path_never_redirects_to_itself() {
    let app = TestApp::with_env(TestEnv::new().set("SIGN_IN_PATH", "/login"));

    let response = app.get("/login").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response_json(response).await["path"], "/en/login");

    let response = app.get("/en/settings").await;
    assert_eq!(
        location(&response).unwrap(),
        "/login?callbackUrl=%2Fen%2Fsettings"
    );
}

#[tokio::test]
async fn sign_in_path_with_query_never_redirects_to_itself() {
    let app = TestApp::with_env(TestEnv::new().set("SIGN_IN_PATH", "/login?provider=github"));

    let response = app.get("/login").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response_json(response).await["path"], "/en/login");

    let response = app.get("/en/settings").await;
    assert_eq!(
        location(&response).unwrap(),
        "/login?provider=github&callbackUrl=%2Fen%2Fsettings"
    );
}

// -------------------------------------------------------------------------
// Matcher and bypass
// -------------------------------------------------------------------------

#[tokio::test]
async fn matcher_excluded_path_is_untouched() {
    let app = TestApp::new();

    let response = app.get("/_next/static/chunk.js").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response_json(response).await,
        json!({"error": "not found", "locale": null, "path": "/_next/static/chunk.js"})
    );
}

#[tokio::test]
async fn assets_inside_the_matcher_skip_the_session_check() {
    let app = TestApp::with_env(TestEnv::new().set("MATCHER_EXCLUDE", r"^/(?:health|metrics)$"));

    let response = app.get("/_next/static/chunk.js").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response_json(response).await["locale"], "en");

    let response = app.get("/en/report.pdf").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.get("/v1.2/notes").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response_json(response).await["path"], "/en/v1.2/notes");

    let metrics = app.state.metrics().encode();
    assert!(metrics.contains(r#"gate_decisions_total{decision="bypassed"} 3"#));
}

// -------------------------------------------------------------------------
// Locale strategies
// -------------------------------------------------------------------------

#[tokio::test]
async fn redirect_strategy_sends_client_to_prefixed_url() {
    let app = TestApp::with_env(TestEnv::new().set("LOCALE_PREFIX_STRATEGY", "redirect"));

    let response = app.get("/form-handling?step=1").await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response).unwrap(), "/en/form-handling?step=1");

    let response = app.get("/en/form-handling").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn detection_uses_locale_cookie() {
    let app = TestApp::with_env(TestEnv::new().set("LOCALE_DETECTION", "true"));

    let body = response_json(app.get_with_cookie("/", "NEXT_LOCALE=zh").await).await;
    assert_eq!(body["locale"], "zh");
    assert_eq!(body["path"], "/zh");
}

#[tokio::test]
async fn detection_disabled_ignores_locale_cookie() {
    let app = TestApp::new();

    let body = response_json(app.get_with_cookie("/", "NEXT_LOCALE=zh").await).await;
    assert_eq!(body["locale"], "en");
}

// -------------------------------------------------------------------------
// Kernel routes
// -------------------------------------------------------------------------

#[tokio::test]
async fn health_is_served_without_session() {
    let app = TestApp::new();

    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await, json!({"status": "healthy"}));
}

#[tokio::test]
async fn metrics_count_gate_decisions() {
    let app = TestApp::new();

    app.get("/en/dashboard").await;
    app.get("/en").await;
    app.get("/favicon.ico").await;

    // The scrape itself passes the gate as unmatched before it is encoded.
    let response = app.get("/metrics").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_text(response).await;
    assert!(body.contains(r#"gate_decisions_total{decision="sign_in"} 1"#));
    assert!(body.contains(r#"gate_decisions_total{decision="public"} 1"#));
    assert!(body.contains(r#"gate_decisions_total{decision="unmatched"} 2"#));
    assert!(body.contains(r#"locale_resolutions_total{locale="en"} 1"#));
}

#[tokio::test]
async fn robots_txt_points_at_sitemap() {
    let app = TestApp::with_env(TestEnv::new().set("SITE_URL", "https://example.com"));

    let response = app.get("/robots.txt").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_text(response).await;
    assert!(body.contains("Sitemap: https://example.com/sitemap.xml"));
}

#[tokio::test]
async fn sitemap_lists_public_pages_per_locale() {
    let app = TestApp::with_env(TestEnv::new().set("SITE_URL", "https://example.com"));

    let response = app.get("/sitemap.xml").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_text(response).await;
    assert!(body.contains("<loc>https://example.com/en</loc>"));
    assert!(body.contains("<loc>https://example.com/zh/form-handling</loc>"));
    assert!(!body.contains("proxy-demo"));
    assert!(!body.contains("signin"));
}
