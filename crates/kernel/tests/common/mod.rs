#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! Every [`TestApp`] runs the real router with the real gate in front; only
//! the environment is swapped for a [`TestEnv`] so tests never touch process
//! state.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, header};
use axum::response::Response;
use http_body_util::BodyExt;
use tower::ServiceExt;

use portico_kernel::{AppState, Config};
use portico_test_utils::TestEnv;

/// Test application wrapping the full router.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    /// App with the default configuration.
    pub fn new() -> Self {
        Self::with_env(TestEnv::new())
    }

    /// App configured from `env`.
    pub fn with_env(env: TestEnv) -> Self {
        let config = Config::from_lookup(env.lookup()).expect("test config should be valid");
        let state = AppState::new(&config).expect("test gate config should be valid");

        Self {
            router: portico_kernel::app(state.clone()),
            state,
        }
    }

    /// Send a request through the router.
    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// GET `uri` without credentials.
    pub async fn get(&self, uri: &str) -> Response {
        self.request(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    /// GET `uri` with a `Cookie` header.
    pub async fn get_with_cookie(&self, uri: &str, cookie: &str) -> Response {
        self.request(
            Request::get(uri)
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }
}

/// Read the response body as JSON.
pub async fn response_json(response: Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Read the response body as text.
pub async fn response_text(response: Response) -> String {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(body.to_vec()).unwrap()
}

/// The `Location` header, if any.
pub fn location(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string())
}
