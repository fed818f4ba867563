//! Locale-aware access gate.
//!
//! Every request the route matcher selects runs through [`AccessGate::handle`]:
//!
//! 1. Internal assets (build output, auth provider routes, files) are
//!    bypassed straight to locale resolution.
//! 2. Public paths go to locale resolution only.
//! 3. Everything else needs a session first; without one the client is sent
//!    to sign-in with its original destination attached.
//!
//! The gate holds no per-request state and is shared by all requests.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use crate::middleware::language::{
    LocaleAction, LocaleResolver, LocaleSet, PrefixStrategy, ResolvedLocale,
};
use crate::middleware::matcher::{AssetPattern, RouteMatcher};
use crate::middleware::public_path::PublicPaths;
use crate::middleware::session_gate::SessionGate;
use crate::session::SessionValidator;
use crate::state::AppState;

/// Immutable gate configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct GateConfig {
    pub locales: LocaleSet,
    pub public_paths: PublicPaths,
    pub matcher: RouteMatcher,
    pub assets: AssetPattern,
    pub sign_in_path: String,
    pub locale_detection: bool,
    pub locale_cookie: String,
    pub prefix_strategy: PrefixStrategy,
    pub unlocalized_prefixes: Vec<String>,
}

/// How the gate classified a request path.
///
/// Inserted into request extensions for every request the gate forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClass {
    /// Internal asset; no classification or session check.
    Bypassed,
    /// Served without a session.
    Public,
    /// Requires a valid session.
    Protected,
}

impl RouteClass {
    pub fn as_str(self) -> &'static str {
        match self {
            RouteClass::Bypassed => "bypassed",
            RouteClass::Public => "public",
            RouteClass::Protected => "protected",
        }
    }
}

/// Why the gate answered with a redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReason {
    /// Protected path without a valid session.
    SignIn,
    /// Unprefixed path under the redirect prefix strategy.
    LocalePrefix,
}

/// Outcome of [`AccessGate::handle`].
#[derive(Debug)]
pub enum GateDecision {
    /// Hand the (possibly rewritten) request to the next service.
    Forward(Request<Body>),
    /// Answer with a temporary redirect.
    Redirect {
        location: String,
        reason: RedirectReason,
    },
}

impl GateDecision {
    /// Short label for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            GateDecision::Forward(request) => request
                .extensions()
                .get::<RouteClass>()
                .map_or("unmatched", |class| class.as_str()),
            GateDecision::Redirect {
                reason: RedirectReason::SignIn,
                ..
            } => "sign_in",
            GateDecision::Redirect {
                reason: RedirectReason::LocalePrefix,
                ..
            } => "locale_redirect",
        }
    }
}

/// The per-request dispatcher composing matcher, classifier, session gate,
/// and locale resolver.
pub struct AccessGate {
    matcher: RouteMatcher,
    assets: AssetPattern,
    public_paths: PublicPaths,
    resolver: LocaleResolver,
    session: SessionGate,
}

impl AccessGate {
    pub fn new(config: GateConfig, validator: Arc<dyn SessionValidator>) -> Self {
        let GateConfig {
            locales,
            public_paths,
            matcher,
            assets,
            sign_in_path,
            locale_detection,
            locale_cookie,
            prefix_strategy,
            unlocalized_prefixes,
        } = config;

        // The sign-in page must never redirect to itself. Request paths carry
        // no query, so only the path part can match.
        let sign_in_route = sign_in_path
            .split_once('?')
            .map_or(sign_in_path.as_str(), |(route, _)| route);
        let public_paths = public_paths.with(sign_in_route);

        let mut resolver = LocaleResolver::new(locales, prefix_strategy, unlocalized_prefixes);
        if locale_detection {
            resolver = resolver.with_detection(&locale_cookie);
        }

        Self {
            matcher,
            assets,
            public_paths,
            resolver,
            session: SessionGate::new(validator, sign_in_path),
        }
    }

    pub fn locales(&self) -> &LocaleSet {
        self.resolver.locales()
    }

    pub fn public_paths(&self) -> &PublicPaths {
        &self.public_paths
    }

    /// Whether the gate runs for `path` at all.
    pub fn is_matched(&self, path: &str) -> bool {
        self.matcher.matches(path)
    }

    /// Classify a path without looking at the session.
    pub fn classify(&self, path: &str) -> RouteClass {
        if self.assets.is_asset(path) {
            RouteClass::Bypassed
        } else if self.public_paths.is_public(path, self.locales()) {
            RouteClass::Public
        } else {
            RouteClass::Protected
        }
    }

    /// Decide what happens to `request`.
    ///
    /// The session validator is consulted at most once, and only for
    /// protected paths.
    pub async fn handle(&self, mut request: Request<Body>) -> GateDecision {
        let path = request.uri().path();

        if !self.is_matched(path) {
            return GateDecision::Forward(request);
        }

        let class = self.classify(path);
        debug!(path = %path, class = class.as_str(), "classified request");

        if class == RouteClass::Protected {
            match self.session.check(request.headers()).await {
                Some(claims) => {
                    request.extensions_mut().insert(claims);
                }
                None => {
                    let location = self.session.sign_in_location(request.uri());
                    debug!(
                        path = %request.uri().path(),
                        location = %location,
                        "no valid session, redirecting to sign-in"
                    );
                    return GateDecision::Redirect {
                        location,
                        reason: RedirectReason::SignIn,
                    };
                }
            }
        }

        request.extensions_mut().insert(class);
        self.localize(request)
    }

    /// Run the locale resolver and apply its verdict.
    fn localize(&self, mut request: Request<Body>) -> GateDecision {
        let resolution = self.resolver.resolve(&request);

        match resolution.action {
            LocaleAction::Pass => {}
            LocaleAction::Rewrite(uri) => {
                debug!(
                    original = %request.uri(),
                    rewritten = %uri,
                    locale = %resolution.locale,
                    "qualified path with locale"
                );
                *request.uri_mut() = uri;
            }
            LocaleAction::Redirect(location) => {
                return GateDecision::Redirect {
                    location,
                    reason: RedirectReason::LocalePrefix,
                };
            }
        }

        request
            .extensions_mut()
            .insert(ResolvedLocale(resolution.locale));
        GateDecision::Forward(request)
    }
}

/// Middleware running the access gate in front of the kernel routes.
///
/// Must wrap the router (not be added with `Router::layer` on it) so that
/// locale rewrites happen before routing.
pub async fn access_gate(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let decision = state.gate().handle(request).await;
    state.metrics().record_gate_decision(decision.label());

    match decision {
        GateDecision::Forward(request) => {
            if let Some(ResolvedLocale(locale)) = request.extensions().get::<ResolvedLocale>() {
                state.metrics().record_locale(locale);
            }
            next.run(request).await
        }
        GateDecision::Redirect { location, .. } => Redirect::temporary(&location).into_response(),
    }
}
