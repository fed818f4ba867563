//! Locale resolution.
//!
//! Determines the active locale for each request and makes sure downstream
//! handlers see a locale-qualified path. A path that already starts with a
//! known locale segment passes through untouched; anything else is prefixed
//! with the negotiated locale, either by rewriting the URI in place or by
//! redirecting the client.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, Uri},
};
use axum_extra::extract::cookie::CookieJar;

use crate::error::ConfigError;

/// The resolved locale for the current request.
///
/// Stored in request extensions for per-request access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocale(pub String);

/// The supported locale codes and the fallback among them.
#[derive(Debug, Clone)]
pub struct LocaleSet {
    codes: Vec<String>,
    lookup: HashSet<String>,
    default_locale: String,
}

impl LocaleSet {
    /// Build a locale set. The default must be one of `codes`.
    pub fn new(codes: Vec<String>, default_locale: impl Into<String>) -> Result<Self, ConfigError> {
        let default_locale = default_locale.into();
        if codes.is_empty() {
            return Err(ConfigError::NoLocales);
        }

        let lookup: HashSet<String> = codes.iter().cloned().collect();
        if !lookup.contains(&default_locale) {
            return Err(ConfigError::UnknownDefaultLocale(default_locale));
        }

        Ok(Self {
            codes,
            lookup,
            default_locale,
        })
    }

    /// Codes in configuration order.
    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    /// Case-sensitive membership test.
    pub fn contains(&self, code: &str) -> bool {
        self.lookup.contains(code)
    }

    /// Split a leading locale segment off `path`.
    ///
    /// Returns `Some((locale, remaining_path))` when the first segment is a
    /// known code followed by `/` or end-of-path. `/zh` yields `("zh", "/")`;
    /// `/enterprise` never matches `en`.
    pub fn split_prefix<'a>(&self, path: &'a str) -> Option<(&str, &'a str)> {
        let (candidate, rest) = split_first_segment(path)?;
        let locale = self.lookup.get(candidate)?;
        Some((locale.as_str(), rest))
    }

    /// `path` with any leading locale segment removed; `/` if nothing is left.
    pub fn strip_prefix<'a>(&self, path: &'a str) -> &'a str {
        match self.split_prefix(path) {
            Some((_, rest)) => rest,
            None if path.is_empty() => "/",
            None => path,
        }
    }
}

/// Split `/first/rest` into `("first", "/rest")`.
///
/// The remainder is `/` when nothing follows the first segment. Paths not
/// starting with `/` have no segments.
pub(crate) fn split_first_segment(path: &str) -> Option<(&str, &str)> {
    let trimmed = path.strip_prefix('/')?;
    match trimmed.find('/') {
        Some(pos) => Some(trimmed.split_at(pos)),
        None => Some((trimmed, "/")),
    }
}

/// How an unprefixed path is qualified with a locale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PrefixStrategy {
    /// Rewrite the request URI in place; the client never sees the prefix.
    #[default]
    Rewrite,
    /// Answer with a temporary redirect to the prefixed URL.
    Redirect,
}

impl FromStr for PrefixStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rewrite" => Ok(Self::Rewrite),
            "redirect" => Ok(Self::Redirect),
            _ => Err(ConfigError::Invalid {
                key: "LOCALE_PREFIX_STRATEGY",
                value: s.to_string(),
            }),
        }
    }
}

/// Trait for locale negotiation strategies.
///
/// Implementations inspect the request and return a locale code if they
/// can determine the desired locale. The resolver chains negotiators by
/// priority (highest first) and uses the first result that is a known locale.
pub trait LocaleNegotiator: Send + Sync {
    /// Attempt to negotiate a locale from the request.
    fn negotiate(&self, request: &Request<Body>) -> Option<String>;

    /// Priority of this negotiator (higher = checked first).
    fn priority(&self) -> i32;
}

/// Negotiates the locale from a preference cookie (e.g. `NEXT_LOCALE=zh`).
pub struct CookieNegotiator {
    cookie_name: String,
}

impl CookieNegotiator {
    pub fn new(cookie_name: impl Into<String>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
        }
    }
}

impl LocaleNegotiator for CookieNegotiator {
    fn negotiate(&self, request: &Request<Body>) -> Option<String> {
        let jar = CookieJar::from_headers(request.headers());
        let value = jar.get(&self.cookie_name)?.value().trim();
        (!value.is_empty()).then(|| value.to_string())
    }

    fn priority(&self) -> i32 {
        100
    }
}

/// Negotiates the locale from the Accept-Language HTTP header.
///
/// Parses quality values and returns the highest-quality language that
/// matches a known locale.
pub struct AcceptLanguageNegotiator {
    known_locales: HashSet<String>,
}

impl AcceptLanguageNegotiator {
    pub fn new(known_locales: &[String]) -> Self {
        Self {
            known_locales: known_locales.iter().cloned().collect(),
        }
    }

    /// Parse Accept-Language header value into (language, quality) pairs,
    /// sorted by quality descending (stable sort preserves original order for ties).
    fn parse_accept_language(header: &str) -> Vec<(String, f32)> {
        let mut langs: Vec<(String, f32)> = header
            .split(',')
            .filter_map(|part| {
                let part = part.trim();
                if part.is_empty() {
                    return None;
                }

                let mut segments = part.split(';');
                let lang = segments.next()?.trim().to_lowercase();

                let quality = segments
                    .find_map(|s| {
                        s.trim()
                            .strip_prefix("q=")
                            .and_then(|q| q.trim().parse::<f32>().ok())
                    })
                    .unwrap_or(1.0)
                    .clamp(0.0, 1.0); // RFC 7231 §5.3.1

                Some((lang, quality))
            })
            .collect();

        langs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        langs
    }
}

impl LocaleNegotiator for AcceptLanguageNegotiator {
    fn negotiate(&self, request: &Request<Body>) -> Option<String> {
        let header = request.headers().get("accept-language")?.to_str().ok()?;

        for (lang, quality) in Self::parse_accept_language(header) {
            // q=0 means "not acceptable"
            if quality <= 0.0 {
                continue;
            }
            if self.known_locales.contains(&lang) {
                return Some(lang);
            }
            // Primary subtag (e.g., "zh-CN" → "zh")
            if let Some(primary) = lang.split('-').next()
                && self.known_locales.contains(primary)
            {
                return Some(primary.to_string());
            }
        }

        None
    }

    fn priority(&self) -> i32 {
        50
    }
}

/// What the resolver wants done with the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocaleAction {
    /// Path is already locale-qualified (or exempt); leave it alone.
    Pass,
    /// Replace the request URI with this locale-qualified one.
    Rewrite(Uri),
    /// Redirect the client to this locale-qualified location.
    Redirect(String),
}

/// Result of [`LocaleResolver::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleResolution {
    pub locale: String,
    pub action: LocaleAction,
}

impl LocaleResolution {
    fn pass(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            action: LocaleAction::Pass,
        }
    }
}

/// Resolves the active locale and the locale-qualified path for a request.
pub struct LocaleResolver {
    locales: LocaleSet,
    negotiators: Vec<Arc<dyn LocaleNegotiator>>,
    strategy: PrefixStrategy,
    unlocalized_prefixes: Vec<String>,
}

impl LocaleResolver {
    pub fn new(
        locales: LocaleSet,
        strategy: PrefixStrategy,
        unlocalized_prefixes: Vec<String>,
    ) -> Self {
        Self {
            locales,
            negotiators: Vec::new(),
            strategy,
            unlocalized_prefixes: unlocalized_prefixes
                .into_iter()
                .map(|p| p.trim_end_matches('/').to_string())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Enable cookie and Accept-Language detection for unprefixed paths.
    pub fn with_detection(self, cookie_name: &str) -> Self {
        let accept = AcceptLanguageNegotiator::new(self.locales.codes());
        self.with_negotiator(Arc::new(CookieNegotiator::new(cookie_name)))
            .with_negotiator(Arc::new(accept))
    }

    /// Add a negotiator; negotiators are kept sorted by priority, highest first.
    pub fn with_negotiator(mut self, negotiator: Arc<dyn LocaleNegotiator>) -> Self {
        self.negotiators.push(negotiator);
        self.negotiators.sort_by_key(|n| std::cmp::Reverse(n.priority()));
        self
    }

    pub fn locales(&self) -> &LocaleSet {
        &self.locales
    }

    /// Resolve the locale for `request`.
    ///
    /// Resolving a path that already carries a known locale prefix is a
    /// no-op, so running the resolver twice never double-prefixes.
    pub fn resolve(&self, request: &Request<Body>) -> LocaleResolution {
        let uri = request.uri();
        let path = uri.path();

        if let Some((locale, _)) = self.locales.split_prefix(path) {
            return LocaleResolution::pass(locale);
        }

        let default_locale = self.locales.default_locale();
        if self.is_unlocalized(path) {
            return LocaleResolution::pass(default_locale);
        }

        let locale = self.select_locale(request);
        let target = with_query(&qualify_path(&locale, path), uri.query());

        match self.strategy {
            PrefixStrategy::Rewrite => match target.parse::<Uri>() {
                Ok(rewritten) => LocaleResolution {
                    locale,
                    action: LocaleAction::Rewrite(rewritten),
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path,
                        error = %e,
                        "could not qualify path with locale, using default"
                    );
                    LocaleResolution::pass(default_locale)
                }
            },
            PrefixStrategy::Redirect => LocaleResolution {
                locale,
                action: LocaleAction::Redirect(target),
            },
        }
    }

    fn is_unlocalized(&self, path: &str) -> bool {
        self.unlocalized_prefixes
            .iter()
            .any(|prefix| match path.strip_prefix(prefix.as_str()) {
                Some(rest) => rest.is_empty() || rest.starts_with('/'),
                None => false,
            })
    }

    /// Pick a locale for an unprefixed path: negotiators by priority, then default.
    fn select_locale(&self, request: &Request<Body>) -> String {
        for negotiator in &self.negotiators {
            if let Some(locale) = negotiator.negotiate(request) {
                if self.locales.contains(&locale) {
                    return locale;
                }
                tracing::debug!(
                    negotiated = %locale,
                    "negotiator returned unknown locale, ignoring"
                );
            }
        }

        self.locales.default_locale().to_string()
    }
}

/// Prefix `path` with `/<locale>`; the root maps to `/<locale>`.
fn qualify_path(locale: &str, path: &str) -> String {
    if path.is_empty() || path == "/" {
        format!("/{locale}")
    } else {
        format!("/{locale}{path}")
    }
}

fn with_query(path: &str, query: Option<&str>) -> String {
    match query {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    }
}
