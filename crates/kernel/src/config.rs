//! Configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use crate::error::ConfigError;
use crate::middleware::access_gate::GateConfig;
use crate::middleware::language::{LocaleSet, PrefixStrategy};
use crate::middleware::matcher::{AssetPattern, DEFAULT_MATCHER_EXCLUDES, RouteMatcher};
use crate::middleware::public_path::PublicPaths;

/// Minimum length of the session token signing secret.
pub const MIN_AUTH_SECRET_LEN: usize = 32;

/// Application configuration.
///
/// Built once at startup and never mutated. The gate-specific parts are
/// turned into a [`GateConfig`] by [`Config::gate_config`].
#[derive(Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// Public site URL used for absolute links in robots.txt and the sitemap.
    pub site_url: String,

    /// Supported locale codes, in configuration order (default: "en,zh").
    pub locales: Vec<String>,

    /// Fallback locale (default: first entry of `locales`).
    pub default_locale: String,

    /// Negotiate a locale from cookie / Accept-Language for unprefixed paths.
    pub locale_detection: bool,

    /// Cookie consulted by locale detection (default: NEXT_LOCALE).
    pub locale_cookie: String,

    /// How unprefixed paths are qualified with a locale.
    pub prefix_strategy: PrefixStrategy,

    /// Path prefixes that are never qualified with a locale.
    pub unlocalized_prefixes: Vec<String>,

    /// Path prefixes served without a session.
    pub public_paths: Vec<String>,

    /// Where unauthenticated requests for protected paths are sent.
    pub sign_in_path: String,

    /// Build-internal asset prefix (default: /_next).
    pub internal_prefix: String,

    /// Authentication provider prefix (default: /api/auth).
    pub auth_prefix: String,

    /// Regexes for paths the gate does not run on at all.
    pub matcher_exclude: Vec<String>,

    /// HS256 secret for session tokens.
    pub auth_secret: String,

    /// Session cookie name (default: session-token).
    pub session_cookie: String,

    /// Disallow entries for robots.txt.
    pub robots_disallow: Vec<String>,

    /// CORS allowed origins (comma-separated, default: "*").
    pub cors_allowed_origins: Vec<String>,

    /// Host-level request timeout (default: 30s).
    pub request_timeout: Duration,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("site_url", &self.site_url)
            .field("locales", &self.locales)
            .field("default_locale", &self.default_locale)
            .field("locale_detection", &self.locale_detection)
            .field("prefix_strategy", &self.prefix_strategy)
            .field("public_paths", &self.public_paths)
            .field("sign_in_path", &self.sign_in_path)
            .field("matcher_exclude", &self.matcher_exclude)
            .field("auth_secret", &"[redacted]")
            .field("session_cookie", &self.session_cookie)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// `from_env` delegates here; tests pass a map-backed closure instead of
    /// mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = parse_number(&lookup, "PORT", 3000)?;

        let site_url = lookup("SITE_URL")
            .unwrap_or_else(|| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_string();

        let locales = lookup("LOCALES")
            .map(|v| parse_list(&v))
            .unwrap_or_else(|| vec!["en".to_string(), "zh".to_string()]);
        if locales.is_empty() {
            return Err(ConfigError::NoLocales);
        }

        let default_locale = match lookup("DEFAULT_LOCALE") {
            Some(v) => v.trim().to_string(),
            None => locales[0].clone(),
        };

        let locale_detection = match lookup("LOCALE_DETECTION") {
            Some(v) => parse_bool("LOCALE_DETECTION", &v)?,
            None => false,
        };

        let locale_cookie = lookup("LOCALE_COOKIE").unwrap_or_else(|| "NEXT_LOCALE".to_string());

        let prefix_strategy = match lookup("LOCALE_PREFIX_STRATEGY") {
            Some(v) => v.parse()?,
            None => PrefixStrategy::default(),
        };

        let unlocalized_prefixes = list_or(
            &lookup,
            "UNLOCALIZED_PREFIXES",
            &["/api", "/health", "/metrics", "/robots.txt", "/sitemap.xml"],
        );

        let public_paths = list_or(
            &lookup,
            "PUBLIC_PATHS",
            &[
                "/",
                "/integration-demo",
                "/data-fetching",
                "/form-handling",
                "/api/proxy-demo",
            ],
        );

        let sign_in_path =
            lookup("SIGN_IN_PATH").unwrap_or_else(|| "/api/auth/signin".to_string());
        let internal_prefix = lookup("INTERNAL_PREFIX").unwrap_or_else(|| "/_next".to_string());
        let auth_prefix = lookup("AUTH_PREFIX").unwrap_or_else(|| "/api/auth".to_string());

        let matcher_exclude = list_or(&lookup, "MATCHER_EXCLUDE", DEFAULT_MATCHER_EXCLUDES);

        let auth_secret = lookup("AUTH_SECRET").ok_or(ConfigError::Missing("AUTH_SECRET"))?;
        if auth_secret.len() < MIN_AUTH_SECRET_LEN {
            return Err(ConfigError::AuthSecretTooShort {
                min: MIN_AUTH_SECRET_LEN,
                actual: auth_secret.len(),
            });
        }

        let session_cookie =
            lookup("SESSION_COOKIE").unwrap_or_else(|| "session-token".to_string());

        let robots_disallow = list_or(
            &lookup,
            "ROBOTS_DISALLOW",
            &["/api/", "/dashboard/", "/profile/", "/settings/"],
        );

        let cors_allowed_origins = list_or(&lookup, "CORS_ALLOWED_ORIGINS", &["*"]);

        let request_timeout =
            Duration::from_secs(parse_number(&lookup, "REQUEST_TIMEOUT_SECS", 30)?);

        Ok(Self {
            port,
            site_url,
            locales,
            default_locale,
            locale_detection,
            locale_cookie,
            prefix_strategy,
            unlocalized_prefixes,
            public_paths,
            sign_in_path,
            internal_prefix,
            auth_prefix,
            matcher_exclude,
            auth_secret,
            session_cookie,
            robots_disallow,
            cors_allowed_origins,
            request_timeout,
        })
    }

    /// Build the immutable gate configuration.
    ///
    /// Fails if the default locale is not configured or a matcher pattern
    /// does not compile.
    pub fn gate_config(&self) -> Result<GateConfig, ConfigError> {
        let locales = LocaleSet::new(self.locales.clone(), self.default_locale.clone())?;
        let matcher = RouteMatcher::new(&self.matcher_exclude)?;

        Ok(GateConfig {
            locales,
            public_paths: PublicPaths::new(&self.public_paths),
            matcher,
            assets: AssetPattern::new(&self.internal_prefix, &self.auth_prefix),
            sign_in_path: self.sign_in_path.clone(),
            locale_detection: self.locale_detection,
            locale_cookie: self.locale_cookie.clone(),
            prefix_strategy: self.prefix_strategy,
            unlocalized_prefixes: self.unlocalized_prefixes.clone(),
        })
    }
}

/// Split a comma-separated value, dropping empty entries.
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn list_or<F>(lookup: &F, key: &str, default: &[&str]) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| parse_list(&v))
        .unwrap_or_else(|| default.iter().map(|s| (*s).to_string()).collect())
}

fn parse_number<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid { key, value: v }),
        None => Ok(default),
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        }),
    }
}
