//! Request path matching ahead of the access gate.
//!
//! [`RouteMatcher`] decides whether the gate runs for a path at all.
//! [`AssetPattern`] spots build-internal, auth-provider, and static file
//! requests that only need locale handling.

use regex::RegexSet;

/// Paths the gate never sees: auth provider routes, build internals, kernel
/// probes, and anything with a dot in it (static files, robots, sitemap).
pub const DEFAULT_MATCHER_EXCLUDES: &[&str] = &[
    r"^/api/auth(?:/|$)",
    r"^/_next(?:/|$)",
    r"^/(?:health|metrics)$",
    r"\.",
];

/// Host-level filter selecting which paths the gate runs on.
#[derive(Debug, Clone)]
pub struct RouteMatcher {
    excluded: RegexSet,
}

impl RouteMatcher {
    /// Compile the exclusion patterns.
    pub fn new<I, S>(excluded: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            excluded: RegexSet::new(excluded)?,
        })
    }

    /// A matcher that lets every path through.
    pub fn all() -> Self {
        Self {
            excluded: RegexSet::empty(),
        }
    }

    /// True when the gate should run for `path`.
    pub fn matches(&self, path: &str) -> bool {
        !self.excluded.is_match(path)
    }
}

/// Internal-asset detection for paths that made it past the matcher.
#[derive(Debug, Clone)]
pub struct AssetPattern {
    internal_prefix: String,
    auth_prefix: String,
}

impl AssetPattern {
    pub fn new(internal_prefix: &str, auth_prefix: &str) -> Self {
        Self {
            internal_prefix: internal_prefix.to_string(),
            auth_prefix: auth_prefix.to_string(),
        }
    }

    /// True for build-internal paths, paths containing the auth prefix
    /// anywhere (including after a locale segment), and file requests.
    pub fn is_asset(&self, path: &str) -> bool {
        (!self.internal_prefix.is_empty() && path.starts_with(&self.internal_prefix))
            || (!self.auth_prefix.is_empty() && path.contains(&self.auth_prefix))
            || has_file_extension(path)
    }
}

/// Any dot anywhere in the path counts, the same rule as the default `\.`
/// matcher exclusion.
fn has_file_extension(path: &str) -> bool {
    path.contains('.')
}
