//! Public path classification.
//!
//! Decides whether a request path can be served without a session. Paths are
//! compared after removing any leading locale segment, so `/zh/data-fetching`
//! and `/data-fetching` classify the same way.

use crate::middleware::language::{LocaleSet, split_first_segment};

/// The root entry; matched by equality only, never as a prefix.
pub const ROOT: &str = "/";

/// Configured public path prefixes.
///
/// Classification is a set test, so entry order never changes the result.
#[derive(Debug, Clone, Default)]
pub struct PublicPaths {
    root_public: bool,
    prefixes: Vec<String>,
}

impl PublicPaths {
    /// Build from configured entries. Empty entries are dropped; an empty
    /// prefix would otherwise match every path.
    pub fn new<S: AsRef<str>>(entries: &[S]) -> Self {
        let mut paths = Self::default();
        for entry in entries {
            paths.insert(entry.as_ref());
        }
        paths
    }

    /// Add one entry.
    pub fn with(mut self, entry: &str) -> Self {
        self.insert(entry);
        self
    }

    fn insert(&mut self, entry: &str) {
        let entry = entry.trim();
        if entry.is_empty() {
            return;
        }
        if entry == ROOT {
            self.root_public = true;
        } else if !self.prefixes.iter().any(|p| p == entry) {
            self.prefixes.push(entry.to_string());
        }
    }

    pub fn root_is_public(&self) -> bool {
        self.root_public
    }

    /// Non-root prefixes, in configuration order.
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Whether `path` is exempt from authentication.
    ///
    /// `/en` normalizes to `/` and is therefore public only when the root is.
    pub fn is_public(&self, path: &str, locales: &LocaleSet) -> bool {
        self.matches_normalized(locales.strip_prefix(path))
    }

    /// Match an already locale-stripped path.
    pub fn matches_normalized(&self, normalized: &str) -> bool {
        if normalized == ROOT {
            return self.root_public;
        }
        self.prefixes
            .iter()
            .any(|prefix| normalized.starts_with(prefix.as_str()))
    }
}

/// One-shot form of [`PublicPaths::is_public`] over plain lists.
///
/// Builds nothing that outlives the call; prefer [`PublicPaths`] on hot paths.
pub fn is_public<L, P>(path: &str, locale_codes: &[L], public_prefixes: &[P]) -> bool
where
    L: AsRef<str>,
    P: AsRef<str>,
{
    let normalized = strip_locale(path, locale_codes);
    PublicPaths::new(public_prefixes).matches_normalized(normalized)
}

fn strip_locale<'a, L: AsRef<str>>(path: &'a str, locale_codes: &[L]) -> &'a str {
    match split_first_segment(path) {
        Some((segment, rest)) if locale_codes.iter().any(|code| code.as_ref() == segment) => rest,
        _ if path.is_empty() => ROOT,
        _ => path,
    }
}
