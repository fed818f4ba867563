//! HTTP middleware components.
//!
//! The access gate and the pieces it composes: route matching, public path
//! classification, session checks, and locale resolution.

pub mod access_gate;
pub mod language;
pub mod matcher;
pub mod public_path;
pub mod session_gate;

pub use access_gate::{AccessGate, GateConfig, GateDecision, RedirectReason, RouteClass, access_gate};
pub use language::{LocaleResolver, LocaleSet, PrefixStrategy, ResolvedLocale};
pub use public_path::{PublicPaths, is_public};
