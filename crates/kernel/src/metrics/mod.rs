//! Prometheus metrics collection.
//!
//! Counts what the access gate decided and which locales it resolved.

use prometheus_client::encoding::{EncodeLabelSet, text::encode};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

/// Gate decision labels.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct GateLabels {
    pub decision: String,
}

/// Resolved locale labels.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct LocaleLabels {
    pub locale: String,
}

/// Application metrics.
pub struct Metrics {
    registry: Registry,

    /// Gate decisions by outcome (unmatched, bypassed, public, protected,
    /// sign_in, locale_redirect).
    pub gate_decisions: Family<GateLabels, Counter>,

    /// Forwarded requests by resolved locale.
    pub locale_resolutions: Family<LocaleLabels, Counter>,
}

impl Metrics {
    /// Create a new metrics registry.
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let gate_decisions = Family::<GateLabels, Counter>::default();
        registry.register(
            "gate_decisions",
            "Access gate decisions by outcome",
            gate_decisions.clone(),
        );

        let locale_resolutions = Family::<LocaleLabels, Counter>::default();
        registry.register(
            "locale_resolutions",
            "Forwarded requests by resolved locale",
            locale_resolutions.clone(),
        );

        Self {
            registry,
            gate_decisions,
            locale_resolutions,
        }
    }

    /// Record one gate decision.
    pub fn record_gate_decision(&self, decision: &str) {
        self.gate_decisions
            .get_or_create(&GateLabels {
                decision: decision.to_string(),
            })
            .inc();
    }

    pub fn record_locale(&self, locale: &str) {
        self.locale_resolutions
            .get_or_create(&LocaleLabels {
                locale: locale.to_string(),
            })
            .inc();
    }

    /// Encode metrics in Prometheus text format.
    ///
    /// # Panics
    ///
    /// Panics if Prometheus metric encoding to a `String` buffer fails.
    /// The `fmt::Write` impl for `String` is infallible.
    pub fn encode(&self) -> String {
        let mut buffer = String::new();
        // Prometheus encoding to String buffer is infallible
        #[allow(clippy::expect_used)]
        encode(&mut buffer, &self.registry).expect("encoding metrics");
        buffer
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish()
    }
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn counter_is_registered() {
        let metrics = Metrics::new();
        metrics.record_gate_decision("public");
        assert!(metrics.encode().contains("gate_decisions_total"));
    }

    #[test]
    fn decisions_are_counted_per_label() {
        let metrics = Metrics::new();
        metrics.record_gate_decision("sign_in");
        metrics.record_gate_decision("sign_in");
        metrics.record_gate_decision("public");

        let output = metrics.encode();
        assert!(output.contains(r#"gate_decisions_total{decision="sign_in"} 2"#));
        assert!(output.contains(r#"gate_decisions_total{decision="public"} 1"#));
    }

    #[test]
    fn locales_are_counted_separately() {
        let metrics = Metrics::new();
        metrics.record_locale("zh");
        metrics.record_locale("en");
        metrics.record_locale("zh");

        let output = metrics.encode();
        assert!(output.contains(r#"locale_resolutions_total{locale="zh"} 2"#));
        assert!(output.contains(r#"locale_resolutions_total{locale="en"} 1"#));
    }
}
