//! Strategy resolution.
//!
//! Maps a raw strategy identifier to an algorithm. Resolution never fails:
//! a missing or unrecognized identifier selects network-only and produces
//! exactly one `StrategyDiagnostic`.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::algorithms::{self, Algorithm};
use crate::strategy::Strategy;

/// Why a strategy identifier was coerced to network-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyDiagnostic {
    /// No identifier was supplied.
    Missing,
    /// The identifier names no known strategy.
    Unrecognized { given: String },
}

impl fmt::Display for StrategyDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "no strategy given, using {}", Strategy::Network),
            Self::Unrecognized { given } => {
                write!(f, "unrecognized strategy {:?}, using {}", given, Strategy::Network)
            }
        }
    }
}

/// Outcome of resolving an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Selected strategy.
    pub strategy: Strategy,
    /// Set when the identifier was coerced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<StrategyDiagnostic>,
}

impl Resolution {
    /// Algorithm implementing the selected strategy.
    pub fn algorithm(&self) -> &'static dyn Algorithm {
        algorithms::for_strategy(self.strategy)
    }

    /// Check if the identifier was coerced.
    pub fn was_coerced(&self) -> bool {
        self.diagnostic.is_some()
    }
}

type DiagnosticHook = Arc<dyn Fn(&StrategyDiagnostic) + Send + Sync>;

/// Resolves strategy identifiers, reporting coercions to an optional hook.
#[derive(Clone, Default)]
pub struct StrategyResolver {
    on_diagnostic: Option<DiagnosticHook>,
}

impl StrategyResolver {
    /// Create a resolver that only logs diagnostics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also pass every diagnostic to `hook`.
    pub fn on_diagnostic<F>(mut self, hook: F) -> Self
    where
        F: Fn(&StrategyDiagnostic) + Send + Sync + 'static,
    {
        self.on_diagnostic = Some(Arc::new(hook));
        self
    }

    /// Resolve an identifier.
    pub fn resolve(&self, id: Option<&str>) -> Resolution {
        let diagnostic = match id.map(str::trim) {
            None | Some("") => StrategyDiagnostic::Missing,
            Some(raw) => match raw.parse::<Strategy>() {
                Ok(strategy) => {
                    return Resolution {
                        strategy,
                        diagnostic: None,
                    }
                }
                Err(e) => StrategyDiagnostic::Unrecognized { given: e.0 },
            },
        };

        tracing::warn!(diagnostic = %diagnostic, "Strategy coerced to network");
        if let Some(hook) = &self.on_diagnostic {
            hook(&diagnostic);
        }

        Resolution {
            strategy: Strategy::Network,
            diagnostic: Some(diagnostic),
        }
    }
}

impl fmt::Debug for StrategyResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyResolver")
            .field("on_diagnostic", &self.on_diagnostic.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn counting_resolver() -> (StrategyResolver, Arc<Mutex<Vec<StrategyDiagnostic>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let resolver = StrategyResolver::new().on_diagnostic(move |d| sink.lock().push(d.clone()));
        (resolver, seen)
    }

    #[test]
    fn test_known_ids_resolve_without_diagnostic() {
        let (resolver, seen) = counting_resolver();

        for strategy in Strategy::ALL {
            let resolution = resolver.resolve(Some(strategy.id()));
            assert_eq!(resolution.strategy, strategy);
            assert!(!resolution.was_coerced());
            assert_eq!(resolution.algorithm().strategy(), strategy);
        }
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_unrecognized_id_coerces_to_network_once() {
        let (resolver, seen) = counting_resolver();

        let resolution = resolver.resolve(Some("stale-while-revalidate"));
        assert_eq!(resolution.strategy, Strategy::Network);
        assert_eq!(resolution.algorithm().strategy(), Strategy::Network);
        assert_eq!(
            resolution.diagnostic,
            Some(StrategyDiagnostic::Unrecognized {
                given: "stale-while-revalidate".to_string()
            })
        );
        assert_eq!(seen.lock().len(), 1);
    }

    #[test]
    fn test_missing_id_coerces_to_network_once() {
        let (resolver, seen) = counting_resolver();

        assert_eq!(resolver.resolve(None).diagnostic, Some(StrategyDiagnostic::Missing));
        assert_eq!(resolver.resolve(Some("  ")).diagnostic, Some(StrategyDiagnostic::Missing));
        assert_eq!(seen.lock().len(), 2);
    }

    #[test]
    fn test_diagnostic_display() {
        let d = StrategyDiagnostic::Unrecognized {
            given: "x".to_string(),
        };
        assert_eq!(d.to_string(), r#"unrecognized strategy "x", using network"#);
        assert_eq!(
            StrategyDiagnostic::Missing.to_string(),
            "no strategy given, using network"
        );
    }
}
