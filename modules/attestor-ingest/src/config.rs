use std::env;
use std::time::Duration;

use crate::batch::RiskLinkPolicy;

/// Processor configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Topic the processor subscribes to at startup.
    pub topic: String,
    pub risk_link: RiskLinkPolicy,
    pub retry: RetryPolicy,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            topic: "execution-results".to_string(),
            risk_link: RiskLinkPolicy::default(),
            retry: RetryPolicy::disabled(),
        }
    }
}

impl ProcessorConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults. Panics with a clear message if a value is unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            topic: env::var("RESULTS_TOPIC").unwrap_or(defaults.topic),
            risk_link: match env::var("RISK_LINK_POLICY").as_deref() {
                Ok("all-observations") => RiskLinkPolicy::AllObservations,
                Ok("first-observation") | Err(_) => RiskLinkPolicy::FirstObservation,
                Ok(other) => panic!("RISK_LINK_POLICY must be first-observation or all-observations, got {other}"),
            },
            retry: RetryPolicy {
                max_attempts: env::var("PERSIST_RETRY_ATTEMPTS")
                    .unwrap_or_else(|_| "1".to_string())
                    .parse()
                    .expect("PERSIST_RETRY_ATTEMPTS must be a number"),
                base: Duration::from_millis(
                    env::var("PERSIST_RETRY_BASE_MS")
                        .unwrap_or_else(|_| "250".to_string())
                        .parse()
                        .expect("PERSIST_RETRY_BASE_MS must be a number"),
                ),
            },
        }
    }
}

/// Bounded retry for persistence calls.
///
/// Attempt n (zero-based) backs off `base * 3^n` plus jitter before the
/// next try. Disabled by default: one attempt, no backoff.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base: Duration,
}

impl RetryPolicy {
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            base: Duration::ZERO,
        }
    }

    pub fn new(max_attempts: u32, base: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base,
        }
    }
}
