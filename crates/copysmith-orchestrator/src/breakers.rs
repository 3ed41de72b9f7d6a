//! Named circuit-breaker registry
//!
//! Breakers are constructed once at startup and injected into whichever
//! component performs the integration they guard. There are no globals;
//! the registry is plain data handed down from the composition root.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use copysmith_agent::CircuitBreaker;
use copysmith_core::{BreakerConfig, Platform};

/// Breaker guarding model-based grading calls
pub const GRADING_BREAKER: &str = "grading";

/// Registry of named breakers, one per integration point
#[derive(Clone)]
pub struct BreakerRegistry {
    breakers: HashMap<String, Arc<CircuitBreaker>>,
}

impl BreakerRegistry {
    /// Build the standard registry: one breaker per platform workflow plus
    /// one for grading.
    pub fn from_config(config: &BreakerConfig) -> Self {
        let timeout = Duration::from_secs(config.recovery_timeout_secs);
        let mut breakers = HashMap::new();
        for platform in [Platform::LinkedIn, Platform::Email, Platform::Twitter] {
            let name = Self::workflow_name(platform);
            breakers.insert(
                name.clone(),
                Arc::new(CircuitBreaker::new(name, config.failure_threshold, timeout)),
            );
        }
        breakers.insert(
            GRADING_BREAKER.to_string(),
            Arc::new(CircuitBreaker::new(
                GRADING_BREAKER,
                config.failure_threshold,
                timeout,
            )),
        );
        Self { breakers }
    }

    pub fn workflow_name(platform: Platform) -> String {
        format!("workflow:{}", platform)
    }

    /// Breaker for a platform's writer/reviser calls
    pub fn workflow(&self, platform: Platform) -> Arc<CircuitBreaker> {
        self.get(&Self::workflow_name(platform))
    }

    /// Breaker for grading calls
    pub fn grading(&self) -> Arc<CircuitBreaker> {
        self.get(GRADING_BREAKER)
    }

    fn get(&self, name: &str) -> Arc<CircuitBreaker> {
        // Standard names are always seeded in from_config
        self.breakers
            .get(name)
            .cloned()
            .unwrap_or_else(|| Arc::new(CircuitBreaker::default()))
    }

    /// Snapshot every breaker, for status display
    pub fn snapshots(&self) -> Vec<(String, copysmith_agent::BreakerSnapshot)> {
        let mut out: Vec<_> = self
            .breakers
            .iter()
            .map(|(name, b)| (name.clone(), b.snapshot()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;

    use copysmith_agent::{CircuitState, Tool, ToolDispatcher, ToolId};
    use copysmith_core::{ToolCallRequest, ToolTimeouts};

    #[test]
    fn test_registry_seeds_all_integration_points() {
        let registry = BreakerRegistry::from_config(&BreakerConfig::default());
        assert_eq!(registry.snapshots().len(), 4);
        assert_eq!(registry.grading().state(), CircuitState::Closed);
    }

    #[test]
    fn test_platform_breakers_are_independent() {
        let config = BreakerConfig {
            failure_threshold: 1,
            recovery_timeout_secs: 60,
        };
        let registry = BreakerRegistry::from_config(&config);

        let email = registry.workflow(Platform::Email);
        let _ = email.call(|| -> copysmith_core::Result<()> {
            Err(copysmith_core::CopysmithError::Other("boom".into()))
        });

        assert_eq!(email.state(), CircuitState::Open);
        assert_eq!(
            registry.workflow(Platform::LinkedIn).state(),
            CircuitState::Closed
        );
        assert_eq!(registry.grading().state(), CircuitState::Closed);
    }

    struct SlowTool;

    #[async_trait]
    impl Tool for SlowTool {
        async fn run(&self, _input: serde_json::Value) -> Result<String, String> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok("too late".to_string())
        }
    }

    #[tokio::test]
    async fn test_tool_timeout_does_not_trip_any_breaker() {
        let registry = BreakerRegistry::from_config(&BreakerConfig::default());

        let mut dispatcher = ToolDispatcher::new(ToolTimeouts {
            general_secs: 0,
            composite_secs: 0,
        });
        dispatcher.register(
            ToolId::ResearchLookup,
            "slow",
            serde_json::json!({}),
            Arc::new(SlowTool),
        );

        let result = dispatcher
            .execute(&ToolCallRequest {
                tool_name: "research_lookup".to_string(),
                input: serde_json::json!({}),
                call_id: "c1".to_string(),
            })
            .await;

        assert!(result.is_error);
        assert!(result.content.contains("research_lookup"));
        for (_, snapshot) in registry.snapshots() {
            assert_eq!(snapshot.state, CircuitState::Closed);
        }
    }
}
