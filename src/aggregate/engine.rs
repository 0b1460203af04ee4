//! The aggregation engine: concurrent provider fan-out with per-call
//! deadlines and failure isolation.
//!
//! One pass launches every applicable provider as an independent task, waits
//! for all of them (no short-circuiting), and classifies each outcome.
//! Provider failures never escape `execute` as errors; they become entries
//! in the failed list plus human-readable strings. There are no retries.

use super::provider::ProviderRegistry;
use super::types::{AggregationResult, ProviderError, ProviderResult, ProviderStatus, QueryContext};
use crate::config::EngineConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::Instant;

type TaskOutcome = Result<Result<ProviderResult, ProviderError>, tokio::time::error::Elapsed>;

pub struct AggregationEngine {
    registry: Arc<ProviderRegistry>,
    config: EngineConfig,
}

impl AggregationEngine {
    pub fn new(registry: Arc<ProviderRegistry>, config: EngineConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Run one aggregation pass for a coordinate within a municipality.
    ///
    /// Always returns; every attempted provider lands in exactly one of
    /// `providers_succeeded` / `providers_failed`. An empty applicable set
    /// is a success with a single warning, not an error.
    pub async fn execute(&self, lat: f64, lon: f64, municipality: &str) -> AggregationResult {
        let started = Instant::now();
        let mut result = AggregationResult::default();

        let mut applicable = self.registry.applicable(municipality);
        applicable.retain(|p| {
            if self.config.enabled(p.name()) {
                true
            } else {
                result.warnings.push(format!("{}: disabled by configuration", p.name()));
                false
            }
        });

        if applicable.is_empty() {
            result.warnings.push("no applicable providers".into());
            result.total_time_ms = started.elapsed().as_secs_f64() * 1000.0;
            return result;
        }

        let ctx = Arc::new(QueryContext {
            municipality: municipality.to_string(),
            address: None,
        });
        let semaphore = self
            .config
            .max_parallel_providers
            .map(|n| Arc::new(Semaphore::new(n.max(1))));

        let mut tasks: Vec<(String, Duration, JoinHandle<TaskOutcome>)> = Vec::with_capacity(applicable.len());
        for provider in applicable {
            let name = provider.name().to_string();
            let deadline = self.config.timeout_for(&name);
            let ctx = Arc::clone(&ctx);
            let semaphore = semaphore.clone();

            let handle = tokio::spawn(async move {
                // The permit gates task start; the deadline covers only the
                // call itself, not time spent queued behind the cap.
                let _permit = match &semaphore {
                    Some(sem) => Arc::clone(sem).acquire_owned().await.ok(),
                    None => None,
                };
                tokio::time::timeout(deadline, provider.query(lat, lon, &ctx)).await
            });
            tasks.push((name, deadline, handle));
        }

        // Full fan-in: await every task, timed out or not.
        for (name, deadline, handle) in tasks {
            match handle.await {
                Err(join_err) => {
                    result.providers_failed.push(name.clone());
                    result.errors.push(format!("{}: provider task panicked: {}", name, join_err));
                }
                Ok(Err(_elapsed)) => {
                    result.providers_failed.push(name.clone());
                    result.errors.push(format!(
                        "{}: timed out after {:.0}ms",
                        name,
                        deadline.as_secs_f64() * 1000.0
                    ));
                }
                Ok(Ok(Err(provider_err))) => {
                    result.providers_failed.push(name.clone());
                    result.errors.push(format!("{}: {}", name, provider_err));
                }
                Ok(Ok(Ok(pr))) => self.classify(&mut result, &name, pr),
            }
        }

        result.total_time_ms = started.elapsed().as_secs_f64() * 1000.0;
        result
    }

    /// Fold one returned `ProviderResult` into the pass summary.
    fn classify(&self, result: &mut AggregationResult, name: &str, pr: ProviderResult) {
        for warning in &pr.warnings {
            result.warnings.push(format!("{}: {}", name, warning));
        }

        if !pr.success {
            result.providers_failed.push(name.to_string());
            let detail = pr
                .error
                .unwrap_or_else(|| format!("failed with status {}", pr.status));
            result.errors.push(format!("{}: {}", name, detail));
            return;
        }

        match pr.data {
            Some(payload) => {
                result.providers_succeeded.push(name.to_string());
                if pr.status == ProviderStatus::Partial {
                    result.warnings.push(format!("{}: returned partial data", name));
                }
                result.data.insert(name.to_string(), payload);
            }
            // Contract violation by the provider: success with no payload.
            None => {
                result.providers_failed.push(name.to_string());
                result.errors.push(format!("{}: reported success without a payload", name));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::provider::{Provider, SourceType, StaticProvider};
    use async_trait::async_trait;
    use serde_json::json;

    /// Test double with a programmable delay and outcome.
    struct ScriptedProvider {
        name: String,
        delay: Duration,
        outcome: Outcome,
    }

    enum Outcome {
        Ok(serde_json::Value),
        Failed(String),
        Err(String),
        Panic,
        SuccessNoData,
        WithWarnings(serde_json::Value, Vec<String>),
    }

    impl ScriptedProvider {
        fn new(name: &str, delay_ms: u64, outcome: Outcome) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                delay: Duration::from_millis(delay_ms),
                outcome,
            })
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            &self.name
        }

        fn source_type(&self) -> SourceType {
            SourceType::MunicipalOpenData
        }

        fn is_applicable(&self, _region: &str) -> bool {
            true
        }

        async fn query(&self, _lat: f64, _lon: f64, _ctx: &QueryContext) -> Result<ProviderResult, ProviderError> {
            tokio::time::sleep(self.delay).await;
            match &self.outcome {
                Outcome::Ok(v) => Ok(ProviderResult::ok(&self.name, v.clone())),
                Outcome::Failed(msg) => Ok(ProviderResult::failed(&self.name, msg)),
                Outcome::Err(msg) => Err(ProviderError::Network(msg.clone())),
                Outcome::Panic => panic!("scripted panic"),
                Outcome::SuccessNoData => {
                    let mut r = ProviderResult::ok(&self.name, json!({}));
                    r.data = None;
                    Ok(r)
                }
                Outcome::WithWarnings(v, warnings) => {
                    let mut r = ProviderResult::ok(&self.name, v.clone());
                    r.warnings = warnings.clone();
                    Ok(r)
                }
            }
        }
    }

    fn engine(providers: Vec<Arc<dyn Provider>>, config: EngineConfig) -> AggregationEngine {
        let mut registry = ProviderRegistry::new();
        for p in providers {
            registry.register(p);
        }
        AggregationEngine::new(Arc::new(registry), config)
    }

    fn config_with_timeout(secs: u64) -> EngineConfig {
        EngineConfig {
            default_timeout_secs: secs,
            ..EngineConfig::default()
        }
    }

    #[tokio::test]
    async fn test_no_applicable_providers_is_success() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(
            StaticProvider::new("local", SourceType::MunicipalOpenData, json!({}))
                .with_regions(vec!["Hamilton".into()]),
        ));
        let engine = AggregationEngine::new(Arc::new(registry), EngineConfig::default());

        let result = engine.execute(43.0, -79.0, "Toronto").await;
        assert!(result.errors.is_empty());
        assert!(result.data.is_empty());
        assert_eq!(result.warnings, vec!["no applicable providers"]);
        assert!(result.providers_succeeded.is_empty());
        assert!(result.providers_failed.is_empty());
    }

    #[tokio::test]
    async fn test_all_outcomes_accounted_for() {
        let engine = engine(
            vec![
                ScriptedProvider::new("ok", 0, Outcome::Ok(json!({"zoning": "R1"}))),
                ScriptedProvider::new("bad", 0, Outcome::Failed("upstream 500".into())),
                ScriptedProvider::new("raise", 0, Outcome::Err("connection refused".into())),
                ScriptedProvider::new("boom", 0, Outcome::Panic),
                ScriptedProvider::new("hollow", 0, Outcome::SuccessNoData),
            ],
            EngineConfig::default(),
        );

        let result = engine.execute(43.0, -79.0, "Hamilton").await;

        let attempted: Vec<String> = ["ok", "bad", "raise", "boom", "hollow"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(result.accounts_for(&attempted));
        assert_eq!(result.providers_succeeded, vec!["ok"]);
        assert_eq!(result.providers_failed.len(), 4);
        assert_eq!(result.data.len(), 1);
        assert_eq!(result.data["ok"]["zoning"], "R1");
        assert!(result.errors.iter().any(|e| e.starts_with("bad: upstream 500")));
        assert!(result.errors.iter().any(|e| e.contains("panicked")));
        assert!(result.errors.iter().any(|e| e.contains("without a payload")));
    }

    #[tokio::test]
    async fn test_slow_provider_times_out_fast_one_survives() {
        tokio::time::pause();
        let engine = engine(
            vec![
                ScriptedProvider::new("a", 10, Outcome::Ok(json!({"zoning": "R1"}))),
                ScriptedProvider::new("b", 60_000, Outcome::Ok(json!({"zoning": "X"}))),
            ],
            config_with_timeout(1),
        );

        let result = engine.execute(43.0, -79.0, "Hamilton").await;
        assert_eq!(result.providers_succeeded, vec!["a"]);
        assert_eq!(result.providers_failed, vec!["b"]);
        assert_eq!(result.data.len(), 1);
        assert!(result.errors.iter().any(|e| e.starts_with("b: timed out")));
        // Wall clock is bounded by the deadline, not b's 60s sleep.
        assert!(result.total_time_ms < 1500.0, "got {}", result.total_time_ms);
    }

    #[tokio::test]
    async fn test_total_time_is_wall_clock_not_sum() {
        tokio::time::pause();
        // Two 400ms providers in parallel: the pass takes ~400ms, not 800.
        let engine = engine(
            vec![
                ScriptedProvider::new("a", 400, Outcome::Ok(json!({}))),
                ScriptedProvider::new("b", 400, Outcome::Ok(json!({}))),
            ],
            EngineConfig::default(),
        );

        let result = engine.execute(43.0, -79.0, "Hamilton").await;
        assert_eq!(result.providers_succeeded.len(), 2);
        assert!(result.total_time_ms < 700.0, "got {}", result.total_time_ms);
    }

    #[tokio::test]
    async fn test_warnings_prefixed_with_provider_name() {
        let engine = engine(
            vec![ScriptedProvider::new(
                "census",
                0,
                Outcome::WithWarnings(json!({"population": 500000}), vec!["2021 vintage".into()]),
            )],
            EngineConfig::default(),
        );

        let result = engine.execute(43.0, -79.0, "Hamilton").await;
        assert_eq!(result.warnings, vec!["census: 2021 vintage"]);
    }

    #[tokio::test]
    async fn test_disabled_provider_not_attempted() {
        let mut config = EngineConfig::default();
        config.providers.insert(
            "bad".into(),
            crate::config::ProviderConfig {
                enabled: false,
                ..Default::default()
            },
        );
        let engine = engine(
            vec![
                ScriptedProvider::new("ok", 0, Outcome::Ok(json!({}))),
                ScriptedProvider::new("bad", 0, Outcome::Panic),
            ],
            config,
        );

        let result = engine.execute(43.0, -79.0, "Hamilton").await;
        assert_eq!(result.providers_succeeded, vec!["ok"]);
        assert!(result.providers_failed.is_empty());
        assert!(result.warnings.iter().any(|w| w == "bad: disabled by configuration"));
    }

    #[tokio::test]
    async fn test_parallel_cap_still_completes_all() {
        let mut config = EngineConfig::default();
        config.max_parallel_providers = Some(1);
        let engine = engine(
            vec![
                ScriptedProvider::new("a", 5, Outcome::Ok(json!({}))),
                ScriptedProvider::new("b", 5, Outcome::Ok(json!({}))),
                ScriptedProvider::new("c", 5, Outcome::Ok(json!({}))),
            ],
            config,
        );

        let result = engine.execute(43.0, -79.0, "Hamilton").await;
        assert_eq!(result.providers_succeeded.len(), 3);
        assert!(result.providers_failed.is_empty());
    }

    #[tokio::test]
    async fn test_all_failing_never_raises() {
        let engine = engine(
            vec![
                ScriptedProvider::new("x", 0, Outcome::Failed("down".into())),
                ScriptedProvider::new("y", 0, Outcome::Panic),
            ],
            EngineConfig::default(),
        );

        let result = engine.execute(43.0, -79.0, "Hamilton").await;
        assert!(result.data.is_empty());
        assert_eq!(result.providers_failed.len(), 2);
        assert_eq!(result.errors.len(), 2);
    }
}
