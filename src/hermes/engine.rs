use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::constants::OPTIMAL_HOUR;
use crate::hermes::config::{HermesConfig, HermesConfigPatch};
use crate::hermes::decay::{dynamic_decay_constant, visibility_decay};
use crate::hermes::metrics::{self, track_op};
use crate::hermes::time_of_day::{boost_score, hour_of_day};
use crate::hermes::types::*;

/// Immutable view of the engine state. Every composite read runs against a
/// single snapshot, so concurrent updates can never be observed half-applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    pub config: HermesConfig,
    pub system_load: SystemLoad,
}

impl EngineSnapshot {
    pub fn new(config: HermesConfig, system_load: SystemLoad) -> Self {
        Self {
            config,
            system_load,
        }
    }

    pub fn effective_decay_constant(&self, elapsed: ElapsedHours) -> Result<DecayConstant, HermesError> {
        DecayConstant::new(dynamic_decay_constant(
            self.config.base_decay_constant,
            self.system_load.value(),
            elapsed.value(),
        ))
    }

    pub fn visibility_score(
        &self,
        initial_visibility: f64,
        elapsed: ElapsedHours,
    ) -> Result<ScoredVisibility, HermesError> {
        let initial_visibility = validate_visibility(initial_visibility)?;
        let lambda = self.effective_decay_constant(elapsed)?;
        Ok(ScoredVisibility {
            score: visibility_decay(initial_visibility, lambda.value(), elapsed.value()),
            decay_constant: lambda.value(),
        })
    }

    pub fn time_impact(&self, hour: Hour) -> f64 {
        boost_score(
            self.config.max_boost_effect,
            self.config.aggression_factor,
            hour.value(),
            OPTIMAL_HOUR,
        )
    }

    pub fn visibility_report(
        &self,
        profile_id: Option<String>,
        initial_visibility: f64,
        elapsed: ElapsedHours,
        hour: Hour,
    ) -> Result<VisibilityReport, HermesError> {
        let scored = self.visibility_score(initial_visibility, elapsed)?;
        let time_impact = self.time_impact(hour);
        let boosted_score =
            scored.score * (1.0 + self.config.time_of_day_factor * time_impact / 100.0);
        if !boosted_score.is_finite() {
            return Err(HermesError::invalid(
                "initialVisibility",
                format!("boosted score overflows for initial visibility {initial_visibility}"),
            ));
        }
        Ok(VisibilityReport {
            profile_id,
            visibility_score: scored.score,
            decay_constant: scored.decay_constant,
            hour: hour.value(),
            time_impact,
            boosted_score,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredVisibility {
    pub score: f64,
    pub decay_constant: f64,
}

pub struct HermesEngine {
    snapshot: Arc<RwLock<EngineSnapshot>>,
    metrics_registry: Arc<metrics::MetricsRegistry>,
}

impl HermesEngine {
    pub fn new(config: HermesConfig, system_load: SystemLoad) -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(EngineSnapshot::new(config, system_load))),
            metrics_registry: Arc::new(metrics::MetricsRegistry::new()),
        }
    }

    pub fn metrics_registry(&self) -> &Arc<metrics::MetricsRegistry> {
        &self.metrics_registry
    }

    pub async fn snapshot(&self) -> EngineSnapshot {
        self.snapshot.read().await.clone()
    }

    pub async fn get_config(&self) -> HermesConfig {
        self.snapshot.read().await.config.clone()
    }

    pub async fn system_load(&self) -> SystemLoad {
        self.snapshot.read().await.system_load
    }

    /// Decayed visibility for a profile whose boost started `time_elapsed_hours` ago.
    pub async fn calculate_visibility_score(
        &self,
        initial_visibility: f64,
        time_elapsed_hours: f64,
    ) -> Result<ScoredVisibility, HermesError> {
        let snapshot = self.snapshot().await;
        track_op!(self.metrics_registry, HermesOp::VisibilityScore, {
            let elapsed = ElapsedHours::new(time_elapsed_hours)?;
            snapshot.visibility_score(initial_visibility, elapsed)
        })
    }

    /// Scores `(initial_visibility, time_elapsed_hours)` pairs against one snapshot.
    /// Each item succeeds or fails on its own.
    pub async fn calculate_visibility_scores(
        &self,
        items: &[(f64, f64)],
    ) -> Vec<Result<ScoredVisibility, HermesError>> {
        let snapshot = self.snapshot().await;
        items
            .iter()
            .map(|&(initial_visibility, time_elapsed_hours)| {
                track_op!(self.metrics_registry, HermesOp::VisibilityScore, {
                    let elapsed = ElapsedHours::new(time_elapsed_hours)?;
                    snapshot.visibility_score(initial_visibility, elapsed)
                })
            })
            .collect()
    }

    /// Time-of-day bonus. Uses the local wall clock when `current_hour` is `None`.
    pub async fn calculate_time_impact(&self, current_hour: Option<f64>) -> Result<TimeImpact, HermesError> {
        let snapshot = self.snapshot().await;
        track_op!(self.metrics_registry, HermesOp::TimeImpact, {
            let hour = Hour::new(current_hour.unwrap_or_else(current_local_hour))?;
            Ok::<_, HermesError>(TimeImpact {
                hour: hour.value(),
                optimal_hour: OPTIMAL_HOUR,
                time_impact: snapshot.time_impact(hour),
            })
        })
    }

    pub async fn visibility_report(
        &self,
        profile_id: Option<String>,
        initial_visibility: f64,
        time_elapsed_hours: f64,
        current_hour: Option<f64>,
    ) -> Result<VisibilityReport, HermesError> {
        let snapshot = self.snapshot().await;
        track_op!(self.metrics_registry, HermesOp::VisibilityReport, {
            let elapsed = ElapsedHours::new(time_elapsed_hours)?;
            let hour = Hour::new(current_hour.unwrap_or_else(current_local_hour))?;
            snapshot.visibility_report(profile_id, initial_visibility, elapsed, hour)
        })
    }

    /// Clamps `load` into `[0, 1]` and makes it visible to subsequent reads.
    pub async fn update_system_load(&self, load: f64) -> Result<SystemLoad, HermesError> {
        let load = track_op!(
            self.metrics_registry,
            HermesOp::SystemLoadUpdate,
            SystemLoad::new(load)
        )?;
        let mut snapshot = self.snapshot.write().await;
        let previous = snapshot.system_load;
        *snapshot = EngineSnapshot::new(snapshot.config.clone(), load);
        tracing::debug!(
            previous = previous.value(),
            current = load.value(),
            "Hermes system load updated"
        );
        Ok(load)
    }

    /// Merges `patch` into the current config. An invalid result leaves the engine unchanged.
    pub async fn update_config(&self, patch: &HermesConfigPatch) -> Result<HermesConfig, HermesError> {
        let mut snapshot = self.snapshot.write().await;
        let merged = track_op!(self.metrics_registry, HermesOp::ConfigUpdate, {
            let merged = snapshot.config.apply(patch);
            merged.validate().map(|()| merged)
        })?;
        *snapshot = EngineSnapshot::new(merged.clone(), snapshot.system_load);
        tracing::info!(?patch, "Hermes config updated");
        Ok(merged)
    }

    pub async fn reload_config(&self, new_config: HermesConfig) -> Result<(), HermesError> {
        track_op!(
            self.metrics_registry,
            HermesOp::ConfigUpdate,
            new_config.validate()
        )?;
        let mut snapshot = self.snapshot.write().await;
        *snapshot = EngineSnapshot::new(new_config, snapshot.system_load);
        tracing::info!("Hermes config reloaded");
        Ok(())
    }
}

impl Default for HermesEngine {
    fn default() -> Self {
        Self::new(HermesConfig::default(), SystemLoad::IDLE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeImpact {
    pub hour: f64,
    pub optimal_hour: f64,
    pub time_impact: f64,
}

fn current_local_hour() -> f64 {
    hour_of_day(&chrono::Local::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fresh_score_equals_initial() {
        let engine = HermesEngine::default();
        let scored = engine.calculate_visibility_score(100.0, 0.0).await.unwrap();
        assert_eq!(scored.score, 100.0);
        assert_eq!(scored.decay_constant, 0.2);
    }

    #[tokio::test]
    async fn load_accelerates_decay() {
        let engine = HermesEngine::default();
        let idle = engine.calculate_visibility_score(100.0, 10.0).await.unwrap();

        engine.update_system_load(0.5).await.unwrap();
        let loaded = engine.calculate_visibility_score(100.0, 10.0).await.unwrap();

        assert!((loaded.decay_constant - 0.30).abs() < 1e-12);
        assert!(loaded.score < idle.score);
        assert!((loaded.score - 100.0 * (-3.0_f64).exp()).abs() < 1e-9);
    }

    #[tokio::test]
    async fn negative_elapsed_time_is_rejected() {
        let engine = HermesEngine::default();
        let err = engine
            .calculate_visibility_score(100.0, -1.0)
            .await
            .unwrap_err();
        assert!(matches!(err, HermesError::InvalidParameter { .. }));
        let snap = engine.metrics_registry().snapshot();
        assert_eq!(snap["visibility_score"].error_count, 1);
    }

    #[tokio::test]
    async fn batch_scores_items_independently() {
        let engine = HermesEngine::default();
        let results = engine
            .calculate_visibility_scores(&[(100.0, 0.0), (100.0, -2.0), (50.0, 10.0)])
            .await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().score, 100.0);
        assert!(results[1].is_err());
        let third = results[2].as_ref().unwrap();
        assert!((third.score - 50.0 * (-2.5_f64).exp()).abs() < 1e-9);

        let snap = engine.metrics_registry().snapshot();
        assert_eq!(snap["visibility_score"].call_count, 3);
        assert_eq!(snap["visibility_score"].error_count, 1);
    }

    #[tokio::test]
    async fn time_impact_peaks_at_optimal_hour() {
        let engine = HermesEngine::default();
        let impact = engine.calculate_time_impact(Some(21.0)).await.unwrap();
        assert_eq!(impact.time_impact, 75.0);
        assert_eq!(impact.optimal_hour, 21.0);
    }

    #[tokio::test]
    async fn time_impact_wraps_out_of_range_hours() {
        let engine = HermesEngine::default();
        let wrapped = engine.calculate_time_impact(Some(45.0)).await.unwrap();
        let direct = engine.calculate_time_impact(Some(21.0)).await.unwrap();
        assert_eq!(wrapped.hour, 21.0);
        assert_eq!(wrapped.time_impact, direct.time_impact);
    }

    #[tokio::test]
    async fn time_impact_from_wall_clock_is_bounded() {
        let engine = HermesEngine::default();
        let impact = engine.calculate_time_impact(None).await.unwrap();
        assert!((0.0..24.0).contains(&impact.hour));
        assert!(impact.time_impact >= 0.0);
        assert!(impact.time_impact <= 75.0);
    }

    #[tokio::test]
    async fn system_load_is_clamped_on_update() {
        let engine = HermesEngine::default();
        let load = engine.update_system_load(3.0).await.unwrap();
        assert_eq!(load.value(), 1.0);
        assert_eq!(engine.system_load().await.value(), 1.0);
        assert!(engine.update_system_load(f64::NAN).await.is_err());
        assert_eq!(engine.system_load().await.value(), 1.0);
    }

    #[tokio::test]
    async fn config_patch_is_merged() {
        let engine = HermesEngine::default();
        let patch = HermesConfigPatch {
            max_boost_effect: Some(100.0),
            ..Default::default()
        };
        let merged = engine.update_config(&patch).await.unwrap();
        assert_eq!(merged.max_boost_effect, 100.0);
        assert_eq!(merged.aggression_factor, 0.5);

        let impact = engine.calculate_time_impact(Some(21.0)).await.unwrap();
        assert_eq!(impact.time_impact, 100.0);
    }

    #[tokio::test]
    async fn invalid_patch_leaves_config_untouched() {
        let engine = HermesEngine::default();
        let patch = HermesConfigPatch {
            base_decay_constant: Some(-1.0),
            ..Default::default()
        };
        assert!(engine.update_config(&patch).await.is_err());
        assert_eq!(engine.get_config().await, HermesConfig::default());
    }

    #[tokio::test]
    async fn reload_keeps_system_load() {
        let engine = HermesEngine::default();
        engine.update_system_load(0.4).await.unwrap();
        let cfg = HermesConfig {
            base_decay_constant: 0.1,
            ..HermesConfig::default()
        };
        engine.reload_config(cfg.clone()).await.unwrap();
        let snap = engine.snapshot().await;
        assert_eq!(snap.config, cfg);
        assert_eq!(snap.system_load.value(), 0.4);
    }

    #[test]
    fn report_applies_time_of_day_factor() {
        let snapshot = EngineSnapshot::new(
            HermesConfig {
                max_boost_effect: 100.0,
                time_of_day_factor: 0.5,
                ..HermesConfig::default()
            },
            SystemLoad::IDLE,
        );
        let report = snapshot
            .visibility_report(
                Some("profile-1".to_string()),
                80.0,
                ElapsedHours::ZERO,
                Hour::new(21.0).unwrap(),
            )
            .unwrap();
        assert_eq!(report.visibility_score, 80.0);
        assert_eq!(report.time_impact, 100.0);
        assert_eq!(report.boosted_score, 120.0);
        assert_eq!(report.profile_id.as_deref(), Some("profile-1"));
    }

    #[test]
    fn report_rejects_overflowing_boost() {
        let snapshot = EngineSnapshot::new(HermesConfig::default(), SystemLoad::IDLE);
        let err = snapshot
            .visibility_report(None, 1.7e308, ElapsedHours::ZERO, Hour::new(21.0).unwrap())
            .unwrap_err();
        assert!(matches!(
            err,
            HermesError::InvalidParameter { name: "initialVisibility", .. }
        ));

        let huge_boost = EngineSnapshot::new(
            HermesConfig {
                max_boost_effect: f64::MAX,
                time_of_day_factor: 1.0,
                ..HermesConfig::default()
            },
            SystemLoad::IDLE,
        );
        assert!(huge_boost
            .visibility_report(None, 1000.0, ElapsedHours::ZERO, Hour::new(21.0).unwrap())
            .is_err());
    }

    #[test]
    fn snapshot_rejects_negative_visibility() {
        let snapshot = EngineSnapshot::new(HermesConfig::default(), SystemLoad::IDLE);
        assert!(snapshot
            .visibility_score(-1.0, ElapsedHours::ZERO)
            .is_err());
    }
}
