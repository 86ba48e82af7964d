use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use serde::Serialize;

use crate::hermes::types::HermesOp;

const LATENCY_BUCKETS_US: [u64; 5] = [10, 100, 1_000, 10_000, u64::MAX];
const BUCKET_MIDPOINTS_US: [f64; 5] = [5.0, 55.0, 550.0, 5_500.0, 15_000.0];

#[derive(Default)]
struct OpMetrics {
    call_count: AtomicU64,
    error_count: AtomicU64,
    total_latency_us: AtomicU64,
    last_called_at: AtomicI64,
    latency_buckets: [AtomicU64; 5],
}

impl OpMetrics {
    fn record_latency_bucket(&self, latency_us: u64) {
        if let Some(i) = LATENCY_BUCKETS_US.iter().position(|&t| latency_us <= t) {
            self.latency_buckets[i].fetch_add(1, Ordering::Relaxed);
        }
    }

    fn p50_p95(&self) -> (f64, f64) {
        let counts: Vec<u64> = self
            .latency_buckets
            .iter()
            .map(|b| b.load(Ordering::Relaxed))
            .collect();
        let total: u64 = counts.iter().sum();
        if total == 0 {
            return (0.0, 0.0);
        }

        let percentile = |pct: f64| -> f64 {
            let target = (pct / 100.0 * total as f64).ceil() as u64;
            let mut cumulative = 0u64;
            for (i, &count) in counts.iter().enumerate() {
                cumulative += count;
                if cumulative >= target {
                    return BUCKET_MIDPOINTS_US[i];
                }
            }
            BUCKET_MIDPOINTS_US[BUCKET_MIDPOINTS_US.len() - 1]
        };

        (percentile(50.0), percentile(95.0))
    }
}

/// Per-operation call counters for the engine.
pub struct MetricsRegistry {
    ops: HashMap<HermesOp, OpMetrics>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        let ops = HermesOp::ALL
            .iter()
            .map(|op| (*op, OpMetrics::default()))
            .collect();
        Self { ops }
    }

    pub fn record_call(&self, op: HermesOp, latency_us: u64, is_error: bool) {
        let Some(metric) = self.ops.get(&op) else {
            return;
        };
        metric.call_count.fetch_add(1, Ordering::Relaxed);
        metric
            .total_latency_us
            .fetch_add(latency_us, Ordering::Relaxed);
        if is_error {
            metric.error_count.fetch_add(1, Ordering::Relaxed);
        }
        metric.record_latency_bucket(latency_us);
        metric
            .last_called_at
            .store(chrono::Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> HashMap<String, MetricsSnapshot> {
        self.ops
            .iter()
            .map(|(op, metric)| {
                let (p50_us, p95_us) = metric.p50_p95();
                let last = metric.last_called_at.load(Ordering::Relaxed);
                (
                    op.as_str().to_string(),
                    MetricsSnapshot {
                        call_count: metric.call_count.load(Ordering::Relaxed),
                        error_count: metric.error_count.load(Ordering::Relaxed),
                        total_latency_us: metric.total_latency_us.load(Ordering::Relaxed),
                        p50_latency_us: p50_us,
                        p95_latency_us: p95_us,
                        last_called_at: (last > 0).then_some(last),
                    },
                )
            })
            .collect()
    }

    pub fn reset(&self) {
        for metric in self.ops.values() {
            metric.call_count.store(0, Ordering::Relaxed);
            metric.error_count.store(0, Ordering::Relaxed);
            metric.total_latency_us.store(0, Ordering::Relaxed);
            metric.last_called_at.store(0, Ordering::Relaxed);
            for bucket in &metric.latency_buckets {
                bucket.store(0, Ordering::Relaxed);
            }
        }
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub call_count: u64,
    pub error_count: u64,
    pub total_latency_us: u64,
    pub p50_latency_us: f64,
    pub p95_latency_us: f64,
    pub last_called_at: Option<i64>,
}

/// Times `$block` and records it against `$op`. The block must evaluate to a
/// `Result`; it runs inside a closure so `?` stays local to the block.
macro_rules! track_op {
    ($registry:expr, $op:expr, $block:expr) => {{
        let start = std::time::Instant::now();
        #[allow(clippy::redundant_closure_call)]
        let result = (|| $block)();
        let latency_us = start.elapsed().as_micros() as u64;
        $registry.record_call($op, latency_us, result.is_err());
        result
    }};
}

pub(crate) use track_op;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_lists_every_op() {
        let registry = MetricsRegistry::new();
        let snap = registry.snapshot();
        assert_eq!(snap.len(), HermesOp::ALL.len());
        assert_eq!(snap["time_impact"].call_count, 0);
        assert!(snap["time_impact"].last_called_at.is_none());
    }

    #[test]
    fn records_calls_and_errors() {
        let registry = MetricsRegistry::new();
        registry.record_call(HermesOp::VisibilityScore, 4, false);
        registry.record_call(HermesOp::VisibilityScore, 40, true);
        let snap = registry.snapshot();
        let score = &snap["visibility_score"];
        assert_eq!(score.call_count, 2);
        assert_eq!(score.error_count, 1);
        assert_eq!(score.total_latency_us, 44);
        assert_eq!(score.p50_latency_us, 5.0);
        assert_eq!(score.p95_latency_us, 55.0);
        assert!(score.last_called_at.is_some());
    }

    #[test]
    fn reset_clears_counters() {
        let registry = MetricsRegistry::new();
        registry.record_call(HermesOp::ConfigUpdate, 1, false);
        registry.reset();
        assert_eq!(registry.snapshot()["config_update"].call_count, 0);
    }

    #[test]
    fn track_op_marks_errors() {
        let registry = MetricsRegistry::new();
        let result: Result<(), &str> = track_op!(registry, HermesOp::TimeImpact, Err("boom"));
        assert!(result.is_err());
        assert_eq!(registry.snapshot()["time_impact"].error_count, 1);
    }
}
