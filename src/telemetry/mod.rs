//! Telemetry for PartAssist
//!
//! In-process request statistics keyed by intent. The collector is cheap to
//! clone and shared between the pipeline and the HTTP layer.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::types::Intent;

/// Telemetry event types
#[derive(Debug, Clone)]
pub enum TelemetryEvent {
    RequestCompleted {
        intent: Intent,
        retrieved: usize,
        product_card: bool,
        duration_ms: u64,
    },
    RequestFailed {
        intent: Intent,
        code: &'static str,
        duration_ms: u64,
    },
    IndexRun {
        indexed: usize,
        total_units: usize,
    },
}

/// Telemetry statistics
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct TelemetryStats {
    pub requests_total: usize,
    pub requests_failed: usize,
    pub failures_by_code: BTreeMap<&'static str, usize>,
    pub product_cards: usize,
    pub empty_retrievals: usize,
    pub by_intent: BTreeMap<Intent, usize>,
    pub total_latency_ms: u64,
    pub units_indexed: usize,
    /// Index size after the most recent indexing run
    pub total_units: Option<usize>,
}

impl TelemetryStats {
    /// Mean latency over all requests, failed ones included
    pub fn mean_latency_ms(&self) -> f64 {
        if self.requests_total == 0 {
            0.0
        } else {
            self.total_latency_ms as f64 / self.requests_total as f64
        }
    }
}

/// Point-in-time view served by `/stats`
#[derive(Debug, Clone, Serialize)]
pub struct TelemetrySnapshot {
    #[serde(flatten)]
    pub stats: TelemetryStats,
    pub mean_latency_ms: f64,
    pub uptime_secs: u64,
}

/// Telemetry collector
#[derive(Clone)]
pub struct TelemetryCollector {
    stats: Arc<Mutex<TelemetryStats>>,
    start_time: Instant,
}

impl TelemetryCollector {
    /// Create a new telemetry collector
    pub fn new() -> Self {
        Self {
            stats: Arc::new(Mutex::new(TelemetryStats::default())),
            start_time: Instant::now(),
        }
    }

    /// Record an event
    pub fn record(&self, event: TelemetryEvent) {
        let mut stats = lock(&self.stats);
        match event {
            TelemetryEvent::RequestCompleted {
                intent,
                retrieved,
                product_card,
                duration_ms,
            } => {
                stats.requests_total += 1;
                *stats.by_intent.entry(intent).or_insert(0) += 1;
                stats.total_latency_ms += duration_ms;
                if product_card {
                    stats.product_cards += 1;
                }
                if retrieved == 0 {
                    stats.empty_retrievals += 1;
                }
            }
            TelemetryEvent::RequestFailed {
                intent,
                code,
                duration_ms,
            } => {
                stats.requests_total += 1;
                stats.requests_failed += 1;
                *stats.failures_by_code.entry(code).or_insert(0) += 1;
                *stats.by_intent.entry(intent).or_insert(0) += 1;
                stats.total_latency_ms += duration_ms;
            }
            TelemetryEvent::IndexRun {
                indexed,
                total_units,
            } => {
                stats.units_indexed += indexed;
                stats.total_units = Some(total_units);
            }
        }
    }

    /// Get current statistics
    pub fn get_stats(&self) -> TelemetryStats {
        lock(&self.stats).clone()
    }

    /// Get elapsed time since start
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Statistics plus derived figures
    pub fn snapshot(&self) -> TelemetrySnapshot {
        let stats = self.get_stats();
        TelemetrySnapshot {
            mean_latency_ms: stats.mean_latency_ms(),
            uptime_secs: self.elapsed().as_secs(),
            stats,
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(intent: Intent, retrieved: usize, card: bool) -> TelemetryEvent {
        TelemetryEvent::RequestCompleted {
            intent,
            retrieved,
            product_card: card,
            duration_ms: 100,
        }
    }

    #[test]
    fn test_collector_creation() {
        let collector = TelemetryCollector::new();
        assert_eq!(collector.get_stats(), TelemetryStats::default());
        assert_eq!(collector.snapshot().mean_latency_ms, 0.0);
    }

    #[test]
    fn test_counts_by_intent() {
        let collector = TelemetryCollector::new();
        collector.record(completed(Intent::Installation, 4, true));
        collector.record(completed(Intent::Installation, 0, false));
        collector.record(TelemetryEvent::RequestFailed {
            intent: Intent::PartLookup,
            code: "GENERATION_FAILED",
            duration_ms: 50,
        });

        let stats = collector.get_stats();
        assert_eq!(stats.requests_total, 3);
        assert_eq!(stats.requests_failed, 1);
        assert_eq!(stats.failures_by_code["GENERATION_FAILED"], 1);
        assert_eq!(stats.product_cards, 1);
        assert_eq!(stats.empty_retrievals, 1);
        assert_eq!(stats.by_intent[&Intent::Installation], 2);
        assert_eq!(stats.by_intent[&Intent::PartLookup], 1);
        assert!((stats.mean_latency_ms() - 250.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_index_runs_accumulate() {
        let collector = TelemetryCollector::new();
        for total_units in [5, 10] {
            collector.record(TelemetryEvent::IndexRun {
                indexed: 5,
                total_units,
            });
        }
        let stats = collector.get_stats();
        assert_eq!(stats.units_indexed, 10);
        assert_eq!(stats.total_units, Some(10));
    }

    #[test]
    fn test_snapshot_serializes_flat() {
        let collector = TelemetryCollector::new();
        collector.record(completed(Intent::PartLookup, 1, false));
        let value = serde_json::to_value(collector.snapshot()).unwrap();
        assert_eq!(value["by_intent"]["part_lookup"], 1);
        assert_eq!(value["requests_total"], 1);
        assert_eq!(value["mean_latency_ms"], 100.0);
        assert!(value["uptime_secs"].is_u64());
    }
}
