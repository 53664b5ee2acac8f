//! Per-provider request accounting.
//!
//! Each provider instance owns its counters; nothing here is global.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct TranslationMetrics {
    /// Chunk requests sent (retries of the same chunk count once)
    api_calls: AtomicUsize,

    /// Chunk requests that ended in failure after retries
    api_failures: AtomicUsize,

    /// Keys that came back with a non-empty translation
    keys_translated: AtomicUsize,

    /// Keys left empty (failed chunk, missing from response, or provider unusable)
    keys_failed: AtomicUsize,
}

impl TranslationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_api_call(&self) {
        self.api_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_api_failure(&self) {
        self.api_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_keys_translated(&self, count: usize) {
        self.keys_translated.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_keys_failed(&self, count: usize) {
        self.keys_failed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn api_calls(&self) -> usize {
        self.api_calls.load(Ordering::Relaxed)
    }

    pub fn api_failures(&self) -> usize {
        self.api_failures.load(Ordering::Relaxed)
    }

    pub fn keys_translated(&self) -> usize {
        self.keys_translated.load(Ordering::Relaxed)
    }

    pub fn keys_failed(&self) -> usize {
        self.keys_failed.load(Ordering::Relaxed)
    }

    /// Snapshot of the counters.
    pub fn report(&self) -> MetricsReport {
        let calls = self.api_calls();
        let failures = self.api_failures();
        let api_success_rate = if calls > 0 {
            ((calls - failures) as f64 / calls as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            api_calls: calls,
            api_failures: failures,
            api_success_rate,
            keys_translated: self.keys_translated(),
            keys_failed: self.keys_failed(),
        }
    }
}

/// Point-in-time copy of [`TranslationMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsReport {
    pub api_calls: usize,
    pub api_failures: usize,
    /// Successful chunk share in percent (0 when nothing was sent)
    pub api_success_rate: f64,
    pub keys_translated: usize,
    pub keys_failed: usize,
}
