//! Resolver counters for monitoring

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct ResolverMetrics {
    pub resolutions: AtomicU64,
    /// Tuples whose relation was outside the known vocabulary
    pub unmapped_relations: AtomicU64,
    /// Tuple or candidate fetches that failed and were resolved as "no access"
    pub fetch_failures: AtomicU64,
}

/// Point-in-time copy of [`ResolverMetrics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub resolutions: u64,
    pub unmapped_relations: u64,
    pub fetch_failures: u64,
}

impl ResolverMetrics {
    pub(crate) fn record_resolution(&self) {
        self.resolutions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unmapped(&self) {
        self.unmapped_relations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            resolutions: self.resolutions.load(Ordering::Relaxed),
            unmapped_relations: self.unmapped_relations.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
        }
    }
}
