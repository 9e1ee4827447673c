//! Prometheus metrics for the child range index
//!
//! Counters are created unregistered so several hierarchies can coexist;
//! call [`ChildRangeMetrics::register`] to expose them.

use prometheus::{IntCounter, IntGauge, Opts, Registry};

use crate::errors::HierarchyResult;

#[derive(Clone)]
pub struct ChildRangeMetrics {
    pub hits: IntCounter,
    pub misses: IntCounter,
    pub probe_reads: IntCounter,
    pub invalidations: IntCounter,
    pub entries: IntGauge,
}

impl ChildRangeMetrics {
    pub fn new() -> HierarchyResult<Self> {
        Ok(Self {
            hits: IntCounter::with_opts(Opts::new(
                "hierarchy_child_range_hits_total",
                "Child range cache hits",
            ))?,
            misses: IntCounter::with_opts(Opts::new(
                "hierarchy_child_range_misses_total",
                "Child range cache misses",
            ))?,
            probe_reads: IntCounter::with_opts(Opts::new(
                "hierarchy_probe_reads_total",
                "Rows read by bounded probes",
            ))?,
            invalidations: IntCounter::with_opts(Opts::new(
                "hierarchy_invalidations_total",
                "Full child range cache invalidations",
            ))?,
            entries: IntGauge::with_opts(Opts::new(
                "hierarchy_child_range_entries",
                "Cached child ranges",
            ))?,
        })
    }

    pub fn register(&self, registry: &Registry) -> HierarchyResult<()> {
        registry.register(Box::new(self.hits.clone()))?;
        registry.register(Box::new(self.misses.clone()))?;
        registry.register(Box::new(self.probe_reads.clone()))?;
        registry.register(Box::new(self.invalidations.clone()))?;
        registry.register(Box::new(self.entries.clone()))?;
        Ok(())
    }

    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.get() as f64;
        let total = hits + self.misses.get() as f64;
        if total > 0.0 {
            hits / total
        } else {
            0.0
        }
    }
}
