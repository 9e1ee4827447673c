//! Child range discovery and caching
//!
//! Ranges are computed lazily on the first `children`/`has_children` query
//! for a parent and reused until the next invalidation.

mod index;
mod metrics;
mod probe;

pub use index::ChildRangeIndex;
pub use metrics::ChildRangeMetrics;
pub use probe::{BoundedProbe, ChildRange, ProbeStats};

use super::node_view::NodeView;
use super::state::HierarchyState;
use crate::domain::{is_truthy, HierarchicalId};

impl HierarchyState {
    /// Cached or freshly probed child range of `parent`
    pub(crate) fn child_range(&self, parent: &HierarchicalId) -> Option<ChildRange> {
        let parent_def = self.level(parent.level())?;
        let child_def = self.level(parent.level() + 1)?;

        let generation = {
            let cache = self.cache.lock();
            if let Some(hit) = cache.ranges.get(parent) {
                self.metrics.hits.inc();
                return hit;
            }
            cache.ranges.generation()
        };
        self.metrics.misses.inc();

        let link = child_def.parent_link_field.as_deref()?;
        let probe = BoundedProbe {
            children: child_def.source.as_ref(),
            parents: parent_def.source.as_ref(),
            parent_link_field: link,
            entity_id_field: &self.config.entity_id_field,
            max_steps: self.config.max_probe_steps,
            verify: self.config.verify_ranges,
        };

        let mut stats = ProbeStats::default();
        let range = probe.find_range(parent.local_id(), &mut stats);
        self.metrics.probe_reads.inc_by(stats.reads);

        tracing::debug!(
            "Child range miss for {}: {:?} ({} reads, {} steps)",
            parent,
            range,
            stats.reads,
            stats.steps
        );

        let mut cache = self.cache.lock();
        if cache.ranges.insert(parent.clone(), range, generation) {
            self.metrics.entries.set(cache.ranges.len() as i64);
        }
        range
    }

    pub(crate) fn children(&self, parent: &HierarchicalId) -> NodeView {
        let child_level = parent.level() + 1;
        match (self.child_range(parent), self.level(child_level)) {
            (Some(range), Some(child_def)) => {
                NodeView::children(child_def.source.clone(), parent.clone(), range)
            }
            _ => NodeView::empty(child_level),
        }
    }

    pub(crate) fn has_children(&self, id: &HierarchicalId) -> bool {
        let Some(def) = self.level(id.level()) else {
            return false;
        };
        if self.level(id.level() + 1).is_none() {
            return false;
        }

        if let Some(field) = &def.has_children_field {
            return def
                .source
                .field(id.local_id(), field)
                .map_or(false, |value| is_truthy(&value));
        }

        self.child_range(id).is_some()
    }
}
