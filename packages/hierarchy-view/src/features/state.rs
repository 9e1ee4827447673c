//! State shared by the hierarchy facade and its source watchers
//!
//! The child range cache and the notification phase sit behind one mutex.
//! No lock is held while calling into sources or listeners.

use parking_lot::{Mutex, RwLock};
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use super::change_notifier::{HierarchyListener, ListenerId, NotifyPhase};
use super::child_range::{ChildRangeIndex, ChildRangeMetrics};
use super::property_resolver::PropertyResolver;
use crate::config::HierarchyConfig;
use crate::domain::LevelDefinition;

pub(crate) struct CacheState {
    pub(crate) ranges: ChildRangeIndex,
    pub(crate) phase: NotifyPhase,
}

pub(crate) struct HierarchyState {
    /// Indexed by level number
    pub(crate) levels: Vec<LevelDefinition>,
    pub(crate) resolver: PropertyResolver,
    pub(crate) config: HierarchyConfig,
    pub(crate) cache: Mutex<CacheState>,
    pub(crate) listeners: RwLock<Vec<(ListenerId, Arc<dyn HierarchyListener>)>>,
    pub(crate) next_listener: AtomicU64,
    pub(crate) metrics: ChildRangeMetrics,
}

impl HierarchyState {
    pub(crate) fn new(
        levels: Vec<LevelDefinition>,
        resolver: PropertyResolver,
        config: HierarchyConfig,
        metrics: ChildRangeMetrics,
    ) -> Self {
        Self {
            levels,
            resolver,
            config,
            cache: Mutex::new(CacheState {
                ranges: ChildRangeIndex::new(),
                phase: NotifyPhase::Idle,
            }),
            listeners: RwLock::new(Vec::new()),
            next_listener: AtomicU64::new(1),
            metrics,
        }
    }

    pub(crate) fn level(&self, level: usize) -> Option<&LevelDefinition> {
        self.levels.get(level)
    }

    /// Drop every cached range
    pub(crate) fn invalidate_ranges(&self) -> usize {
        let dropped = self.cache.lock().ranges.clear();
        self.metrics.invalidations.inc();
        self.metrics.entries.set(0);
        dropped
    }
}
