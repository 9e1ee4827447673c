//! Change aggregation across leaf sources
//!
//! Each notifying source gets a [`LevelWatcher`]. A notification clears the
//! whole child range index, asks every other refreshable source to refresh,
//! then emits a single [`HierarchyChange`] to the hierarchy listeners.
//!
//! Refreshing a source usually makes it notify again. Those nested
//! notifications arrive while the phase is `Notifying` and are dropped.
//! Operations that touch several sources at once (sort) run inside
//! [`HierarchyState::batch_notifications`] and also produce one change.

use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::state::{CacheState, HierarchyState};
use crate::ports::{SourceEvent, SourceListener};

/// Reentrancy state of the notifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyPhase {
    Idle,
    Notifying,
}

/// Aggregated change event emitted by a hierarchy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyChange {
    /// Level whose source reported the change
    pub origin_level: usize,
    pub event: SourceEvent,
    /// Levels asked to refresh, in level order
    pub refreshed_levels: Vec<usize>,
    /// Child ranges dropped from the cache
    pub cleared_ranges: usize,
}

pub trait HierarchyListener: Send + Sync {
    fn on_hierarchy_change(&self, change: &HierarchyChange);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Subscription a hierarchy holds on one level source
pub(crate) struct LevelWatcher {
    level: usize,
    state: Weak<HierarchyState>,
}

impl LevelWatcher {
    pub(crate) fn new(level: usize, state: Weak<HierarchyState>) -> Self {
        Self { level, state }
    }
}

impl SourceListener for LevelWatcher {
    fn on_source_change(&self, event: &SourceEvent) {
        if let Some(state) = self.state.upgrade() {
            state.handle_source_change(self.level, *event);
        }
    }
}

/// Puts the phase back to `Idle` even if a listener panics
struct PhaseReset<'a>(&'a Mutex<CacheState>);

impl Drop for PhaseReset<'_> {
    fn drop(&mut self) {
        self.0.lock().phase = NotifyPhase::Idle;
    }
}

impl HierarchyState {
    /// Enter `Notifying` and clear the cache; `None` if a notification is running
    fn begin_notify(&self) -> Option<usize> {
        let cleared_ranges = {
            let mut cache = self.cache.lock();
            if cache.phase == NotifyPhase::Notifying {
                return None;
            }
            cache.phase = NotifyPhase::Notifying;
            cache.ranges.clear()
        };
        self.metrics.invalidations.inc();
        self.metrics.entries.set(0);
        Some(cleared_ranges)
    }

    pub(crate) fn handle_source_change(&self, origin_level: usize, event: SourceEvent) {
        let Some(cleared_ranges) = self.begin_notify() else {
            tracing::debug!(
                "Dropping nested {:?} from level {} during notification",
                event,
                origin_level
            );
            return;
        };
        let _reset = PhaseReset(&self.cache);

        self.refresh_and_emit(origin_level, event, &[origin_level], cleared_ranges);
    }

    /// Run `work` with source notifications muted, then emit one change
    ///
    /// `work` returns its result and the levels it changed; the first changed
    /// level is reported as the origin. Nothing is emitted when no level
    /// changed. Called during a notification, `work` runs without emitting.
    pub(crate) fn batch_notifications<R>(
        &self,
        event: SourceEvent,
        work: impl FnOnce() -> (R, Vec<usize>),
    ) -> R {
        let Some(cleared_ranges) = self.begin_notify() else {
            let (result, _) = work();
            self.invalidate_ranges();
            return result;
        };
        let _reset = PhaseReset(&self.cache);

        let (result, changed) = work();
        if let Some(&origin_level) = changed.first() {
            self.refresh_and_emit(origin_level, event, &changed, cleared_ranges);
        } else {
            self.cache.lock().ranges.clear();
        }
        result
    }

    /// Refresh every refreshable level not in `changed`, then emit
    fn refresh_and_emit(
        &self,
        origin_level: usize,
        event: SourceEvent,
        changed: &[usize],
        cleared_ranges: usize,
    ) {
        let mut refreshed_levels = Vec::new();
        for def in &self.levels {
            if changed.contains(&def.level) || !def.source.supports_refresh() {
                continue;
            }
            def.source.refresh();
            refreshed_levels.push(def.level);
        }

        // Sources changed after the first clear; drop anything probed meanwhile
        self.cache.lock().ranges.clear();

        tracing::debug!(
            "Level {} reported {:?}: cleared {} ranges, refreshed levels {:?}",
            origin_level,
            event,
            cleared_ranges,
            refreshed_levels
        );

        let change = HierarchyChange {
            origin_level,
            event,
            refreshed_levels,
            cleared_ranges,
        };
        self.emit(&change);
    }

    pub(crate) fn emit(&self, change: &HierarchyChange) {
        let listeners: Vec<Arc<dyn HierarchyListener>> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener.on_hierarchy_change(change);
        }
    }

    pub(crate) fn add_listener(&self, listener: Arc<dyn HierarchyListener>) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, listener));
        id
    }

    pub(crate) fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub(crate) fn phase(&self) -> NotifyPhase {
        self.cache.lock().phase
    }
}
