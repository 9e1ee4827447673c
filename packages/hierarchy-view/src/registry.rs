//! Hierarchy facade
//!
//! ```rust
//! use hierarchy_view::{HierarchyBuilder, LevelDefinition, MemorySource};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let parents = MemorySource::new(["name"])
//!     .with_row("P1", json!({"name": "first"}))
//!     .with_row("P2", json!({"name": "second"}));
//! let children = MemorySource::new(["name", "parent"])
//!     .with_row("C1", json!({"name": "a", "parent": "P1"}))
//!     .with_row("C2", json!({"name": "b", "parent": "P1"}))
//!     .with_row("C3", json!({"name": "c", "parent": "P2"}));
//!
//! let hierarchy = HierarchyBuilder::new(["name"])
//!     .level(LevelDefinition::root(Arc::new(parents), ["name"]))
//!     .level(LevelDefinition::child(1, Arc::new(children), "parent", ["name"]))
//!     .build()
//!     .unwrap();
//!
//! let p1 = hierarchy.root_ids().first().unwrap();
//! assert_eq!(hierarchy.children(&p1).len(), 2);
//! ```

use prometheus::Registry;
use serde_json::Value;
use std::sync::Arc;

use crate::config::HierarchyConfig;
use crate::domain::{HierarchicalId, LevelDefinition, LocalId};
use crate::errors::{HierarchyError, HierarchyResult};
use crate::features::change_notifier::LevelWatcher;
use crate::features::state::HierarchyState;
use crate::features::{
    ChildRangeMetrics, HierarchyListener, ListenerId, NodeView, NotifyPhase, PropertyResolver,
};
use crate::ports::{SharedSource, SubscriptionId};

/// Collects level registrations and validates them in [`build`](Self::build)
pub struct HierarchyBuilder {
    field_names: Vec<String>,
    levels: Vec<LevelDefinition>,
    config: HierarchyConfig,
}

impl HierarchyBuilder {
    /// Start from the global logical field list
    pub fn new<I, S>(field_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field_names: field_names.into_iter().map(Into::into).collect(),
            levels: Vec::new(),
            config: HierarchyConfig::default(),
        }
    }

    pub fn config(mut self, config: HierarchyConfig) -> Self {
        self.config = config;
        self
    }

    pub fn level(mut self, definition: LevelDefinition) -> Self {
        self.levels.push(definition);
        self
    }

    /// Register a level from its parts
    pub fn register<I, S>(
        self,
        level: usize,
        source: SharedSource,
        parent_link_field: Option<&str>,
        has_children_field: Option<&str>,
        field_map: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.level(LevelDefinition::new(
            level,
            source,
            parent_link_field,
            has_children_field,
            field_map,
        ))
    }

    pub fn build(self) -> HierarchyResult<Hierarchy> {
        self.config.validate()?;

        if self.levels.is_empty() {
            return Err(HierarchyError::configuration(
                "At least one level must be registered",
            ));
        }

        let mut levels = self.levels;
        levels.sort_by_key(|def| def.level);

        for (expected, def) in levels.iter().enumerate() {
            if def.level < expected {
                return Err(HierarchyError::configuration(format!(
                    "Level {} is registered more than once",
                    def.level
                )));
            }
            if def.level > expected {
                return Err(HierarchyError::unregistered_level(expected));
            }
            def.validate()?;
            if def.field_map.len() > self.field_names.len() {
                tracing::warn!(
                    "Level {} maps {} fields but only {} logical fields exist",
                    def.level,
                    def.field_map.len(),
                    self.field_names.len()
                );
            }
        }

        let depth = levels.len();
        let state = Arc::new(HierarchyState::new(
            levels,
            PropertyResolver::new(self.field_names),
            self.config,
            ChildRangeMetrics::new()?,
        ));

        let mut subscriptions = Vec::new();
        for def in &state.levels {
            let watcher = Arc::new(LevelWatcher::new(def.level, Arc::downgrade(&state)));
            if let Some(sub) = def.source.subscribe(watcher) {
                subscriptions.push((def.level, sub));
            }
        }

        tracing::info!(
            "hierarchy_built (levels={}, fields={}, watched={})",
            depth,
            state.resolver.field_names().len(),
            subscriptions.len()
        );

        Ok(Hierarchy {
            state,
            subscriptions,
        })
    }
}

/// Read-only virtual tree over per-level sources
pub struct Hierarchy {
    state: Arc<HierarchyState>,
    subscriptions: Vec<(usize, SubscriptionId)>,
}

impl Hierarchy {
    pub fn builder<I, S>(field_names: I) -> HierarchyBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        HierarchyBuilder::new(field_names)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Structure
    // ═══════════════════════════════════════════════════════════════════════

    /// Total number of nodes across all levels
    pub fn size(&self) -> usize {
        self.state.levels.iter().map(|def| def.source.size()).sum()
    }

    pub fn level_size(&self, level: usize) -> Option<usize> {
        self.state.level(level).map(|def| def.source.size())
    }

    /// Number of registered levels
    pub fn depth(&self) -> usize {
        self.state.levels.len()
    }

    pub fn level(&self, level: usize) -> Option<&LevelDefinition> {
        self.state.level(level)
    }

    pub fn config(&self) -> &HierarchyConfig {
        &self.state.config
    }

    pub fn root_ids(&self) -> NodeView {
        match self.state.level(0) {
            Some(root) => NodeView::whole_level(root.source.clone(), 0),
            None => NodeView::empty(0),
        }
    }

    pub fn children(&self, parent: &HierarchicalId) -> NodeView {
        self.state.children(parent)
    }

    pub fn parent(&self, id: &HierarchicalId) -> Option<HierarchicalId> {
        id.parent().cloned()
    }

    pub fn has_children(&self, id: &HierarchicalId) -> bool {
        self.state.has_children(id)
    }

    pub fn is_root(&self, id: &HierarchicalId) -> bool {
        id.level() == 0
    }

    /// True when the id's level exists and its source holds the row
    pub fn contains_id(&self, id: &HierarchicalId) -> bool {
        self.state
            .level(id.level())
            .map_or(false, |def| def.source.contains(id.local_id()))
    }

    /// Build the full identity of a row from its parent-link fields
    pub fn identify(&self, level: usize, local: &LocalId) -> Option<HierarchicalId> {
        self.state.identify(level, local)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Navigation
    // ═══════════════════════════════════════════════════════════════════════

    pub fn first_id(&self) -> Option<HierarchicalId> {
        self.state.first_id()
    }

    pub fn last_id(&self) -> Option<HierarchicalId> {
        self.state.last_id()
    }

    pub fn next_id(&self, id: &HierarchicalId) -> Option<HierarchicalId> {
        self.state.next_id(id)
    }

    pub fn prev_id(&self, id: &HierarchicalId) -> Option<HierarchicalId> {
        self.state.prev_id(id)
    }

    /// First row of the id's whole level (not of its siblings)
    pub fn is_first_id(&self, id: &HierarchicalId) -> bool {
        self.state.is_first_id(id)
    }

    /// Last row of the id's whole level (not of its siblings)
    pub fn is_last_id(&self, id: &HierarchicalId) -> bool {
        self.state.is_last_id(id)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Fields
    // ═══════════════════════════════════════════════════════════════════════

    pub fn field(&self, id: &HierarchicalId, name: &str) -> Option<Value> {
        let def = self.state.level(id.level())?;
        self.state.resolver.read(def, id.local_id(), name)
    }

    pub fn field_names(&self) -> &[String] {
        self.state.resolver.field_names()
    }

    /// Level-local name a logical field reads from
    pub fn resolve_field(&self, level: usize, name: &str) -> Option<String> {
        let def = self.state.level(level)?;
        self.state.resolver.resolve(def, name).map(str::to_string)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Sorting
    // ═══════════════════════════════════════════════════════════════════════

    /// Sort every level by the fields it can resolve; listeners get one `Sorted` change
    pub fn sort<S: AsRef<str>>(&self, fields: &[S], ascending: &[bool]) -> HierarchyResult<()> {
        self.state.sort(fields, ascending)
    }

    pub fn sortable_fields(&self) -> Vec<String> {
        self.state.sortable_fields()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Change subscription
    // ═══════════════════════════════════════════════════════════════════════

    pub fn add_listener(&self, listener: Arc<dyn HierarchyListener>) -> ListenerId {
        self.state.add_listener(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.state.remove_listener(id)
    }

    /// Clear the child range cache without refreshing or notifying
    pub fn invalidate(&self) {
        let dropped = self.state.invalidate_ranges();
        tracing::debug!("Manual invalidation dropped {} ranges", dropped);
    }

    pub fn notify_phase(&self) -> NotifyPhase {
        self.state.phase()
    }

    /// Number of parents with a cached range (including cached "none")
    pub fn cached_ranges(&self) -> usize {
        self.state.cache.lock().ranges.len()
    }

    pub fn metrics(&self) -> &ChildRangeMetrics {
        &self.state.metrics
    }

    pub fn register_metrics(&self, registry: &Registry) -> HierarchyResult<()> {
        self.state.metrics.register(registry)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Rejected mutations
    // ═══════════════════════════════════════════════════════════════════════

    pub fn add_item(
        &self,
        _parent: Option<&HierarchicalId>,
        _local: LocalId,
    ) -> HierarchyResult<HierarchicalId> {
        Err(HierarchyError::unsupported("add_item"))
    }

    pub fn remove_item(&self, _id: &HierarchicalId) -> HierarchyResult<()> {
        Err(HierarchyError::unsupported("remove_item"))
    }

    pub fn add_field(&self, _name: &str, _default: Value) -> HierarchyResult<()> {
        Err(HierarchyError::unsupported("add_field"))
    }

    pub fn remove_field(&self, _name: &str) -> HierarchyResult<()> {
        Err(HierarchyError::unsupported("remove_field"))
    }

    pub fn set_parent(
        &self,
        _id: &HierarchicalId,
        _parent: Option<&HierarchicalId>,
    ) -> HierarchyResult<()> {
        Err(HierarchyError::unsupported("set_parent"))
    }
}

impl Drop for Hierarchy {
    fn drop(&mut self) {
        for (level, sub) in self.subscriptions.drain(..) {
            if let Some(def) = self.state.level(level) {
                def.source.unsubscribe(sub);
            }
        }
    }
}
