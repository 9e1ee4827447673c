//! In-memory leveled source
//!
//! Rows live in a `Vec` with an id → index map. Mutations do not notify on
//! their own; call [`MemorySource::notify`] (or `refresh`) afterwards, the
//! way a paginated backend would report a reload.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::DEFAULT_ENTITY_ID_FIELD;
use crate::domain::{compare_values, LocalId};
use crate::ports::{
    LeveledSource, SortKey, SourceError, SourceEvent, SourceListener, SourceResult,
    SubscriptionId,
};

#[derive(Debug, Clone)]
struct MemoryRow {
    id: LocalId,
    fields: Map<String, Value>,
}

#[derive(Debug, Default)]
struct MemoryState {
    rows: Vec<MemoryRow>,
    index: FxHashMap<LocalId, usize>,
}

impl MemoryState {
    fn reindex(&mut self) {
        self.index.clear();
        for (i, row) in self.rows.iter().enumerate() {
            self.index.insert(row.id.clone(), i);
        }
    }
}

/// Vec-backed [`LeveledSource`] with sorting, change notification and
/// access counters
pub struct MemorySource {
    field_names: Vec<String>,
    sortable: Vec<String>,
    entity_id_field: String,
    notifications: bool,
    state: RwLock<MemoryState>,
    listeners: RwLock<Vec<(SubscriptionId, Arc<dyn SourceListener>)>>,
    next_subscription: AtomicU64,
    field_reads: AtomicU64,
    refreshes: AtomicU64,
}

impl MemorySource {
    /// Empty source; every field is sortable and notifications are on
    pub fn new<I, S>(field_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let field_names: Vec<String> = field_names.into_iter().map(Into::into).collect();
        Self {
            sortable: field_names.clone(),
            field_names,
            entity_id_field: DEFAULT_ENTITY_ID_FIELD.to_string(),
            notifications: true,
            state: RwLock::new(MemoryState::default()),
            listeners: RwLock::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
            field_reads: AtomicU64::new(0),
            refreshes: AtomicU64::new(0),
        }
    }

    /// Append a row; `fields` must be a JSON object (other values add an
    /// empty row). An existing row with the same id is replaced in place.
    pub fn with_row(self, id: impl Into<LocalId>, fields: Value) -> Self {
        self.push(id, fields);
        self
    }

    /// Restrict sorting to `fields` (empty disables sorting)
    pub fn with_sortable<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sortable = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_notifications(mut self, enabled: bool) -> Self {
        self.notifications = enabled;
        self
    }

    pub fn with_entity_id_field(mut self, field: impl Into<String>) -> Self {
        self.entity_id_field = field.into();
        self
    }

    /// Append a row, or replace the fields of the row that already has `id`
    ///
    /// Returns `false` when an existing row was replaced.
    pub fn push(&self, id: impl Into<LocalId>, fields: Value) -> bool {
        let id = id.into();
        let fields = into_object(fields);
        let mut state = self.state.write();
        if let Some(&existing) = state.index.get(&id) {
            state.rows[existing].fields = fields;
            return false;
        }

        let index = state.rows.len();
        state.index.insert(id.clone(), index);
        state.rows.push(MemoryRow { id, fields });
        true
    }

    /// Insert a row at `index` (clamped to the current size); a row with the
    /// same id is moved there
    pub fn insert(&self, index: usize, id: impl Into<LocalId>, fields: Value) {
        let id = id.into();
        let mut state = self.state.write();
        if let Some(existing) = state.index.remove(&id) {
            state.rows.remove(existing);
        }
        let index = index.min(state.rows.len());
        state.rows.insert(
            index,
            MemoryRow {
                id,
                fields: into_object(fields),
            },
        );
        state.reindex();
    }

    pub fn remove(&self, id: &LocalId) -> bool {
        let mut state = self.state.write();
        match state.index.get(id).copied() {
            Some(index) => {
                state.rows.remove(index);
                state.reindex();
                true
            }
            None => false,
        }
    }

    pub fn set_field(&self, id: &LocalId, name: &str, value: Value) -> bool {
        let mut state = self.state.write();
        let Some(index) = state.index.get(id).copied() else {
            return false;
        };
        state.rows[index].fields.insert(name.to_string(), value);
        true
    }

    /// Reorder rows by local id order; unknown and repeated ids are skipped
    pub fn reorder(&self, ids: &[LocalId]) {
        let mut state = self.state.write();
        let mut rows: Vec<MemoryRow> = Vec::with_capacity(state.rows.len());
        let mut taken = vec![false; state.rows.len()];
        for id in ids {
            if let Some(&index) = state.index.get(id) {
                if !std::mem::replace(&mut taken[index], true) {
                    rows.push(state.rows[index].clone());
                }
            }
        }
        state.rows = rows;
        state.reindex();
    }

    /// Deliver `event` to every subscriber
    pub fn notify(&self, event: SourceEvent) {
        let listeners: Vec<Arc<dyn SourceListener>> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener.on_source_change(&event);
        }
    }

    pub fn ids(&self) -> Vec<LocalId> {
        self.state.read().rows.iter().map(|r| r.id.clone()).collect()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Number of `field` calls since creation or the last reset
    pub fn field_reads(&self) -> u64 {
        self.field_reads.load(Ordering::Relaxed)
    }

    pub fn refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::Relaxed)
    }

    pub fn reset_counters(&self) {
        self.field_reads.store(0, Ordering::Relaxed);
        self.refreshes.store(0, Ordering::Relaxed);
    }
}

fn into_object(fields: Value) -> Map<String, Value> {
    match fields {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

impl LeveledSource for MemorySource {
    fn size(&self) -> usize {
        self.state.read().rows.len()
    }

    fn id_at(&self, index: usize) -> Option<LocalId> {
        self.state.read().rows.get(index).map(|r| r.id.clone())
    }

    fn index_of(&self, id: &LocalId) -> Option<usize> {
        self.state.read().index.get(id).copied()
    }

    fn field(&self, id: &LocalId, name: &str) -> Option<Value> {
        self.field_reads.fetch_add(1, Ordering::Relaxed);
        let state = self.state.read();
        let index = *state.index.get(id)?;
        state.rows[index].fields.get(name).cloned()
    }

    fn field_names(&self) -> Vec<String> {
        self.field_names.clone()
    }

    fn sortable_fields(&self) -> Vec<String> {
        self.sortable.clone()
    }

    fn sort(&self, keys: &[SortKey]) -> SourceResult<()> {
        if let Some(key) = keys.iter().find(|k| !self.sortable.contains(&k.field)) {
            return Err(SourceError::NotSortable(key.field.clone()));
        }
        if keys.is_empty() {
            return Ok(());
        }

        {
            let mut state = self.state.write();
            let entity_id_field = self.entity_id_field.as_str();
            state.rows.sort_by(|a, b| {
                for key in keys {
                    let left = a.fields.get(&key.field).unwrap_or(&Value::Null);
                    let right = b.fields.get(&key.field).unwrap_or(&Value::Null);
                    let ord = compare_values(left, right, entity_id_field);
                    let ord = if key.ascending { ord } else { ord.reverse() };
                    if ord != std::cmp::Ordering::Equal {
                        return ord;
                    }
                }
                std::cmp::Ordering::Equal
            });
            state.reindex();
        }

        self.notify(SourceEvent::Sorted);
        Ok(())
    }

    fn subscribe(&self, listener: Arc<dyn SourceListener>) -> Option<SubscriptionId> {
        if !self.notifications {
            return None;
        }
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, listener));
        Some(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.write().retain(|(sub, _)| *sub != id);
    }

    fn supports_refresh(&self) -> bool {
        true
    }

    fn refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::Relaxed);
        self.notify(SourceEvent::Refreshed);
    }
}
