// Ports: leveled source trait and change subscription types
//
// A leveled source is one flat, indexable data set holding every row of a
// single tree depth. The hierarchy only reads from it; `sort` and `refresh`
// are the only operations it ever invokes that change source state.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::LocalId;

/// Shared handle to a leaf source
pub type SharedSource = Arc<dyn LeveledSource>;

/// Trait that every per-level data source must implement
///
/// Required: `size`, `id_at`, `index_of`, `field`, `field_names`.
/// Everything else has a default that describes a source without the
/// capability (not sortable, not notifying, nothing to refresh).
pub trait LeveledSource: Send + Sync {
    /// Number of rows currently visible in the source
    fn size(&self) -> usize;

    /// Row key at `index` in source order
    fn id_at(&self, index: usize) -> Option<LocalId>;

    /// Position of `id` in source order
    fn index_of(&self, id: &LocalId) -> Option<usize>;

    fn first_id(&self) -> Option<LocalId> {
        self.id_at(0)
    }

    fn last_id(&self) -> Option<LocalId> {
        self.size().checked_sub(1).and_then(|last| self.id_at(last))
    }

    fn is_first(&self, id: &LocalId) -> bool {
        self.index_of(id) == Some(0)
    }

    fn is_last(&self, id: &LocalId) -> bool {
        match self.size() {
            0 => false,
            n => self.index_of(id) == Some(n - 1),
        }
    }

    fn contains(&self, id: &LocalId) -> bool {
        self.index_of(id).is_some()
    }

    /// Field value of a row, `None` for unknown rows or fields
    fn field(&self, id: &LocalId, name: &str) -> Option<Value>;

    /// Native field names of this source
    fn field_names(&self) -> Vec<String>;

    fn has_field(&self, name: &str) -> bool {
        self.field_names().iter().any(|f| f == name)
    }

    /// Native fields the source can sort by (empty = not sortable)
    fn sortable_fields(&self) -> Vec<String> {
        Vec::new()
    }

    fn is_sortable(&self) -> bool {
        !self.sortable_fields().is_empty()
    }

    /// Reorder rows by `keys`, first key most significant
    fn sort(&self, keys: &[SortKey]) -> SourceResult<()> {
        let _ = keys;
        Err(SourceError::Unsupported("sort".to_string()))
    }

    /// Register a change listener; `None` if the source never notifies
    fn subscribe(&self, listener: Arc<dyn SourceListener>) -> Option<SubscriptionId> {
        let _ = listener;
        None
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        let _ = id;
    }

    fn supports_refresh(&self) -> bool {
        false
    }

    /// Drop cached pages and re-read the backing data
    fn refresh(&self) {}
}

/// Receiver of leaf source change notifications
pub trait SourceListener: Send + Sync {
    fn on_source_change(&self, event: &SourceEvent);
}

/// Structural change reported by a leaf source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEvent {
    /// Rows were added, removed or moved
    ItemSetChanged,
    /// The source re-read its backing data
    Refreshed,
    /// Row order changed
    Sorted,
}

/// Handle returned by [`LeveledSource::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// One field of a sort request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub ascending: bool,
}

impl SortKey {
    pub fn new(field: impl Into<String>, ascending: bool) -> Self {
        Self {
            field: field.into(),
            ascending,
        }
    }

    pub fn ascending(field: impl Into<String>) -> Self {
        Self::new(field, true)
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self::new(field, false)
    }
}

/// Errors reported by leaf sources
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Operation not supported by source: {0}")]
    Unsupported(String),

    #[error("Field is not sortable: {0}")]
    NotSortable(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

impl SourceError {
    pub fn unsupported(operation: impl Into<String>) -> Self {
        SourceError::Unsupported(operation.into())
    }
}

pub type SourceResult<T> = Result<T, SourceError>;
