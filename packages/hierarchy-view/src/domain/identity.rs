//! Hierarchical identity: `(level, local id, parent)`
//!
//! Identities are cheap `Arc`-backed values. A child shares its parent's
//! value, so sibling identities form a singly-linked ancestry chain without
//! copying it.
//!
//! # Equality
//!
//! `PartialEq`/`Hash` look at `(level, local_id)` only; the parent chain is
//! ignored. Two rows with the same local id on the same level compare equal
//! even when reached through different parents. Use
//! [`HierarchicalId::same_ancestry`] when the full path matters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Row key inside one leveled source
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocalId {
    Int(i64),
    Text(String),
}

impl LocalId {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            LocalId::Int(v) => Some(*v),
            LocalId::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            LocalId::Int(_) => None,
            LocalId::Text(s) => Some(s),
        }
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalId::Int(v) => write!(f, "{}", v),
            LocalId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for LocalId {
    fn from(v: i64) -> Self {
        LocalId::Int(v)
    }
}

impl From<i32> for LocalId {
    fn from(v: i32) -> Self {
        LocalId::Int(v as i64)
    }
}

impl From<&str> for LocalId {
    fn from(s: &str) -> Self {
        LocalId::Text(s.to_string())
    }
}

impl From<String> for LocalId {
    fn from(s: String) -> Self {
        LocalId::Text(s)
    }
}

impl From<LocalId> for serde_json::Value {
    fn from(id: LocalId) -> Self {
        match id {
            LocalId::Int(v) => serde_json::Value::from(v),
            LocalId::Text(s) => serde_json::Value::String(s),
        }
    }
}

struct IdNode {
    level: usize,
    local_id: LocalId,
    parent: Option<HierarchicalId>,
}

/// Node address in the virtual tree
#[derive(Clone)]
pub struct HierarchicalId(Arc<IdNode>);

impl HierarchicalId {
    /// Level-0 identity (no parent)
    pub fn root(local_id: impl Into<LocalId>) -> Self {
        Self::new(0, local_id.into(), None)
    }

    /// Identity of a row at `parent.level() + 1`
    pub fn child_of(parent: &HierarchicalId, local_id: impl Into<LocalId>) -> Self {
        Self::new(parent.level() + 1, local_id.into(), Some(parent.clone()))
    }

    pub fn new(level: usize, local_id: LocalId, parent: Option<HierarchicalId>) -> Self {
        Self(Arc::new(IdNode {
            level,
            local_id,
            parent,
        }))
    }

    pub fn level(&self) -> usize {
        self.0.level
    }

    /// Unwrap to the level-local id
    pub fn local_id(&self) -> &LocalId {
        &self.0.local_id
    }

    pub fn parent(&self) -> Option<&HierarchicalId> {
        self.0.parent.as_ref()
    }

    /// True when both values share one allocation
    pub fn ptr_eq(&self, other: &HierarchicalId) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Compare the whole chain, not just `(level, local_id)`
    pub fn same_ancestry(&self, other: &HierarchicalId) -> bool {
        let mut left = Some(self);
        let mut right = Some(other);
        loop {
            match (left, right) {
                (None, None) => return true,
                (Some(a), Some(b)) => {
                    if a.ptr_eq(b) {
                        return true;
                    }
                    if a != b {
                        return false;
                    }
                    left = a.parent();
                    right = b.parent();
                }
                _ => return false,
            }
        }
    }

    /// Ancestors from the direct parent up to level 0
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors {
            next: self.parent(),
        }
    }

    /// Local ids from level 0 down to this node
    pub fn path(&self) -> Vec<LocalId> {
        let mut path: Vec<LocalId> = self.ancestors().map(|a| a.local_id().clone()).collect();
        path.reverse();
        path.push(self.local_id().clone());
        path
    }
}

impl PartialEq for HierarchicalId {
    fn eq(&self, other: &Self) -> bool {
        self.level() == other.level() && self.local_id() == other.local_id()
    }
}

impl Eq for HierarchicalId {}

impl Hash for HierarchicalId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.level().hash(state);
        self.local_id().hash(state);
    }
}

impl fmt::Debug for HierarchicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HierarchicalId({})", self)
    }
}

impl fmt::Display for HierarchicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path: Vec<String> = self.path().iter().map(|id| id.to_string()).collect();
        write!(f, "L{}:{}", self.level(), path.join("/"))
    }
}

/// Iterator over an identity's ancestors
pub struct Ancestors<'a> {
    next: Option<&'a HierarchicalId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a HierarchicalId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent();
        Some(current)
    }
}
