//! Logical → level-local field name resolution
//!
//! The global field list is positional: the i-th logical field maps to the
//! i-th entry of a level's field map. Names outside the map fall through
//! unchanged when the level's source has a native field of that name.

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::domain::{LevelDefinition, LocalId};

#[derive(Debug, Clone)]
pub struct PropertyResolver {
    field_names: Vec<String>,
    positions: FxHashMap<String, usize>,
}

impl PropertyResolver {
    pub fn new<I, S>(field_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let field_names: Vec<String> = field_names.into_iter().map(Into::into).collect();
        let mut positions = FxHashMap::default();
        for (i, name) in field_names.iter().enumerate() {
            // First occurrence wins for duplicated logical names
            positions.entry(name.clone()).or_insert(i);
        }
        Self {
            field_names,
            positions,
        }
    }

    /// Global logical field list
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    pub fn position(&self, logical: &str) -> Option<usize> {
        self.positions.get(logical).copied()
    }

    /// Level-local name of `logical`, or `None` when the level has no such
    /// field
    pub fn resolve<'a>(&self, level: &'a LevelDefinition, logical: &'a str) -> Option<&'a str> {
        let mapped = self
            .position(logical)
            .and_then(|i| level.field_map.get(i))
            .filter(|name| !name.is_empty());

        if let Some(name) = mapped {
            return Some(name.as_str());
        }

        if level.source.has_field(logical) {
            Some(logical)
        } else {
            None
        }
    }

    /// Resolve, then read the field of row `id`
    pub fn read(&self, level: &LevelDefinition, id: &LocalId, logical: &str) -> Option<Value> {
        let local = self.resolve(level, logical)?;
        level.source.field(id, local)
    }
}
