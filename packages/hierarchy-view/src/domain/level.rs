//! Per-depth level registration

use std::fmt;

use crate::errors::{HierarchyError, HierarchyResult};
use crate::ports::SharedSource;

/// Configuration of one tree depth
///
/// `field_map[i]` is the level-local name of the i-th global logical field.
/// An empty entry marks a logical field the level does not map.
#[derive(Clone)]
pub struct LevelDefinition {
    pub level: usize,
    pub source: SharedSource,
    pub field_map: Vec<String>,
    /// Field of each row holding its parent's key (levels > 0)
    pub parent_link_field: Option<String>,
    /// Field answering "has children" without probing
    pub has_children_field: Option<String>,
}

impl LevelDefinition {
    pub fn new<I, S>(
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
        Self {
            level,
            source,
            field_map: field_map.into_iter().map(Into::into).collect(),
            parent_link_field: parent_link_field.map(str::to_string),
            has_children_field: has_children_field.map(str::to_string),
        }
    }

    /// Level 0 definition
    pub fn root<I, S>(source: SharedSource, field_map: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(0, source, None, None, field_map)
    }

    /// Definition of a level below the root
    pub fn child<I, S>(
        level: usize,
        source: SharedSource,
        parent_link_field: &str,
        field_map: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(level, source, Some(parent_link_field), None, field_map)
    }

    pub fn with_has_children_field(mut self, field: &str) -> Self {
        self.has_children_field = Some(field.to_string());
        self
    }

    pub fn is_root(&self) -> bool {
        self.level == 0
    }

    /// Check the registration invariants of this level on its own
    pub fn validate(&self) -> HierarchyResult<()> {
        if self.field_map.is_empty() {
            return Err(HierarchyError::configuration(format!(
                "Level {} has an empty field map",
                self.level
            )));
        }

        match (&self.parent_link_field, self.level) {
            (Some(field), 0) => Err(HierarchyError::configuration(format!(
                "Level 0 cannot declare a parent link field (got '{}')",
                field
            ))),
            (None, level) if level > 0 => Err(HierarchyError::missing_parent_link(level)),
            (Some(field), level) if field.is_empty() => {
                Err(HierarchyError::missing_parent_link(level))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for LevelDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LevelDefinition")
            .field("level", &self.level)
            .field("source_size", &self.source.size())
            .field("field_map", &self.field_map)
            .field("parent_link_field", &self.parent_link_field)
            .field("has_children_field", &self.has_children_field)
            .finish()
    }
}
