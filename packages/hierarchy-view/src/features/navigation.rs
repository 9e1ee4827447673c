//! First/last/next/prev across a level
//!
//! Stepping always follows the per-level source order. While the stepped row
//! stays inside the current parent's child range the parent is reused;
//! once it leaves the range the row's ancestry is rebuilt from parent-link
//! fields (see [`HierarchyState::identify`]).
//!
//! `is_first_id`/`is_last_id` answer for the whole level, not for siblings.

use crate::domain::{identity_of, HierarchicalId, LevelDefinition, LocalId};

use super::state::HierarchyState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Forward,
    Backward,
}

impl HierarchyState {
    pub(crate) fn first_id(&self) -> Option<HierarchicalId> {
        let root = self.level(0)?;
        root.source
            .first_id()
            .map(|local| HierarchicalId::new(0, local, None))
    }

    pub(crate) fn last_id(&self) -> Option<HierarchicalId> {
        let root = self.level(0)?;
        root.source
            .last_id()
            .map(|local| HierarchicalId::new(0, local, None))
    }

    pub(crate) fn is_first_id(&self, id: &HierarchicalId) -> bool {
        self.level(id.level())
            .map_or(false, |def| def.source.is_first(id.local_id()))
    }

    pub(crate) fn is_last_id(&self, id: &HierarchicalId) -> bool {
        self.level(id.level())
            .map_or(false, |def| def.source.is_last(id.local_id()))
    }

    pub(crate) fn next_id(&self, id: &HierarchicalId) -> Option<HierarchicalId> {
        self.step(id, Step::Forward)
    }

    pub(crate) fn prev_id(&self, id: &HierarchicalId) -> Option<HierarchicalId> {
        self.step(id, Step::Backward)
    }

    fn step(&self, id: &HierarchicalId, step: Step) -> Option<HierarchicalId> {
        let def = self.level(id.level())?;
        let index = def.source.index_of(id.local_id())?;
        let stepped = match step {
            Step::Forward => index.checked_add(1)?,
            Step::Backward => index.checked_sub(1)?,
        };
        let local = def.source.id_at(stepped)?;

        if id.level() == 0 {
            return Some(HierarchicalId::new(0, local, None));
        }

        if let Some(parent) = id.parent() {
            let in_range = self
                .child_range(parent)
                .map_or(false, |range| range.contains(stepped));
            if in_range {
                return Some(HierarchicalId::new(id.level(), local, Some(parent.clone())));
            }
        }

        let parent = self.parent_of_row(def, &local);
        Some(HierarchicalId::new(id.level(), local, parent))
    }

    /// Full identity of a row, ancestry read from parent-link fields
    ///
    /// `None` when the level or row does not exist. A row whose parent key
    /// cannot be resolved comes back without a parent.
    pub(crate) fn identify(&self, level: usize, local: &LocalId) -> Option<HierarchicalId> {
        let def = self.level(level)?;
        if !def.source.contains(local) {
            return None;
        }
        if level == 0 {
            return Some(HierarchicalId::new(0, local.clone(), None));
        }
        let parent = self.parent_of_row(def, local);
        Some(HierarchicalId::new(level, local.clone(), parent))
    }

    fn parent_of_row(&self, def: &LevelDefinition, local: &LocalId) -> Option<HierarchicalId> {
        let link = def.parent_link_field.as_deref()?;
        let value = def.source.field(local, link)?;
        let key = identity_of(&value, &self.config.entity_id_field)?;
        let parent_level = def.level.checked_sub(1)?;
        let parent = self.identify(parent_level, &key);
        if parent.is_none() {
            tracing::debug!(
                "Row {} at level {} points at unknown parent {}",
                local,
                def.level,
                key
            );
        }
        parent
    }
}
