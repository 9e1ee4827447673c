//! Multi-field sort fan-out
//!
//! A sort request is split per level: each sortable level receives the
//! subset of requested fields it can resolve to one of its sortable fields,
//! in request order. Levels with nothing to sort by are left alone.
//!
//! The whole dispatch is one notification batch: the `Sorted` events the
//! sources raise are muted and a single change is emitted afterwards.

use std::collections::HashSet;

use super::state::HierarchyState;
use crate::domain::LevelDefinition;
use crate::errors::{HierarchyError, HierarchyResult};
use crate::ports::{SortKey, SourceEvent};

impl HierarchyState {
    /// Sort keys that apply to `def`; missing flags mean ascending
    pub(crate) fn sort_keys_for<S: AsRef<str>>(
        &self,
        def: &LevelDefinition,
        fields: &[S],
        ascending: &[bool],
    ) -> Vec<SortKey> {
        let sortable = def.source.sortable_fields();
        if sortable.is_empty() {
            return Vec::new();
        }

        fields
            .iter()
            .enumerate()
            .filter_map(|(i, field)| {
                let local = self.resolver.resolve(def, field.as_ref())?;
                if !sortable.iter().any(|s| s == local) {
                    return None;
                }
                Some(SortKey::new(local, ascending.get(i).copied().unwrap_or(true)))
            })
            .collect()
    }

    /// Sort every level that can; one aggregated `Sorted` change is emitted
    pub(crate) fn sort<S: AsRef<str>>(
        &self,
        fields: &[S],
        ascending: &[bool],
    ) -> HierarchyResult<()> {
        self.batch_notifications(SourceEvent::Sorted, || self.sort_levels(fields, ascending))
    }

    /// Returns the first failure and the levels that were sorted
    fn sort_levels<S: AsRef<str>>(
        &self,
        fields: &[S],
        ascending: &[bool],
    ) -> (HierarchyResult<()>, Vec<usize>) {
        let mut first_error: Option<HierarchyError> = None;
        let mut sorted = Vec::new();

        for def in &self.levels {
            let keys = self.sort_keys_for(def, fields, ascending);
            if keys.is_empty() {
                continue;
            }

            tracing::debug!("Sorting level {} by {:?}", def.level, keys);
            match def.source.sort(&keys) {
                Ok(()) => sorted.push(def.level),
                Err(err) => {
                    tracing::warn!("Sort failed on level {}: {}", def.level, err);
                    first_error.get_or_insert(HierarchyError::source_failure(def.level, err));
                }
            }
        }

        let result = match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        };
        (result, sorted)
    }

    /// Logical fields sortable on at least one level
    pub(crate) fn sortable_fields(&self) -> Vec<String> {
        let native = self
            .levels
            .iter()
            .flat_map(|def| def.source.sortable_fields());
        let candidates: Vec<String> = self
            .resolver
            .field_names()
            .iter()
            .cloned()
            .chain(native)
            .collect();

        let mut seen = HashSet::new();
        candidates
            .into_iter()
            .filter(|name| seen.insert(name.clone()))
            .filter(|name| {
                self.levels
                    .iter()
                    .any(|def| !self.sort_keys_for(def, &[name.as_str()], &[]).is_empty())
            })
            .collect()
    }
}
