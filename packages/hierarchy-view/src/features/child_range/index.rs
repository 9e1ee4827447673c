//! Parent identity → child range cache
//!
//! Negative results are cached too. The cache is only ever cleared as a
//! whole; every clear bumps the generation so a range computed before the
//! clear cannot be stored after it.

use rustc_hash::FxHashMap;

use super::probe::ChildRange;
use crate::domain::HierarchicalId;

#[derive(Debug, Default)]
pub struct ChildRangeIndex {
    entries: FxHashMap<HierarchicalId, Option<ChildRange>>,
    generation: u64,
}

impl ChildRangeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Some(None)` is a cached "no children"
    pub fn get(&self, parent: &HierarchicalId) -> Option<Option<ChildRange>> {
        self.entries.get(parent).copied()
    }

    /// Store a computed range unless the cache was cleared since `generation`
    pub fn insert(
        &mut self,
        parent: HierarchicalId,
        range: Option<ChildRange>,
        generation: u64,
    ) -> bool {
        if generation != self.generation {
            return false;
        }
        self.entries.insert(parent, range);
        true
    }

    /// Drop every entry; returns how many were dropped
    pub fn clear(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        self.generation += 1;
        dropped
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
