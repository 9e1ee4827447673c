//! Lazy, index-addressable window over one level source
//!
//! A view only records `(source, level, parent, start, len)`. Identities are
//! built on access, so `root_ids()` over a million-row level costs nothing
//! until it is iterated.

use std::fmt;
use std::iter::FusedIterator;

use super::child_range::ChildRange;
use crate::domain::{HierarchicalId, LocalId};
use crate::ports::SharedSource;

#[derive(Clone)]
pub struct NodeView {
    source: Option<SharedSource>,
    level: usize,
    parent: Option<HierarchicalId>,
    start: usize,
    len: usize,
}

impl NodeView {
    /// View over a whole level (root ids)
    pub(crate) fn whole_level(source: SharedSource, level: usize) -> Self {
        let len = source.size();
        Self {
            source: Some(source),
            level,
            parent: None,
            start: 0,
            len,
        }
    }

    /// View over a parent's child range
    pub(crate) fn children(
        source: SharedSource,
        parent: HierarchicalId,
        range: ChildRange,
    ) -> Self {
        Self {
            source: Some(source),
            level: parent.level() + 1,
            parent: Some(parent),
            start: range.first,
            len: range.len(),
        }
    }

    pub fn empty(level: usize) -> Self {
        Self {
            source: None,
            level,
            parent: None,
            start: 0,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Level of the nodes in this view
    pub fn level(&self) -> usize {
        self.level
    }

    pub fn parent(&self) -> Option<&HierarchicalId> {
        self.parent.as_ref()
    }

    /// Index range in the underlying source
    pub fn source_range(&self) -> Option<ChildRange> {
        if self.is_empty() {
            None
        } else {
            Some(ChildRange::new(self.start, self.start + self.len - 1))
        }
    }

    /// Node at `index`, `None` past the end or if the source shrank
    pub fn get(&self, index: usize) -> Option<HierarchicalId> {
        if index >= self.len {
            return None;
        }
        let source = self.source.as_ref()?;
        let local = source.id_at(self.start + index)?;
        Some(HierarchicalId::new(self.level, local, self.parent.clone()))
    }

    pub fn first(&self) -> Option<HierarchicalId> {
        self.get(0)
    }

    pub fn last(&self) -> Option<HierarchicalId> {
        self.len.checked_sub(1).and_then(|i| self.get(i))
    }

    /// Position of a local id inside this view
    pub fn position(&self, local: &LocalId) -> Option<usize> {
        let index = self.source.as_ref()?.index_of(local)?;
        if index >= self.start && index < self.start + self.len {
            Some(index - self.start)
        } else {
            None
        }
    }

    pub fn contains(&self, id: &HierarchicalId) -> bool {
        id.level() == self.level && self.position(id.local_id()).is_some()
    }

    pub fn iter(&self) -> NodeViewIter<'_> {
        NodeViewIter {
            view: self,
            front: 0,
            back: self.len,
        }
    }

    pub fn to_vec(&self) -> Vec<HierarchicalId> {
        self.iter().collect()
    }

    /// Local ids of the view, in order
    pub fn local_ids(&self) -> Vec<LocalId> {
        self.iter().map(|id| id.local_id().clone()).collect()
    }
}

impl fmt::Debug for NodeView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeView")
            .field("level", &self.level)
            .field("parent", &self.parent)
            .field("start", &self.start)
            .field("len", &self.len)
            .finish()
    }
}

pub struct NodeViewIter<'a> {
    view: &'a NodeView,
    front: usize,
    back: usize,
}

impl<'a> Iterator for NodeViewIter<'a> {
    type Item = HierarchicalId;

    fn next(&mut self) -> Option<Self::Item> {
        while self.front < self.back {
            let index = self.front;
            self.front += 1;
            if let Some(id) = self.view.get(index) {
                return Some(id);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.back - self.front))
    }
}

impl<'a> DoubleEndedIterator for NodeViewIter<'a> {
    fn next_back(&mut self) -> Option<Self::Item> {
        while self.front < self.back {
            self.back -= 1;
            if let Some(id) = self.view.get(self.back) {
                return Some(id);
            }
        }
        None
    }
}

impl<'a> FusedIterator for NodeViewIter<'a> {}

impl<'a> IntoIterator for &'a NodeView {
    type Item = HierarchicalId;
    type IntoIter = NodeViewIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::MemorySource;
    use serde_json::json;
    use std::sync::Arc;

    fn source() -> SharedSource {
        let source = MemorySource::new(["parent"]);
        for (id, parent) in [(1, "A"), (2, "A"), (3, "B"), (4, "B"), (5, "B")] {
            source.push(id, json!({ "parent": parent }));
        }
        Arc::new(source)
    }

    #[test]
    fn test_children_window() {
        let parent = HierarchicalId::root("B");
        let view = NodeView::children(source(), parent.clone(), ChildRange::new(2, 4));

        assert_eq!(view.len(), 3);
        assert_eq!(view.level(), 1);
        assert_eq!(
            view.local_ids(),
            vec![LocalId::Int(3), LocalId::Int(4), LocalId::Int(5)]
        );
        assert!(view.get(0).unwrap().parent().unwrap().ptr_eq(&parent));
        assert_eq!(view.get(3), None);
        assert_eq!(view.source_range(), Some(ChildRange::new(2, 4)));
    }

    #[test]
    fn test_position_and_contains() {
        let parent = HierarchicalId::root("A");
        let view = NodeView::children(source(), parent.clone(), ChildRange::new(0, 1));

        assert_eq!(view.position(&LocalId::Int(2)), Some(1));
        assert_eq!(view.position(&LocalId::Int(3)), None);
        assert!(view.contains(&HierarchicalId::child_of(&parent, 1)));
        assert!(!view.contains(&HierarchicalId::root(1)));
    }

    #[test]
    fn test_whole_level_and_reverse_iteration() {
        let view = NodeView::whole_level(source(), 0);
        assert_eq!(view.len(), 5);
        assert!(view.parent().is_none());

        let reversed: Vec<LocalId> = view.iter().rev().map(|id| id.local_id().clone()).collect();
        assert_eq!(reversed.first(), Some(&LocalId::Int(5)));
        assert_eq!(view.last().unwrap().local_id(), &LocalId::Int(5));
    }

    #[test]
    fn test_empty_view() {
        let view = NodeView::empty(2);
        assert!(view.is_empty());
        assert_eq!(view.first(), None);
        assert_eq!(view.last(), None);
        assert_eq!(view.iter().count(), 0);
        assert_eq!(view.source_range(), None);
    }
}
