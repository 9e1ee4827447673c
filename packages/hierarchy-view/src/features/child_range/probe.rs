//! Bounded probe over a grouped child source
//!
//! This is not a classical binary search. The child source is only required
//! to keep each parent's rows contiguous; groups may come in any order.
//! Bisection therefore needs an order over the groups, and two are tried in
//! turn:
//!
//! 1. parent key order (`LocalId` ordering), which no sort can change
//! 2. parent rank order (index of the parent row in the parent source)
//!
//! For each order the direction (ascending or descending) is read off the
//! first and last rows, so a child level sorted descending still bisects.
//! A group layout that follows neither order is reported as "not found".
//!
//! Every failure mode ends in "not found": step budget exhausted, empty
//! interval, a row whose parent key cannot be read, a parent key unknown to
//! the parent level, and (with verification on) any foreign row inside the
//! discovered range.

use std::cmp::Ordering;

use crate::domain::{identity_of, LocalId};
use crate::ports::LeveledSource;

/// Inclusive index interval of one parent's children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildRange {
    pub first: usize,
    pub last: usize,
}

impl ChildRange {
    pub fn new(first: usize, last: usize) -> Self {
        debug_assert!(first <= last);
        Self { first, last }
    }

    pub fn len(&self) -> usize {
        self.last - self.first + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.first && index <= self.last
    }
}

/// Row reads performed by one probe
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProbeStats {
    pub reads: u64,
    pub steps: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    First,
    Last,
}

/// Order the sibling groups are assumed to follow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupOrder {
    ParentKey,
    ParentRank,
}

/// One bisection attempt: the group order plus its direction in this source
#[derive(Debug, Clone, Copy)]
struct Layout {
    order: GroupOrder,
    descending: bool,
}

/// The parent being searched for
struct Target<'t> {
    key: &'t LocalId,
    rank: usize,
}

pub struct BoundedProbe<'a> {
    pub children: &'a dyn LeveledSource,
    pub parents: &'a dyn LeveledSource,
    pub parent_link_field: &'a str,
    pub entity_id_field: &'a str,
    /// Bisection steps allowed per boundary search
    pub max_steps: u32,
    pub verify: bool,
}

impl<'a> BoundedProbe<'a> {
    /// Locate the rows of `parent` in the child source
    pub fn find_range(&self, parent: &LocalId, stats: &mut ProbeStats) -> Option<ChildRange> {
        let size = self.children.size();
        if size == 0 {
            return None;
        }
        let target = Target {
            key: parent,
            rank: self.parents.index_of(parent)?,
        };

        let head = self.parent_key_at(0, stats)?;
        let tail = self.parent_key_at(size - 1, stats)?;

        [GroupOrder::ParentKey, GroupOrder::ParentRank]
            .into_iter()
            .filter_map(|order| self.layout(order, &head, &tail))
            .find_map(|layout| self.find_in_layout(&target, layout, size, stats))
    }

    fn find_in_layout(
        &self,
        target: &Target<'_>,
        layout: Layout,
        size: usize,
        stats: &mut ProbeStats,
    ) -> Option<ChildRange> {
        let first = self.find_boundary(target, layout, Boundary::First, 0, size - 1, stats)?;
        let last = self.find_boundary(target, layout, Boundary::Last, first, size - 1, stats)?;

        if last < first {
            return None;
        }
        if self.verify && !self.verify_range(target.key, first, last, stats) {
            tracing::debug!(
                "Child range of {} failed verification ({}..={}), source is not grouped",
                target.key,
                first,
                last
            );
            return None;
        }

        Some(ChildRange::new(first, last))
    }

    /// Direction of `order` in the child source, from its first and last rows
    fn layout(&self, order: GroupOrder, head: &LocalId, tail: &LocalId) -> Option<Layout> {
        let descending = match order {
            GroupOrder::ParentKey => head > tail,
            GroupOrder::ParentRank => self.parents.index_of(head)? > self.parents.index_of(tail)?,
        };
        Some(Layout { order, descending })
    }

    /// Where a group keyed `key` sits relative to the target's group
    fn compare(&self, key: &LocalId, target: &Target<'_>, layout: Layout) -> Option<Ordering> {
        let ordering = match layout.order {
            GroupOrder::ParentKey => key.cmp(target.key),
            GroupOrder::ParentRank => self.parents.index_of(key)?.cmp(&target.rank),
        };
        Some(if layout.descending {
            ordering.reverse()
        } else {
            ordering
        })
    }

    fn parent_key_at(&self, index: usize, stats: &mut ProbeStats) -> Option<LocalId> {
        let id = self.children.id_at(index)?;
        stats.reads += 1;
        let value = self.children.field(&id, self.parent_link_field)?;
        identity_of(&value, self.entity_id_field)
    }

    fn is_target_at(&self, index: usize, target: &LocalId, stats: &mut ProbeStats) -> bool {
        self.parent_key_at(index, stats).as_ref() == Some(target)
    }

    fn find_boundary(
        &self,
        target: &Target<'_>,
        layout: Layout,
        boundary: Boundary,
        mut lo: usize,
        mut hi: usize,
        stats: &mut ProbeStats,
    ) -> Option<usize> {
        let last_index = self.children.size().checked_sub(1)?;
        let mut steps = 0u32;

        while lo <= hi {
            steps += 1;
            stats.steps += 1;
            if steps > self.max_steps {
                tracing::debug!(
                    "Probe for {} gave up after {} steps ({:?} boundary, {:?})",
                    target.key,
                    self.max_steps,
                    boundary,
                    layout.order
                );
                return None;
            }

            let mid = lo + (hi - lo) / 2;
            let key = self.parent_key_at(mid, stats)?;

            if key == *target.key {
                match boundary {
                    Boundary::First => {
                        if mid == 0 || !self.is_target_at(mid - 1, target.key, stats) {
                            return Some(mid);
                        }
                        hi = mid - 1;
                    }
                    Boundary::Last => {
                        if mid >= last_index || !self.is_target_at(mid + 1, target.key, stats) {
                            return Some(mid);
                        }
                        lo = mid + 1;
                    }
                }
                continue;
            }

            match self.compare(&key, target, layout)? {
                Ordering::Less => lo = mid + 1,
                Ordering::Greater if mid > 0 => hi = mid - 1,
                _ => return None,
            }
        }

        None
    }

    fn verify_range(
        &self,
        target: &LocalId,
        first: usize,
        last: usize,
        stats: &mut ProbeStats,
    ) -> bool {
        // Boundaries were read during the search
        (first + 1..last).all(|i| self.is_target_at(i, target, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::MemorySource;
    use serde_json::json;

    fn parents(keys: &[&str]) -> MemorySource {
        let source = MemorySource::new(["name"]);
        for key in keys {
            source.push(*key, json!({ "name": key }));
        }
        source
    }

    fn children(links: &[&str]) -> MemorySource {
        let source = MemorySource::new(["parent"]);
        for (i, link) in links.iter().enumerate() {
            source.push(i as i64, json!({ "parent": link }));
        }
        source
    }

    fn probe<'a>(children: &'a MemorySource, parents: &'a MemorySource) -> BoundedProbe<'a> {
        BoundedProbe {
            children,
            parents,
            parent_link_field: "parent",
            entity_id_field: "id",
            max_steps: 32,
            verify: true,
        }
    }

    fn find(p: &BoundedProbe<'_>, key: &str) -> Option<ChildRange> {
        p.find_range(&LocalId::from(key), &mut ProbeStats::default())
    }

    #[test]
    fn test_finds_each_group() {
        let ps = parents(&["A", "B", "C", "D"]);
        let cs = children(&["A", "A", "B", "D", "D", "D"]);
        let p = probe(&cs, &ps);

        assert_eq!(find(&p, "A"), Some(ChildRange::new(0, 1)));
        assert_eq!(find(&p, "B"), Some(ChildRange::new(2, 2)));
        assert_eq!(find(&p, "C"), None);
        assert_eq!(find(&p, "D"), Some(ChildRange::new(3, 5)));
        assert_eq!(find(&p, "Z"), None);
    }

    #[test]
    fn test_parent_rows_in_other_order_than_groups() {
        let ps = parents(&["D", "C", "B", "A"]);
        let cs = children(&["A", "A", "B", "D"]);
        let p = probe(&cs, &ps);

        assert_eq!(find(&p, "A"), Some(ChildRange::new(0, 1)));
        assert_eq!(find(&p, "B"), Some(ChildRange::new(2, 2)));
        assert_eq!(find(&p, "C"), None);
        assert_eq!(find(&p, "D"), Some(ChildRange::new(3, 3)));
    }

    #[test]
    fn test_groups_in_descending_key_order() {
        let ps = parents(&["A", "B", "C"]);
        let cs = children(&["C", "C", "B", "A", "A"]);
        let p = probe(&cs, &ps);

        assert_eq!(find(&p, "C"), Some(ChildRange::new(0, 1)));
        assert_eq!(find(&p, "B"), Some(ChildRange::new(2, 2)));
        assert_eq!(find(&p, "A"), Some(ChildRange::new(3, 4)));
    }

    #[test]
    fn test_groups_following_parent_rows_only() {
        // Groups are not in key order, but follow the parent level's rows
        let ps = parents(&["B", "A", "C"]);
        let cs = children(&["B", "A", "A", "C"]);
        let p = probe(&cs, &ps);

        assert_eq!(find(&p, "B"), Some(ChildRange::new(0, 0)));
        assert_eq!(find(&p, "A"), Some(ChildRange::new(1, 2)));
        assert_eq!(find(&p, "C"), Some(ChildRange::new(3, 3)));
    }

    #[test]
    fn test_integer_parent_keys_use_numeric_order() {
        let ps = MemorySource::new(["name"])
            .with_row(2, json!({"name": "two"}))
            .with_row(10, json!({"name": "ten"}));
        let cs = MemorySource::new(["parent"])
            .with_row("a", json!({"parent": 2}))
            .with_row("b", json!({"parent": 10}))
            .with_row("c", json!({"parent": 10}));
        let p = probe(&cs, &ps);

        let mut stats = ProbeStats::default();
        assert_eq!(
            p.find_range(&LocalId::from(2), &mut stats),
            Some(ChildRange::new(0, 0))
        );
        assert_eq!(
            p.find_range(&LocalId::from(10), &mut stats),
            Some(ChildRange::new(1, 2))
        );
    }

    #[test]
    fn test_empty_child_source() {
        let ps = parents(&["A"]);
        let cs = children(&[]);
        assert_eq!(find(&probe(&cs, &ps), "A"), None);
    }

    #[test]
    fn test_single_group_spanning_source() {
        let ps = parents(&["A"]);
        let cs = children(&["A"; 9]);
        assert_eq!(find(&probe(&cs, &ps), "A"), Some(ChildRange::new(0, 8)));
    }

    #[test]
    fn test_entity_like_parent_links() {
        let ps = parents(&["A", "B"]);
        let cs = MemorySource::new(["parent"])
            .with_row(1, json!({"parent": {"id": "A", "label": "x"}}))
            .with_row(2, json!({"parent": {"id": "B", "label": "y"}}))
            .with_row(3, json!({"parent": {"id": "B", "label": "z"}}));
        assert_eq!(find(&probe(&cs, &ps), "B"), Some(ChildRange::new(1, 2)));
    }

    #[test]
    fn test_step_budget_exhausted() {
        let ps = parents(&["A", "B"]);
        let mut links = vec!["A"; 100];
        links.push("B");
        let cs = children(&links);
        let mut p = probe(&cs, &ps);
        p.max_steps = 2;
        assert_eq!(find(&p, "B"), None);

        p.max_steps = 32;
        assert_eq!(find(&p, "B"), Some(ChildRange::new(100, 100)));
    }

    #[test]
    fn test_unreadable_parent_key_gives_up() {
        let ps = parents(&["A", "B"]);
        let cs = MemorySource::new(["parent"])
            .with_row(0, json!({"parent": "A"}))
            .with_row(1, json!({}))
            .with_row(2, json!({"parent": "B"}));
        let p = probe(&cs, &ps);
        // Middle row has no parent link: the probe stops rather than guess
        assert_eq!(find(&p, "B"), None);
    }

    #[test]
    fn test_verification_rejects_interleaved_rows() {
        let ps = parents(&["A", "B"]);
        // A's rows are split by a B row
        let cs = children(&["A", "A", "B", "A", "A"]);
        let mut p = probe(&cs, &ps);

        let mut stats = ProbeStats::default();
        let range = p.find_range(&LocalId::from("A"), &mut stats);
        assert!(range.map_or(true, |r| (r.first..=r.last).all(|i| i != 2)));

        p.verify = false;
        let unverified = find(&p, "A");
        if let Some(r) = unverified {
            assert!(r.first <= r.last);
        }
    }

    #[test]
    fn test_reads_are_logarithmic() {
        let keys: Vec<String> = (0..64).map(|i| format!("P{:02}", i)).collect();
        let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
        let ps = parents(&key_refs);
        let links: Vec<&str> = key_refs.iter().flat_map(|k| [*k; 16]).collect();
        let cs = children(&links);
        let mut p = probe(&cs, &ps);
        p.verify = false;

        let mut stats = ProbeStats::default();
        let range = p.find_range(&LocalId::from("P40"), &mut stats);
        assert_eq!(range, Some(ChildRange::new(640, 655)));
        assert!(stats.reads < 64, "reads = {}", stats.reads);
    }

    #[test]
    fn test_range_helpers() {
        let r = ChildRange::new(3, 5);
        assert_eq!(r.len(), 3);
        assert!(r.contains(3) && r.contains(5));
        assert!(!r.contains(2) && !r.contains(6));
        assert!(!r.is_empty());
    }
}
