//! Hierarchy features
//!
//! Each module adds one slice of behavior on top of the shared
//! [`state::HierarchyState`]:
//! - `property_resolver`: logical → level-local field names
//! - `child_range`: bounded probe + range cache
//! - `node_view`: lazy views over level sources
//! - `navigation`: first/last/next/prev
//! - `sort_dispatcher`: sort fan-out per level
//! - `change_notifier`: invalidation + sibling refresh

pub mod change_notifier;
pub mod child_range;
pub mod navigation;
pub mod node_view;
pub mod property_resolver;
pub mod sort_dispatcher;
pub(crate) mod state;

pub use change_notifier::{HierarchyChange, HierarchyListener, ListenerId, NotifyPhase};
pub use child_range::{BoundedProbe, ChildRange, ChildRangeIndex, ChildRangeMetrics, ProbeStats};
pub use node_view::{NodeView, NodeViewIter};
pub use property_resolver::PropertyResolver;
