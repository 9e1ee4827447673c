//! hierarchy-view: lazy multi-level tree over flat per-level sources
//!
//! Several independently paginated sources, one per tree depth, are
//! composed into a single read-only virtual tree. Nothing is materialized:
//! children are located with a bounded probe over the child level's source
//! and only their index ranges are cached.
//!
//! ## Layout
//!
//! - `domain/`: identities, level definitions, field values
//! - `ports/`: the [`LeveledSource`] contract leaf sources implement
//! - `features/`: property resolution, child ranges, navigation, sorting,
//!   change notification
//! - `registry`: the [`Hierarchy`] facade and its builder
//! - `infrastructure/`: [`MemorySource`], an in-memory leveled source
//!
//! ## Core Contracts
//!
//! 1. **Grouped children**: rows of one parent are contiguous in their
//!    level. Groups are located in parent key order or in parent row
//!    order, either direction; any other layout degrades to "no children".
//! 2. **Identity**: `HierarchicalId` equality is `(level, local_id)`; the
//!    parent chain is not compared.
//! 3. **Invalidation**: any structural change clears every cached range.
//! 4. **Read path never fails**: unknown ids/fields give `None` or an empty
//!    view; errors only come from setup, sort, and rejected mutations.

pub mod config;
pub mod domain;
pub mod errors;
pub mod features;
pub mod infrastructure;
pub mod ports;
pub mod registry;

pub use config::HierarchyConfig;
pub use domain::{HierarchicalId, LevelDefinition, LocalId};
pub use errors::{ErrorKind, HierarchyError, HierarchyResult};
pub use features::{
    ChildRange, HierarchyChange, HierarchyListener, ListenerId, NodeView, NotifyPhase,
};
pub use infrastructure::MemorySource;
pub use ports::{
    LeveledSource, SharedSource, SortKey, SourceError, SourceEvent, SourceListener,
    SubscriptionId,
};
pub use registry::{Hierarchy, HierarchyBuilder};
