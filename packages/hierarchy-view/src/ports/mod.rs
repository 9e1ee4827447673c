//! Collaborator interfaces the hierarchy is composed from

pub mod source;

pub use source::{
    LeveledSource, SharedSource, SortKey, SourceError, SourceEvent, SourceListener, SourceResult,
    SubscriptionId,
};
