//! Domain models: identities, level definitions, field values

pub mod field_value;
pub mod identity;
pub mod level;

pub use field_value::{compare_values, identity_of, is_truthy};
pub use identity::{Ancestors, HierarchicalId, LocalId};
pub use level::LevelDefinition;
