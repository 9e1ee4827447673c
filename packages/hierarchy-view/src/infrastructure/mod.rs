//! Concrete leveled source adapters

pub mod memory_source;

pub use memory_source::MemorySource;
