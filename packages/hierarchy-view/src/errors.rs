//! Error types for hierarchy-view
//!
//! Only setup and explicit operations (build, sort, config loading, metrics
//! registration, rejected mutations) produce errors. The read path never
//! does: unresolved ids and fields come back as `None` or an empty view.

use std::fmt;
use thiserror::Error;

use crate::ports::SourceError;

/// Hierarchy error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid level registration or configuration values
    Configuration,
    /// Mutation through the read-only view
    UnsupportedOperation,
    /// A leaf source rejected an operation (sort)
    Source,
    /// YAML serialization/deserialization errors
    Serialization,
    /// Prometheus registration errors
    Metrics,
    /// I/O errors
    IO,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::UnsupportedOperation => "unsupported_operation",
            ErrorKind::Source => "source",
            ErrorKind::Serialization => "serialization",
            ErrorKind::Metrics => "metrics",
            ErrorKind::IO => "io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Hierarchy error type
#[derive(Debug, Error)]
#[error("[{kind}] {message}")]
pub struct HierarchyError {
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    pub kind: ErrorKind,
    pub message: String,
}

impl HierarchyError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // Convenience constructors
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn unsupported(operation: &str) -> Self {
        Self::new(
            ErrorKind::UnsupportedOperation,
            format!("{} is not supported: the hierarchy view is read-only", operation),
        )
    }

    pub fn source_failure(level: usize, err: SourceError) -> Self {
        Self::new(
            ErrorKind::Source,
            format!("Level {} source failed: {}", level, err),
        )
        .with_source(err)
    }

    pub fn missing_parent_link(level: usize) -> Self {
        Self::configuration(format!(
            "Level {} must declare a parent link field",
            level
        ))
    }

    pub fn unregistered_level(level: usize) -> Self {
        Self::configuration(format!("Level {} is not registered", level))
    }

    pub fn is_configuration(&self) -> bool {
        self.kind == ErrorKind::Configuration
    }

    pub fn is_unsupported(&self) -> bool {
        self.kind == ErrorKind::UnsupportedOperation
    }
}

impl From<serde_yaml::Error> for HierarchyError {
    fn from(err: serde_yaml::Error) -> Self {
        HierarchyError::new(ErrorKind::Serialization, format!("YAML error: {}", err))
            .with_source(err)
    }
}

impl From<prometheus::Error> for HierarchyError {
    fn from(err: prometheus::Error) -> Self {
        HierarchyError::new(ErrorKind::Metrics, format!("Metrics error: {}", err))
            .with_source(err)
    }
}

impl From<std::io::Error> for HierarchyError {
    fn from(err: std::io::Error) -> Self {
        HierarchyError::new(ErrorKind::IO, format!("IO error: {}", err)).with_source(err)
    }
}

/// Result type alias
pub type HierarchyResult<T> = std::result::Result<T, HierarchyError>;
