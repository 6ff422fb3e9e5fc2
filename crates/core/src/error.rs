//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic failures caused by the input the
/// pipeline was driven with. Storage and network failures have their own
/// error types in the crates that own those concerns.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A condition had the wrong arity or an unknown variable/relation token.
    #[error("malformed condition: {0}")]
    MalformedCondition(String),

    /// A well-formed condition whose (variable, relation) pairing has no
    /// matching rule.
    #[error("unsupported condition: {variable} {relation}")]
    UnsupportedCondition { variable: String, relation: String },

    /// An item carries a size option that was matched but never registered.
    #[error("no size spec registered for option '{0}'")]
    MissingSizeSpec(String),

    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A requested record was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl DomainError {
    pub fn malformed_condition(msg: impl Into<String>) -> Self {
        Self::MalformedCondition(msg.into())
    }

    pub fn unsupported_condition(variable: impl Into<String>, relation: impl Into<String>) -> Self {
        Self::UnsupportedCondition {
            variable: variable.into(),
            relation: relation.into(),
        }
    }

    pub fn missing_size_spec(option_handle: impl Into<String>) -> Self {
        Self::MissingSizeSpec(option_handle.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Configuration errors mean the pipeline itself was driven with invalid
    /// input; they abort the run instead of a single item.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MalformedCondition(_) | Self::UnsupportedCondition { .. } | Self::MissingSizeSpec(_)
        )
    }
}
