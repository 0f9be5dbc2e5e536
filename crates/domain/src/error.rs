//! Unified error type for the domain layer.
//!
//! Per the error-handling design, stores raise these only for *invariant
//! violations* (empty id, unknown NPC id); transient I/O and validation
//! failures never reach this type — they are return-valued as `Option`/
//! `bool` or recorded as command feedback instead.

use thiserror::Error;

/// Unified error type for domain operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A required field was empty where the invariant forbids it
    /// (e.g. an empty memory id or npc id on `NpcMemoryStore::add`).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced entity does not exist.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// An operation would violate a documented invariant
    /// (e.g. advancing a plan step past its bounds).
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_message() {
        let err = DomainError::validation("npc id must not be empty");
        assert_eq!(err.to_string(), "validation failed: npc id must not be empty");
    }

    #[test]
    fn not_found_error_message() {
        let err = DomainError::not_found("NpcMemory", "abc-123");
        assert_eq!(err.to_string(), "NpcMemory not found: abc-123");
    }
}
