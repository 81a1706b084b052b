//! Error types for planner operations
//!
//! Problems with the declarations themselves are never errors here; they are
//! reported as [`Diagnostic`](crate::Diagnostic)s on the planning result.
//! [`PlannerError`] covers misuse of the planner API.

use crate::EntityId;
use thiserror::Error;

/// Errors that can occur when asking the planner for a table or a plan
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlannerError {
    /// No entity with this id was declared
    #[error("Unknown declaring entity: {entity}")]
    UnknownEntity { entity: EntityId },

    /// The entity is a module and has no roots to resolve
    #[error("{entity} is a module, not a container")]
    NotAContainer { entity: EntityId },

    /// A cancellation token fired between two roots
    #[error("Planning was cancelled")]
    Cancelled,
}

impl PlannerError {
    /// Create an UnknownEntity error
    #[inline]
    pub fn unknown_entity(entity: &EntityId) -> Self {
        Self::UnknownEntity {
            entity: entity.clone(),
        }
    }

    /// Create a NotAContainer error
    #[inline]
    pub fn not_a_container(entity: &EntityId) -> Self {
        Self::NotAContainer {
            entity: entity.clone(),
        }
    }
}

/// Result type alias for planner operations
pub type Result<T> = std::result::Result<T, PlannerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            PlannerError::unknown_entity(&"App".into()).to_string(),
            "Unknown declaring entity: App"
        );
        assert_eq!(
            PlannerError::not_a_container(&"Infra".into()).to_string(),
            "Infra is a module, not a container"
        );
    }
}
