//! Errors surfaced to callers of the risk engine session.

use cascade_graph::GraphError;

/// Failure of a session operation.
///
/// Both variants are caller errors; the session state is unchanged when
/// either is returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    /// Malformed input.
    #[error("invalid {field}: {reason}")]
    Validation {
        /// Name of the offending input field.
        field: &'static str,
        /// Human-readable explanation.
        reason: String,
    },

    /// The referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity looked up (`"event"`, `"node"`).
        entity: &'static str,
        /// The id that was not found.
        id: String,
    },
}

impl SessionError {
    /// Shorthand for a [`SessionError::Validation`].
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`SessionError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}

impl From<GraphError> for SessionError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::NodeNotFound(id) => Self::not_found("node", id.0),
            GraphError::OutOfRange {
                field,
                value,
                expected,
                ..
            } => Self::validation(field, format!("{value} is outside {expected}")),
            other => Self::validation("graph", other.to_string()),
        }
    }
}
