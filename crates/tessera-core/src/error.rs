//! Error types for the Tessera authorization core

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TesseraError {
    #[error("Invalid identifier for {field}: {reason} (got {value:?})")]
    InvalidIdentifier {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Relationship store error during {operation}: {message}")]
    RelationshipStore { operation: String, message: String },

    #[error("Resource backend error during {operation} on {path}: {message}")]
    ResourceBackend {
        operation: String,
        path: String,
        message: String,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl TesseraError {
    pub fn invalid_identifier(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidIdentifier {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn store_error(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RelationshipStore {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn backend_error(
        operation: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ResourceBackend {
            operation: operation.into(),
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Validation errors are raised before any remote call is made.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidIdentifier { .. } | Self::InvalidInput { .. }
        )
    }

    /// Errors that originated in a collaborator rather than in local checks.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::RelationshipStore { .. } | Self::ResourceBackend { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, TesseraError>;
