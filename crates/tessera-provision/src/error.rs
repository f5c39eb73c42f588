//! Provisioning failures
//!
//! Each variant carries the path and the error of the step that failed.
//! Compensation results travel in their own field and never replace the
//! triggering error.

use thiserror::Error;

use tessera_core::{ResourceType, TesseraError};

use crate::saga::{CreateState, DeleteState};

/// Outcome of rolling back a created resource after its grant failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
    /// The resource was deleted again; nothing persists
    Compensated,
    /// The compensating delete failed; an ownerless resource remains
    OrphanResource { error: TesseraError },
}

impl Compensation {
    pub fn is_orphan(&self) -> bool {
        matches!(self, Compensation::OrphanResource { .. })
    }
}

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Invalid provisioning request: {source}")]
    Validation {
        #[source]
        source: TesseraError,
    },

    #[error("No free path for {resource_type} {name:?} after {attempts} attempts")]
    PathCollision {
        resource_type: ResourceType,
        name: String,
        attempts: u32,
    },

    #[error("Failed to check for an existing resource at {path}: {source}")]
    ExistenceCheck {
        path: String,
        #[source]
        source: TesseraError,
    },

    #[error("Failed to create resource at {path}: {source}")]
    ResourceCreate {
        path: String,
        #[source]
        source: TesseraError,
    },

    #[error("Failed to grant ownership of {path}: {source}")]
    GrantFailed {
        path: String,
        #[source]
        source: TesseraError,
        compensation: Compensation,
    },

    #[error("Failed to delete resource at {path}: {source}")]
    ResourceDelete {
        path: String,
        #[source]
        source: TesseraError,
    },

    #[error("Resource {path} deleted but relationship cleanup failed: {source}")]
    StaleTuples {
        path: String,
        #[source]
        source: TesseraError,
        /// Tuples known to remain; empty when the listing itself failed
        stale_tuple_ids: Vec<String>,
    },
}

impl ProvisionError {
    /// The saga step that failed
    pub fn operation(&self) -> &'static str {
        match self {
            ProvisionError::Validation { .. } => "validate",
            ProvisionError::PathCollision { .. } | ProvisionError::ExistenceCheck { .. } => {
                "allocate_path"
            }
            ProvisionError::ResourceCreate { .. } => "create_resource",
            ProvisionError::GrantFailed { .. } => "grant_ownership",
            ProvisionError::ResourceDelete { .. } => "delete_resource",
            ProvisionError::StaleTuples { .. } => "revoke_tuples",
        }
    }

    pub fn path(&self) -> Option<&str> {
        match self {
            ProvisionError::Validation { .. } | ProvisionError::PathCollision { .. } => None,
            ProvisionError::ExistenceCheck { path, .. }
            | ProvisionError::ResourceCreate { path, .. }
            | ProvisionError::GrantFailed { path, .. }
            | ProvisionError::ResourceDelete { path, .. }
            | ProvisionError::StaleTuples { path, .. } => Some(path),
        }
    }

    /// The underlying collaborator or validation error, if any
    pub fn cause(&self) -> Option<&TesseraError> {
        match self {
            ProvisionError::PathCollision { .. } => None,
            ProvisionError::Validation { source }
            | ProvisionError::ExistenceCheck { source, .. }
            | ProvisionError::ResourceCreate { source, .. }
            | ProvisionError::GrantFailed { source, .. }
            | ProvisionError::ResourceDelete { source, .. }
            | ProvisionError::StaleTuples { source, .. } => Some(source),
        }
    }

    /// Final state of the create saga, for errors raised by `provision`
    pub fn create_state(&self) -> Option<CreateState> {
        match self {
            ProvisionError::Validation { .. }
            | ProvisionError::PathCollision { .. }
            | ProvisionError::ExistenceCheck { .. }
            | ProvisionError::ResourceCreate { .. } => Some(CreateState::Started),
            ProvisionError::GrantFailed { compensation, .. } => Some(match compensation {
                Compensation::Compensated => CreateState::Compensated,
                Compensation::OrphanResource { .. } => CreateState::OrphanResource,
            }),
            ProvisionError::ResourceDelete { .. } | ProvisionError::StaleTuples { .. } => None,
        }
    }

    /// Final state of the delete saga, for errors raised by `deprovision`
    pub fn delete_state(&self) -> Option<DeleteState> {
        match self {
            ProvisionError::ResourceDelete { .. } => Some(DeleteState::Started),
            ProvisionError::StaleTuples { .. } => Some(DeleteState::StaleTuples),
            _ => None,
        }
    }

    /// Whether an operator has to reconcile state by hand
    pub fn needs_manual_intervention(&self) -> bool {
        match self {
            ProvisionError::GrantFailed { compensation, .. } => compensation.is_orphan(),
            ProvisionError::StaleTuples { .. } => true,
            _ => false,
        }
    }
}
