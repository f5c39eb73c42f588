//! Collaborator traits the core calls into
//!
//! Both collaborators are remote systems with no shared commit protocol.
//! Implementations must be safe to share across tasks.

use crate::{error::Result, models::*};
use async_trait::async_trait;

// =============================================================================
// Relationship Store
// =============================================================================

/// Remote authority holding relationship tuples
#[async_trait]
pub trait RelationshipStore: Send + Sync {
    /// Write a tuple and return the id the store assigned to it
    async fn create(&self, relationship: &NewRelationship) -> Result<String>;

    /// List tuples matching a filter. Expired tuples must not be returned.
    async fn list(&self, filter: &TupleFilter) -> Result<Vec<RelationshipTuple>>;

    /// Delete a tuple by id. `Ok(false)` means it was already absent.
    async fn delete(&self, id: &str) -> Result<bool>;
}

// =============================================================================
// Resource Backend
// =============================================================================

/// Remote system that owns the resources addressed by paths
#[async_trait]
pub trait ResourceBackend: Send + Sync {
    async fn create(&self, path: &str, metadata: &ResourceMetadata) -> Result<ResourceRecord>;

    /// `Ok(false)` means there was nothing at `path`
    async fn delete(&self, path: &str) -> Result<bool>;

    async fn get(&self, path: &str) -> Result<Option<ResourceRecord>>;

    /// Every resource visible to the caller; used to build candidate sets
    async fn list(&self) -> Result<Vec<ResourceRecord>>;
}
