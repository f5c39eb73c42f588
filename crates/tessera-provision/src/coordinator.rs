//! Provisioning coordinator
//!
//! Creating a resource and granting its owner are two writes to two
//! independent systems. The coordinator orders them so that a failure leaves
//! either nothing behind or a logged, typed record of what remains.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use tessera_core::{
    build_path, generate_id, relations, NewRelationship, ObjectRef, RelationshipStore,
    ResourceBackend, ResourceMetadata, ResourceType, Scope, SubjectRef, TesseraError, TupleFilter,
    FILE_OBJECT_TYPE,
};

use crate::error::{Compensation, ProvisionError};
use crate::saga::{CreateState, DeleteState, SagaLog};

pub type ProvisionResult<T> = std::result::Result<T, ProvisionError>;

/// Source of fresh resource ids
pub trait IdSource: Send + Sync {
    fn next_id(&self, resource_type: ResourceType, name: Option<&str>) -> String;
}

/// Random ids from [`generate_id`]
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdSource for RandomIds {
    fn next_id(&self, resource_type: ResourceType, name: Option<&str>) -> String {
        generate_id(resource_type, name)
    }
}

/// Configuration for the provisioning coordinator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionerConfig {
    /// Relation granted to the owner of a new resource
    pub ownership_relation: String,
    /// Object type used for resource paths in the relationship store
    pub object_type: String,
    /// Look the generated path up before creating it
    pub verify_unique_paths: bool,
    /// Id generations tried before giving up on a free path
    pub max_id_attempts: u32,
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            ownership_relation: relations::OWNER_OF.to_string(),
            object_type: FILE_OBJECT_TYPE.to_string(),
            verify_unique_paths: true,
            max_id_attempts: 3,
        }
    }
}

/// A resource to create and the subject that will own it
#[derive(Debug, Clone, PartialEq)]
pub struct ProvisionRequest {
    pub resource_type: ResourceType,
    pub name: String,
    pub scope: Scope,
    pub owner: SubjectRef,
    pub description: Option<String>,
    pub content: Option<serde_json::Value>,
}

impl ProvisionRequest {
    pub fn new(
        resource_type: ResourceType,
        name: impl Into<String>,
        scope: Scope,
        owner: SubjectRef,
    ) -> Self {
        Self {
            resource_type,
            name: name.into(),
            scope,
            owner,
            description: None,
            content: None,
        }
    }

    pub fn workspace(name: impl Into<String>, scope: Scope, owner: SubjectRef) -> Self {
        Self::new(ResourceType::Workspace, name, scope, owner)
    }

    /// A memory namespace
    pub fn memory(name: impl Into<String>, scope: Scope, owner: SubjectRef) -> Self {
        Self::new(ResourceType::Memory, name, scope, owner)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_content(mut self, content: serde_json::Value) -> Self {
        self.content = Some(content);
        self
    }

    fn validate(&self) -> tessera_core::Result<()> {
        self.scope.validate()?;
        if self.owner.subject_type.trim().is_empty() || self.owner.id.trim().is_empty() {
            return Err(TesseraError::invalid_input(format!(
                "owner must have a type and id, got '{}'",
                self.owner
            )));
        }
        Ok(())
    }

    fn metadata(&self) -> ResourceMetadata {
        ResourceMetadata {
            name: self.name.clone(),
            resource_type: self.resource_type,
            description: self.description.clone(),
            content: self.content.clone(),
        }
    }
}

/// What a completed deprovisioning removed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeprovisionReport {
    pub path: String,
    /// False when the backend had no resource at the path
    pub resource_existed: bool,
    pub revoked_tuple_ids: Vec<String>,
    /// Tuples listed for the path that were gone by the time of deletion
    pub already_absent_tuple_ids: Vec<String>,
}

/// Runs the create and delete sagas against a store and a backend
#[derive(Clone)]
pub struct ProvisioningCoordinator {
    store: Arc<dyn RelationshipStore>,
    backend: Arc<dyn ResourceBackend>,
    ids: Arc<dyn IdSource>,
    config: ProvisionerConfig,
}

impl ProvisioningCoordinator {
    pub fn new(store: Arc<dyn RelationshipStore>, backend: Arc<dyn ResourceBackend>) -> Self {
        Self::with_config(store, backend, ProvisionerConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn RelationshipStore>,
        backend: Arc<dyn ResourceBackend>,
        config: ProvisionerConfig,
    ) -> Self {
        Self {
            store,
            backend,
            ids: Arc::new(RandomIds),
            config,
        }
    }

    pub fn with_id_source(mut self, ids: Arc<dyn IdSource>) -> Self {
        self.ids = ids;
        self
    }

    pub fn config(&self) -> &ProvisionerConfig {
        &self.config
    }

    /// Create a resource and grant its owner, returning the resource path.
    ///
    /// The resource is created first. If the grant then fails the resource is
    /// deleted again; the grant error is returned either way, with the outcome
    /// of that rollback attached.
    #[instrument(
        skip(self, request),
        fields(resource_type = %request.resource_type, owner = %request.owner)
    )]
    pub async fn provision(&self, request: &ProvisionRequest) -> ProvisionResult<String> {
        request
            .validate()
            .map_err(|source| ProvisionError::Validation { source })?;

        let path = self.allocate_path(request).await?;
        let mut saga = SagaLog::<CreateState>::new(&path);

        if let Err(source) = self.backend.create(&path, &request.metadata()).await {
            warn!(path = %path, error = %source, "Resource creation failed; nothing to roll back");
            return Err(ProvisionError::ResourceCreate { path, source });
        }
        saga.advance(CreateState::ResourceCreated);

        let grant = NewRelationship::new(
            request.owner.clone(),
            &self.config.ownership_relation,
            ObjectRef::new(&self.config.object_type, &path),
        );
        match self.store.create(&grant).await {
            Ok(tuple_id) => {
                saga.advance(CreateState::Granted);
                info!(path = %path, tuple_id = %tuple_id, "Provisioned resource");
                Ok(path)
            }
            Err(source) => {
                saga.advance(CreateState::GrantFailed);
                let compensation = self.compensate_create(&mut saga, &source).await;
                Err(ProvisionError::GrantFailed {
                    path,
                    source,
                    compensation,
                })
            }
        }
    }

    /// Delete a resource, then revoke every tuple that targets its path.
    ///
    /// A missing resource is not an error; tuples are still revoked. Once the
    /// resource is gone the remaining tuples are all attempted even if some
    /// deletions fail.
    #[instrument(skip(self))]
    pub async fn deprovision(&self, path: &str) -> ProvisionResult<DeprovisionReport> {
        validate_target(path).map_err(|source| ProvisionError::Validation { source })?;

        let mut saga = SagaLog::<DeleteState>::new(path);
        let resource_existed =
            self.backend
                .delete(path)
                .await
                .map_err(|source| ProvisionError::ResourceDelete {
                    path: path.to_string(),
                    source,
                })?;
        if !resource_existed {
            warn!(path, "No resource at path; revoking tuples anyway");
        }
        saga.advance(DeleteState::ResourceDeleted);

        let filter = TupleFilter::for_object(ObjectRef::new(&self.config.object_type, path));
        let tuples = match self.store.list(&filter).await {
            Ok(tuples) => tuples,
            Err(source) => {
                saga.advance(DeleteState::StaleTuples);
                error!(
                    path,
                    error = %source,
                    manual_intervention = true,
                    "Resource deleted but its tuples could not be listed"
                );
                return Err(ProvisionError::StaleTuples {
                    path: path.to_string(),
                    source,
                    stale_tuple_ids: Vec::new(),
                });
            }
        };

        let mut revoked = Vec::new();
        let mut absent = Vec::new();
        let mut stale = Vec::new();
        let mut first_error = None;
        for tuple in tuples {
            match self.store.delete(&tuple.id).await {
                Ok(true) => revoked.push(tuple.id),
                Ok(false) => {
                    debug!(tuple_id = %tuple.id, "Tuple already absent");
                    absent.push(tuple.id);
                }
                Err(e) => {
                    warn!(tuple_id = %tuple.id, error = %e, "Failed to revoke tuple");
                    stale.push(tuple.id);
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Some(source) = first_error {
            saga.advance(DeleteState::StaleTuples);
            error!(
                path,
                stale_tuple_ids = ?stale,
                revoked = revoked.len(),
                manual_intervention = true,
                "Resource deleted but tuples remain"
            );
            return Err(ProvisionError::StaleTuples {
                path: path.to_string(),
                source,
                stale_tuple_ids: stale,
            });
        }

        saga.advance(DeleteState::TuplesRevoked);
        info!(path, revoked = revoked.len(), "Deprovisioned resource");
        Ok(DeprovisionReport {
            path: path.to_string(),
            resource_existed,
            revoked_tuple_ids: revoked,
            already_absent_tuple_ids: absent,
        })
    }

    async fn allocate_path(&self, request: &ProvisionRequest) -> ProvisionResult<String> {
        let name = Some(request.name.as_str()).filter(|n| !n.trim().is_empty());
        let attempts = self.config.max_id_attempts.max(1);

        for attempt in 1..=attempts {
            let id = self.ids.next_id(request.resource_type, name);
            let path = build_path(&request.scope, request.resource_type, &id)
                .map_err(|source| ProvisionError::Validation { source })?;
            if !self.config.verify_unique_paths {
                return Ok(path);
            }

            match self.backend.get(&path).await {
                Ok(None) => return Ok(path),
                Ok(Some(_)) => warn!(attempt, path = %path, "Generated path is taken; regenerating"),
                Err(source) => return Err(ProvisionError::ExistenceCheck { path, source }),
            }
        }

        Err(ProvisionError::PathCollision {
            resource_type: request.resource_type,
            name: request.name.clone(),
            attempts,
        })
    }

    async fn compensate_create(
        &self,
        saga: &mut SagaLog<CreateState>,
        grant_error: &TesseraError,
    ) -> Compensation {
        saga.advance(CreateState::Compensating);
        let path = saga.path().to_string();

        match self.backend.delete(&path).await {
            Ok(existed) => {
                if !existed {
                    warn!(path = %path, "Resource already gone during rollback");
                }
                saga.advance(CreateState::Compensated);
                warn!(path = %path, grant_error = %grant_error, "Rolled back resource after failed grant");
                Compensation::Compensated
            }
            Err(error) => {
                saga.advance(CreateState::OrphanResource);
                error!(
                    path = %path,
                    grant_error = %grant_error,
                    compensation_error = %error,
                    manual_intervention = true,
                    "Resource left without an owner"
                );
                Compensation::OrphanResource { error }
            }
        }
    }
}

fn validate_target(path: &str) -> tessera_core::Result<()> {
    if !path.starts_with('/') || path.trim_matches('/').is_empty() {
        return Err(TesseraError::invalid_input(format!(
            "'{}' is not a resource path",
            path
        )));
    }
    Ok(())
}

impl std::fmt::Debug for ProvisioningCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisioningCoordinator")
            .field("config", &self.config)
            .finish()
    }
}
