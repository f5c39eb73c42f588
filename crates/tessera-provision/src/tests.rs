//! Unit tests for tessera-provision

use super::*;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tessera_core::{
    relations, ObjectRef, ResourceRecord, ResourceType, Scope, SubjectRef, TesseraError,
};
use tessera_testkit::{
    BackendCall, BackendOp, FaultMode, MemoryRelationshipStore, MemoryResourceBackend, StoreCall,
    StoreOp,
};

/// Hands out preset ids in order
struct FixedIds(Mutex<VecDeque<String>>);

impl FixedIds {
    fn new(ids: &[&str]) -> Arc<Self> {
        Arc::new(Self(Mutex::new(
            ids.iter().map(|s| s.to_string()).collect(),
        )))
    }
}

impl IdSource for FixedIds {
    fn next_id(&self, resource_type: ResourceType, _name: Option<&str>) -> String {
        self.0
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| format!("{}_exhausted", resource_type))
    }
}

fn fixture() -> (
    Arc<MemoryRelationshipStore>,
    Arc<MemoryResourceBackend>,
    ProvisioningCoordinator,
) {
    let store = Arc::new(MemoryRelationshipStore::new());
    let backend = Arc::new(MemoryResourceBackend::new());
    let coordinator = ProvisioningCoordinator::new(store.clone(), backend.clone());
    (store, backend, coordinator)
}

fn owner() -> SubjectRef {
    SubjectRef::user("alice")
}

fn workspace_request() -> ProvisionRequest {
    ProvisionRequest::workspace("Team Docs", Scope::tenant("acme"), owner())
}

// =============================================================================
// Provisioning Tests
// =============================================================================

#[cfg(test)]
mod provision_tests {
    use super::*;

    #[tokio::test]
    async fn test_provision_creates_resource_then_grants_owner() {
        let (store, backend, coordinator) = fixture();

        let path = coordinator.provision(&workspace_request()).await.unwrap();

        assert!(path.starts_with("/tenant:acme/workspace/workspace_team_docs_"));
        assert!(backend.contains(&path).await);

        let tuples = store.tuples().await;
        assert_eq!(tuples.len(), 1);
        assert_eq!(tuples[0].subject, owner());
        assert_eq!(tuples[0].relation, relations::OWNER_OF);
        assert_eq!(tuples[0].object, ObjectRef::file(&path));
    }

    #[tokio::test]
    async fn test_provision_passes_metadata_to_backend() {
        let (_store, backend, coordinator) = fixture();
        let request = ProvisionRequest::memory("Notes", Scope::user("acme", "alice"), owner())
            .with_description("scratch space")
            .with_content(serde_json::json!({"entries": []}));

        let path = coordinator.provision(&request).await.unwrap();
        assert!(path.starts_with("/tenant:acme/user:alice/memory/memory_notes_"));

        let created = backend
            .calls()
            .await
            .into_iter()
            .find_map(|call| match call {
                BackendCall::Create(p, metadata) => Some((p, metadata)),
                _ => None,
            })
            .unwrap();
        assert_eq!(created.0, path);
        assert_eq!(created.1.name, "Notes");
        assert_eq!(created.1.resource_type, ResourceType::Memory);
        assert_eq!(created.1.description.as_deref(), Some("scratch space"));
        assert!(created.1.content.is_some());
    }

    #[tokio::test]
    async fn test_provision_system_scope() {
        let (_store, _backend, coordinator) = fixture();
        let request = ProvisionRequest::new(ResourceType::Skill, "", Scope::System, owner());

        let path = coordinator.provision(&request).await.unwrap();
        let parsed = tessera_core::parse_path(&path).unwrap();
        assert_eq!(parsed.scope, Scope::System);
        assert_eq!(parsed.resource_type, ResourceType::Skill);
        // Empty names leave only the type prefix and suffix
        assert_eq!(parsed.id.len(), "skill_".len() + tessera_core::SUFFIX_LEN);
    }

    #[tokio::test]
    async fn test_invalid_scope_makes_no_remote_calls() {
        let (store, backend, coordinator) = fixture();
        let request = ProvisionRequest::workspace("w", Scope::tenant(""), owner());

        let err = coordinator.provision(&request).await.unwrap_err();

        assert!(matches!(err, ProvisionError::Validation { .. }));
        assert_eq!(err.create_state(), Some(CreateState::Started));
        assert!(backend.calls().await.is_empty());
        assert!(store.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_owner_is_rejected() {
        let (_store, backend, coordinator) = fixture();
        let request =
            ProvisionRequest::workspace("w", Scope::tenant("acme"), SubjectRef::user(""));

        let err = coordinator.provision(&request).await.unwrap_err();
        assert!(matches!(err, ProvisionError::Validation { .. }));
        assert!(backend.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_resource_create_failure_skips_grant() {
        let (store, backend, coordinator) = fixture();
        backend.fail(BackendOp::Create, FaultMode::Always).await;

        let err = coordinator.provision(&workspace_request()).await.unwrap_err();

        assert!(matches!(err, ProvisionError::ResourceCreate { .. }));
        assert_eq!(err.operation(), "create_resource");
        assert!(store.calls().await.is_empty());
        assert!(backend.delete_calls().await.is_empty());
        assert!(!err.needs_manual_intervention());
    }

    #[tokio::test]
    async fn test_grant_failure_compensates_with_delete() {
        let (store, backend, coordinator) = fixture();
        store.fail(StoreOp::Create, FaultMode::Always).await;

        let err = coordinator.provision(&workspace_request()).await.unwrap_err();

        let ProvisionError::GrantFailed {
            path,
            source,
            compensation,
        } = &err
        else {
            panic!("expected GrantFailed, got {:?}", err);
        };
        assert_eq!(compensation, &Compensation::Compensated);
        assert!(matches!(source, TesseraError::RelationshipStore { .. }));
        assert_eq!(backend.delete_calls().await, vec![path.clone()]);
        assert!(!backend.contains(path).await);
        assert!(store.tuples().await.is_empty());
        assert_eq!(err.create_state(), Some(CreateState::Compensated));
        assert!(!err.needs_manual_intervention());
    }

    #[tokio::test]
    async fn test_failed_compensation_reports_orphan() {
        let (store, backend, coordinator) = fixture();
        store.fail(StoreOp::Create, FaultMode::Always).await;
        backend.fail(BackendOp::Delete, FaultMode::Always).await;

        let err = coordinator.provision(&workspace_request()).await.unwrap_err();

        let ProvisionError::GrantFailed {
            path,
            source,
            compensation,
        } = &err
        else {
            panic!("expected GrantFailed, got {:?}", err);
        };
        // The grant error stays primary; the rollback error rides alongside
        assert!(matches!(source, TesseraError::RelationshipStore { .. }));
        assert!(matches!(
            compensation,
            Compensation::OrphanResource {
                error: TesseraError::ResourceBackend { .. }
            }
        ));
        assert!(backend.contains(path).await);
        assert_eq!(err.create_state(), Some(CreateState::OrphanResource));
        assert!(err.needs_manual_intervention());
    }

    #[tokio::test]
    async fn test_taken_path_is_regenerated() {
        let (_store, backend, coordinator) = fixture();
        backend
            .seed(ResourceRecord::new("/tenant:acme/workspace/taken"))
            .await;
        let coordinator = coordinator.with_id_source(FixedIds::new(&["taken", "free"]));

        let path = coordinator.provision(&workspace_request()).await.unwrap();

        assert_eq!(path, "/tenant:acme/workspace/free");
        let gets: Vec<_> = backend
            .calls()
            .await
            .into_iter()
            .filter(|c| matches!(c, BackendCall::Get(_)))
            .collect();
        assert_eq!(gets.len(), 2);
    }

    #[tokio::test]
    async fn test_exhausted_attempts_is_a_collision() {
        let store = Arc::new(MemoryRelationshipStore::new());
        let backend = Arc::new(MemoryResourceBackend::new());
        backend.seed(ResourceRecord::new("/tenant:acme/workspace/a")).await;
        backend.seed(ResourceRecord::new("/tenant:acme/workspace/b")).await;
        let config = ProvisionerConfig {
            max_id_attempts: 2,
            ..Default::default()
        };
        let coordinator = ProvisioningCoordinator::with_config(store.clone(), backend.clone(), config)
            .with_id_source(FixedIds::new(&["a", "b", "c"]));

        let err = coordinator.provision(&workspace_request()).await.unwrap_err();

        assert!(matches!(
            err,
            ProvisionError::PathCollision { attempts: 2, .. }
        ));
        assert!(!backend
            .calls()
            .await
            .iter()
            .any(|c| matches!(c, BackendCall::Create(..))));
        assert!(store.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_uniqueness_check_can_be_disabled() {
        let store = Arc::new(MemoryRelationshipStore::new());
        let backend = Arc::new(MemoryResourceBackend::new());
        let config = ProvisionerConfig {
            verify_unique_paths: false,
            ..Default::default()
        };
        let coordinator = ProvisioningCoordinator::with_config(store, backend.clone(), config);

        coordinator.provision(&workspace_request()).await.unwrap();

        assert!(!backend
            .calls()
            .await
            .iter()
            .any(|c| matches!(c, BackendCall::Get(_))));
    }

    #[tokio::test]
    async fn test_existence_check_failure_aborts() {
        let (store, backend, coordinator) = fixture();
        backend.fail(BackendOp::Get, FaultMode::Always).await;

        let err = coordinator.provision(&workspace_request()).await.unwrap_err();

        assert!(matches!(err, ProvisionError::ExistenceCheck { .. }));
        assert!(err.path().is_some());
        assert!(store.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_custom_ownership_relation() {
        let store = Arc::new(MemoryRelationshipStore::new());
        let backend = Arc::new(MemoryResourceBackend::new());
        let config = ProvisionerConfig {
            ownership_relation: relations::DIRECT_OWNER.to_string(),
            ..Default::default()
        };
        let coordinator = ProvisioningCoordinator::with_config(store.clone(), backend, config);

        coordinator.provision(&workspace_request()).await.unwrap();
        assert_eq!(store.tuples().await[0].relation, relations::DIRECT_OWNER);
    }
}

// =============================================================================
// Deprovisioning Tests
// =============================================================================

#[cfg(test)]
mod deprovision_tests {
    use super::*;

    const PATH: &str = "/tenant:acme/workspace/w1";

    async fn seeded() -> (
        Arc<MemoryRelationshipStore>,
        Arc<MemoryResourceBackend>,
        ProvisioningCoordinator,
        Vec<String>,
    ) {
        let (store, backend, coordinator) = fixture();
        backend.seed(ResourceRecord::new(PATH).named("w1")).await;
        let mut ids = Vec::new();
        for (subject, relation) in [
            (SubjectRef::user("alice"), relations::OWNER_OF),
            (SubjectRef::user("bob"), relations::DIRECT_EDITOR),
            (SubjectRef::agent("alice,bot1"), relations::DIRECT_VIEWER),
        ] {
            ids.push(store.seed(subject, relation, ObjectRef::file(PATH)).await);
        }
        store
            .seed(
                SubjectRef::user("alice"),
                relations::OWNER_OF,
                ObjectRef::file("/tenant:acme/workspace/other"),
            )
            .await;
        (store, backend, coordinator, ids)
    }

    #[tokio::test]
    async fn test_deprovision_deletes_resource_and_every_tuple() {
        let (store, backend, coordinator, ids) = seeded().await;

        let report = coordinator.deprovision(PATH).await.unwrap();

        assert_eq!(backend.delete_calls().await, vec![PATH.to_string()]);
        let mut deleted = store.delete_calls().await;
        deleted.sort();
        let mut expected = ids.clone();
        expected.sort();
        assert_eq!(deleted, expected);

        assert!(report.resource_existed);
        assert_eq!(report.revoked_tuple_ids.len(), 3);
        assert!(report.already_absent_tuple_ids.is_empty());
        // Tuples on other paths survive
        assert_eq!(store.tuples().await.len(), 1);
    }

    #[tokio::test]
    async fn test_resource_delete_failure_leaves_tuples_alone() {
        let (store, backend, coordinator, _ids) = seeded().await;
        backend.fail(BackendOp::Delete, FaultMode::Always).await;

        let err = coordinator.deprovision(PATH).await.unwrap_err();

        assert!(matches!(err, ProvisionError::ResourceDelete { .. }));
        assert_eq!(err.delete_state(), Some(DeleteState::Started));
        assert!(store.calls().await.is_empty());
        assert_eq!(store.tuples().await.len(), 4);
    }

    #[tokio::test]
    async fn test_missing_resource_still_revokes_tuples() {
        let (store, _backend, coordinator) = fixture();
        store
            .seed(owner(), relations::OWNER_OF, ObjectRef::file(PATH))
            .await;

        let report = coordinator.deprovision(PATH).await.unwrap();

        assert!(!report.resource_existed);
        assert_eq!(report.revoked_tuple_ids.len(), 1);
        assert!(store.tuples().await.is_empty());
    }

    #[tokio::test]
    async fn test_tuple_delete_failure_reports_stale_ids() {
        let (store, backend, coordinator, ids) = seeded().await;
        store.fail_delete_of(&ids[1]).await;

        let err = coordinator.deprovision(PATH).await.unwrap_err();

        let ProvisionError::StaleTuples {
            path,
            stale_tuple_ids,
            ..
        } = &err
        else {
            panic!("expected StaleTuples, got {:?}", err);
        };
        assert_eq!(path, PATH);
        assert_eq!(stale_tuple_ids, &vec![ids[1].clone()]);
        // Every tuple was attempted despite the failure
        assert_eq!(store.delete_calls().await.len(), 3);
        assert!(!backend.contains(PATH).await);
        assert_eq!(err.delete_state(), Some(DeleteState::StaleTuples));
        assert!(err.needs_manual_intervention());
    }

    #[tokio::test]
    async fn test_tuple_listing_failure_is_stale() {
        let (store, backend, coordinator, _ids) = seeded().await;
        store.fail(StoreOp::List, FaultMode::Always).await;

        let err = coordinator.deprovision(PATH).await.unwrap_err();

        assert!(matches!(
            &err,
            ProvisionError::StaleTuples { stale_tuple_ids, .. } if stale_tuple_ids.is_empty()
        ));
        assert!(!backend.contains(PATH).await);
        assert!(store.delete_calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_non_paths_are_rejected() {
        let (store, backend, coordinator) = fixture();

        for target in ["", "/", "workspace/w1"] {
            let err = coordinator.deprovision(target).await.unwrap_err();
            assert!(matches!(err, ProvisionError::Validation { .. }), "{:?}", target);
        }
        assert!(backend.calls().await.is_empty());
        assert!(store.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_lists_by_object() {
        let (store, _backend, coordinator, _ids) = seeded().await;
        coordinator.deprovision(PATH).await.unwrap();

        let listed = store.calls().await.into_iter().find_map(|c| match c {
            StoreCall::List(filter) => Some(filter),
            _ => None,
        });
        let filter = listed.unwrap();
        assert_eq!(filter.object, Some(ObjectRef::file(PATH)));
        assert!(filter.subject.is_none());
    }
}
