//! Provisioning and permission resolution over shared in-memory collaborators

use std::sync::Arc;

use tessera_core::{PermissionLevel, Scope, SubjectRef};
use tessera_provision::{ProvisionError, ProvisionRequest, ProvisioningCoordinator};
use tessera_rebac::{AllResources, PermissionResolver};
use tessera_testkit::{FaultMode, MemoryRelationshipStore, MemoryResourceBackend, StoreOp};

struct Harness {
    store: Arc<MemoryRelationshipStore>,
    coordinator: ProvisioningCoordinator,
    resolver: PermissionResolver,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryRelationshipStore::new());
    let backend = Arc::new(MemoryResourceBackend::new());
    Harness {
        coordinator: ProvisioningCoordinator::new(store.clone(), backend.clone()),
        resolver: PermissionResolver::new(store.clone(), backend),
        store,
    }
}

#[tokio::test]
async fn test_provisioned_owner_resolves_as_viewer() {
    let h = harness();
    let alice = SubjectRef::user("alice");
    let request = ProvisionRequest::workspace("Roadmap", Scope::tenant("acme"), alice.clone());

    let path = h.coordinator.provision(&request).await.unwrap();

    let check = h.resolver.has_directory_access(&alice, &path, None).await;
    assert!(check.granted);
    assert_eq!(check.level, Some(PermissionLevel::Viewer));

    let access = h.resolver.resolve_for(&alice, &AllResources).await;
    assert_eq!(access.len(), 1);
    assert_eq!(access[0].resource_path, path);
    assert_eq!(access[0].name.as_deref(), Some("Roadmap"));
    assert_eq!(access[0].permission, PermissionLevel::Viewer);

    let bob = SubjectRef::user("bob");
    assert!(h.resolver.resolve_for(&bob, &AllResources).await.is_empty());
    // `owner-of` is outside the level table; counted for each of alice's lookups
    assert_eq!(h.resolver.metrics().snapshot().unmapped_relations, 2);
}

#[tokio::test]
async fn test_deprovisioned_resource_grants_nothing() {
    let h = harness();
    let alice = SubjectRef::user("alice");
    let request = ProvisionRequest::memory("Scratch", Scope::user("acme", "alice"), alice.clone());
    let path = h.coordinator.provision(&request).await.unwrap();

    let report = h.coordinator.deprovision(&path).await.unwrap();
    assert_eq!(report.revoked_tuple_ids.len(), 1);

    assert!(!h.resolver.has_directory_access(&alice, &path, None).await.granted);
    assert!(h.resolver.resolve_for(&alice, &AllResources).await.is_empty());
    assert!(h.store.tuples().await.is_empty());
}

#[tokio::test]
async fn test_compensated_provision_leaves_no_access() {
    let h = harness();
    h.store.fail(StoreOp::Create, FaultMode::Times(1)).await;
    let alice = SubjectRef::user("alice");
    let request = ProvisionRequest::workspace("Flaky", Scope::tenant("acme"), alice.clone());

    let err = h.coordinator.provision(&request).await.unwrap_err();
    assert!(matches!(err, ProvisionError::GrantFailed { .. }));
    assert!(h.resolver.resolve_for(&alice, &AllResources).await.is_empty());

    // The fault was one-shot; a retry goes through
    let path = h.coordinator.provision(&request).await.unwrap();
    assert_eq!(h.resolver.resolve_for(&alice, &AllResources).await[0].resource_path, path);
}
