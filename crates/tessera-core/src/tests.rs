//! Unit tests for tessera-core

use super::*;
use chrono::{Duration, Utc};

// =============================================================================
// Relation Mapping Tests
// =============================================================================

#[cfg(test)]
mod relation_tests {
    use super::*;

    #[test]
    fn test_owner_relations() {
        for relation in [relations::DIRECT_OWNER, relations::PARENT_OWNER] {
            assert_eq!(
                PermissionLevel::for_relation(relation),
                Some(PermissionLevel::Owner)
            );
        }
    }

    #[test]
    fn test_editor_and_viewer_relations() {
        assert_eq!(
            PermissionLevel::from_relation("direct_editor"),
            PermissionLevel::Editor
        );
        assert_eq!(
            PermissionLevel::from_relation("parent_editor"),
            PermissionLevel::Editor
        );
        assert_eq!(
            PermissionLevel::from_relation("direct_viewer"),
            PermissionLevel::Viewer
        );
        assert_eq!(
            PermissionLevel::from_relation("parent_viewer"),
            PermissionLevel::Viewer
        );
    }

    #[test]
    fn test_unknown_relation_fails_open_to_viewer() {
        assert_eq!(PermissionLevel::for_relation("direct_ownr"), None);
        assert_eq!(
            PermissionLevel::from_relation("direct_ownr"),
            PermissionLevel::Viewer
        );
        assert_eq!(PermissionLevel::from_relation(""), PermissionLevel::Viewer);
    }

    #[test]
    fn test_provisioning_grant_is_outside_the_table() {
        assert_eq!(PermissionLevel::for_relation(relations::OWNER_OF), None);
        assert_eq!(
            PermissionLevel::from_relation(relations::OWNER_OF),
            PermissionLevel::Viewer
        );
    }

    #[test]
    fn test_level_ordering() {
        assert!(PermissionLevel::Owner > PermissionLevel::Editor);
        assert!(PermissionLevel::Editor > PermissionLevel::Viewer);
        assert!(PermissionLevel::Editor.can_write());
        assert!(!PermissionLevel::Viewer.can_write());
    }

    #[test]
    fn test_level_serialization() {
        let json = serde_json::to_string(&PermissionLevel::Editor).unwrap();
        assert_eq!(json, "\"editor\"");
    }
}

// =============================================================================
// Model Tests
// =============================================================================

#[cfg(test)]
mod model_tests {
    use super::*;

    fn tuple(subject: SubjectRef, relation: &str, path: &str) -> RelationshipTuple {
        RelationshipTuple {
            id: "t1".to_string(),
            subject,
            relation: relation.to_string(),
            object: ObjectRef::file(path),
            created_at: None,
            expires_at: None,
        }
    }

    #[test]
    fn test_owning_user() {
        assert_eq!(SubjectRef::agent("alice,bot1").owning_user(), Some("alice"));
        assert_eq!(SubjectRef::user("bob").owning_user(), Some("bob"));
        assert_eq!(SubjectRef::agent("nobody").owning_user(), None);
        assert_eq!(SubjectRef::agent(",bot").owning_user(), None);
        assert_eq!(SubjectRef::tenant("acme").owning_user(), None);
    }

    #[test]
    fn test_tuple_filter_matching() {
        let alice = SubjectRef::agent("alice,bot1");
        let t = tuple(alice.clone(), "direct_viewer", "/workspace/a");

        assert!(TupleFilter::default().matches(&t));
        assert!(TupleFilter::for_subject(alice.clone()).matches(&t));
        assert!(TupleFilter::for_object(ObjectRef::file("/workspace/a")).matches(&t));
        assert!(!TupleFilter::for_object(ObjectRef::file("/workspace/b")).matches(&t));
        assert!(!TupleFilter::for_subject(alice)
            .with_relation("direct_owner")
            .matches(&t));
        assert!(!TupleFilter::for_subject(SubjectRef::user("alice")).matches(&t));
    }

    #[test]
    fn test_tuple_expiry() {
        let now = Utc::now();
        let mut t = tuple(SubjectRef::user("u"), "direct_viewer", "/skill/s");
        assert!(!t.is_expired_at(now));

        t.expires_at = Some(now - Duration::seconds(1));
        assert!(t.is_expired_at(now));

        t.expires_at = Some(now + Duration::hours(1));
        assert!(!t.is_expired_at(now));
    }

    #[test]
    fn test_new_relationship_display() {
        let rel = NewRelationship::new(
            SubjectRef::user("alice"),
            relations::OWNER_OF,
            ObjectRef::file("/workspace/ws_1"),
        );
        assert_eq!(rel.to_string(), "file:/workspace/ws_1#owner-of@user:alice");
    }

    #[test]
    fn test_resource_record_key_prefers_name() {
        let record = ResourceRecord::new("/connector/c1");
        assert_eq!(record.key(), "/connector/c1");
        assert_eq!(record.named("Slack").key(), "Slack");
    }

    #[test]
    fn test_access_check_constructors() {
        assert!(!AccessCheck::denied().granted);
        assert_eq!(AccessCheck::denied().level, None);
        let granted = AccessCheck::granted(PermissionLevel::Owner);
        assert!(granted.granted);
        assert_eq!(granted.level, Some(PermissionLevel::Owner));
    }

    #[test]
    fn test_scope_serialization() {
        let scope = Scope::user("acme", "alice");
        let json = serde_json::to_value(&scope).unwrap();
        assert_eq!(json["kind"], "user");
        assert_eq!(json["tenant_id"], "acme");
        let back: Scope = serde_json::from_value(json).unwrap();
        assert_eq!(back, scope);
    }
}

// =============================================================================
// Error Tests
// =============================================================================

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(TesseraError::invalid_input("x").is_validation());
        assert!(TesseraError::invalid_identifier("tenant_id", "", "empty").is_validation());
        assert!(TesseraError::store_error("create", "timeout").is_remote());
        assert!(TesseraError::backend_error("delete", "/a/b", "503").is_remote());
        assert!(!TesseraError::internal_error("x").is_remote());
    }

    #[test]
    fn test_error_messages_carry_context() {
        let err = TesseraError::backend_error("create", "/workspace/ws_1", "connection reset");
        let message = err.to_string();
        assert!(message.contains("create"));
        assert!(message.contains("/workspace/ws_1"));
        assert!(message.contains("connection reset"));
    }
}
