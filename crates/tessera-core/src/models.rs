//! Domain models for the Tessera authorization core
//!
//! ## Relation vocabulary
//!
//! Relations written to the store map many-to-one onto three permission
//! levels, ordered `owner > editor > viewer`:
//!
//! | relation | level |
//! |---|---|
//! | `direct_owner`, `parent_owner` | owner |
//! | `direct_editor`, `parent_editor` | editor |
//! | `direct_viewer`, `parent_viewer` | viewer |
//!
//! Anything else resolves to viewer. Callers that need to notice unknown
//! relations use [`PermissionLevel::for_relation`], which returns `None`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::paths::ResourceType;

// =============================================================================
// Relations
// =============================================================================

pub mod relations {
    pub const DIRECT_OWNER: &str = "direct_owner";
    pub const PARENT_OWNER: &str = "parent_owner";
    pub const DIRECT_EDITOR: &str = "direct_editor";
    pub const PARENT_EDITOR: &str = "parent_editor";
    pub const DIRECT_VIEWER: &str = "direct_viewer";
    pub const PARENT_VIEWER: &str = "parent_viewer";
    /// Written by the provisioning saga when it grants ownership. Outside the
    /// level table, so it resolves as viewer.
    pub const OWNER_OF: &str = "owner-of";
}

/// Object type used for every path-addressed resource
pub const FILE_OBJECT_TYPE: &str = "file";

// =============================================================================
// Subjects & Objects
// =============================================================================

/// The identity side of a relationship tuple
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectRef {
    pub subject_type: String,
    pub id: String,
}

/// Identities are opaque `(type, id)` pairs
pub type Identity = SubjectRef;

impl SubjectRef {
    pub fn new(subject_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            subject_type: subject_type.into(),
            id: id.into(),
        }
    }

    pub fn agent(id: impl Into<String>) -> Self {
        Self::new("agent", id)
    }

    pub fn user(id: impl Into<String>) -> Self {
        Self::new("user", id)
    }

    pub fn tenant(id: impl Into<String>) -> Self {
        Self::new("tenant", id)
    }

    /// The human user behind this identity, if one can be derived.
    ///
    /// Agent ids are `<userId>,<agentName>`.
    pub fn owning_user(&self) -> Option<&str> {
        match self.subject_type.as_str() {
            "user" => Some(self.id.as_str()).filter(|id| !id.is_empty()),
            "agent" => self
                .id
                .split_once(',')
                .map(|(user, _)| user)
                .filter(|user| !user.is_empty()),
            _ => None,
        }
    }
}

impl fmt::Display for SubjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.subject_type, self.id)
    }
}

/// The resource side of a relationship tuple
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectRef {
    pub object_type: String,
    pub id: String,
}

impl ObjectRef {
    pub fn new(object_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            id: id.into(),
        }
    }

    /// A path-addressed resource
    pub fn file(path: impl Into<String>) -> Self {
        Self::new(FILE_OBJECT_TYPE, path)
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.object_type, self.id)
    }
}

// =============================================================================
// Relationship Tuples
// =============================================================================

/// A stored access-control fact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipTuple {
    /// Assigned by the store
    pub id: String,
    pub subject: SubjectRef,
    pub relation: String,
    pub object: ObjectRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl RelationshipTuple {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// A tuple to be written; the store assigns the id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRelationship {
    pub subject: SubjectRef,
    pub relation: String,
    pub object: ObjectRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewRelationship {
    pub fn new(subject: SubjectRef, relation: impl Into<String>, object: ObjectRef) -> Self {
        Self {
            subject,
            relation: relation.into(),
            object,
            expires_at: None,
        }
    }

    pub fn expiring_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }
}

impl fmt::Display for NewRelationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}@{}", self.object, self.relation, self.subject)
    }
}

/// Filter for listing relationship tuples; unset fields match anything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TupleFilter {
    pub subject: Option<SubjectRef>,
    pub relation: Option<String>,
    pub object: Option<ObjectRef>,
}

impl TupleFilter {
    pub fn for_subject(subject: SubjectRef) -> Self {
        Self {
            subject: Some(subject),
            ..Default::default()
        }
    }

    pub fn for_object(object: ObjectRef) -> Self {
        Self {
            object: Some(object),
            ..Default::default()
        }
    }

    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = Some(relation.into());
        self
    }

    pub fn with_object(mut self, object: ObjectRef) -> Self {
        self.object = Some(object);
        self
    }

    pub fn matches(&self, tuple: &RelationshipTuple) -> bool {
        self.subject.as_ref().map_or(true, |s| *s == tuple.subject)
            && self.relation.as_ref().map_or(true, |r| *r == tuple.relation)
            && self.object.as_ref().map_or(true, |o| *o == tuple.object)
    }
}

// =============================================================================
// Permission Levels
// =============================================================================

/// Effective permission, totally ordered `Viewer < Editor < Owner`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLevel {
    Viewer,
    Editor,
    Owner,
}

impl PermissionLevel {
    /// Map a recognized relation; `None` for anything outside the vocabulary
    pub fn for_relation(relation: &str) -> Option<Self> {
        use relations::*;
        match relation {
            DIRECT_OWNER | PARENT_OWNER => Some(PermissionLevel::Owner),
            DIRECT_EDITOR | PARENT_EDITOR => Some(PermissionLevel::Editor),
            DIRECT_VIEWER | PARENT_VIEWER => Some(PermissionLevel::Viewer),
            _ => None,
        }
    }

    /// Map any relation, falling back to the lowest level for unknown ones
    pub fn from_relation(relation: &str) -> Self {
        Self::for_relation(relation).unwrap_or(PermissionLevel::Viewer)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionLevel::Viewer => "viewer",
            PermissionLevel::Editor => "editor",
            PermissionLevel::Owner => "owner",
        }
    }

    pub fn can_write(&self) -> bool {
        *self >= PermissionLevel::Editor
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Resolution Output
// =============================================================================

/// One accessible resource, collapsed to the strongest level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveAccess {
    pub resource_path: String,
    pub permission: PermissionLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Result of an exact-path access check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccessCheck {
    pub granted: bool,
    pub level: Option<PermissionLevel>,
}

impl AccessCheck {
    pub fn denied() -> Self {
        Self::default()
    }

    pub fn granted(level: PermissionLevel) -> Self {
        Self {
            granted: true,
            level: Some(level),
        }
    }
}

// =============================================================================
// Resources
// =============================================================================

/// Metadata handed to the resource backend on creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceMetadata {
    pub name: String,
    pub resource_type: ResourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<serde_json::Value>,
}

/// A resource as reported by the resource backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<ResourceType>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ResourceRecord {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: None,
            resource_type: None,
            metadata: serde_json::Map::new(),
            created_at: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Deduplication key: the display name when present, else the path
    pub fn key(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.path)
    }
}
