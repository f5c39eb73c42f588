//! Hierarchical resource addresses across the system, tenant and user scopes
//!
//! Three shapes are recognized:
//!
//! ```text
//! /<type>/<id>                                   system
//! /tenant:<tenantId>/<type>/<id>                 tenant
//! /tenant:<tenantId>/user:<userId>/<type>/<id>   user
//! ```
//!
//! [`parse_path`] is the structural inverse of [`build_path`]. Anything that
//! does not match one of the shapes (legacy flat paths such as
//! `/workspace/<userId>/<name>` included) is reported as `None`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TesseraError};

/// Maximum length of a tenant or user id segment
pub const MAX_SCOPE_ID_LEN: usize = 100;

const TENANT_PREFIX: &str = "tenant:";
const USER_PREFIX: &str = "user:";

/// Kinds of resources that live under the path scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Workspace,
    Resource,
    Connector,
    Memory,
    Skill,
    Agent,
}

impl ResourceType {
    pub const ALL: [ResourceType; 6] = [
        ResourceType::Workspace,
        ResourceType::Resource,
        ResourceType::Connector,
        ResourceType::Memory,
        ResourceType::Skill,
        ResourceType::Agent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Workspace => "workspace",
            ResourceType::Resource => "resource",
            ResourceType::Connector => "connector",
            ResourceType::Memory => "memory",
            ResourceType::Skill => "skill",
            ResourceType::Agent => "agent",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = TesseraError;

    fn from_str(s: &str) -> Result<Self> {
        ResourceType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| TesseraError::invalid_input(format!("unknown resource type: {}", s)))
    }
}

/// Ownership scope of a resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scope {
    System,
    Tenant { tenant_id: String },
    User { tenant_id: String, user_id: String },
}

/// Discriminant of [`Scope`] without the ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    System,
    Tenant,
    User,
}

impl Scope {
    pub fn tenant(tenant_id: impl Into<String>) -> Self {
        Scope::Tenant {
            tenant_id: tenant_id.into(),
        }
    }

    pub fn user(tenant_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Scope::User {
            tenant_id: tenant_id.into(),
            user_id: user_id.into(),
        }
    }

    pub fn kind(&self) -> ScopeKind {
        match self {
            Scope::System => ScopeKind::System,
            Scope::Tenant { .. } => ScopeKind::Tenant,
            Scope::User { .. } => ScopeKind::User,
        }
    }

    pub fn tenant_id(&self) -> Option<&str> {
        match self {
            Scope::System => None,
            Scope::Tenant { tenant_id } | Scope::User { tenant_id, .. } => Some(tenant_id),
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Scope::User { user_id, .. } => Some(user_id),
            _ => None,
        }
    }

    /// Build a scope from optional ids, the shape `build_path` callers pass around.
    ///
    /// A user id without a tenant id is rejected.
    pub fn from_ids(tenant_id: Option<&str>, user_id: Option<&str>) -> Result<Self> {
        match (tenant_id, user_id) {
            (None, None) => Ok(Scope::System),
            (Some(t), None) => Ok(Scope::tenant(t)),
            (Some(t), Some(u)) => Ok(Scope::user(t, u)),
            (None, Some(u)) => Err(TesseraError::invalid_identifier(
                "tenant_id",
                "",
                format!("user scope for {:?} requires a tenant id", u),
            )),
        }
    }

    /// Check tenant/user ids against the segment rules
    pub fn validate(&self) -> Result<()> {
        match self {
            Scope::System => Ok(()),
            Scope::Tenant { tenant_id } => validate_scope_id("tenant_id", tenant_id),
            Scope::User { tenant_id, user_id } => {
                validate_scope_id("tenant_id", tenant_id)?;
                validate_scope_id("user_id", user_id)
            }
        }
    }

    /// The path prefix for this scope, empty for the system scope
    pub fn prefix(&self) -> String {
        match self {
            Scope::System => String::new(),
            Scope::Tenant { tenant_id } => format!("/{}{}", TENANT_PREFIX, tenant_id),
            Scope::User { tenant_id, user_id } => {
                format!("/{}{}/{}{}", TENANT_PREFIX, tenant_id, USER_PREFIX, user_id)
            }
        }
    }
}

/// A structurally decomposed resource path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourcePath {
    pub scope: Scope,
    pub resource_type: ResourceType,
    pub id: String,
}

impl ResourcePath {
    /// Validate the parts and build a path
    pub fn new(scope: Scope, resource_type: ResourceType, id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        scope.validate()?;
        validate_resource_id(&id)?;
        Ok(Self {
            scope,
            resource_type,
            id,
        })
    }

    /// Parse a path string, returning `None` for anything outside the scheme
    pub fn parse(path: &str) -> Option<Self> {
        let rest = path.strip_prefix('/')?;
        let segments: Vec<&str> = rest.split('/').collect();

        let (scope, type_segment, id_segment) = match segments.as_slice() {
            [t, id] => (Scope::System, *t, *id),
            [tenant, t, id] => (Scope::tenant(scope_segment(tenant, TENANT_PREFIX)?), *t, *id),
            [tenant, user, t, id] => (
                Scope::user(
                    scope_segment(tenant, TENANT_PREFIX)?,
                    scope_segment(user, USER_PREFIX)?,
                ),
                *t,
                *id,
            ),
            _ => return None,
        };

        let resource_type = ResourceType::from_str(type_segment).ok()?;
        if id_segment.is_empty() {
            return None;
        }

        Some(Self {
            scope,
            resource_type,
            id: id_segment.to_string(),
        })
    }

    pub fn scope_kind(&self) -> ScopeKind {
        self.scope.kind()
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.scope.prefix(), self.resource_type, self.id)
    }
}

impl FromStr for ResourcePath {
    type Err = TesseraError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| {
            TesseraError::invalid_input(format!("not a resource path of this scheme: {}", s))
        })
    }
}

/// Build the canonical path string for a resource
pub fn build_path(scope: &Scope, resource_type: ResourceType, id: &str) -> Result<String> {
    ResourcePath::new(scope.clone(), resource_type, id).map(|p| p.to_string())
}

/// Decompose a path; `None` means "not a resource path of this scheme"
pub fn parse_path(path: &str) -> Option<ResourcePath> {
    ResourcePath::parse(path)
}

/// Tenant and user ids: non-empty, no `/`, at most [`MAX_SCOPE_ID_LEN`] chars
pub fn validate_scope_id(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(TesseraError::invalid_identifier(field, value, "must not be empty"));
    }
    if value.contains('/') {
        return Err(TesseraError::invalid_identifier(field, value, "must not contain '/'"));
    }
    if value.chars().count() > MAX_SCOPE_ID_LEN {
        return Err(TesseraError::invalid_identifier(
            field,
            value,
            format!("must be at most {} characters", MAX_SCOPE_ID_LEN),
        ));
    }
    Ok(())
}

fn validate_resource_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(TesseraError::invalid_identifier("id", id, "must not be empty"));
    }
    if id.contains('/') {
        return Err(TesseraError::invalid_identifier("id", id, "must not contain '/'"));
    }
    Ok(())
}

fn scope_segment(segment: &str, prefix: &str) -> Option<String> {
    let value = segment.strip_prefix(prefix)?;
    validate_scope_id(prefix, value).ok()?;
    Some(value.to_string())
}
