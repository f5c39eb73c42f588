//! Mapping between Tessera identifiers and SpiceDB's restricted alphabet
//!
//! SpiceDB object ids accept `[a-zA-Z0-9/_|\-=+]` and relation names
//! `[a-z][a-z0-9_]*`. Resource paths (`/tenant:acme/...`) and agent ids
//! (`alice,bot1`) fall outside that, so such ids are stored as
//! `b64|<base64url>` and decoded on read. Ids already starting with the
//! prefix are always encoded so decoding stays unambiguous.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use std::fmt;
use std::str::FromStr;

use tessera_core::{relations, NewRelationship, Result, TesseraError};

use crate::proto;

pub const ENCODED_ID_PREFIX: &str = "b64|";

/// Relations whose Tessera name is not a valid SpiceDB relation name
const RELATION_ALIASES: &[(&str, &str)] = &[(relations::OWNER_OF, "owner_of")];

fn is_native_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '/' | '_' | '|' | '-' | '=' | '+')
}

pub fn encode_object_id(id: &str) -> String {
    if !id.is_empty() && !id.starts_with(ENCODED_ID_PREFIX) && id.chars().all(is_native_id_char) {
        id.to_string()
    } else {
        format!("{}{}", ENCODED_ID_PREFIX, URL_SAFE_NO_PAD.encode(id))
    }
}

pub fn decode_object_id(wire: &str) -> Result<String> {
    let Some(encoded) = wire.strip_prefix(ENCODED_ID_PREFIX) else {
        return Ok(wire.to_string());
    };
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|e| TesseraError::invalid_identifier("object_id", wire, e.to_string()))?;
    String::from_utf8(bytes)
        .map_err(|e| TesseraError::invalid_identifier("object_id", wire, e.to_string()))
}

pub fn encode_relation(relation: &str) -> String {
    RELATION_ALIASES
        .iter()
        .find(|(name, _)| *name == relation)
        .map(|(_, wire)| wire.to_string())
        .unwrap_or_else(|| relation.to_string())
}

pub fn decode_relation(wire: &str) -> String {
    RELATION_ALIASES
        .iter()
        .find(|(_, alias)| *alias == wire)
        .map(|(name, _)| name.to_string())
        .unwrap_or_else(|| wire.to_string())
}

/// A relationship in wire form. Its string form is the tuple id
/// (`type:id#relation@type:id`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelationshipKey {
    pub resource_type: String,
    pub resource_id: String,
    pub relation: String,
    pub subject_type: String,
    pub subject_id: String,
}

impl RelationshipKey {
    pub fn encode(relationship: &NewRelationship) -> Self {
        Self {
            resource_type: relationship.object.object_type.clone(),
            resource_id: encode_object_id(&relationship.object.id),
            relation: encode_relation(&relationship.relation),
            subject_type: relationship.subject.subject_type.clone(),
            subject_id: encode_object_id(&relationship.subject.id),
        }
    }

    /// Key of a relationship read back from SpiceDB
    pub fn from_proto(relationship: &proto::Relationship) -> Result<Self> {
        let resource = relationship.resource.as_ref().ok_or_else(|| {
            TesseraError::store_error("read", "relationship without a resource")
        })?;
        let subject = relationship
            .subject
            .as_ref()
            .and_then(|s| s.object.as_ref())
            .ok_or_else(|| TesseraError::store_error("read", "relationship without a subject"))?;

        Ok(Self {
            resource_type: resource.object_type.clone(),
            resource_id: resource.object_id.clone(),
            relation: relationship.relation.clone(),
            subject_type: subject.object_type.clone(),
            subject_id: subject.object_id.clone(),
        })
    }

    pub fn resource(&self) -> proto::ObjectReference {
        proto::ObjectReference {
            object_type: self.resource_type.clone(),
            object_id: self.resource_id.clone(),
        }
    }

    pub fn subject(&self) -> proto::SubjectReference {
        proto::SubjectReference {
            object: Some(proto::ObjectReference {
                object_type: self.subject_type.clone(),
                object_id: self.subject_id.clone(),
            }),
            optional_relation: String::new(),
        }
    }

    pub fn to_relationship(&self) -> proto::Relationship {
        proto::Relationship {
            resource: Some(self.resource()),
            relation: self.relation.clone(),
            subject: Some(self.subject()),
            optional_expires_at: None,
        }
    }

    /// Filter matching exactly this relationship
    pub fn exact_filter(&self) -> proto::RelationshipFilter {
        proto::RelationshipFilter {
            resource_type: self.resource_type.clone(),
            optional_resource_id: self.resource_id.clone(),
            optional_resource_id_prefix: String::new(),
            optional_relation: self.relation.clone(),
            optional_subject_filter: Some(proto::SubjectFilter {
                subject_type: self.subject_type.clone(),
                optional_subject_id: self.subject_id.clone(),
                optional_relation: None,
            }),
        }
    }
}

impl fmt::Display for RelationshipKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}#{}@{}:{}",
            self.resource_type, self.resource_id, self.relation, self.subject_type, self.subject_id
        )
    }
}

impl FromStr for RelationshipKey {
    type Err = TesseraError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| TesseraError::invalid_identifier("tuple_id", s, reason);

        let (resource, subject) = s.split_once('@').ok_or_else(|| invalid("missing '@'"))?;
        let (resource, relation) = resource
            .split_once('#')
            .ok_or_else(|| invalid("missing '#'"))?;
        let (resource_type, resource_id) = resource
            .split_once(':')
            .ok_or_else(|| invalid("resource missing ':'"))?;
        let (subject_type, subject_id) = subject
            .split_once(':')
            .ok_or_else(|| invalid("subject missing ':'"))?;

        let parts = [resource_type, resource_id, relation, subject_type, subject_id];
        if parts.iter().any(|p| p.is_empty()) {
            return Err(invalid("empty component"));
        }
        if !resource_id.chars().all(is_native_id_char)
            || !subject_id.chars().all(is_native_id_char)
        {
            return Err(invalid("id is not in wire form"));
        }

        Ok(Self {
            resource_type: resource_type.to_string(),
            resource_id: resource_id.to_string(),
            relation: relation.to_string(),
            subject_type: subject_type.to_string(),
            subject_id: subject_id.to_string(),
        })
    }
}
