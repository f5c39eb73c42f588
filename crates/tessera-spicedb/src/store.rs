//! [`RelationshipStore`] over SpiceDB

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tonic::Code;
use tracing::{debug, instrument};

use tessera_core::{
    NewRelationship, ObjectRef, RelationshipStore, RelationshipTuple, Result, SubjectRef,
    TupleFilter,
};

use crate::client::{status_error, SpiceDbClient};
use crate::codec::{decode_object_id, decode_relation, encode_object_id, encode_relation, RelationshipKey};
use crate::proto;
use crate::schema::TESSERA_SCHEMA;

/// Relationship store that keeps tuples in SpiceDB.
///
/// Tuple ids are relationship strings in wire form, so deleting needs no
/// extra lookup.
#[derive(Clone, Debug)]
pub struct SpiceDbRelationshipStore {
    client: SpiceDbClient,
}

impl SpiceDbRelationshipStore {
    pub fn new(client: SpiceDbClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &SpiceDbClient {
        &self.client
    }

    /// Write [`TESSERA_SCHEMA`], returning the ZedToken of the write
    pub async fn ensure_schema(&self) -> Result<String> {
        self.client.write_schema(TESSERA_SCHEMA).await
    }
}

#[async_trait]
impl RelationshipStore for SpiceDbRelationshipStore {
    #[instrument(skip(self, relationship), fields(relationship = %relationship))]
    async fn create(&self, relationship: &NewRelationship) -> Result<String> {
        let key = RelationshipKey::encode(relationship);
        let mut wire = key.to_relationship();
        wire.optional_expires_at = relationship.expires_at.map(to_timestamp);

        let update = proto::RelationshipUpdate {
            operation: proto::relationship_update::Operation::Touch as i32,
            relationship: Some(wire),
        };
        let token = self
            .client
            .write_relationships(vec![update], Vec::new())
            .await
            .map_err(|e| status_error("create", e))?;

        debug!(tuple_id = %key, written_at = %token, "Relationship written");
        Ok(key.to_string())
    }

    #[instrument(skip(self))]
    async fn list(&self, filter: &TupleFilter) -> Result<Vec<RelationshipTuple>> {
        let wire_filter = to_filter(filter, &self.client.config().object_type);
        let page_size = self.client.config().page_size as usize;

        let mut tuples = Vec::new();
        let mut cursor = None;
        loop {
            let page = self
                .client
                .read_relationships_page(wire_filter.clone(), cursor)
                .await?;
            let count = page.relationships.len();
            for relationship in &page.relationships {
                tuples.push(to_tuple(relationship)?);
            }
            if page_size == 0 || count < page_size || page.next_cursor.is_none() {
                break;
            }
            cursor = page.next_cursor;
        }

        debug!("Listed {} tuples", tuples.len());
        Ok(tuples)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> Result<bool> {
        let key: RelationshipKey = id.parse()?;
        let update = proto::RelationshipUpdate {
            operation: proto::relationship_update::Operation::Delete as i32,
            relationship: Some(key.to_relationship()),
        };
        // Without the precondition SpiceDB reports success for absent tuples
        let must_exist = proto::Precondition {
            operation: proto::precondition::Operation::MustMatch as i32,
            filter: Some(key.exact_filter()),
        };

        match self
            .client
            .write_relationships(vec![update], vec![must_exist])
            .await
        {
            Ok(_) => Ok(true),
            Err(status) if status.code() == Code::FailedPrecondition => {
                debug!(tuple_id = id, "Relationship already absent");
                Ok(false)
            }
            Err(status) => Err(status_error("delete", status)),
        }
    }
}

/// Build the wire filter. SpiceDB needs a resource type, so filters without
/// an object fall back to `default_type`.
pub(crate) fn to_filter(filter: &TupleFilter, default_type: &str) -> proto::RelationshipFilter {
    proto::RelationshipFilter {
        resource_type: filter
            .object
            .as_ref()
            .map(|o| o.object_type.clone())
            .unwrap_or_else(|| default_type.to_string()),
        optional_resource_id: filter
            .object
            .as_ref()
            .map(|o| encode_object_id(&o.id))
            .unwrap_or_default(),
        optional_resource_id_prefix: String::new(),
        optional_relation: filter
            .relation
            .as_deref()
            .map(encode_relation)
            .unwrap_or_default(),
        optional_subject_filter: filter.subject.as_ref().map(|s| proto::SubjectFilter {
            subject_type: s.subject_type.clone(),
            optional_subject_id: encode_object_id(&s.id),
            optional_relation: None,
        }),
    }
}

pub(crate) fn to_tuple(relationship: &proto::Relationship) -> Result<RelationshipTuple> {
    let key = RelationshipKey::from_proto(relationship)?;
    Ok(RelationshipTuple {
        id: key.to_string(),
        subject: SubjectRef::new(&key.subject_type, decode_object_id(&key.subject_id)?),
        relation: decode_relation(&key.relation),
        object: ObjectRef::new(&key.resource_type, decode_object_id(&key.resource_id)?),
        created_at: None,
        expires_at: relationship
            .optional_expires_at
            .as_ref()
            .and_then(from_timestamp),
    })
}

fn to_timestamp(at: DateTime<Utc>) -> prost_types::Timestamp {
    prost_types::Timestamp {
        seconds: at.timestamp(),
        nanos: at.timestamp_subsec_nanos() as i32,
    }
}

fn from_timestamp(ts: &prost_types::Timestamp) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts.seconds, u32::try_from(ts.nanos).ok()?)
}
