//! In-memory relationship store

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use tessera_core::{
    NewRelationship, ObjectRef, RelationshipStore, RelationshipTuple, Result, SubjectRef,
    TesseraError, TupleFilter,
};

use crate::faults::{FaultMode, FaultPlan};

/// Store operations that can be failed on purpose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Create,
    List,
    Delete,
}

/// A recorded call against the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Create(NewRelationship),
    List(TupleFilter),
    Delete(String),
}

#[derive(Default)]
struct Inner {
    tuples: Vec<RelationshipTuple>,
    calls: Vec<StoreCall>,
    faults: FaultPlan<StoreOp>,
}

/// Relationship store backed by a vector.
///
/// Writing an existing (subject, relation, object) triple returns the
/// existing id. Expired tuples are never listed.
#[derive(Default)]
pub struct MemoryRelationshipStore {
    inner: Mutex<Inner>,
}

impl MemoryRelationshipStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tuple directly, bypassing faults and call recording
    pub async fn seed(&self, subject: SubjectRef, relation: &str, object: ObjectRef) -> String {
        let mut inner = self.inner.lock().await;
        insert(&mut inner.tuples, NewRelationship::new(subject, relation, object))
    }

    /// Insert a fully specified tuple, keeping its id and timestamps
    pub async fn seed_tuple(&self, tuple: RelationshipTuple) {
        self.inner.lock().await.tuples.push(tuple);
    }

    /// All stored tuples, expired ones included
    pub async fn tuples(&self) -> Vec<RelationshipTuple> {
        self.inner.lock().await.tuples.clone()
    }

    pub async fn calls(&self) -> Vec<StoreCall> {
        self.inner.lock().await.calls.clone()
    }

    pub async fn delete_calls(&self) -> Vec<String> {
        self.calls()
            .await
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::Delete(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub async fn fail(&self, op: StoreOp, mode: FaultMode) {
        self.inner.lock().await.faults.set(op, mode);
    }

    /// Fail deletes of one specific tuple id
    pub async fn fail_delete_of(&self, id: &str) {
        self.inner.lock().await.faults.fail_key(id);
    }

    pub async fn clear_faults(&self) {
        self.inner.lock().await.faults.clear();
    }
}

fn insert(tuples: &mut Vec<RelationshipTuple>, relationship: NewRelationship) -> String {
    if let Some(existing) = tuples.iter().find(|t| {
        t.subject == relationship.subject
            && t.relation == relationship.relation
            && t.object == relationship.object
    }) {
        return existing.id.clone();
    }

    let id = Uuid::now_v7().to_string();
    tuples.push(RelationshipTuple {
        id: id.clone(),
        subject: relationship.subject,
        relation: relationship.relation,
        object: relationship.object,
        created_at: Some(Utc::now()),
        expires_at: relationship.expires_at,
    });
    id
}

fn injected(operation: &str) -> TesseraError {
    TesseraError::store_error(operation, "injected fault")
}

#[async_trait]
impl RelationshipStore for MemoryRelationshipStore {
    async fn create(&self, relationship: &NewRelationship) -> Result<String> {
        let mut inner = self.inner.lock().await;
        inner.calls.push(StoreCall::Create(relationship.clone()));
        if inner.faults.should_fail(StoreOp::Create, None) {
            return Err(injected("create"));
        }
        Ok(insert(&mut inner.tuples, relationship.clone()))
    }

    async fn list(&self, filter: &TupleFilter) -> Result<Vec<RelationshipTuple>> {
        let mut inner = self.inner.lock().await;
        inner.calls.push(StoreCall::List(filter.clone()));
        if inner.faults.should_fail(StoreOp::List, None) {
            return Err(injected("list"));
        }
        let now = Utc::now();
        Ok(inner
            .tuples
            .iter()
            .filter(|t| !t.is_expired_at(now) && filter.matches(t))
            .cloned()
            .collect())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        inner.calls.push(StoreCall::Delete(id.to_string()));
        if inner.faults.should_fail(StoreOp::Delete, Some(id)) {
            return Err(injected("delete"));
        }
        let before = inner.tuples.len();
        inner.tuples.retain(|t| t.id != id);
        Ok(inner.tuples.len() < before)
    }
}
