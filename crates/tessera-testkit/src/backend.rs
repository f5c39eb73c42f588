//! In-memory resource backend

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

use tessera_core::{
    ResourceBackend, ResourceMetadata, ResourceRecord, Result, TesseraError,
};

use crate::faults::{FaultMode, FaultPlan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendOp {
    Create,
    Delete,
    Get,
    List,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Create(String, ResourceMetadata),
    Delete(String),
    Get(String),
    List,
}

#[derive(Default)]
struct Inner {
    resources: BTreeMap<String, ResourceRecord>,
    calls: Vec<BackendCall>,
    faults: FaultPlan<BackendOp>,
}

/// Resource backend keyed by path. Creating over an existing path is a conflict.
#[derive(Default)]
pub struct MemoryResourceBackend {
    inner: Mutex<Inner>,
}

impl MemoryResourceBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record directly, bypassing faults and call recording
    pub async fn seed(&self, record: ResourceRecord) {
        self.inner
            .lock()
            .await
            .resources
            .insert(record.path.clone(), record);
    }

    pub async fn contains(&self, path: &str) -> bool {
        self.inner.lock().await.resources.contains_key(path)
    }

    pub async fn paths(&self) -> Vec<String> {
        self.inner.lock().await.resources.keys().cloned().collect()
    }

    pub async fn calls(&self) -> Vec<BackendCall> {
        self.inner.lock().await.calls.clone()
    }

    pub async fn delete_calls(&self) -> Vec<String> {
        self.calls()
            .await
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::Delete(path) => Some(path),
                _ => None,
            })
            .collect()
    }

    pub async fn fail(&self, op: BackendOp, mode: FaultMode) {
        self.inner.lock().await.faults.set(op, mode);
    }

    pub async fn clear_faults(&self) {
        self.inner.lock().await.faults.clear();
    }
}

fn injected(operation: &str, path: &str) -> TesseraError {
    TesseraError::backend_error(operation, path, "injected fault")
}

#[async_trait]
impl ResourceBackend for MemoryResourceBackend {
    async fn create(&self, path: &str, metadata: &ResourceMetadata) -> Result<ResourceRecord> {
        let mut inner = self.inner.lock().await;
        inner
            .calls
            .push(BackendCall::Create(path.to_string(), metadata.clone()));
        if inner.faults.should_fail(BackendOp::Create, Some(path)) {
            return Err(injected("create", path));
        }
        if inner.resources.contains_key(path) {
            return Err(TesseraError::conflict(format!("resource exists: {}", path)));
        }

        let mut record = ResourceRecord::new(path).named(metadata.name.clone());
        record.resource_type = Some(metadata.resource_type);
        record.created_at = Some(Utc::now());
        if let Some(description) = &metadata.description {
            record
                .metadata
                .insert("description".to_string(), description.clone().into());
        }
        if let Some(content) = &metadata.content {
            record.metadata.insert("content".to_string(), content.clone());
        }

        inner.resources.insert(path.to_string(), record.clone());
        Ok(record)
    }

    async fn delete(&self, path: &str) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        inner.calls.push(BackendCall::Delete(path.to_string()));
        if inner.faults.should_fail(BackendOp::Delete, Some(path)) {
            return Err(injected("delete", path));
        }
        Ok(inner.resources.remove(path).is_some())
    }

    async fn get(&self, path: &str) -> Result<Option<ResourceRecord>> {
        let mut inner = self.inner.lock().await;
        inner.calls.push(BackendCall::Get(path.to_string()));
        if inner.faults.should_fail(BackendOp::Get, Some(path)) {
            return Err(injected("get", path));
        }
        Ok(inner.resources.get(path).cloned())
    }

    async fn list(&self) -> Result<Vec<ResourceRecord>> {
        let mut inner = self.inner.lock().await;
        inner.calls.push(BackendCall::List);
        if inner.faults.should_fail(BackendOp::List, None) {
            return Err(injected("list", "/"));
        }
        Ok(inner.resources.values().cloned().collect())
    }
}
