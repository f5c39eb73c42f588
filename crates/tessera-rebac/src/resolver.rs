//! Permission resolution over relationship tuples
//!
//! Resolution is two-phase: enumerate candidate resources, then enumerate
//! the identity's tuples once, and reduce. Callers that already hold a tuple
//! snapshot for an identity pass it in instead of fetching again.
//!
//! Fetch failures never surface as errors here. They are logged, counted,
//! and resolved as "no access".

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

use tessera_core::{
    AccessCheck, EffectiveAccess, Identity, ObjectRef, PermissionLevel, RelationshipStore,
    RelationshipTuple, ResourceBackend, ResourceRecord, Result, TesseraError, TupleFilter,
    FILE_OBJECT_TYPE,
};

use crate::candidates::{RootCandidates, RootContext};
use crate::filter::{CandidateFilter, PathPrefixFilter};
use crate::metrics::ResolverMetrics;

/// Configuration for the resolver
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Object type whose ids are resource paths
    pub object_type: String,
    /// Path prefixes that identify connector resources
    pub connector_prefixes: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            object_type: FILE_OBJECT_TYPE.to_string(),
            connector_prefixes: vec!["/connector/".to_string(), "/connectors/".to_string()],
        }
    }
}

/// Resolves effective permissions for identities
#[derive(Clone)]
pub struct PermissionResolver {
    store: Arc<dyn RelationshipStore>,
    backend: Arc<dyn ResourceBackend>,
    config: ResolverConfig,
    roots: RootCandidates,
    metrics: Arc<ResolverMetrics>,
}

impl PermissionResolver {
    pub fn new(store: Arc<dyn RelationshipStore>, backend: Arc<dyn ResourceBackend>) -> Self {
        Self::with_config(store, backend, ResolverConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn RelationshipStore>,
        backend: Arc<dyn ResourceBackend>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            store,
            backend,
            config,
            roots: RootCandidates::default(),
            metrics: Arc::new(ResolverMetrics::default()),
        }
    }

    /// Replace the root candidate chain used by [`Self::has_root_access`]
    pub fn with_root_candidates(mut self, roots: RootCandidates) -> Self {
        self.roots = roots;
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn metrics(&self) -> &ResolverMetrics {
        &self.metrics
    }

    /// Fetch every tuple held by `identity`, for reuse across resolution calls
    #[instrument(skip(self, identity), fields(identity = %identity))]
    pub async fn fetch_tuples(&self, identity: &Identity) -> Result<Vec<RelationshipTuple>> {
        let tuples = self
            .store
            .list(&TupleFilter::for_subject(identity.clone()))
            .await?;
        debug!("Fetched {} tuples", tuples.len());
        Ok(tuples)
    }

    /// Collapse tuples into one record per accessible candidate resource.
    ///
    /// Only tuples held by `identity` on a candidate accepted by `filter`
    /// count. Records are deduplicated by [`ResourceRecord::key`], keeping the
    /// strongest level, and returned ordered by that key.
    pub fn resolve_access(
        &self,
        identity: &Identity,
        candidates: &[ResourceRecord],
        tuples: &[RelationshipTuple],
        filter: &dyn CandidateFilter,
    ) -> Vec<EffectiveAccess> {
        self.metrics.record_resolution();

        let by_path: BTreeMap<&str, &ResourceRecord> = candidates
            .iter()
            .filter(|r| filter.includes(r))
            .map(|r| (r.path.as_str(), r))
            .collect();

        let mut best: BTreeMap<&str, EffectiveAccess> = BTreeMap::new();
        for tuple in tuples {
            if tuple.subject != *identity || tuple.object.object_type != self.config.object_type {
                continue;
            }
            let Some(resource) = by_path.get(tuple.object.id.as_str()) else {
                continue;
            };

            let level = self.level_for(tuple);
            best.entry(resource.key())
                .and_modify(|current| {
                    if level > current.permission {
                        current.permission = level;
                        current.resource_path = resource.path.clone();
                        current.name = resource.name.clone();
                    }
                })
                .or_insert_with(|| EffectiveAccess {
                    resource_path: resource.path.clone(),
                    permission: level,
                    name: resource.name.clone(),
                });
        }

        best.into_values().collect()
    }

    /// Fetch candidates and tuples, then resolve. Any fetch failure yields an empty set.
    #[instrument(skip(self, identity, filter), fields(identity = %identity))]
    pub async fn resolve_for(
        &self,
        identity: &Identity,
        filter: &dyn CandidateFilter,
    ) -> Vec<EffectiveAccess> {
        let candidates = match self.backend.list().await {
            Ok(candidates) => candidates,
            Err(e) => {
                self.record_failure("list candidate resources", &e);
                return Vec::new();
            }
        };
        let tuples = match self.fetch_tuples(identity).await {
            Ok(tuples) => tuples,
            Err(e) => {
                self.record_failure("list relationship tuples", &e);
                return Vec::new();
            }
        };

        let access = self.resolve_access(identity, &candidates, &tuples, filter);
        debug!(
            candidates = candidates.len(),
            tuples = tuples.len(),
            accessible = access.len(),
            "Resolved access"
        );
        access
    }

    /// Connector resources the identity can use
    pub async fn resolve_connector_access(&self, identity: &Identity) -> Vec<EffectiveAccess> {
        let filter = PathPrefixFilter::new(self.config.connector_prefixes.iter().cloned());
        self.resolve_for(identity, &filter).await
    }

    /// Best grant held by `identity` on exactly `canonical_path`
    #[instrument(skip(self, identity, tuples), fields(identity = %identity))]
    pub async fn has_directory_access(
        &self,
        identity: &Identity,
        canonical_path: &str,
        tuples: Option<&[RelationshipTuple]>,
    ) -> AccessCheck {
        let fetched;
        let tuples = match tuples {
            Some(tuples) => tuples,
            None => {
                let filter = TupleFilter::for_subject(identity.clone())
                    .with_object(ObjectRef::new(&self.config.object_type, canonical_path));
                match self.store.list(&filter).await {
                    Ok(list) => {
                        fetched = list;
                        &fetched[..]
                    }
                    Err(e) => {
                        self.record_failure("list tuples for path", &e);
                        return AccessCheck::denied();
                    }
                }
            }
        };

        self.best_level_on(identity, canonical_path, tuples)
            .map(AccessCheck::granted)
            .unwrap_or_default()
    }

    /// Access to a root, trying the scoped layout before the legacy flat one.
    ///
    /// The user segment of the scoped candidate is derived from the identity
    /// (`agent:<user>,<name>` or `user:<user>`).
    #[instrument(skip(self, identity, tuples), fields(identity = %identity))]
    pub async fn has_root_access(
        &self,
        identity: &Identity,
        tenant_id: Option<&str>,
        root_path: &str,
        tuples: Option<&[RelationshipTuple]>,
    ) -> AccessCheck {
        let ctx = RootContext {
            tenant_id,
            user_id: identity.owning_user(),
            root_path,
        };
        let candidates = self.roots.paths(&ctx);
        if candidates.is_empty() {
            return AccessCheck::denied();
        }

        let fetched;
        let tuples = match tuples {
            Some(tuples) => tuples,
            None => match self.fetch_tuples(identity).await {
                Ok(list) => {
                    fetched = list;
                    &fetched[..]
                }
                Err(e) => {
                    self.record_failure("list tuples for root", &e);
                    return AccessCheck::denied();
                }
            },
        };

        for (convention, path) in &candidates {
            if let Some(level) = self.best_level_on(identity, path, tuples) {
                debug!(convention = *convention, path = %path, level = %level, "Root access granted");
                return AccessCheck::granted(level);
            }
        }
        AccessCheck::denied()
    }

    fn best_level_on(
        &self,
        identity: &Identity,
        path: &str,
        tuples: &[RelationshipTuple],
    ) -> Option<PermissionLevel> {
        tuples
            .iter()
            .filter(|t| {
                t.subject == *identity
                    && t.object.object_type == self.config.object_type
                    && t.object.id == path
            })
            .map(|t| self.level_for(t))
            .max()
    }

    fn level_for(&self, tuple: &RelationshipTuple) -> PermissionLevel {
        match PermissionLevel::for_relation(&tuple.relation) {
            Some(level) => level,
            None => {
                self.metrics.record_unmapped();
                warn!(
                    relation = %tuple.relation,
                    tuple_id = %tuple.id,
                    object = %tuple.object,
                    "Unmapped relation resolved as viewer"
                );
                PermissionLevel::Viewer
            }
        }
    }

    fn record_failure(&self, operation: &str, err: &TesseraError) {
        self.metrics.record_fetch_failure();
        error!(operation, error = %err, "Permission resolution failed; denying access");
    }
}

impl std::fmt::Debug for PermissionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionResolver")
            .field("config", &self.config)
            .field("roots", &self.roots)
            .finish()
    }
}
