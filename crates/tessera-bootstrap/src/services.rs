//! Service wiring

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use tessera_core::{RelationshipStore, ResourceBackend};
use tessera_provision::ProvisioningCoordinator;
use tessera_rebac::PermissionResolver;
use tessera_spicedb::{SpiceDbClient, SpiceDbRelationshipStore};

use crate::config::Settings;

/// The resolver and the coordinator, sharing one store and one backend
#[derive(Clone, Debug)]
pub struct Services {
    pub resolver: PermissionResolver,
    pub provisioner: ProvisioningCoordinator,
}

impl Services {
    pub fn new(
        store: Arc<dyn RelationshipStore>,
        backend: Arc<dyn ResourceBackend>,
        settings: &Settings,
    ) -> Self {
        Self {
            resolver: PermissionResolver::with_config(
                store.clone(),
                backend.clone(),
                settings.resolver.clone(),
            ),
            provisioner: ProvisioningCoordinator::with_config(
                store,
                backend,
                settings.provisioning.clone(),
            ),
        }
    }

    /// Connect to SpiceDB and wire services around `backend`
    pub async fn connect(settings: &Settings, backend: Arc<dyn ResourceBackend>) -> Result<Self> {
        let client = SpiceDbClient::connect(settings.spicedb.clone())
            .await
            .with_context(|| format!("Failed to connect to SpiceDB at {}", settings.spicedb.endpoint))?;
        let store = SpiceDbRelationshipStore::new(client);

        if settings.schema.write_on_start {
            match store.ensure_schema().await {
                Ok(token) => info!(written_at = %token, "SpiceDB schema written"),
                // The schema may have been written by another instance
                Err(e) => warn!("Failed to write SpiceDB schema: {}", e),
            }
        }

        info!("Services initialized");
        Ok(Self::new(Arc::new(store), backend, settings))
    }
}
