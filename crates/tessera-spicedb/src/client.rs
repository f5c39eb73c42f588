//! SpiceDB gRPC client

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tonic::{metadata::MetadataValue, Request, Status};
use tracing::{debug, info, instrument};

use tessera_core::{Result, TesseraError, FILE_OBJECT_TYPE};

use crate::proto;

/// Configuration for the SpiceDB connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpiceDbConfig {
    /// SpiceDB endpoint URL (e.g., "http://localhost:50051")
    pub endpoint: String,
    /// Pre-shared key for authentication
    pub token: String,
    pub use_tls: bool,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    /// Relationships requested per ReadRelationships page
    pub page_size: u32,
    /// Resource type listed when a filter names no object
    pub object_type: String,
    /// Read at full consistency instead of minimizing latency
    pub fully_consistent: bool,
}

impl Default for SpiceDbConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:50051".to_string(),
            token: String::new(),
            use_tls: false,
            connect_timeout_ms: 5000,
            request_timeout_ms: 30000,
            page_size: 1000,
            object_type: FILE_OBJECT_TYPE.to_string(),
            fully_consistent: true,
        }
    }
}

/// One page of a ReadRelationships stream
#[derive(Debug, Clone, Default)]
pub struct RelationshipPage {
    pub relationships: Vec<proto::Relationship>,
    pub next_cursor: Option<proto::Cursor>,
}

/// SpiceDB client wrapper with bearer-token authentication
#[derive(Clone)]
pub struct SpiceDbClient {
    channel: Channel,
    token: Arc<String>,
    config: Arc<SpiceDbConfig>,
}

impl SpiceDbClient {
    #[instrument(skip(config), fields(endpoint = %config.endpoint))]
    pub async fn connect(config: SpiceDbConfig) -> Result<Self> {
        info!("Connecting to SpiceDB at {}", config.endpoint);
        let channel = Self::endpoint(&config)?
            .connect()
            .await
            .map_err(|e| TesseraError::store_error("connect", e.to_string()))?;
        info!("Connected to SpiceDB");
        Ok(Self::from_channel(channel, config))
    }

    /// Build a client that connects on first use
    pub fn connect_lazy(config: SpiceDbConfig) -> Result<Self> {
        let channel = Self::endpoint(&config)?.connect_lazy();
        Ok(Self::from_channel(channel, config))
    }

    fn from_channel(channel: Channel, config: SpiceDbConfig) -> Self {
        Self {
            channel,
            token: Arc::new(config.token.clone()),
            config: Arc::new(config),
        }
    }

    fn endpoint(config: &SpiceDbConfig) -> Result<Endpoint> {
        let mut endpoint = Endpoint::from_shared(config.endpoint.clone())
            .map_err(|e| TesseraError::config_error(format!("Invalid SpiceDB endpoint: {}", e)))?
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(config.request_timeout_ms));

        if config.use_tls {
            endpoint = endpoint
                .tls_config(ClientTlsConfig::new().with_webpki_roots())
                .map_err(|e| TesseraError::config_error(format!("Invalid TLS setup: {}", e)))?;
        }
        Ok(endpoint)
    }

    pub fn config(&self) -> &SpiceDbConfig {
        &self.config
    }

    /// Create an authenticated request
    pub fn create_request<T>(&self, inner: T) -> std::result::Result<Request<T>, Status> {
        let mut request = Request::new(inner);

        if !self.token.is_empty() {
            let bearer = format!("Bearer {}", self.token);
            let metadata_value = MetadataValue::try_from(&bearer)
                .map_err(|e| Status::internal(format!("Invalid token: {}", e)))?;
            request.metadata_mut().insert("authorization", metadata_value);
        }

        Ok(request)
    }

    pub fn permissions_client(
        &self,
    ) -> proto::permissions_service_client::PermissionsServiceClient<Channel> {
        proto::permissions_service_client::PermissionsServiceClient::new(self.channel.clone())
    }

    pub fn schema_client(&self) -> proto::schema_service_client::SchemaServiceClient<Channel> {
        proto::schema_service_client::SchemaServiceClient::new(self.channel.clone())
    }

    /// Reachability check via ReadSchema
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<bool> {
        let mut client = self.schema_client();
        let request = self
            .create_request(proto::ReadSchemaRequest {})
            .map_err(|e| status_error("health_check", e))?;

        match client.read_schema(request).await {
            Ok(_) => Ok(true),
            Err(e) => {
                debug!("SpiceDB health check failed: {}", e);
                Ok(false)
            }
        }
    }

    #[instrument(skip(self, schema))]
    pub async fn write_schema(&self, schema: &str) -> Result<String> {
        info!("Writing schema to SpiceDB");
        let mut client = self.schema_client();
        let request = self
            .create_request(proto::WriteSchemaRequest {
                schema: schema.to_string(),
            })
            .map_err(|e| status_error("write_schema", e))?;

        let response = client
            .write_schema(request)
            .await
            .map_err(|e| status_error("write_schema", e))?;

        Ok(response
            .into_inner()
            .written_at
            .map(|t| t.token)
            .unwrap_or_default())
    }

    #[instrument(skip(self))]
    pub async fn read_schema(&self) -> Result<String> {
        let mut client = self.schema_client();
        let request = self
            .create_request(proto::ReadSchemaRequest {})
            .map_err(|e| status_error("read_schema", e))?;

        let response = client
            .read_schema(request)
            .await
            .map_err(|e| status_error("read_schema", e))?;
        Ok(response.into_inner().schema_text)
    }

    /// Apply updates atomically, returning the ZedToken of the write.
    ///
    /// The raw status is returned so callers can branch on its code.
    #[instrument(skip(self, updates, preconditions), fields(updates = updates.len()))]
    pub async fn write_relationships(
        &self,
        updates: Vec<proto::RelationshipUpdate>,
        preconditions: Vec<proto::Precondition>,
    ) -> std::result::Result<String, Status> {
        let mut client = self.permissions_client();
        let request = self.create_request(proto::WriteRelationshipsRequest {
            updates,
            optional_preconditions: preconditions,
        })?;

        let response = client.write_relationships(request).await?;
        Ok(response
            .into_inner()
            .written_at
            .map(|t| t.token)
            .unwrap_or_default())
    }

    /// Read one page of relationships matching `filter`
    #[instrument(skip(self, filter, cursor), fields(resource_type = %filter.resource_type))]
    pub async fn read_relationships_page(
        &self,
        filter: proto::RelationshipFilter,
        cursor: Option<proto::Cursor>,
    ) -> Result<RelationshipPage> {
        let mut client = self.permissions_client();
        let request = self
            .create_request(proto::ReadRelationshipsRequest {
                consistency: Some(self.consistency()),
                relationship_filter: Some(filter),
                optional_limit: self.config.page_size,
                optional_cursor: cursor,
            })
            .map_err(|e| status_error("read_relationships", e))?;

        let mut stream = client
            .read_relationships(request)
            .await
            .map_err(|e| status_error("read_relationships", e))?
            .into_inner();

        let mut page = RelationshipPage::default();
        while let Some(response) = stream
            .message()
            .await
            .map_err(|e| status_error("read_relationships", e))?
        {
            if let Some(relationship) = response.relationship {
                page.relationships.push(relationship);
            }
            if response.after_result_cursor.is_some() {
                page.next_cursor = response.after_result_cursor;
            }
        }

        debug!("Read {} relationships", page.relationships.len());
        Ok(page)
    }

    fn consistency(&self) -> proto::Consistency {
        let requirement = if self.config.fully_consistent {
            proto::consistency::Requirement::FullyConsistent(true)
        } else {
            proto::consistency::Requirement::MinimizeLatency(true)
        };
        proto::Consistency {
            requirement: Some(requirement),
        }
    }
}

/// Convert a gRPC status into a store error for `operation`
pub(crate) fn status_error(operation: &str, status: Status) -> TesseraError {
    TesseraError::store_error(
        operation,
        format!("{:?}: {}", status.code(), status.message()),
    )
}

impl std::fmt::Debug for SpiceDbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpiceDbClient")
            .field("endpoint", &self.config.endpoint)
            .field("has_token", &!self.token.is_empty())
            .finish()
    }
}
