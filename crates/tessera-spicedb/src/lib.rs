//! SpiceDB-backed relationship store for Tessera

pub mod client;
pub mod codec;
pub mod schema;
pub mod store;


pub use client::{SpiceDbClient, SpiceDbConfig};
pub use codec::{decode_object_id, decode_relation, encode_object_id, encode_relation, RelationshipKey};
pub use schema::TESSERA_SCHEMA;
pub use store::SpiceDbRelationshipStore;

/// Protobuf types for the subset of `authzed.api.v1` the store uses
#[allow(clippy::all)]
pub mod proto {
    // Core types
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ObjectReference {
        #[prost(string, tag = "1")]
        pub object_type: String,
        #[prost(string, tag = "2")]
        pub object_id: String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct SubjectReference {
        #[prost(message, optional, tag = "1")]
        pub object: Option<ObjectReference>,
        #[prost(string, tag = "2")]
        pub optional_relation: String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Relationship {
        #[prost(message, optional, tag = "1")]
        pub resource: Option<ObjectReference>,
        #[prost(string, tag = "2")]
        pub relation: String,
        #[prost(message, optional, tag = "3")]
        pub subject: Option<SubjectReference>,
        #[prost(message, optional, tag = "5")]
        pub optional_expires_at: Option<::prost_types::Timestamp>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ZedToken {
        #[prost(string, tag = "1")]
        pub token: String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Consistency {
        #[prost(oneof = "consistency::Requirement", tags = "1, 2, 3, 4")]
        pub requirement: Option<consistency::Requirement>,
    }

    pub mod consistency {
        #[derive(Clone, PartialEq, ::prost::Oneof)]
        pub enum Requirement {
            #[prost(bool, tag = "1")]
            MinimizeLatency(bool),
            #[prost(message, tag = "2")]
            AtLeastAsFresh(super::ZedToken),
            #[prost(message, tag = "3")]
            AtExactSnapshot(super::ZedToken),
            #[prost(bool, tag = "4")]
            FullyConsistent(bool),
        }
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Cursor {
        #[prost(string, tag = "1")]
        pub token: String,
    }

    // Schema service
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ReadSchemaRequest {}

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ReadSchemaResponse {
        #[prost(string, tag = "1")]
        pub schema_text: String,
        #[prost(message, optional, tag = "2")]
        pub read_at: Option<ZedToken>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct WriteSchemaRequest {
        #[prost(string, tag = "1")]
        pub schema: String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct WriteSchemaResponse {
        #[prost(message, optional, tag = "1")]
        pub written_at: Option<ZedToken>,
    }

    // Permissions service: relationship reads and writes
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct RelationshipUpdate {
        #[prost(enumeration = "relationship_update::Operation", tag = "1")]
        pub operation: i32,
        #[prost(message, optional, tag = "2")]
        pub relationship: Option<Relationship>,
    }

    pub mod relationship_update {
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration,
        )]
        #[repr(i32)]
        pub enum Operation {
            Unspecified = 0,
            Create = 1,
            Touch = 2,
            Delete = 3,
        }
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Precondition {
        #[prost(enumeration = "precondition::Operation", tag = "1")]
        pub operation: i32,
        #[prost(message, optional, tag = "2")]
        pub filter: Option<RelationshipFilter>,
    }

    pub mod precondition {
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration,
        )]
        #[repr(i32)]
        pub enum Operation {
            Unspecified = 0,
            MustNotMatch = 1,
            MustMatch = 2,
        }
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct RelationshipFilter {
        #[prost(string, tag = "1")]
        pub resource_type: String,
        #[prost(string, tag = "2")]
        pub optional_resource_id: String,
        #[prost(string, tag = "5")]
        pub optional_resource_id_prefix: String,
        #[prost(string, tag = "3")]
        pub optional_relation: String,
        #[prost(message, optional, tag = "4")]
        pub optional_subject_filter: Option<SubjectFilter>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct SubjectFilter {
        #[prost(string, tag = "1")]
        pub subject_type: String,
        #[prost(string, tag = "2")]
        pub optional_subject_id: String,
        #[prost(message, optional, tag = "3")]
        pub optional_relation: Option<subject_filter::RelationFilter>,
    }

    pub mod subject_filter {
        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct RelationFilter {
            #[prost(string, tag = "1")]
            pub relation: String,
        }
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct WriteRelationshipsRequest {
        #[prost(message, repeated, tag = "1")]
        pub updates: Vec<RelationshipUpdate>,
        #[prost(message, repeated, tag = "2")]
        pub optional_preconditions: Vec<Precondition>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct WriteRelationshipsResponse {
        #[prost(message, optional, tag = "1")]
        pub written_at: Option<ZedToken>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ReadRelationshipsRequest {
        #[prost(message, optional, tag = "1")]
        pub consistency: Option<Consistency>,
        #[prost(message, optional, tag = "2")]
        pub relationship_filter: Option<RelationshipFilter>,
        #[prost(uint32, tag = "3")]
        pub optional_limit: u32,
        #[prost(message, optional, tag = "4")]
        pub optional_cursor: Option<Cursor>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ReadRelationshipsResponse {
        #[prost(message, optional, tag = "1")]
        pub read_at: Option<ZedToken>,
        #[prost(message, optional, tag = "2")]
        pub relationship: Option<Relationship>,
        #[prost(message, optional, tag = "3")]
        pub after_result_cursor: Option<Cursor>,
    }

    /// Schema service client
    pub mod schema_service_client {
        use tonic::codegen::*;

        #[derive(Debug, Clone)]
        pub struct SchemaServiceClient<T> {
            inner: tonic::client::Grpc<T>,
        }

        impl SchemaServiceClient<tonic::transport::Channel> {
            pub fn new(channel: tonic::transport::Channel) -> Self {
                let inner = tonic::client::Grpc::new(channel);
                Self { inner }
            }
        }

        impl<T> SchemaServiceClient<T>
        where
            T: tonic::client::GrpcService<tonic::body::BoxBody>,
            T::Error: Into<StdError>,
            T::ResponseBody: Body<Data = Bytes> + std::marker::Send + 'static,
            <T::ResponseBody as Body>::Error: Into<StdError> + std::marker::Send,
        {
            pub async fn read_schema(
                &mut self,
                request: impl tonic::IntoRequest<super::ReadSchemaRequest>,
            ) -> std::result::Result<tonic::Response<super::ReadSchemaResponse>, tonic::Status>
            {
                self.inner.ready().await.map_err(|e| {
                    tonic::Status::new(
                        tonic::Code::Unknown,
                        format!("Service was not ready: {}", e.into()),
                    )
                })?;
                let codec = tonic::codec::ProstCodec::default();
                let path = http::uri::PathAndQuery::from_static(
                    "/authzed.api.v1.SchemaService/ReadSchema",
                );
                self.inner.unary(request.into_request(), path, codec).await
            }

            pub async fn write_schema(
                &mut self,
                request: impl tonic::IntoRequest<super::WriteSchemaRequest>,
            ) -> std::result::Result<tonic::Response<super::WriteSchemaResponse>, tonic::Status>
            {
                self.inner.ready().await.map_err(|e| {
                    tonic::Status::new(
                        tonic::Code::Unknown,
                        format!("Service was not ready: {}", e.into()),
                    )
                })?;
                let codec = tonic::codec::ProstCodec::default();
                let path = http::uri::PathAndQuery::from_static(
                    "/authzed.api.v1.SchemaService/WriteSchema",
                );
                self.inner.unary(request.into_request(), path, codec).await
            }
        }
    }

    /// Permissions service client, relationship methods only
    pub mod permissions_service_client {
        use tonic::codegen::*;

        #[derive(Debug, Clone)]
        pub struct PermissionsServiceClient<T> {
            inner: tonic::client::Grpc<T>,
        }

        impl PermissionsServiceClient<tonic::transport::Channel> {
            pub fn new(channel: tonic::transport::Channel) -> Self {
                let inner = tonic::client::Grpc::new(channel);
                Self { inner }
            }
        }

        impl<T> PermissionsServiceClient<T>
        where
            T: tonic::client::GrpcService<tonic::body::BoxBody>,
            T::Error: Into<StdError>,
            T::ResponseBody: Body<Data = Bytes> + std::marker::Send + 'static,
            <T::ResponseBody as Body>::Error: Into<StdError> + std::marker::Send,
        {
            pub async fn write_relationships(
                &mut self,
                request: impl tonic::IntoRequest<super::WriteRelationshipsRequest>,
            ) -> std::result::Result<
                tonic::Response<super::WriteRelationshipsResponse>,
                tonic::Status,
            > {
                self.inner.ready().await.map_err(|e| {
                    tonic::Status::new(
                        tonic::Code::Unknown,
                        format!("Service was not ready: {}", e.into()),
                    )
                })?;
                let codec = tonic::codec::ProstCodec::default();
                let path = http::uri::PathAndQuery::from_static(
                    "/authzed.api.v1.PermissionsService/WriteRelationships",
                );
                self.inner.unary(request.into_request(), path, codec).await
            }

            pub async fn read_relationships(
                &mut self,
                request: impl tonic::IntoRequest<super::ReadRelationshipsRequest>,
            ) -> std::result::Result<
                tonic::Response<tonic::Streaming<super::ReadRelationshipsResponse>>,
                tonic::Status,
            > {
                self.inner.ready().await.map_err(|e| {
                    tonic::Status::new(
                        tonic::Code::Unknown,
                        format!("Service was not ready: {}", e.into()),
                    )
                })?;
                let codec = tonic::codec::ProstCodec::default();
                let path = http::uri::PathAndQuery::from_static(
                    "/authzed.api.v1.PermissionsService/ReadRelationships",
                );
                self.inner
                    .server_streaming(request.into_request(), path, codec)
                    .await
            }
        }
    }
}
