//! Tessera Testkit - In-memory collaborators for deterministic tests
//!
//! Both fakes record every call they receive and can be told to fail
//! selected operations, so saga and resolver failure paths can be driven
//! without a remote service.

pub mod backend;
pub mod faults;
pub mod store;

pub use backend::{BackendCall, BackendOp, MemoryResourceBackend};
pub use faults::{FaultMode, FaultPlan};
pub use store::{MemoryRelationshipStore, StoreCall, StoreOp};
