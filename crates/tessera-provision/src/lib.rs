//! Tessera Provision - Resource creation and deletion paired with ownership tuples

pub mod coordinator;
pub mod error;
pub mod saga;

#[cfg(test)]
mod tests;

pub use coordinator::{
    DeprovisionReport, IdSource, ProvisionRequest, ProvisionResult, ProvisionerConfig,
    ProvisioningCoordinator, RandomIds,
};
pub use error::{Compensation, ProvisionError};
pub use saga::{CreateState, DeleteState, SagaLog, SagaState};
