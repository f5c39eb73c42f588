//! Saga state machines for provisioning and deprovisioning
//!
//! ```text
//! create: Started -> ResourceCreated -> Granted
//!         Started -> ResourceCreated -> GrantFailed -> Compensating -> Compensated
//!                                                                   -> OrphanResource
//! delete: Started -> ResourceDeleted -> TuplesRevoked
//!         Started -> ResourceDeleted -> StaleTuples
//! ```
//!
//! A step that fails before leaving persistent state ends the saga in
//! `Started`; there is nothing to compensate.

use serde::Serialize;
use std::fmt;
use tracing::{debug, error};

/// Common behaviour of the saga state enums
pub trait SagaState: Copy + Eq + fmt::Debug + fmt::Display {
    const SAGA: &'static str;
    const INITIAL: Self;

    fn allows(self, next: Self) -> bool;
    fn is_terminal(self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CreateState {
    Started,
    ResourceCreated,
    Granted,
    GrantFailed,
    Compensating,
    Compensated,
    /// The resource exists but its ownership grant does not
    OrphanResource,
}

impl SagaState for CreateState {
    const SAGA: &'static str = "provision";
    const INITIAL: Self = CreateState::Started;

    fn allows(self, next: Self) -> bool {
        use CreateState::*;
        matches!(
            (self, next),
            (Started, ResourceCreated)
                | (ResourceCreated, Granted)
                | (ResourceCreated, GrantFailed)
                | (GrantFailed, Compensating)
                | (Compensating, Compensated)
                | (Compensating, OrphanResource)
        )
    }

    fn is_terminal(self) -> bool {
        matches!(
            self,
            CreateState::Granted | CreateState::Compensated | CreateState::OrphanResource
        )
    }
}

impl fmt::Display for CreateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CreateState::Started => "started",
            CreateState::ResourceCreated => "resource_created",
            CreateState::Granted => "granted",
            CreateState::GrantFailed => "grant_failed",
            CreateState::Compensating => "compensating",
            CreateState::Compensated => "compensated",
            CreateState::OrphanResource => "orphan_resource",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteState {
    Started,
    ResourceDeleted,
    TuplesRevoked,
    /// The resource is gone but tuples still reference its path
    StaleTuples,
}

impl SagaState for DeleteState {
    const SAGA: &'static str = "deprovision";
    const INITIAL: Self = DeleteState::Started;

    fn allows(self, next: Self) -> bool {
        use DeleteState::*;
        matches!(
            (self, next),
            (Started, ResourceDeleted)
                | (ResourceDeleted, TuplesRevoked)
                | (ResourceDeleted, StaleTuples)
        )
    }

    fn is_terminal(self) -> bool {
        matches!(self, DeleteState::TuplesRevoked | DeleteState::StaleTuples)
    }
}

impl fmt::Display for DeleteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeleteState::Started => "started",
            DeleteState::ResourceDeleted => "resource_deleted",
            DeleteState::TuplesRevoked => "tuples_revoked",
            DeleteState::StaleTuples => "stale_tuples",
        };
        f.write_str(s)
    }
}

/// Transition history of one saga run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SagaLog<S: SagaState> {
    path: String,
    history: Vec<S>,
}

impl<S: SagaState> SagaLog<S> {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            history: vec![S::INITIAL],
        }
    }

    pub fn current(&self) -> S {
        self.history.last().copied().unwrap_or(S::INITIAL)
    }

    pub fn history(&self) -> &[S] {
        &self.history
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Move to `next`. Illegal transitions are logged and ignored.
    pub fn advance(&mut self, next: S) -> bool {
        let from = self.current();
        if !from.allows(next) {
            error!(
                saga = S::SAGA,
                path = %self.path,
                from = %from,
                to = %next,
                "Illegal saga transition"
            );
            return false;
        }
        debug!(saga = S::SAGA, path = %self.path, from = %from, to = %next, "Saga transition");
        self.history.push(next);
        true
    }

    pub fn is_finished(&self) -> bool {
        self.current().is_terminal()
    }
}
