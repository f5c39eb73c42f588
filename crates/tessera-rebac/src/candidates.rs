//! Ordered path candidates for root access checks
//!
//! Roots exist under two conventions: the tenant/user-scoped layout and the
//! legacy flat layout. Each convention is one [`RootCandidate`]; a
//! [`RootCandidates`] chain tries them in priority order so the dual-layout
//! logic lives in one place.

use std::sync::Arc;
use tracing::debug;

use tessera_core::Scope;

/// Inputs shared by all candidate generators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootContext<'a> {
    pub tenant_id: Option<&'a str>,
    pub user_id: Option<&'a str>,
    /// Root path in legacy flat form, e.g. `/workspace`
    pub root_path: &'a str,
}

/// One path convention
pub trait RootCandidate: Send + Sync {
    fn name(&self) -> &'static str;

    /// The canonical path under this convention, or `None` if it does not apply
    fn path(&self, ctx: &RootContext<'_>) -> Option<String>;
}

/// `/tenant:<t>[/user:<u>]<root_path>`; requires a tenant id
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopedRoot;

impl RootCandidate for ScopedRoot {
    fn name(&self) -> &'static str {
        "scoped"
    }

    fn path(&self, ctx: &RootContext<'_>) -> Option<String> {
        let tenant_id = ctx.tenant_id?;
        if !ctx.root_path.starts_with('/') {
            return None;
        }
        let scope = match Scope::from_ids(Some(tenant_id), ctx.user_id) {
            Ok(scope) => scope,
            Err(e) => {
                debug!("Skipping scoped root candidate: {}", e);
                return None;
            }
        };
        if let Err(e) = scope.validate() {
            debug!("Skipping scoped root candidate: {}", e);
            return None;
        }
        Some(format!("{}{}", scope.prefix(), ctx.root_path.trim_end_matches('/')))
    }
}

/// The root path exactly as given
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyRoot;

impl RootCandidate for LegacyRoot {
    fn name(&self) -> &'static str {
        "legacy"
    }

    fn path(&self, ctx: &RootContext<'_>) -> Option<String> {
        (!ctx.root_path.is_empty()).then(|| ctx.root_path.to_string())
    }
}

/// Candidate generators in priority order
#[derive(Clone)]
pub struct RootCandidates {
    generators: Vec<Arc<dyn RootCandidate>>,
}

impl RootCandidates {
    pub fn new(generators: Vec<Arc<dyn RootCandidate>>) -> Self {
        Self { generators }
    }

    /// Candidate paths in order, labelled by convention, without duplicates
    pub fn paths(&self, ctx: &RootContext<'_>) -> Vec<(&'static str, String)> {
        let mut out: Vec<(&'static str, String)> = Vec::with_capacity(self.generators.len());
        for generator in &self.generators {
            if let Some(path) = generator.path(ctx) {
                if !out.iter().any(|(_, p)| *p == path) {
                    out.push((generator.name(), path));
                }
            }
        }
        out
    }
}

impl Default for RootCandidates {
    /// Scoped first, legacy second
    fn default() -> Self {
        Self::new(vec![Arc::new(ScopedRoot), Arc::new(LegacyRoot)])
    }
}

impl std::fmt::Debug for RootCandidates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.generators.iter().map(|g| g.name()))
            .finish()
    }
}
