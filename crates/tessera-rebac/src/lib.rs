//! Tessera ReBAC - Collapse relationship tuples into effective permissions

pub mod candidates;
pub mod filter;
pub mod metrics;
pub mod resolver;


pub use candidates::{LegacyRoot, RootCandidate, RootCandidates, RootContext, ScopedRoot};
pub use filter::{AllResources, CandidateFilter, PathPrefixFilter};
pub use metrics::{MetricsSnapshot, ResolverMetrics};
pub use resolver::{PermissionResolver, ResolverConfig};
