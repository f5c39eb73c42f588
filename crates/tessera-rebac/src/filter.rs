//! Inclusion filters for candidate resource sets

use tessera_core::ResourceRecord;

/// Decides which offered resources a resolution call may consider
pub trait CandidateFilter: Send + Sync {
    fn includes(&self, resource: &ResourceRecord) -> bool;
}

/// Every offered resource is a candidate
#[derive(Debug, Clone, Copy, Default)]
pub struct AllResources;

impl CandidateFilter for AllResources {
    fn includes(&self, _resource: &ResourceRecord) -> bool {
        true
    }
}

/// Resources whose path starts with any of the prefixes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefixFilter {
    prefixes: Vec<String>,
}

impl PathPrefixFilter {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// Connector resources, in both the singular and the legacy plural layout
    pub fn connectors() -> Self {
        Self::new(["/connector/", "/connectors/"])
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }
}

impl CandidateFilter for PathPrefixFilter {
    fn includes(&self, resource: &ResourceRecord) -> bool {
        self.prefixes.iter().any(|p| resource.path.starts_with(p.as_str()))
    }
}
