use serde::{Deserialize, Serialize};

/// Anchor targets of a page, split by host, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSet {
    pub internal: Vec<String>,
    pub external: Vec<String>,
    /// Hrefs that could not be parsed or were excluded, never classified.
    pub dropped: usize,
}

impl LinkSet {
    pub fn processed(&self) -> usize {
        self.internal.len() + self.external.len()
    }
}

/// Outcome of probing a set of external links.
///
/// `failed` is in completion order, which depends on network timing.
/// Compare it as a set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReachabilityReport {
    pub checked: usize,
    pub failed: Vec<String>,
}

impl ReachabilityReport {
    pub fn succeeded(&self) -> usize {
        self.checked - self.failed.len()
    }
}

/// How a single probe ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Responded with an accepted status
    Reachable(u16),
    /// Responded with any other status
    Rejected(u16),
    /// Transport failure (DNS, refused connection, TLS, request timeout)
    Errored(String),
    /// Still running when the aggregate deadline expired
    Abandoned,
}

impl ProbeOutcome {
    pub fn is_reachable(&self) -> bool {
        matches!(self, ProbeOutcome::Reachable(_))
    }
}
