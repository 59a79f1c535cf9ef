// Analyzer configuration, built once and shared read-only

use pagescope_scanner::prober::{DEFAULT_ACCEPTED_STATUSES, DEFAULT_CONCURRENCY, DEFAULT_USER_AGENT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// A doctype label and the literal text that identifies it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctypeSignature {
    pub label: String,
    pub signature: String,
}

impl DoctypeSignature {
    pub fn new(label: &str, signature: &str) -> Self {
        Self {
            label: label.to_string(),
            signature: signature.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    pub user_agent: String,
    pub accepted_statuses: Vec<u16>,
    pub concurrency: usize,
    /// Per-request timeout
    pub timeout_secs: Option<u64>,
    /// Bound on the whole probe phase; unfinished probes count as failed
    pub deadline_secs: Option<u64>,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accepted_statuses: DEFAULT_ACCEPTED_STATUSES.to_vec(),
            concurrency: DEFAULT_CONCURRENCY,
            timeout_secs: Some(10),
            deadline_secs: None,
        }
    }
}

impl ProbeSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Checked in order, first match wins
    pub doctypes: Vec<DoctypeSignature>,
    /// Href prefixes never reported as external
    pub link_exceptions: Vec<String>,
    /// URL substrings that mark a login page
    pub login_slugs: Vec<String>,
    pub probe: ProbeSettings,
    /// Count level-6 headings with the `h16` tag lookup of earlier releases.
    /// Turn off to count real `<h6>` elements.
    pub legacy_h6_lookup: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            doctypes: default_doctypes(),
            link_exceptions: vec!["mailto:".to_string(), "tel:".to_string()],
            login_slugs: ["login", "log-in", "signin", "sign-in"]
                .iter()
                .map(|slug| slug.to_string())
                .collect(),
            probe: ProbeSettings::default(),
            legacy_h6_lookup: true,
        }
    }
}

/// Most specific declarations first, bare HTML 5 last.
pub fn default_doctypes() -> Vec<DoctypeSignature> {
    vec![
        DoctypeSignature::new("XHTML 1.1", r#""-//W3C//DTD XHTML 1.1//EN""#),
        DoctypeSignature::new("XHTML 1.0 Strict", r#""-//W3C//DTD XHTML 1.0 Strict//EN""#),
        DoctypeSignature::new(
            "XHTML 1.0 Transitional",
            r#""-//W3C//DTD XHTML 1.0 Transitional//EN""#,
        ),
        DoctypeSignature::new("XHTML 1.0 Frameset", r#""-//W3C//DTD XHTML 1.0 Frameset//EN""#),
        DoctypeSignature::new("HTML 4.01 Strict", r#""-//W3C//DTD HTML 4.01//EN""#),
        DoctypeSignature::new(
            "HTML 4.01 Transitional",
            r#""-//W3C//DTD HTML 4.01 Transitional//EN""#,
        ),
        DoctypeSignature::new("HTML 4.01 Frameset", r#""-//W3C//DTD HTML 4.01 Frameset//EN""#),
        DoctypeSignature::new("HTML 5", "<!DOCTYPE html>"),
    ]
}

impl AnalyzerConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: AnalyzerConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.probe.concurrency == 0 {
            return Err(ConfigError::Invalid(
                "probe.concurrency must be at least 1".to_string(),
            ));
        }

        if self.probe.timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "probe.timeout_secs must be at least 1 (or null for no timeout)".to_string(),
            ));
        }

        if self.probe.deadline_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "probe.deadline_secs must be at least 1 (or null for no deadline)".to_string(),
            ));
        }

        if self.probe.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "probe.user_agent must not be empty".to_string(),
            ));
        }

        if let Some(doctype) = self.doctypes.iter().find(|d| d.signature.is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "doctype '{}' has an empty signature",
                doctype.label
            )));
        }

        Ok(())
    }

    /// Tag names counted for heading levels 1 through 6.
    pub fn heading_tags(&self) -> [&'static str; 6] {
        let h6 = if self.legacy_h6_lookup { "h16" } else { "h6" };
        ["h1", "h2", "h3", "h4", "h5", h6]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(AnalyzerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_html5_is_checked_last() {
        let doctypes = default_doctypes();
        assert_eq!(doctypes.len(), 8);
        assert_eq!(doctypes.last().unwrap().label, "HTML 5");
    }

    #[test]
    fn test_heading_tags() {
        let mut config = AnalyzerConfig::default();
        assert_eq!(config.heading_tags()[5], "h16");
        config.legacy_h6_lookup = false;
        assert_eq!(config.heading_tags()[5], "h6");
    }
}
