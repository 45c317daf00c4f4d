//! Configuration schema (solmap.toml)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use crate::diagnostic::{DiagnosticCode, Severity};
use crate::graph::NodeIdStyle;

/// Repository that holds the solutions tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Repository owner
    #[serde(default = "default_owner")]
    pub owner: String,

    /// Repository name
    #[serde(default = "default_repo_name")]
    pub name: String,

    /// Branch to read
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Directory that contains one sub-directory per solution
    #[serde(default = "default_solutions_root")]
    pub solutions_root: String,
}

fn default_owner() -> String {
    "Azure".to_string()
}

fn default_repo_name() -> String {
    "Azure-Sentinel".to_string()
}

fn default_branch() -> String {
    "master".to_string()
}

fn default_solutions_root() -> String {
    "Solutions".to_string()
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            name: default_repo_name(),
            branch: default_branch(),
            solutions_root: default_solutions_root(),
        }
    }
}

/// Content host connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// REST API base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Raw content base URL
    #[serde(default = "default_raw_base_url")]
    pub raw_base_url: String,

    /// Environment variable holding the access token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_raw_base_url() -> String {
    "https://raw.githubusercontent.com".to_string()
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

fn default_user_agent() -> String {
    concat!("solmap/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            raw_base_url: default_raw_base_url(),
            token_env: default_token_env(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GitHubConfig {
    /// Read the access token from the configured environment variable
    pub fn token(&self) -> Option<String> {
        std::env::var(&self.token_env)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

/// Graph assembly settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Node identity style
    #[serde(default)]
    pub node_ids: NodeIdStyle,

    /// Solution node name used when nothing better is known
    #[serde(default = "default_solution_name")]
    pub default_solution_name: String,
}

fn default_solution_name() -> String {
    "Solution".to_string()
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            node_ids: NodeIdStyle::default(),
            default_solution_name: default_solution_name(),
        }
    }
}

/// Severity threshold overrides for specific diagnostic codes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeverityThreshold {
    /// Map of diagnostic code to severity override
    #[serde(default)]
    pub overrides: HashMap<String, Severity>,
}

impl SeverityThreshold {
    /// Get severity for a diagnostic code, or default
    pub fn get_severity(&self, code: DiagnosticCode, default: Severity) -> Severity {
        self.overrides
            .get(code.as_str())
            .copied()
            .unwrap_or(default)
    }

    /// Set severity override for a code
    pub fn set_override(&mut self, code: DiagnosticCode, severity: Severity) {
        self.overrides.insert(code.as_str().to_string(), severity);
    }
}

/// Paths that are never fetched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathFilter {
    /// Glob patterns (`*` wildcard) matched against repository paths
    #[serde(default)]
    pub skip_paths: Vec<String>,
}

impl PathFilter {
    /// Check if a path should be skipped
    pub fn is_skipped(&self, path: &str) -> bool {
        self.skip_paths.iter().any(|pattern| {
            if pattern.contains('*') {
                glob_match(pattern, path)
            } else {
                pattern == path
            }
        })
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Repository settings
    #[serde(default)]
    pub repository: RepositoryConfig,

    /// Content host settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// Graph settings
    #[serde(default)]
    pub graph: GraphConfig,

    /// Path filter
    #[serde(default)]
    pub filter: PathFilter,

    /// Severity thresholds
    #[serde(default)]
    pub severity: SeverityThreshold,
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Severity for a code after applying overrides
    pub fn severity_for(&self, code: DiagnosticCode) -> Severity {
        self.severity.get_severity(code, code.default_severity())
    }
}

/// Simple glob matching (supports a single `*`)
fn glob_match(pattern: &str, text: &str) -> bool {
    match glob::Pattern::new(pattern) {
        Ok(compiled) => compiled.matches(text),
        Err(_) => pattern == text,
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
