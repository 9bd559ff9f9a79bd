use crate::error::{Result, TestEngineError};
use context_graph::DEFAULT_MAX_DEPTH;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment override for [`EngineConfig::max_dependency_depth`]
pub const MAX_DEPTH_ENV: &str = "CONTEXT_TESTS_MAX_DEPTH";

const MAX_DEPTH_LIMIT: usize = 16;

/// Engine-wide tuning, loaded once at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Hop limit for indirect dependency discovery
    pub max_dependency_depth: usize,

    /// Case-insensitive markers that flag a test file as smoke
    pub smoke_markers: Vec<String>,

    pub smoke_timeout_secs: u64,
    pub unit_timeout_secs: u64,
    pub integration_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_dependency_depth: DEFAULT_MAX_DEPTH,
            smoke_markers: vec!["smoke".to_string()],
            smoke_timeout_secs: 60,
            unit_timeout_secs: 30,
            integration_timeout_secs: 300,
        }
    }
}

impl EngineConfig {
    /// Parse JSON, falling back to TOML
    pub fn parse(raw: &str) -> Result<Self> {
        match serde_json::from_str::<Self>(raw) {
            Ok(cfg) => Ok(cfg),
            Err(json_err) => toml::from_str::<Self>(raw).map_err(|toml_err| {
                TestEngineError::InvalidConfig(format!(
                    "config is not valid JSON ({json_err}) or TOML ({toml_err})"
                ))
            }),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let cfg = Self::parse(&raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Defaults or `path`, then environment overrides, validated
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let cfg = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let cfg = cfg.with_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(raw) = std::env::var(MAX_DEPTH_ENV) {
            self.max_dependency_depth = raw.trim().parse().map_err(|_| {
                TestEngineError::InvalidConfig(format!("{MAX_DEPTH_ENV}={raw:?} is not a number"))
            })?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_dependency_depth == 0 || self.max_dependency_depth > MAX_DEPTH_LIMIT {
            return Err(TestEngineError::InvalidConfig(format!(
                "max_dependency_depth must be between 1 and {MAX_DEPTH_LIMIT}, got {}",
                self.max_dependency_depth
            )));
        }

        if self.smoke_markers.iter().any(|m| m.trim().is_empty()) {
            return Err(TestEngineError::InvalidConfig(
                "smoke_markers must not contain empty markers".to_string(),
            ));
        }

        Ok(())
    }
}
