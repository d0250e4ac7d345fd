//! `dioph.toml` configuration file.
//!
//! Every key is optional; command-line flags override the file and the
//! file overrides built-in defaults. The service credential is never read
//! from here, only from the environment.
//!
//! # Example
//!
//! ```toml
//! [execution]
//! notebook = "diophantine_exploration.ipynb"
//! jupyter = "jupyter"
//! python = "python3"
//! timeout_secs = 1800
//!
//! [service]
//! endpoint = "https://api.openai.com/v1"
//! model = "gpt-4o"
//! max_tokens = 2000
//! temperature = 0.7
//! timeout_secs = 120
//! max_retries = 0
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use dioph_core::{OrchestratorConfig, ServiceSettings};
use serde::Deserialize;

use crate::{ExecArgs, NarrateArgs};

/// Looked up under `--root` when `--config` is not given.
pub(crate) const DEFAULT_CONFIG_FILE: &str = "dioph.toml";

// ── Types ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileConfig {
    #[serde(default)]
    pub execution: ExecutionSection,
    #[serde(default)]
    pub service: ServiceSection,
}

/// `[execution]` section.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct ExecutionSection {
    pub notebook: Option<PathBuf>,
    pub jupyter: Option<String>,
    pub python: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// `[service]` section.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct ServiceSection {
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
}

// ── Functions ─────────────────────────────────────────────────────────────────

/// Load the configuration file.
///
/// An explicit path must exist. Without one, `<root>/dioph.toml` is used
/// when present and defaults otherwise.
pub(crate) fn load(root: &Path, explicit: Option<&Path>) -> Result<FileConfig, String> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let implicit = root.join(DEFAULT_CONFIG_FILE);
            if !implicit.exists() {
                return Ok(FileConfig::default());
            }
            implicit
        }
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| format!("could not read '{}': {}", path.display(), e))?;
    let config = parse(&content).map_err(|e| format!("invalid config '{}': {}", path.display(), e))?;
    tracing::debug!(path = %path.display(), "configuration loaded");
    Ok(config)
}

fn parse(content: &str) -> Result<FileConfig, String> {
    let config: FileConfig = toml::from_str(content).map_err(|e| e.to_string())?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &FileConfig) -> Result<(), String> {
    if config.execution.timeout_secs == Some(0) {
        return Err("execution.timeout_secs must be greater than 0".into());
    }
    if config.service.timeout_secs == Some(0) {
        return Err("service.timeout_secs must be greater than 0".into());
    }
    if config.service.max_tokens == Some(0) {
        return Err("service.max_tokens must be greater than 0".into());
    }
    if let Some(t) = config.service.temperature {
        if !(0.0..=2.0).contains(&t) {
            return Err(format!("service.temperature must be within 0.0..=2.0, got {}", t));
        }
    }
    Ok(())
}

impl FileConfig {
    /// Merge `[execution]` with command-line overrides.
    pub(crate) fn orchestrator_config(&self, args: &ExecArgs) -> OrchestratorConfig {
        let defaults = OrchestratorConfig::default();
        let exec = &self.execution;
        OrchestratorConfig {
            notebook: args
                .notebook
                .clone()
                .or_else(|| exec.notebook.clone())
                .unwrap_or(defaults.notebook),
            jupyter: args
                .jupyter
                .clone()
                .or_else(|| exec.jupyter.clone())
                .unwrap_or(defaults.jupyter),
            python: args
                .python
                .clone()
                .or_else(|| exec.python.clone())
                .unwrap_or(defaults.python),
            timeout: args
                .timeout_secs
                .or(exec.timeout_secs)
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }

    /// Merge `[service]` with command-line overrides.
    pub(crate) fn service_settings(&self, args: &NarrateArgs) -> ServiceSettings {
        let defaults = ServiceSettings::default();
        let svc = &self.service;
        ServiceSettings {
            endpoint: args
                .endpoint
                .clone()
                .or_else(|| svc.endpoint.clone())
                .unwrap_or(defaults.endpoint),
            model: args
                .model
                .clone()
                .or_else(|| svc.model.clone())
                .unwrap_or(defaults.model),
            max_tokens: svc.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: svc.temperature.unwrap_or(defaults.temperature),
            timeout: svc
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            max_retries: svc.max_retries.unwrap_or(defaults.max_retries),
        }
    }
}
