use std::path::Path;

use log::debug;
use serde::Deserialize;

use crate::{error::TermResult, expr::pretty::PrettyMode};

/// Tunables of an [`Environment`](crate::environment::Environment).
///
/// Every field is optional in TOML form:
/// ```toml
/// retain_topology = true
/// trace_phases = false
/// pretty_width = 100
/// error_mode = "readable"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Keep the bindings of the last successful call for inspection.
    pub retain_topology: bool,
    /// Log the XML projection of the tree after every phase (at `trace` level).
    pub trace_phases: bool,
    /// Width used when pretty printing to the terminal.
    pub pretty_width: usize,
    /// Rendering used for expressions embedded in diagnostics.
    pub error_mode: PrettyMode,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            retain_topology: true,
            trace_phases: false,
            pretty_width: 80,
            error_mode: PrettyMode::Minimum,
        }
    }
}

impl EnvironmentConfig {
    pub fn from_toml_str(source: &str) -> TermResult<Self> {
        let config: EnvironmentConfig = toml::from_str(source)?;
        debug!("Loaded environment configuration: {:?}", config);
        Ok(config)
    }

    pub fn load_from_toml(path: &Path) -> TermResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn with_retain_topology(mut self, retain_topology: bool) -> Self {
        self.retain_topology = retain_topology;
        self
    }

    pub fn with_trace_phases(mut self, trace_phases: bool) -> Self {
        self.trace_phases = trace_phases;
        self
    }

    pub fn with_pretty_width(mut self, pretty_width: usize) -> Self {
        self.pretty_width = pretty_width;
        self
    }

    pub fn with_error_mode(mut self, error_mode: PrettyMode) -> Self {
        self.error_mode = error_mode;
        self
    }
}
