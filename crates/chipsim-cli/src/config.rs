//! Configuration management for the chipsim CLI

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

/// Queue ordering discipline, as read from config or CLI flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueModeConfig {
    /// Plain FIFO.
    Fifo,
    /// Delay-1 promotion.
    Priority,
}

impl From<QueueModeConfig> for chipsim_core::QueueMode {
    fn from(value: QueueModeConfig) -> Self {
        match value {
            QueueModeConfig::Fifo => chipsim_core::QueueMode::Fifo,
            QueueModeConfig::Priority => chipsim_core::QueueMode::Priority,
        }
    }
}

/// Numeric backend selection, as read from config or CLI flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericModeConfig {
    /// IEEE-754 `f32`.
    Float,
    /// Fixed-point with the reference default bit widths.
    Fixed,
}

/// Run-configuration defaults for a chipsim workspace, loaded from an
/// optional `chipsim.toml` (§10d). CLI flags take precedence over a loaded
/// config, which takes precedence over [`SimConfig::default`].
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Default per-queue capacity for router input buffers and core
    /// in/out buffers.
    pub queue_capacity: usize,
    /// Default queue ordering discipline.
    pub queue_mode: QueueModeConfig,
    /// Default numeric backend.
    pub numeric_mode: NumericModeConfig,
    /// Whether to sample per-op-step router utilization while running.
    pub sample_utilization: bool,
    /// Default output directory for voltage traces.
    pub output_dir: String,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1000,
            queue_mode: QueueModeConfig::Fifo,
            numeric_mode: NumericModeConfig::Float,
            sample_utilization: false,
            output_dir: "traces".to_string(),
        }
    }
}

impl SimConfig {
    /// Load from `path` if it exists, falling back to [`SimConfig::default`]
    /// otherwise.
    pub fn load_from_file(path: &Path) -> CliResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content).map_err(CliError::from)
        } else {
            Ok(Self::default())
        }
    }

    /// Serialize to `path`, creating parent directories as needed.
    pub fn save_to_file(&self, path: &Path) -> CliResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| CliError::config(format!("failed to serialize config: {e}")))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_float_fifo() {
        let cfg = SimConfig::default();
        assert_eq!(cfg.queue_mode, QueueModeConfig::Fifo);
        assert_eq!(cfg.numeric_mode, NumericModeConfig::Float);
    }

    #[test]
    fn missing_config_file_falls_back_to_default() {
        let cfg = SimConfig::load_from_file(Path::new("/nonexistent/chipsim.toml")).unwrap();
        assert_eq!(cfg.queue_capacity, 1000);
    }
}
