use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

const DEFAULT_METRICS_TICK_MS: u64 = 2500;
const DEFAULT_RENDER_TICK_MS: u64 = 250;
const DEFAULT_REASONING_TIMEOUT_SECS: u64 = 60;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConsoleConfig {
    pub roster_path: Option<PathBuf>,
    pub metrics_tick_ms: u64,
    pub render_tick_ms: u64,
    pub reasoning: ReasoningConfig,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReasoningConfig {
    pub command: Option<String>,
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            roster_path: None,
            metrics_tick_ms: DEFAULT_METRICS_TICK_MS,
            render_tick_ms: DEFAULT_RENDER_TICK_MS,
            reasoning: ReasoningConfig::default(),
        }
    }
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            timeout_secs: DEFAULT_REASONING_TIMEOUT_SECS,
        }
    }
}

/// Reads the TOML config. A missing file means defaults.
pub fn load_config(path: &Path) -> Result<ConsoleConfig> {
    if !path.exists() {
        return Ok(ConsoleConfig::default());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    Ok(config)
}

impl ConsoleConfig {
    /// `ACMD_ROSTER`, `ACMD_REASONING_CMD` and `ACMD_METRICS_TICK_MS` win over the file.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("ACMD_ROSTER").filter(|value| !value.trim().is_empty()) {
            self.roster_path = Some(PathBuf::from(path.trim()));
        }
        if let Some(command) = lookup("ACMD_REASONING_CMD").filter(|value| !value.trim().is_empty())
        {
            self.reasoning.command = Some(command.trim().to_string());
        }
        if let Some(ms) = lookup("ACMD_METRICS_TICK_MS").and_then(|value| value.trim().parse().ok())
        {
            self.metrics_tick_ms = ms;
        }
    }

    pub fn metrics_tick_ms(&self) -> u64 {
        self.metrics_tick_ms.max(100)
    }

    pub fn render_tick_ms(&self) -> u64 {
        self.render_tick_ms.max(16)
    }
}

pub fn config_path() -> PathBuf {
    if let Ok(path) = env::var("ACMD_CONFIG_PATH") {
        return PathBuf::from(path);
    }
    config_dir().join("acmd/config.toml")
}

fn config_dir() -> PathBuf {
    if let Ok(path) = env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(path);
    }
    home_dir().join(".config")
}

fn home_dir() -> PathBuf {
    env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

pub fn parse_bool_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
