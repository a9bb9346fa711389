use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::controller::ControllerConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub server: ServerConfig,
    pub history: HistoryConfig,
    pub controller: LoopConfig,
    pub voice: VoiceConfig,
    pub visual: VisualConfig,
    pub actions: ActionsConfig,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base URL clients use to reach this server.
    pub fn url(&self) -> String {
        format!("http://{}", self.bind_addr())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub capacity: usize,
    pub default_limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            default_limit: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    pub stop_grace_ms: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self { stop_grace_ms: 1000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub listen_timeout_ms: u64,
    pub calibration_ms: u64,
    pub transcribe_slack_ms: u64,
    pub listen_command: Vec<String>,
    pub calibrate_command: Option<Vec<String>>,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            listen_timeout_ms: 1000,
            calibration_ms: 1000,
            transcribe_slack_ms: 5000,
            listen_command: vec!["handsfree-listen".to_string(), "--timeout-ms".to_string(), "{timeout_ms}".to_string()],
            calibrate_command: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualConfig {
    pub interval_ms: u64,
    pub capture_timeout_ms: u64,
    pub capture_command: Vec<String>,
    pub skin_ratio_threshold: f32,
    pub sample_stride: u32,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            capture_timeout_ms: 2000,
            capture_command: default_capture_command(),
            skin_ratio_threshold: 0.05,
            sample_stride: 8,
        }
    }
}

fn default_capture_command() -> Vec<String> {
    let argv: &[&str] = if cfg!(target_os = "macos") {
        &["screencapture", "-x", "-t", "png", "/dev/stdout"]
    } else if cfg!(target_os = "windows") {
        &["handsfree-capture"]
    } else {
        &["grim", "-"]
    };
    argv.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionsConfig {
    pub timeout_ms: u64,
    /// Replacement argv per command name
    pub overrides: HashMap<String, Vec<String>>,
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            overrides: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub tick_rate_ms: u64,
    pub refresh_ms: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: 250,
            refresh_ms: 2000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            server: ServerConfig::default(),
            history: HistoryConfig::default(),
            controller: LoopConfig::default(),
            voice: VoiceConfig::default(),
            visual: VisualConfig::default(),
            actions: ActionsConfig::default(),
            dashboard: DashboardConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let project_name = env!("CARGO_PKG_NAME");
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            eyre::bail!("server.port must be > 0");
        }
        if self.history.capacity == 0 {
            eyre::bail!("history.capacity must be > 0");
        }
        if self.voice.listen_command.is_empty() {
            eyre::bail!("voice.listen_command must not be empty");
        }
        if self.visual.capture_command.is_empty() {
            eyre::bail!("visual.capture_command must not be empty");
        }
        if !(0.0..=1.0).contains(&self.visual.skin_ratio_threshold) {
            eyre::bail!("visual.skin_ratio_threshold must be within 0.0..=1.0");
        }
        Ok(())
    }

    /// Controller settings derived from this config.
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            poll_timeout: Duration::from_millis(self.voice.listen_timeout_ms),
            stop_grace: Duration::from_millis(self.controller.stop_grace_ms),
            history_capacity: self.history.capacity,
        }
    }
}
