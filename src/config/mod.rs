//! Server and tuning configuration.
//!
//! Servers come from the environment first (`RUNDECK_URL`, `RUNDECK_API_TOKEN`,
//! `RUNDECK_API_VERSION` for the primary server, `RUNDECK_URL_1` .. `_9` and
//! friends for additional ones), then from an optional TOML file whose
//! `[[servers]]` tables are appended after them. A tool prompts file may be
//! named by `RUNDECK_MCP_TOOL_PROMPTS` or `[tools] prompts_file`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub const DEFAULT_API_VERSION: &str = "47";

/// Name the primary (unnumbered) server registers under.
pub const DEFAULT_SERVER_NAME: &str = "default";

/// Highest index probed for numbered servers (`RUNDECK_URL_1` .. `RUNDECK_URL_9`).
pub const MAX_ADDITIONAL_SERVERS: usize = 9;

/// Environment variable naming a TOML config file.
pub const CONFIG_ENV: &str = "RUNDECK_MCP_CONFIG";

/// Environment variable naming a tool prompts JSON file.
pub const PROMPTS_ENV: &str = "RUNDECK_MCP_TOOL_PROMPTS";

/// Connection settings for one Rundeck server. Never mutated after startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerProfile {
    pub name: String,
    pub url: String,
    pub token: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

/// Execution monitor tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    pub poll_interval_secs: u64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
        }
    }
}

/// Assumptions behind the ROI estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoiSettings {
    /// Manual hours one successful execution is assumed to replace.
    pub manual_hours_per_success: f64,
}

impl Default for RoiSettings {
    fn default() -> Self {
        Self {
            manual_hours_per_success: 1.0,
        }
    }
}

/// Tool catalog settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// JSON file overriding tool descriptions and prompts.
    pub prompts_file: Option<PathBuf>,
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RundeckConfig {
    #[serde(default)]
    pub servers: Vec<ServerProfile>,
    #[serde(default)]
    pub monitor: MonitorSettings,
    #[serde(default)]
    pub roi: RoiSettings,
    #[serde(default)]
    pub tools: ToolSettings,
}

impl RundeckConfig {
    /// Read servers from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read servers through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut servers = Vec::new();

        // 1. Primary server
        if let (Some(url), Some(token)) = (get("RUNDECK_URL"), get("RUNDECK_API_TOKEN")) {
            info!(%url, "Configured default Rundeck server");
            servers.push(ServerProfile {
                name: DEFAULT_SERVER_NAME.to_string(),
                url,
                token,
                api_version: get("RUNDECK_API_VERSION").unwrap_or_else(default_api_version),
            });
        }

        // 2. Numbered servers
        for i in 1..=MAX_ADDITIONAL_SERVERS {
            let url = get(&format!("RUNDECK_URL_{}", i));
            let token = get(&format!("RUNDECK_API_TOKEN_{}", i));
            let (Some(url), Some(token)) = (url, token) else {
                continue;
            };

            let name = get(&format!("RUNDECK_NAME_{}", i)).unwrap_or_else(|| format!("server_{}", i));
            info!(server = %name, %url, "Configured Rundeck server");
            servers.push(ServerProfile {
                name,
                url,
                token,
                api_version: get(&format!("RUNDECK_API_VERSION_{}", i))
                    .unwrap_or_else(default_api_version),
            });
        }

        Self {
            servers,
            tools: ToolSettings {
                prompts_file: get(PROMPTS_ENV).map(PathBuf::from),
            },
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        info!(path = %path.display(), servers = config.servers.len(), "Loaded configuration file");
        Ok(config)
    }

    /// Environment servers, followed by those in `path` (or `$RUNDECK_MCP_CONFIG`).
    /// Tuning sections come from the file when one is given.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::from_env();

        let file_path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => std::env::var(CONFIG_ENV).ok().map(Into::into),
        };

        match file_path {
            Some(p) => {
                let file = Self::load(&p)?;
                config.merge(file);
            }
            None => debug!("No config file given, using environment only"),
        }

        if config.servers.is_empty() {
            warn!("No Rundeck servers found in environment or config file");
        }
        Ok(config)
    }

    /// Append `other`'s servers and adopt its tuning sections. A prompts
    /// file already set from the environment wins over the file's.
    pub fn merge(&mut self, other: RundeckConfig) {
        self.servers.extend(other.servers);
        self.monitor = other.monitor;
        self.roi = other.roi;
        if self.tools.prompts_file.is_none() {
            self.tools = other.tools;
        }
    }
}
