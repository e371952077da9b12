//! Per-tool description overrides read from a JSON file.
//!
//! The file maps tool names to an optional `description` and an optional
//! `prompt`:
//!
//! ```json
//! { "get_jobs": { "description": "List jobs", "prompt": "Prefer job_filter." } }
//! ```
//!
//! Tools without an entry keep their built-in description.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use super::Tool;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ToolPrompt {
    pub description: Option<String>,
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ToolPrompts {
    entries: HashMap<String, ToolPrompt>,
}

impl ToolPrompts {
    /// Read overrides from `path`. A missing or malformed file is logged and
    /// yields no overrides.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), "Tool prompts file not readable, using built-in descriptions: {}", e);
                return Self::default();
            }
        };

        match serde_json::from_str::<HashMap<String, ToolPrompt>>(&content) {
            Ok(entries) => {
                for name in entries.keys().filter(|n| Tool::from_name(n).is_none()) {
                    warn!(path = %path.display(), tool = %name, "Tool prompts file names an unknown tool");
                }
                info!(path = %path.display(), tools = entries.len(), "Loaded tool prompts");
                Self { entries }
            }
            Err(e) => {
                warn!(path = %path.display(), "Invalid tool prompts file, using built-in descriptions: {}", e);
                Self::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The advertised description: the override (or built-in text) followed
    /// by the prompt after a blank line.
    pub fn describe(&self, tool: Tool) -> String {
        let fallback = tool.description();
        let Some(entry) = self.entries.get(tool.name()) else {
            return fallback.to_string();
        };

        let description = entry
            .description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(fallback);
        match entry.prompt.as_deref().filter(|p| !p.trim().is_empty()) {
            Some(prompt) => format!("{}\n\n{}", description, prompt),
            None => description.to_string(),
        }
    }
}
