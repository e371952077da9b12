//! Named Rundeck clients, built once at startup and shared read-only.

use std::sync::Arc;

use tracing::info;

use crate::client::{Result, RundeckApi, RundeckClient, RundeckError};
use crate::config::{ServerProfile, DEFAULT_SERVER_NAME};

/// A configured server: its profile plus the client that talks to it.
#[derive(Clone)]
pub struct ServerEntry {
    pub name: String,
    pub url: String,
    pub api_version: String,
    pub client: Arc<dyn RundeckApi>,
}

/// Registry of servers, in configuration order.
///
/// Resolution never mutates; rebuild the whole registry to reconfigure.
#[derive(Clone, Default)]
pub struct ServerRegistry {
    entries: Vec<ServerEntry>,
}

impl ServerRegistry {
    /// Build HTTP clients for every profile. Fails when the list is empty.
    pub fn from_profiles(profiles: &[ServerProfile]) -> Result<Self> {
        if profiles.is_empty() {
            return Err(RundeckError::NoServersConfigured);
        }

        let mut registry = Self::default();
        for profile in profiles {
            let client = RundeckClient::new(profile)?;
            info!(server = %profile.name, url = %profile.url, "Initialized Rundeck client");
            registry.insert(ServerEntry {
                name: profile.name.clone(),
                url: client.base_url().to_string(),
                api_version: profile.api_version.clone(),
                client: Arc::new(client),
            });
        }
        info!(count = registry.len(), "Rundeck clients ready");
        Ok(registry)
    }

    /// Add an entry. A later entry with the same name replaces the earlier one in place.
    pub fn insert(&mut self, entry: ServerEntry) {
        match self.entries.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Pick a server by name. Without a name, `default` wins, otherwise the first configured.
    pub fn resolve(&self, name: Option<&str>) -> Result<&ServerEntry> {
        if self.entries.is_empty() {
            return Err(RundeckError::NotConfigured);
        }

        match name {
            None => Ok(self
                .get(DEFAULT_SERVER_NAME)
                .unwrap_or(&self.entries[0])),
            Some(name) => self.get(name).ok_or_else(|| RundeckError::UnknownServer {
                name: name.to_string(),
                available: self.names(),
            }),
        }
    }

    /// Shorthand for `resolve(name)?.client`.
    pub fn client(&self, name: Option<&str>) -> Result<Arc<dyn RundeckApi>> {
        self.resolve(name).map(|e| e.client.clone())
    }

    pub fn get(&self, name: &str) -> Option<&ServerEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    pub fn entries(&self) -> &[ServerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
