//! Plugin registry — stores loaded plugin instances and metadata.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use hookhub_core::{AppError, AppResult};

use crate::api::context::PluginContext;

/// Metadata about a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    /// Unique plugin identifier; also the owner tag on its callbacks.
    pub id: String,
    /// Human-readable plugin name.
    pub name: String,
    /// Plugin version string.
    pub version: String,
    /// Plugin description.
    pub description: String,
    /// Author or maintainer.
    pub author: String,
    /// Load priority (lower = loaded first).
    pub priority: i32,
}

/// Trait that all plugins implement.
pub trait Plugin: Send + Sync + std::fmt::Debug {
    /// Returns plugin metadata.
    fn info(&self) -> PluginInfo;

    /// Called once before the plugin registers its callbacks.
    fn on_load(&self) -> Result<(), String> {
        Ok(())
    }

    /// Registers the plugin's callbacks through `ctx`.
    fn register(&self, ctx: &PluginContext<'_>) -> AppResult<()>;

    /// Called after the plugin's callbacks have been removed.
    fn on_unload(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Registry of all loaded plugins.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    /// Plugin ID → plugin instance.
    plugins: RwLock<HashMap<String, Arc<dyn Plugin>>>,
    /// Plugin ID → metadata.
    metadata: RwLock<HashMap<String, PluginInfo>>,
}

impl PluginRegistry {
    /// Creates a new empty plugin registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a plugin.
    pub fn register(&self, plugin: Arc<dyn Plugin>) -> AppResult<()> {
        let info = plugin.info();
        let id = info.id.clone();

        let mut plugins = self.plugins.write();
        let mut metadata = self.metadata.write();

        if plugins.contains_key(&id) {
            return Err(AppError::conflict(format!(
                "Plugin '{id}' is already registered"
            )));
        }

        info!(plugin_id = %id, name = %info.name, version = %info.version, "Registering plugin");

        plugins.insert(id.clone(), plugin);
        metadata.insert(id, info);

        Ok(())
    }

    /// Unregisters a plugin by ID.
    pub fn unregister(&self, plugin_id: &str) -> AppResult<Arc<dyn Plugin>> {
        let mut plugins = self.plugins.write();
        let mut metadata = self.metadata.write();

        let plugin = plugins
            .remove(plugin_id)
            .ok_or_else(|| AppError::not_found(format!("Plugin '{plugin_id}' not found")))?;

        metadata.remove(plugin_id);

        info!(plugin_id = %plugin_id, "Plugin unregistered");

        Ok(plugin)
    }

    /// Gets a plugin by ID.
    pub fn get(&self, plugin_id: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins.read().get(plugin_id).cloned()
    }

    /// Lists all registered plugin metadata, by load priority then id.
    pub fn list(&self) -> Vec<PluginInfo> {
        let mut infos: Vec<PluginInfo> = self.metadata.read().values().cloned().collect();
        infos.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id)));
        infos
    }

    /// Returns plugin count.
    pub fn count(&self) -> usize {
        self.plugins.read().len()
    }

    /// Checks whether a plugin is registered.
    pub fn contains(&self, plugin_id: &str) -> bool {
        self.plugins.read().contains_key(plugin_id)
    }
}
