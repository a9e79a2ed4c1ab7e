//! Plugin manager — lifecycle management for all plugins.

use std::sync::Arc;

use tracing::{error, info, warn};

use hookhub_core::config::plugin::PluginConfig;
use hookhub_core::{AppError, AppResult};

use crate::api::context::PluginContext;
use crate::hooks::HookEngine;
use crate::registry::{Plugin, PluginInfo, PluginRegistry};

/// Manages the lifecycle of plugins: load, register, boot, unload.
#[derive(Debug)]
pub struct PluginManager {
    /// Engine the plugins register on.
    engine: Arc<HookEngine>,
    /// Plugin registry.
    plugin_registry: PluginRegistry,
    /// Plugin settings.
    config: PluginConfig,
}

impl PluginManager {
    /// Creates a new plugin manager over `engine`.
    pub fn new(engine: Arc<HookEngine>, config: PluginConfig) -> Self {
        Self {
            engine,
            plugin_registry: PluginRegistry::new(),
            config,
        }
    }

    /// Loads a compiled-in plugin and lets it register its callbacks.
    ///
    /// Returns `Ok(false)` when the plugin is disabled by configuration. If
    /// registration fails, whatever the plugin registered is rolled back.
    pub fn load_plugin(&self, plugin: Arc<dyn Plugin>) -> AppResult<bool> {
        let info = plugin.info();
        let plugin_id = info.id.clone();

        if !self.config.is_enabled(&plugin_id) {
            info!(plugin_id = %plugin_id, "Plugin disabled by configuration, skipping");
            return Ok(false);
        }

        // Load
        plugin.on_load().map_err(|e| {
            AppError::plugin(format!("Plugin '{}' load failed: {}", plugin_id, e))
        })?;

        // Register
        self.plugin_registry.register(plugin.clone())?;

        // Register hooks
        let ctx = PluginContext::new(&self.engine, &plugin_id);
        if let Err(e) = plugin.register(&ctx) {
            error!(plugin_id = %plugin_id, error = %e, "Plugin hook registration failed");
            self.engine.remove_owned_by(&plugin_id);
            self.plugin_registry.unregister(&plugin_id)?;
            return Err(AppError::plugin(format!(
                "Plugin '{}' registration failed: {}",
                plugin_id, e
            )));
        }

        info!(
            plugin_id = %plugin_id,
            name = %info.name,
            version = %info.version,
            "Plugin loaded"
        );

        Ok(true)
    }

    /// Fires the bootstrap hook once plugins are in place.
    pub fn boot(&self) {
        let hook = &self.engine.config().bootstrap_hook;
        info!(hook = %hook, plugins = self.plugin_registry.count(), "Booting plugins");
        self.engine.fire_action(hook, &[]);
    }

    /// Unregisters a plugin's callbacks and unloads it.
    pub fn unload_plugin(&self, plugin_id: &str) -> AppResult<()> {
        if !self.plugin_registry.contains(plugin_id) {
            return Err(AppError::not_found(format!(
                "Plugin '{}' not found",
                plugin_id
            )));
        }

        // Unregister hooks
        let removed = self.engine.remove_owned_by(plugin_id);

        // Unregister plugin
        let plugin = self.plugin_registry.unregister(plugin_id)?;

        // Unload
        if let Err(e) = plugin.on_unload() {
            warn!(
                plugin_id = %plugin_id,
                error = %e,
                "Plugin unload returned error"
            );
        }

        info!(plugin_id = %plugin_id, callbacks = removed, "Plugin unloaded");

        Ok(())
    }

    /// Fires the shutdown hook, then unloads every plugin in reverse load order.
    pub fn shutdown(&self) {
        let hook = &self.engine.config().shutdown_hook;
        self.engine.fire_action(hook, &[]);

        let plugins = self.plugin_registry.list();
        for info in plugins.iter().rev() {
            if let Err(e) = self.unload_plugin(&info.id) {
                error!(
                    plugin_id = %info.id,
                    error = %e,
                    "Error unloading plugin"
                );
            }
        }

        info!("All plugins unloaded");
    }

    /// Returns the engine plugins register on.
    pub fn engine(&self) -> &Arc<HookEngine> {
        &self.engine
    }

    /// Returns the plugin registry.
    pub fn plugin_registry(&self) -> &PluginRegistry {
        &self.plugin_registry
    }

    /// Lists all loaded plugins.
    pub fn list_plugins(&self) -> Vec<PluginInfo> {
        self.plugin_registry.list()
    }
}
