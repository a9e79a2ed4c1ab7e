//! Plugin context — the view of the engine a plugin registers through.

use hookhub_core::types::Priority;

use crate::hooks::{Callback, HookEngine};

/// Handed to [`crate::registry::Plugin::register`].
///
/// Every callback added through the context is tagged with the plugin id, so
/// the manager can remove all of them when the plugin is unloaded.
#[derive(Debug, Clone, Copy)]
pub struct PluginContext<'a> {
    engine: &'a HookEngine,
    plugin_id: &'a str,
}

impl<'a> PluginContext<'a> {
    /// Creates a context for `plugin_id`.
    pub fn new(engine: &'a HookEngine, plugin_id: &'a str) -> Self {
        Self { engine, plugin_id }
    }

    /// The plugin this context registers for.
    pub fn plugin_id(&self) -> &str {
        self.plugin_id
    }

    /// The underlying engine, for firing hooks and introspection.
    pub fn engine(&self) -> &'a HookEngine {
        self.engine
    }

    /// Registers `callback` with the engine defaults.
    pub fn add(&self, hook: &str, callback: Callback) {
        self.engine.add(hook, callback.owned_by(self.plugin_id));
    }

    /// Registers `callback` at `priority` with `arity` arguments.
    pub fn add_callback(&self, hook: &str, callback: Callback, priority: Priority, arity: usize) {
        self.engine
            .add_callback(hook, callback.owned_by(self.plugin_id), priority, arity);
    }
}
