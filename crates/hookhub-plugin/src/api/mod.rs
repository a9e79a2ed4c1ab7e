//! Plugin API — the surface exposed to plugin code.

pub mod context;

pub use context::PluginContext;
