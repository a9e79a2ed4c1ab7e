//! Hook engine configuration.

use serde::{Deserialize, Serialize};

use crate::types::priority::{DEFAULT_ARITY, DEFAULT_PRIORITY, Priority};

/// Defaults applied by the hook engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HooksConfig {
    /// Priority used when a registrant does not pick one.
    #[serde(default = "default_priority")]
    pub default_priority: Priority,
    /// Number of fired arguments passed when a registrant does not pick one.
    #[serde(default = "default_arity")]
    pub default_arity: usize,
    /// Name of the channel whose callbacks observe every fire.
    #[serde(default = "default_wildcard")]
    pub wildcard: String,
    /// Hook fired once plugins are loaded, so they can register late work.
    #[serde(default = "default_bootstrap_hook")]
    pub bootstrap_hook: String,
    /// Hook fired before plugins are unloaded.
    #[serde(default = "default_shutdown_hook")]
    pub shutdown_hook: String,
}

impl Default for HooksConfig {
    fn default() -> Self {
        Self {
            default_priority: default_priority(),
            default_arity: default_arity(),
            wildcard: default_wildcard(),
            bootstrap_hook: default_bootstrap_hook(),
            shutdown_hook: default_shutdown_hook(),
        }
    }
}

fn default_priority() -> Priority {
    DEFAULT_PRIORITY
}

fn default_arity() -> usize {
    DEFAULT_ARITY
}

fn default_wildcard() -> String {
    "all".to_string()
}

fn default_bootstrap_hook() -> String {
    "init".to_string()
}

fn default_shutdown_hook() -> String {
    "shutdown".to_string()
}
