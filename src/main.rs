//! HookHub — hook engine host.
//!
//! Main entry point that wires configuration, logging and the builtin plugins
//! around a hook engine, runs the lifecycle hooks, and reports statistics.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use hookhub_core::config::AppConfig;
use hookhub_core::error::AppError;
use hookhub_plugin::builtin::TraceObserver;
use hookhub_plugin::{HookEngine, PluginManager};

fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config) {
        tracing::error!("HookHub error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    if let Ok(path) = std::env::var("HOOKHUB_CONFIG") {
        return AppConfig::from_file(&path)
            .map_err(|e| AppError::internal(format!("Config load error: {}", e)));
    }

    let env = std::env::var("HOOKHUB_ENV").unwrap_or_else(|_| "development".to_string());

    AppConfig::load(&env).map_err(|e| AppError::internal(format!("Config load error: {}", e)))
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Boot the engine, run the lifecycle hooks and print hook statistics
fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting HookHub v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Hook engine ──────────────────────────────────────
    let engine = Arc::new(HookEngine::with_config(config.hooks));
    tracing::info!(
        wildcard = %engine.config().wildcard,
        default_priority = engine.default_priority(),
        "Hook engine initialized"
    );

    // ── Step 2: Builtin plugins ──────────────────────────────────
    let manager = PluginManager::new(Arc::clone(&engine), config.plugins);
    manager.load_plugin(Arc::new(TraceObserver::new()))?;
    tracing::info!("Loaded {} plugin(s)", manager.list_plugins().len());

    // ── Step 3: Lifecycle ────────────────────────────────────────
    manager.boot();
    manager.shutdown();

    // ── Step 4: Report ───────────────────────────────────────────
    let stats = serde_json::to_string_pretty(&engine.all_stats())?;
    println!("{}", stats);

    tracing::info!("HookHub shut down");
    Ok(())
}
