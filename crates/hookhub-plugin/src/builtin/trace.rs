//! Observer that logs every fired hook through the wildcard channel.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

use hookhub_core::AppResult;

use crate::api::context::PluginContext;
use crate::hooks::{Callback, Value};
use crate::registry::{Plugin, PluginInfo};

/// Plugin id of the trace observer.
pub const TRACE_PLUGIN_ID: &str = "builtin-trace";

#[derive(Debug, Default)]
struct Counter {
    observed: AtomicU64,
}

impl Counter {
    fn observe(&self, args: &[Value]) -> Value {
        self.observed.fetch_add(1, Ordering::Relaxed);
        let hook = args.first().and_then(Value::as_str).unwrap_or_default();
        trace!(hook = %hook, args = args.len().saturating_sub(1), "Hook fired");
        Value::Null
    }
}

/// Logs each fire at `trace` level and counts how many it has seen.
#[derive(Debug, Default)]
pub struct TraceObserver {
    counter: Arc<Counter>,
}

impl TraceObserver {
    /// Creates a new observer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fires observed since the plugin was loaded.
    pub fn observed(&self) -> u64 {
        self.counter.observed.load(Ordering::Relaxed)
    }
}

impl Plugin for TraceObserver {
    fn info(&self) -> PluginInfo {
        crate::plugin_info!(
            id: TRACE_PLUGIN_ID,
            name: "Trace Observer",
            version: env!("CARGO_PKG_VERSION"),
            description: "Logs every fired hook",
            author: "hookhub",
            priority: 0
        )
    }

    fn register(&self, ctx: &PluginContext<'_>) -> AppResult<()> {
        let wildcard = ctx.engine().config().wildcard.clone();
        let callback = Callback::bound(&self.counter, "observe", Counter::observe)?;
        ctx.add_callback(&wildcard, callback, i32::MIN, 0);
        Ok(())
    }

    fn on_unload(&self) -> Result<(), String> {
        trace!(observed = self.observed(), "Trace observer unloaded");
        Ok(())
    }
}
