//! Shared helpers for hook engine integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;

use hookhub_plugin::{Callback, HookEngine, Value};

/// Ordered record of what callbacks observed.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// A callback identified as `label` that records `label` each time it runs.
    pub fn callback(&self, label: &str) -> Callback {
        let journal = self.clone();
        let owned = label.to_string();
        Callback::named(label, move |_| {
            journal.push(owned.clone());
            Value::Null
        })
        .expect("valid callable name")
    }
}

/// A shared engine that callbacks can capture.
pub fn shared_engine() -> Arc<HookEngine> {
    Arc::new(HookEngine::new())
}
