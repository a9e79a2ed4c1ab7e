//! Hook table — hook name to registry mapping plus firing bookkeeping.
//!
//! Entries are created on first registration or first fire and are never
//! deleted; emptying a hook keeps its call count.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use hookhub_core::types::{HookName, Priority};

use super::definitions::HookStats;
use super::registry::CallbackRegistry;

/// Per-hook state.
#[derive(Debug, Default)]
pub struct HookState {
    registry: CallbackRegistry,
    call_count: u64,
    firing_depth: usize,
    last_fired: Option<DateTime<Utc>>,
    /// Priority of the entry each open cursor last yielded, innermost last.
    running: Vec<Option<Priority>>,
}

impl HookState {
    /// The hook's callbacks.
    pub fn registry(&self) -> &CallbackRegistry {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut CallbackRegistry {
        &mut self.registry
    }

    /// Times the hook has been fired.
    pub fn call_count(&self) -> u64 {
        self.call_count
    }

    /// Number of fires of this hook currently in progress.
    pub fn firing_depth(&self) -> usize {
        self.firing_depth
    }

    pub(crate) fn push_running(&mut self) {
        self.running.push(None);
    }

    pub(crate) fn set_running(&mut self, priority: Priority) {
        if let Some(slot) = self.running.last_mut() {
            *slot = Some(priority);
        }
    }

    pub(crate) fn pop_running(&mut self) {
        self.running.pop();
    }

    /// Priority of the callback currently executing in the innermost fire.
    pub fn current_priority(&self) -> Option<Priority> {
        self.running.last().copied().flatten()
    }
}

/// All hooks known to an engine.
#[derive(Debug, Default)]
pub struct HookTable {
    hooks: HashMap<HookName, HookState>,
    /// Names of hooks currently firing, most recent last.
    stack: Vec<HookName>,
}

impl HookTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the interned name and state for `name`, creating both if new.
    ///
    /// Returns `None` only for the empty name, which is never a hook.
    pub(crate) fn get_or_create(&mut self, name: &str) -> Option<(HookName, &mut HookState)> {
        let key = match self.hooks.get_key_value(name) {
            Some((key, _)) => key.clone(),
            None => HookName::new(name).ok()?,
        };
        let state = self.hooks.entry(key.clone()).or_default();
        Some((key, state))
    }

    /// State for an existing hook.
    pub fn get(&self, name: &str) -> Option<&HookState> {
        self.hooks.get(name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut HookState> {
        self.hooks.get_mut(name)
    }

    /// Registry for an existing hook.
    pub fn registry(&self, name: &str) -> Option<&CallbackRegistry> {
        self.get(name).map(HookState::registry)
    }

    pub(crate) fn registries_mut(&mut self) -> impl Iterator<Item = &mut CallbackRegistry> {
        self.hooks.values_mut().map(HookState::registry_mut)
    }

    /// Times `name` has been fired; zero for unknown hooks.
    pub fn call_count(&self, name: &str) -> u64 {
        self.get(name).map_or(0, HookState::call_count)
    }

    /// Records the start of a fire and pushes the name on the stack.
    pub(crate) fn begin_fire(&mut self, name: &str) -> Option<HookName> {
        let (key, state) = self.get_or_create(name)?;
        state.call_count += 1;
        state.firing_depth += 1;
        state.last_fired = Some(Utc::now());
        self.stack.push(key.clone());
        Some(key)
    }

    /// Pops the stack entry pushed by the matching [`HookTable::begin_fire`].
    pub(crate) fn end_fire(&mut self, name: &HookName) {
        let popped = self.stack.pop();
        debug_assert_eq!(popped.as_ref(), Some(name), "firing stack out of order");
        if let Some(state) = self.hooks.get_mut(name.as_str()) {
            state.firing_depth = state.firing_depth.saturating_sub(1);
        }
    }

    /// The active firing stack, most recent last.
    pub fn currently_firing(&self) -> Vec<HookName> {
        self.stack.clone()
    }

    /// The innermost hook being fired.
    pub fn current(&self) -> Option<&HookName> {
        self.stack.last()
    }

    /// Returns whether `name` is anywhere on the firing stack.
    pub fn is_firing(&self, name: &str) -> bool {
        self.stack.iter().any(|hook| hook == name)
    }

    /// Returns whether any hook is firing.
    pub fn is_any_firing(&self) -> bool {
        !self.stack.is_empty()
    }

    /// Introspection snapshot for `name`.
    pub fn stats(&self, name: &str) -> Option<HookStats> {
        self.hooks
            .get_key_value(name)
            .map(|(key, state)| Self::stats_for(key, state))
    }

    /// Snapshots for every known hook, sorted by name.
    pub fn all_stats(&self) -> Vec<HookStats> {
        let mut stats: Vec<HookStats> = self
            .hooks
            .iter()
            .map(|(key, state)| Self::stats_for(key, state))
            .collect();
        stats.sort_by(|a, b| a.name.cmp(&b.name));
        stats
    }

    /// Every hook name the table has seen.
    pub fn hook_names(&self) -> Vec<HookName> {
        let mut names: Vec<HookName> = self.hooks.keys().cloned().collect();
        names.sort();
        names
    }

    fn stats_for(name: &HookName, state: &HookState) -> HookStats {
        HookStats {
            name: name.clone(),
            callbacks: state.registry.len(),
            times_fired: state.call_count,
            firing_depth: state.firing_depth,
            last_fired: state.last_fired,
        }
    }
}
