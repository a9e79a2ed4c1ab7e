//! Hook dispatcher — registers callbacks and fires hooks as actions or filters.
//!
//! Firing a hook:
//! - increments its call count and pushes it on the firing stack;
//! - runs the wildcard channel with the hook name prepended to the arguments;
//! - walks the hook's callbacks in priority order through a fresh cursor;
//! - pops the stack.
//!
//! Callbacks may re-enter the engine freely. The table sits behind a
//! reentrant lock held for the whole call, and the inner `RefCell` is never
//! borrowed while a callback runs. Stack pops and cursor releases are drop
//! guards, so a panicking callback leaves the bookkeeping consistent for a
//! host that catches the unwind. Entries leaving a registry are dropped only
//! after the borrow ends, since their captures may call back in on drop.

use std::cell::{RefCell, RefMut};

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use tracing::{debug, trace, warn};

use hookhub_core::config::hooks::HooksConfig;
use hookhub_core::types::{CallbackId, HookName, Priority};

use super::cursor::IterationCursor;
use super::definitions::{Callback, CallbackEntry, HasResult, HookStats, Value};
use super::table::HookTable;

/// The hook engine: owns the hook table and is the only way to touch it.
#[derive(Debug)]
pub struct HookEngine {
    table: ReentrantMutex<RefCell<HookTable>>,
    config: HooksConfig,
}

impl HookEngine {
    /// Creates an engine with default settings.
    pub fn new() -> Self {
        Self::with_config(HooksConfig::default())
    }

    /// Creates an engine with the given defaults.
    pub fn with_config(config: HooksConfig) -> Self {
        Self {
            table: ReentrantMutex::new(RefCell::new(HookTable::new())),
            config,
        }
    }

    /// Returns the engine defaults.
    pub fn config(&self) -> &HooksConfig {
        &self.config
    }

    /// Priority used by [`HookEngine::add`].
    pub fn default_priority(&self) -> Priority {
        self.config.default_priority
    }

    /// Registers `callback` on `hook` with the configured priority and arity.
    pub fn add(&self, hook: &str, callback: Callback) {
        self.add_callback(
            hook,
            callback,
            self.config.default_priority,
            self.config.default_arity,
        );
    }

    /// Registers `callback` on `hook` at `priority`, passing it at most
    /// `arity` of the fired arguments.
    ///
    /// Registering an identity that is already live at `priority` is a no-op;
    /// the same identity at another priority is a second registration.
    pub fn add_callback(&self, hook: &str, callback: Callback, priority: Priority, arity: usize) {
        let guard = self.table.lock();
        let mut table = guard.borrow_mut();
        let Some((name, state)) = table.get_or_create(hook) else {
            warn!(callback = %callback.id(), "Ignoring registration on empty hook name");
            return;
        };

        let entry = callback.into_entry(priority, arity);
        let id = entry.id.clone();
        let registry = state.registry_mut();
        if registry.add(entry) {
            debug!(hook = %name, callback = %id, priority, arity, "Callback registered");
        } else {
            trace!(hook = %name, callback = %id, priority, "Callback already registered");
        }
        let retired = registry.take_retired();
        release(table, retired);
    }

    /// Removes the registration of `id` at `priority`.
    ///
    /// Returns `false` when nothing matched. Safe to call from inside a
    /// callback of the same hook, including the callback being removed.
    pub fn remove_callback(&self, hook: &str, id: &CallbackId, priority: Priority) -> bool {
        let guard = self.table.lock();
        let mut table = guard.borrow_mut();
        let Some(state) = table.get_mut(hook) else {
            return false;
        };
        let registry = state.registry_mut();
        let removed = registry.remove(priority, id);
        let retired = registry.take_retired();
        release(table, retired);

        if removed {
            debug!(hook = %hook, callback = %id, priority, "Callback removed");
        }
        removed
    }

    /// Removes every callback on `hook`, or only those at `priority`.
    pub fn remove_all_callbacks(&self, hook: &str, priority: Option<Priority>) {
        let guard = self.table.lock();
        let mut table = guard.borrow_mut();
        let Some(state) = table.get_mut(hook) else {
            return;
        };

        let registry = state.registry_mut();
        let removed = match priority {
            Some(priority) => registry.remove_priority(priority),
            None => registry.clear(),
        };
        let retired = registry.take_retired();
        release(table, retired);
        debug!(hook = %hook, ?priority, removed, "Callbacks cleared");
    }

    /// Removes every callback registered by `owner` on any hook.
    pub fn remove_owned_by(&self, owner: &str) -> usize {
        let guard = self.table.lock();
        let mut table = guard.borrow_mut();
        let mut removed = 0;
        let mut retired = Vec::new();
        for registry in table.registries_mut() {
            removed += registry.remove_owned_by(owner);
            retired.extend(registry.take_retired());
        }
        release(table, retired);

        debug!(owner = %owner, removed, "Owned callbacks removed");
        removed
    }

    /// Asks whether `hook` has callbacks, or at what priority `id` sits.
    pub fn has_callback(&self, hook: &str, id: Option<&CallbackId>) -> HasResult {
        let guard = self.table.lock();
        let table = guard.borrow();
        let registry = table.registry(hook);
        match id {
            None => HasResult::Any(registry.is_some_and(|r| !r.is_empty())),
            Some(id) => HasResult::At(registry.and_then(|r| r.priority_of(id))),
        }
    }

    /// Fires `hook` for its side effects.
    ///
    /// Each callback receives the first `arity` elements of `args`; return
    /// values are discarded.
    pub fn fire_action(&self, hook: &str, args: &[Value]) {
        let Some(frame) = self.enter(hook) else {
            return;
        };

        frame.run_wildcard(&self.config.wildcard, args);

        let Some(mut cursor) = frame.open_cursor() else {
            return;
        };
        trace!(hook = %frame.name, "Dispatching action");
        while let Some(entry) = cursor.next() {
            entry.invoke(args);
        }
    }

    /// Fires `hook` as a filter, threading `value` through each callback.
    ///
    /// Each callback receives `(value, args...)` truncated to its arity and
    /// returns the value handed to the next one. A hook without callbacks
    /// returns `value` untouched and opens no cursor.
    pub fn fire_filter(&self, hook: &str, value: Value, args: &[Value]) -> Value {
        let Some(frame) = self.enter(hook) else {
            return value;
        };

        if frame.has_wildcard(&self.config.wildcard) {
            let mut observed = Vec::with_capacity(args.len() + 1);
            observed.push(value.clone());
            observed.extend_from_slice(args);
            frame.run_wildcard(&self.config.wildcard, &observed);
        }

        let Some(mut cursor) = frame.open_cursor() else {
            return value;
        };
        trace!(hook = %frame.name, "Dispatching filter");

        let mut call_args = Vec::with_capacity(args.len() + 1);
        call_args.push(value);
        call_args.extend_from_slice(args);
        while let Some(entry) = cursor.next() {
            let next = entry.invoke(&call_args);
            call_args[0] = next;
        }
        call_args.swap_remove(0)
    }

    /// Fires a deprecated action, warning when anything still listens.
    ///
    /// Nothing is fired, and the call is not counted, when the hook has no
    /// callbacks.
    pub fn fire_action_deprecated(
        &self,
        hook: &str,
        args: &[Value],
        version: &str,
        replacement: Option<&str>,
    ) {
        if !self.has_callback(hook, None).is_registered() {
            return;
        }
        warn_deprecated(hook, version, replacement);
        self.fire_action(hook, args);
    }

    /// Fires a deprecated filter, warning when anything still listens.
    pub fn fire_filter_deprecated(
        &self,
        hook: &str,
        value: Value,
        args: &[Value],
        version: &str,
        replacement: Option<&str>,
    ) -> Value {
        if !self.has_callback(hook, None).is_registered() {
            return value;
        }
        warn_deprecated(hook, version, replacement);
        self.fire_filter(hook, value, args)
    }

    /// With a name: whether that hook is anywhere on the firing stack.
    /// Without: whether any hook is firing.
    pub fn is_firing(&self, hook: Option<&str>) -> bool {
        let guard = self.table.lock();
        let table = guard.borrow();
        match hook {
            Some(hook) => table.is_firing(hook),
            None => table.is_any_firing(),
        }
    }

    /// Times `hook` has been fired as an action or filter.
    pub fn times_fired(&self, hook: &str) -> u64 {
        let guard = self.table.lock();
        guard.borrow().call_count(hook)
    }

    /// The innermost hook being fired.
    pub fn current_hook(&self) -> Option<HookName> {
        let guard = self.table.lock();
        guard.borrow().current().cloned()
    }

    /// The active firing stack, most recent last.
    pub fn firing_stack(&self) -> Vec<HookName> {
        let guard = self.table.lock();
        guard.borrow().currently_firing()
    }

    /// Priority of the callback currently running on `hook`, innermost fire.
    pub fn current_priority(&self, hook: &str) -> Option<Priority> {
        let guard = self.table.lock();
        let table = guard.borrow();
        table.get(hook).and_then(|state| state.current_priority())
    }

    /// Introspection snapshot for `hook`.
    pub fn stats(&self, hook: &str) -> Option<HookStats> {
        let guard = self.table.lock();
        guard.borrow().stats(hook)
    }

    /// Introspection snapshots for every known hook, sorted by name.
    pub fn all_stats(&self) -> Vec<HookStats> {
        let guard = self.table.lock();
        guard.borrow().all_stats()
    }

    /// Starts a fire of `hook`; the returned frame ends it on drop.
    fn enter(&self, hook: &str) -> Option<FireFrame<'_>> {
        let lock = self.table.lock();
        let name = lock.borrow_mut().begin_fire(hook);
        match name {
            Some(name) => Some(FireFrame { lock, name }),
            None => {
                warn!("Ignoring fire of empty hook name");
                None
            }
        }
    }
}

impl Default for HookEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Ends the table borrow, then drops the entries that left a registry.
fn release(table: RefMut<'_, HookTable>, retired: Vec<CallbackEntry>) {
    drop(table);
    drop(retired);
}

fn warn_deprecated(hook: &str, version: &str, replacement: Option<&str>) {
    match replacement {
        Some(replacement) => warn!(
            hook = %hook,
            version = %version,
            replacement = %replacement,
            "Hook is deprecated, use the replacement instead"
        ),
        None => warn!(
            hook = %hook,
            version = %version,
            "Hook is deprecated with no alternative available"
        ),
    }
}

/// One fire of one hook. Pops the firing stack on drop.
struct FireFrame<'a> {
    lock: ReentrantMutexGuard<'a, RefCell<HookTable>>,
    name: HookName,
}

impl<'a> FireFrame<'a> {
    /// Opens a cursor over this hook, or `None` if it has no callbacks.
    fn open_cursor(&self) -> Option<ActiveCursor<'_>> {
        open_cursor(&self.lock, self.name.as_str())
    }

    fn has_wildcard(&self, wildcard: &str) -> bool {
        self.name != wildcard
            && self
                .lock
                .borrow()
                .registry(wildcard)
                .is_some_and(|registry| !registry.is_empty())
    }

    /// Runs the wildcard channel with `(hook, args...)`.
    ///
    /// Wildcard callbacks see every argument regardless of arity. Firing the
    /// wildcard name itself does not run the channel twice.
    fn run_wildcard(&self, wildcard: &str, args: &[Value]) {
        if !self.has_wildcard(wildcard) {
            return;
        }
        let Some(mut cursor) = open_cursor(&self.lock, wildcard) else {
            return;
        };

        let mut observed = Vec::with_capacity(args.len() + 1);
        observed.push(Value::String(self.name.to_string()));
        observed.extend_from_slice(args);
        while let Some(entry) = cursor.next() {
            entry.invoke_all(&observed);
        }
    }
}

impl Drop for FireFrame<'_> {
    fn drop(&mut self) {
        self.lock.borrow_mut().end_fire(&self.name);
    }
}

fn open_cursor<'t>(table: &'t RefCell<HookTable>, hook: &str) -> Option<ActiveCursor<'t>> {
    let mut guard = table.borrow_mut();
    let state = guard.get_mut(hook)?;
    if state.registry().is_empty() {
        return None;
    }
    let cursor = state.registry_mut().snapshot_for_iteration();
    state.push_running();
    Some(ActiveCursor {
        table,
        hook: hook.to_string(),
        cursor,
    })
}

/// An open cursor over one hook. Closes the cursor on drop.
struct ActiveCursor<'t> {
    table: &'t RefCell<HookTable>,
    hook: String,
    cursor: IterationCursor,
}

impl ActiveCursor<'_> {
    /// Next live entry. The table borrow ends before the entry is invoked.
    fn next(&mut self) -> Option<CallbackEntry> {
        let mut table = self.table.borrow_mut();
        let state = table.get_mut(&self.hook)?;
        let entry = self.cursor.next(state.registry_mut());
        if let Some(entry) = &entry {
            state.set_running(entry.priority);
        }
        let retired = state.registry_mut().take_retired();
        release(table, retired);
        entry
    }
}

impl Drop for ActiveCursor<'_> {
    fn drop(&mut self) {
        let mut table = self.table.borrow_mut();
        let Some(state) = table.get_mut(&self.hook) else {
            return;
        };
        self.cursor.close(state.registry_mut());
        state.pop_running();
        let retired = state.registry_mut().take_retired();
        release(table, retired);
    }
}
