//! Callback, entry, and query types shared by the hook engine.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
pub use serde_json::Value;

use hookhub_core::types::{CallbackId, HookName, Priority};
use hookhub_core::AppResult;

/// Invocable body of a callback.
///
/// Receives the fired arguments truncated to the registration's arity. The
/// return value becomes the next filter input; actions discard it.
pub type CallbackFn = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

/// A callable paired with its identity, ready to be registered on a hook.
#[derive(Clone)]
pub struct Callback {
    id: CallbackId,
    invoke: CallbackFn,
    owner: Option<Arc<str>>,
}

impl Callback {
    /// Creates a callback with an explicit identity.
    pub fn new<F>(id: CallbackId, f: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self {
            id,
            invoke: Arc::new(f),
            owner: None,
        }
    }

    /// Creates a callback identified by a callable name such as `wpautop` or
    /// `Sanitizer::title`.
    ///
    /// Fails immediately when the name is not a recognizable callable.
    pub fn named<F>(callable: &str, f: F) -> AppResult<Self>
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Ok(Self::new(CallbackId::parse(callable)?, f))
    }

    /// Creates an anonymous callback with a freshly minted identity.
    ///
    /// Keep [`Callback::id`] around if the callback must be removed later.
    pub fn closure<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self::new(CallbackId::token(), f)
    }

    /// Creates a callback for `method` bound to `instance`.
    ///
    /// The instance is captured, so its identity stays valid for as long as
    /// the callback is registered.
    pub fn bound<T, F>(instance: &Arc<T>, method: &str, f: F) -> AppResult<Self>
    where
        T: Send + Sync + 'static,
        F: Fn(&T, &[Value]) -> Value + Send + Sync + 'static,
    {
        let id = CallbackId::method(instance, method)?;
        let target = Arc::clone(instance);
        Ok(Self::new(id, move |args| f(&target, args)))
    }

    /// Creates a side-effect-only callback; its return value is `null`.
    pub fn action<F>(id: CallbackId, f: F) -> Self
    where
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        Self::new(id, move |args| {
            f(args);
            Value::Null
        })
    }

    /// Tags the callback with the plugin that registered it.
    pub fn owned_by(mut self, owner: &str) -> Self {
        self.owner = Some(Arc::from(owner));
        self
    }

    /// Returns the callback identity.
    pub fn id(&self) -> &CallbackId {
        &self.id
    }

    /// Returns the owning plugin, if any.
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Binds the callback to a position on a hook.
    pub(crate) fn into_entry(self, priority: Priority, arity: usize) -> CallbackEntry {
        CallbackEntry {
            id: self.id,
            priority,
            arity,
            owner: self.owner,
            invoke: self.invoke,
        }
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("invoke", &"<callback>")
            .finish()
    }
}

/// A callback registered on a hook at a given priority.
#[derive(Clone)]
pub struct CallbackEntry {
    /// Identity used for deduplication and removal.
    pub id: CallbackId,
    /// Position on the hook (lower runs first).
    pub priority: Priority,
    /// Maximum number of fired arguments passed to the callable.
    pub arity: usize,
    /// Plugin that registered this entry.
    pub owner: Option<Arc<str>>,
    invoke: CallbackFn,
}

impl CallbackEntry {
    /// Invokes the callable with at most `arity` leading arguments.
    pub fn invoke(&self, args: &[Value]) -> Value {
        let take = self.arity.min(args.len());
        (self.invoke)(&args[..take])
    }

    /// Invokes the callable with every argument, ignoring arity.
    pub(crate) fn invoke_all(&self, args: &[Value]) -> Value {
        (self.invoke)(args)
    }

    /// Returns whether this entry was registered by `owner`.
    pub fn is_owned_by(&self, owner: &str) -> bool {
        self.owner.as_deref() == Some(owner)
    }
}

impl fmt::Debug for CallbackEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackEntry")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("arity", &self.arity)
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

/// Answer to a "is this hook / callback registered" query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HasResult {
    /// No identity was given: whether the hook has any live callback.
    Any(bool),
    /// An identity was given: the lowest priority it is registered at.
    At(Option<Priority>),
}

impl HasResult {
    /// Collapses the answer to a plain boolean.
    pub fn is_registered(&self) -> bool {
        match self {
            Self::Any(any) => *any,
            Self::At(priority) => priority.is_some(),
        }
    }

    /// The matching priority, when the query named an identity.
    pub fn priority(&self) -> Option<Priority> {
        match self {
            Self::Any(_) => None,
            Self::At(priority) => *priority,
        }
    }
}

/// Introspection snapshot for one hook.
#[derive(Debug, Clone, Serialize)]
pub struct HookStats {
    /// Hook name.
    pub name: HookName,
    /// Number of live callbacks.
    pub callbacks: usize,
    /// Times the hook has been fired as an action or filter.
    pub times_fired: u64,
    /// How many fires of this hook are currently on the stack.
    pub firing_depth: usize,
    /// When the hook was last fired.
    pub last_fired: Option<DateTime<Utc>>,
}
