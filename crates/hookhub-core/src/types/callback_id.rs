//! Callback identities used for deduplication and removal.
//!
//! Closures have no usable structural equality, so every registration carries
//! an explicit identity. Bound methods hold the owning instance, so two
//! instances of the same type stay distinct and an instance's address cannot
//! be reused while an identity for it exists.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use uuid::Uuid;

use crate::error::AppError;

/// Identity of a registered callback.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CallbackId {
    /// A free function, e.g. `wpautop`.
    Function(Arc<str>),
    /// An associated function, e.g. `Sanitizer::title`.
    Static {
        /// Owning type name.
        type_name: Arc<str>,
        /// Function name.
        method: Arc<str>,
    },
    /// A method bound to a live instance.
    Method {
        /// The owning instance, compared by allocation.
        instance: Instance,
        /// Method name.
        method: Arc<str>,
    },
    /// An opaque token minted for an anonymous closure.
    Token(Uuid),
}

impl CallbackId {
    /// Parse a callable name of the form `function` or `Type::method`.
    pub fn parse(callable: &str) -> Result<Self, AppError> {
        let segments: Vec<&str> = callable.split("::").collect();
        match segments.as_slice() {
            [function] => {
                validate_ident(function, callable)?;
                Ok(Self::Function(Arc::from(*function)))
            }
            [type_name, method] => {
                validate_ident(type_name, callable)?;
                validate_ident(method, callable)?;
                Ok(Self::Static {
                    type_name: Arc::from(*type_name),
                    method: Arc::from(*method),
                })
            }
            _ => Err(AppError::invalid_callback(format!(
                "unrecognized callable '{callable}': expected 'function' or 'Type::method'"
            ))),
        }
    }

    /// Identity of `method` bound to `instance`.
    ///
    /// The identity keeps `instance` alive for as long as it exists.
    pub fn method<T>(instance: &Arc<T>, method: &str) -> Result<Self, AppError>
    where
        T: Send + Sync + 'static,
    {
        validate_ident(method, method)?;
        Ok(Self::Method {
            instance: Instance(Arc::clone(instance) as Arc<dyn Any + Send + Sync>),
            method: Arc::from(method),
        })
    }

    /// A fresh identity for an anonymous closure.
    pub fn token() -> Self {
        Self::Token(Uuid::new_v4())
    }
}

impl fmt::Display for CallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(name) => write!(f, "{name}"),
            Self::Static { type_name, method } => write!(f, "{type_name}::{method}"),
            Self::Method { instance, method } => write!(f, "{:#x}->{method}", instance.addr()),
            Self::Token(token) => write!(f, "closure#{token}"),
        }
    }
}

/// Shared handle on the instance a method identity is bound to.
///
/// Equality and hashing use the allocation address only.
#[derive(Clone)]
pub struct Instance(Arc<dyn Any + Send + Sync>);

impl Instance {
    /// Address of the instance allocation.
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0).cast::<()>() as usize
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for Instance {}

impl Hash for Instance {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instance({:#x})", self.addr())
    }
}

fn validate_ident(segment: &str, callable: &str) -> Result<(), AppError> {
    let mut chars = segment.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_alphabetic() || first == '_')
                && chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(AppError::invalid_callback(format!(
            "unrecognized callable '{callable}': '{segment}' is not an identifier"
        )))
    }
}
