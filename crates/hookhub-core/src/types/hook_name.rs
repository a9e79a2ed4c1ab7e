//! Interned hook names.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AppError;

/// Name of an extension point.
///
/// Cloning is a reference-count bump; the hook table hands out the same
/// allocation for every lookup of a given name. Names are open-ended: dynamic
/// variants are built with plain string formatting and each resulting string
/// is an unrelated hook.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HookName(Arc<str>);

impl HookName {
    /// Create a hook name, rejecting the empty string.
    pub fn new(name: &str) -> Result<Self, AppError> {
        if name.is_empty() {
            return Err(AppError::invalid_hook_name("hook name must not be empty"));
        }
        Ok(Self(Arc::from(name)))
    }

    /// Return the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HookName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for HookName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for HookName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for HookName {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for HookName {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl TryFrom<&str> for HookName {
    type Error = AppError;

    fn try_from(name: &str) -> Result<Self, Self::Error> {
        Self::new(name)
    }
}

impl Serialize for HookName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for HookName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::new(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_rejects_empty() {
        assert!(HookName::new("").is_err());
        assert!(HookName::try_from("save_post").is_ok());
    }

    #[test]
    fn test_lookup_by_str() {
        let mut map = HashMap::new();
        map.insert(HookName::new("the_content").expect("valid"), 1);
        assert_eq!(map.get("the_content"), Some(&1));
        assert_eq!(map.get("the_title"), None);
    }

    #[test]
    fn test_serde_roundtrip() {
        let name = HookName::new("save_post_page").expect("valid");
        let json = serde_json::to_string(&name).expect("serialize");
        assert_eq!(json, "\"save_post_page\"");
        let parsed: HookName = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, name);
        assert!(serde_json::from_str::<HookName>("\"\"").is_err());
    }
}
