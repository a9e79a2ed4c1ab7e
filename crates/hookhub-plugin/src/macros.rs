//! Convenience macros for plugin development.

/// Macro for creating a plugin info struct.
///
/// # Example
/// ```rust,ignore
/// let info = plugin_info!(
///     id: "my-plugin",
///     name: "My Plugin",
///     version: "1.0.0",
///     description: "Does things",
///     author: "Dev"
/// );
/// ```
#[macro_export]
macro_rules! plugin_info {
    (
        id: $id:expr,
        name: $name:expr,
        version: $version:expr,
        description: $desc:expr,
        author: $author:expr
    ) => {
        $crate::plugin_info!(
            id: $id,
            name: $name,
            version: $version,
            description: $desc,
            author: $author,
            priority: 100
        )
    };
    (
        id: $id:expr,
        name: $name:expr,
        version: $version:expr,
        description: $desc:expr,
        author: $author:expr,
        priority: $priority:expr
    ) => {
        $crate::registry::PluginInfo {
            id: $id.to_string(),
            name: $name.to_string(),
            version: $version.to_string(),
            description: $desc.to_string(),
            author: $author.to_string(),
            priority: $priority,
        }
    };
}

/// Macro for building a fired-argument list from JSON-convertible values.
///
/// # Example
/// ```rust,ignore
/// engine.fire_action("save_post", &hook_args![post_id, "page", true]);
/// ```
#[macro_export]
macro_rules! hook_args {
    () => {
        ::std::vec::Vec::<$crate::hooks::Value>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::__serde_json::json!($value)),+]
    };
}
