use std::path::PathBuf;

use serde::Deserialize;

/// Settings of an [`Engine`](crate::Engine)
///
/// Deserializable so it can live in the host application's own config file.
///
/// ```rust
/// # use stencil::EngineConfig;
/// let config = EngineConfig::default().with_root("templates").with_autoescape(false);
/// assert!(config.cache);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// When set, every template and include must resolve inside this directory
    pub root: Option<PathBuf>,
    /// HTML-escape interpolated values, `html_` variables excepted
    pub autoescape: bool,
    /// Keep parsed templates in memory, keyed by resolved path
    pub cache: bool,
    /// How deep includes can nest before rendering fails
    pub max_include_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig { root: None, autoescape: true, cache: true, max_include_depth: 64 }
    }
}

impl EngineConfig {
    /// Enables root mode
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Turns autoescaping on or off
    pub fn with_autoescape(mut self, autoescape: bool) -> Self {
        self.autoescape = autoescape;
        self
    }

    /// Turns the template cache on or off
    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Sets the include nesting limit
    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.root, None);
        assert!(config.autoescape);
        assert!(config.cache);
        assert_eq!(config.max_include_depth, 64);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: EngineConfig = serde_json::from_value(json!({"root": "site", "cache": false})).unwrap();
        assert_eq!(config.root, Some(PathBuf::from("site")));
        assert!(!config.cache);
        assert!(config.autoescape);
        assert_eq!(config.max_include_depth, 64);
    }
}
