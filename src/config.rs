//! Configuration file parser for ~/.config/shoplist/config.toml.
//!
//! The config file is optional — a missing file yields `Config::default()`,
//! which points at the household's bin. Unknown keys are accepted by serde but
//! logged as a warning, since they are usually typos.
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::util::validate_store_url;

/// The bin the list has always lived in.
pub const DEFAULT_STORE_URL: &str = "https://api.jsonbin.io/b/5eb6b361a47fdd6af16043d4";

/// Public cat picture service.
pub const DEFAULT_CAT_API_BASE: &str = "https://cataas.com";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Which of the two storage API shapes the bin speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreShape {
    /// Whole list under `data`, replaced with PUT.
    Document,
    /// Mapping keyed by item name, merged with PATCH.
    Keyed,
}

/// Display names for the two people who share the list.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Shoppers {
    pub user_a: String,
    pub user_b: String,
}

impl Default for Shoppers {
    fn default() -> Self {
        Self {
            user_a: "User A".to_string(),
            user_b: "User B".to_string(),
        }
    }
}

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// URL of the bin holding the list.
    pub store_url: String,

    /// API shape of the bin.
    pub backend: StoreShape,

    /// Theme variant name ("dark" or "light").
    pub theme: String,

    /// Re-fetch the list before opening the add form or removing an item,
    /// narrowing (not closing) the window for lost updates between two users.
    pub refresh_before_edit: bool,

    /// Per-request timeout in seconds. 0 = wait forever.
    pub request_timeout_secs: u64,

    /// Base URL of the cat picture service.
    pub cat_api_base: String,

    /// Who can order items.
    pub shoppers: Shoppers,

    /// Keybinding overrides. Keys are action names, values are key strings.
    pub keybindings: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_url: DEFAULT_STORE_URL.to_string(),
            backend: StoreShape::Document,
            theme: "dark".to_string(),
            refresh_before_edit: true,
            request_timeout_secs: 20,
            cat_api_base: DEFAULT_CAT_API_BASE.to_string(),
            shoppers: Shoppers::default(),
            keybindings: HashMap::new(),
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 8] = [
        "store_url",
        "backend",
        "theme",
        "refresh_before_edit",
        "request_timeout_secs",
        "cat_api_base",
        "shoppers",
        "keybindings",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = std::fs::read_to_string(path)?;

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            backend = ?config.backend,
            theme = %config.theme,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Check values serde cannot: URLs must parse, the store must be HTTPS
    /// (localhost excepted), and the two shoppers need distinct names.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_store_url(&self.store_url)
            .map_err(|e| ConfigError::Invalid(format!("store_url: {}", e)))?;

        url::Url::parse(&self.cat_api_base)
            .map_err(|e| ConfigError::Invalid(format!("cat_api_base: {}", e)))?;

        let a = self.shoppers.user_a.trim();
        let b = self.shoppers.user_b.trim();
        if a.is_empty() || b.is_empty() {
            return Err(ConfigError::Invalid(
                "shoppers: both names must be non-empty".to_string(),
            ));
        }
        if a.eq_ignore_ascii_case(b) {
            return Err(ConfigError::Invalid(
                "shoppers: user_a and user_b must differ".to_string(),
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(test_name: &str, content: &str) -> (std::path::PathBuf, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("shoplist_config_test_{}", test_name));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.store_url, DEFAULT_STORE_URL);
        assert_eq!(config.backend, StoreShape::Document);
        assert_eq!(config.theme, "dark");
        assert!(config.refresh_before_edit);
        assert_eq!(config.request_timeout_secs, 20);
        assert_eq!(config.shoppers.user_a, "User A");
        assert!(config.keybindings.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/shoplist_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.backend, StoreShape::Document);
    }

    #[test]
    fn test_whitespace_file_returns_default() {
        let (dir, path) = write_config("whitespace", "  \n\n  ");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.theme, "dark");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_full_config() {
        let (dir, path) = write_config(
            "full",
            r#"
store_url = "https://bins.example.com/shopping"
backend = "keyed"
theme = "light"
refresh_before_edit = false
request_timeout_secs = 5
cat_api_base = "https://cats.example.com"

[shoppers]
user_a = "Ewan"
user_b = "Sofia"

[keybindings]
add_item = "+"
"#,
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(config.store_url, "https://bins.example.com/shopping");
        assert_eq!(config.backend, StoreShape::Keyed);
        assert_eq!(config.theme, "light");
        assert!(!config.refresh_before_edit);
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.shoppers.user_a, "Ewan");
        assert_eq!(config.shoppers.user_b, "Sofia");
        assert_eq!(
            config.keybindings.get("add_item").map(String::as_str),
            Some("+")
        );
        assert!(config.validate().is_ok());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_partial_shoppers_keep_defaults() {
        let (dir, path) = write_config("partial_shoppers", "[shoppers]\nuser_b = \"Sofia\"\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.shoppers.user_a, "User A");
        assert_eq!(config.shoppers.user_b, "Sofia");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_backend_is_parse_error() {
        let (dir, path) = write_config("bad_backend", "backend = \"sqlite\"\n");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let (dir, path) = write_config("unknown", "theme = \"dark\"\nlist_color = \"teal\"\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.theme, "dark");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_too_large_file_rejected() {
        let (dir, path) = write_config("too_large", &"#".repeat(1_048_577));
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_validate_rejects_plain_http_store() {
        let config = Config {
            store_url: "http://bins.example.com/shopping".to_string(),
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("store_url"));
    }

    #[test]
    fn test_validate_rejects_identical_shoppers() {
        let mut config = Config::default();
        config.shoppers.user_a = "Sam".to_string();
        config.shoppers.user_b = "sam".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_cat_base() {
        let config = Config {
            cat_api_base: "cats please".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
