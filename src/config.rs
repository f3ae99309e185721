//! # Client Configuration
//!
//! Configuration management for the sign-transfer library and CLI.
//! Supports environment variables, config files, and command-line overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};

/// REST API path appended to the platform base URI.
pub const DEFAULT_API_PATH: &str = "api/rest/v6/";

/// Page size requested when listing library documents.
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Client configuration for API connections and transfer behavior
///
/// # Examples
///
/// ```rust
/// use sign_transfer::config::ClientConfig;
///
/// let config = ClientConfig::default();
/// assert_eq!(config.api.api_path, "api/rest/v6/");
/// assert_eq!(config.api.page_size, 1000);
/// assert!(config.transfer.continue_on_error);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// E-signature REST API settings
    #[serde(default)]
    pub api: ApiEndpointConfig,
    /// Template transfer settings
    #[serde(default)]
    pub transfer: TransferConfig,
}

/// API endpoint configuration
///
/// ```rust
/// use sign_transfer::config::ApiEndpointConfig;
///
/// let config = ApiEndpointConfig {
///     base_url: "https://api.na1.example.com/".to_string(),
///     integration_key: Some("3AAABLblqZhB".to_string()),
///     ..Default::default()
/// };
/// assert_eq!(config.api_base_url(), "https://api.na1.example.com/api/rest/v6/");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiEndpointConfig {
    /// Platform base URI (e.g., "<https://api.na1.example.com/>")
    pub base_url: String,
    /// REST path appended to `base_url`
    pub api_path: String,
    /// Integration key sent as the bearer credential
    pub integration_key: Option<String>,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// Page size for library document listing
    pub page_size: u32,
}

/// Transfer defaults, overridable per CLI invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Account the templates are read from
    pub sender: Option<String>,
    /// Account the templates are created for
    pub receiver: Option<String>,
    /// Keep cloning the remaining templates when one bulk clone fails
    pub continue_on_error: bool,
}

impl Default for ApiEndpointConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.echosign.com/".to_string(),
            api_path: DEFAULT_API_PATH.to_string(),
            integration_key: None,
            timeout_ms: 30000,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            sender: None,
            receiver: None,
            continue_on_error: true,
        }
    }
}

impl ApiEndpointConfig {
    /// Full REST base URL: `base_url` + `api_path`, joined by exactly one `/`
    ///
    /// A `base_url` that already ends with `api_path` is returned as is.
    #[must_use]
    pub fn api_base_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = self.api_path.trim_matches('/');

        if path.is_empty() || base.ends_with(&format!("/{}", path)) {
            return format!("{}/", base);
        }

        format!("{}/{}/", base, path)
    }
}

impl ClientConfig {
    /// Load configuration from environment variables and config file
    ///
    /// Precedence (highest to lowest):
    /// 1. Environment variables
    /// 2. Config file (./sign-transfer.toml, ~/.sign-transfer/config.toml, ...)
    /// 3. Default values
    pub fn load() -> ClientResult<Self> {
        Self::load_discovered(Self::find_config_file().as_deref())
    }

    /// Defaults, overlaid by `config_path` when one was found, then the environment
    ///
    /// A file that exists but does not parse is an error rather than silently
    /// replaced by defaults.
    fn load_discovered(config_path: Option<&Path>) -> ClientResult<Self> {
        let mut config = match config_path {
            Some(config_path) => {
                debug!("Loading config from: {}", config_path.display());
                Self::load_from_file(config_path).inspect_err(|e| {
                    warn!(path = %config_path.display(), error = %e, "Unusable config file");
                })?
            }
            None => Self::default(),
        };

        config.apply_env_overrides();

        debug!(
            base_url = %config.api.base_url,
            has_integration_key = config.api.integration_key.is_some(),
            "Loaded client configuration"
        );
        Ok(config)
    }

    /// Load configuration from a specific file, then apply environment overrides
    pub fn load_with_file(path: &Path) -> ClientResult<Self> {
        let mut config = Self::load_from_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ClientError::config_error(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            ClientError::config_error(format!("Failed to parse config file: {}", e))
        })?;

        Ok(config)
    }

    fn find_config_file() -> Option<PathBuf> {
        let mut possible_paths = vec![
            PathBuf::from("./sign-transfer.toml"),
            PathBuf::from("./config/sign-transfer.toml"),
        ];
        if let Some(home) = dirs::home_dir() {
            possible_paths.push(home.join(".sign-transfer").join("config.toml"));
        }
        if let Some(config_dir) = dirs::config_dir() {
            possible_paths.push(config_dir.join("sign-transfer").join("config.toml"));
        }

        possible_paths
            .into_iter()
            .find(|path| path.exists() && path.is_file())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("INTEGRATION_KEY") {
            self.api.integration_key = Some(key);
        }
        if let Ok(url) = std::env::var("BASE_URI") {
            self.api.base_url = url;
        }
        if let Ok(path) = std::env::var("SIGN_API_PATH") {
            self.api.api_path = path;
        }
        if let Ok(timeout) = std::env::var("SIGN_TIMEOUT_MS") {
            if let Ok(timeout_ms) = timeout.parse() {
                self.api.timeout_ms = timeout_ms;
            }
        }
        if let Ok(page_size) = std::env::var("SIGN_PAGE_SIZE") {
            if let Ok(page_size) = page_size.parse() {
                self.api.page_size = page_size;
            }
        }

        if let Ok(sender) = std::env::var("SIGN_SENDER") {
            self.transfer.sender = Some(sender);
        }
        if let Ok(receiver) = std::env::var("SIGN_RECEIVER") {
            self.transfer.receiver = Some(receiver);
        }
    }

    /// Check that the configuration can be used to reach the API
    pub fn validate(&self) -> ClientResult<()> {
        match self.api.integration_key.as_deref() {
            Some(key) if !key.trim().is_empty() => {}
            _ => {
                return Err(ClientError::config_error(
                    "Integration key is not set (INTEGRATION_KEY)",
                ))
            }
        }

        reqwest::Url::parse(&self.api.api_base_url()).map_err(|e| {
            ClientError::config_error(format!(
                "Invalid base URL '{}': {}",
                self.api.base_url, e
            ))
        })?;

        if self.api.timeout_ms == 0 {
            return Err(ClientError::config_error("timeout_ms must be greater than 0"));
        }
        if self.api.page_size == 0 {
            return Err(ClientError::config_error("page_size must be greater than 0"));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: &Path) -> ClientResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ClientError::config_error(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ClientError::config_error(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            ClientError::config_error(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// Get default config file path
    pub fn default_config_path() -> ClientResult<PathBuf> {
        let home_dir = dirs::home_dir()
            .ok_or_else(|| ClientError::config_error("Could not determine home directory"))?;

        Ok(home_dir.join(".sign-transfer").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    const ENV_VARS: [&str; 7] = [
        "INTEGRATION_KEY",
        "BASE_URI",
        "SIGN_API_PATH",
        "SIGN_TIMEOUT_MS",
        "SIGN_PAGE_SIZE",
        "SIGN_SENDER",
        "SIGN_RECEIVER",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.api.api_path, "api/rest/v6/");
        assert_eq!(config.api.timeout_ms, 30000);
        assert_eq!(config.api.page_size, 1000);
        assert!(config.api.integration_key.is_none());
        assert!(config.transfer.sender.is_none());
    }

    #[test]
    fn test_api_base_url_joins_with_single_separator() {
        let mut api = ApiEndpointConfig::default();
        for base in [
            "https://api.na1.example.com",
            "https://api.na1.example.com/",
            "https://api.na1.example.com//",
        ] {
            api.base_url = base.to_string();
            assert_eq!(api.api_base_url(), "https://api.na1.example.com/api/rest/v6/");
        }

        api.base_url = "https://api.na1.example.com/api/rest/v6".to_string();
        assert_eq!(api.api_base_url(), "https://api.na1.example.com/api/rest/v6/");

        api.api_path = String::new();
        api.base_url = "https://api.na1.example.com/custom".to_string();
        assert_eq!(api.api_base_url(), "https://api.na1.example.com/custom/");
    }

    #[test]
    fn test_validate_requires_integration_key() {
        let mut config = ClientConfig::default();
        assert!(matches!(config.validate(), Err(ClientError::ConfigError(_))));

        config.api.integration_key = Some("  ".to_string());
        assert!(config.validate().is_err());

        config.api.integration_key = Some("key".to_string());
        assert!(config.validate().is_ok());

        config.api.page_size = 0;
        assert!(config.validate().is_err());
        config.api.page_size = 10;

        config.api.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("sign-transfer.toml");

        let mut original_config = ClientConfig::default();
        original_config.api.integration_key = Some("secret".to_string());
        original_config.transfer.sender = Some("alice@example.com".to_string());
        original_config.save_to_file(&config_path).unwrap();

        let loaded_config = ClientConfig::load_from_file(&config_path).unwrap();
        assert_eq!(loaded_config.api.base_url, original_config.api.base_url);
        assert_eq!(loaded_config.api.integration_key.as_deref(), Some("secret"));
        assert_eq!(
            loaded_config.transfer.sender.as_deref(),
            Some("alice@example.com")
        );
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("partial.toml");
        std::fs::write(
            &config_path,
            "[api]\nbase_url = \"https://api.eu1.example.com/\"\n",
        )
        .unwrap();

        let config = ClientConfig::load_from_file(&config_path).unwrap();
        assert_eq!(config.api.base_url, "https://api.eu1.example.com/");
        assert_eq!(config.api.page_size, DEFAULT_PAGE_SIZE);
        assert!(config.transfer.continue_on_error);
    }

    #[test]
    fn test_load_from_missing_file_is_config_error() {
        let result = ClientConfig::load_from_file(Path::new("/nonexistent/sign-transfer.toml"));
        assert!(matches!(result, Err(ClientError::ConfigError(_))));
    }

    #[test]
    #[serial]
    fn test_malformed_discovered_file_is_config_error() {
        clear_env();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("sign-transfer.toml");
        std::fs::write(&config_path, "[api\nintegration_key = \"k\"\n").unwrap();

        match ClientConfig::load_discovered(Some(&config_path)) {
            Err(ClientError::ConfigError(message)) => {
                assert!(message.contains("Failed to parse config file"), "{}", message);
            }
            other => panic!("expected ConfigError, got {:?}", other),
        }

        let config = ClientConfig::load_discovered(None).unwrap();
        assert_eq!(config.api.page_size, DEFAULT_PAGE_SIZE);
        assert!(config.api.integration_key.is_none());
    }

    #[test]
    #[serial]
    fn test_env_overrides_take_precedence() {
        clear_env();
        std::env::set_var("INTEGRATION_KEY", "env-key");
        std::env::set_var("BASE_URI", "https://api.au1.example.com/");
        std::env::set_var("SIGN_TIMEOUT_MS", "5000");
        std::env::set_var("SIGN_PAGE_SIZE", "not-a-number");
        std::env::set_var("SIGN_RECEIVER", "bob@example.com");

        let mut config = ClientConfig::default();
        config.api.integration_key = Some("file-key".to_string());
        config.apply_env_overrides();

        assert_eq!(config.api.integration_key.as_deref(), Some("env-key"));
        assert_eq!(
            config.api.api_base_url(),
            "https://api.au1.example.com/api/rest/v6/"
        );
        assert_eq!(config.api.timeout_ms, 5000);
        assert_eq!(config.api.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.transfer.receiver.as_deref(), Some("bob@example.com"));
        assert!(config.transfer.sender.is_none());

        clear_env();
    }
}
