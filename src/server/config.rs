//! Configuration loading for agrod.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.agrogate/config.toml` (user)
//! 3. `/etc/agrogate/config.toml` (system)
//!
//! Secrets are loaded separately with mandatory permission checks:
//! 1. `~/.agrogate/secrets.toml` (user, must be 0600)
//! 2. `/etc/agrogate/secrets.toml` (system, must be 0600)
//!
//! Individual secrets fall back to environment variables
//! (`AGROGATE_JWT_SECRET`, `GOOGLE_API_KEY`) when absent from the file.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{AgrogateError, Result};

/// Server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub advisor: Option<AdvisorConfig>,
}

/// Server network configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:5000).
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            limits: LimitsConfig::default(),
        }
    }
}

fn default_address() -> String {
    "127.0.0.1:5000".to_string()
}

/// Resource limits.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Request timeout in seconds (default: 30). Bounds the whole request,
    /// model inference included.
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

/// Model artifact configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// Directory holding the serialized model artifacts.
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            artifacts_dir: default_artifacts_dir(),
        }
    }
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

/// Token issuance configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Access token lifetime in seconds (default: 3600).
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_secs: default_token_ttl(),
        }
    }
}

fn default_token_ttl() -> i64 {
    3600
}

/// Advisor configuration. The advisor is only enabled when this section is
/// present and a Google API key is available.
#[derive(Debug, Clone, Deserialize)]
pub struct AdvisorConfig {
    /// Generative model name (default: gemini-1.5-flash).
    #[serde(default = "default_advisor_model")]
    pub model: String,
    /// Reply cache; omit to disable caching.
    #[serde(default)]
    pub cache: Option<CacheLimits>,
}

fn default_advisor_model() -> String {
    "gemini-1.5-flash".to_string()
}

/// Advisor reply cache limits.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheLimits {
    #[serde(default = "default_cache_entries")]
    pub max_entries: u64,
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

fn default_cache_entries() -> u64 {
    10_000
}

fn default_cache_ttl() -> u64 {
    3600
}

/// Secrets configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Secrets {
    /// JWT signing secret.
    #[serde(default)]
    pub jwt: Option<SecretValue>,
    /// Google generative-language API key.
    #[serde(default)]
    pub google: Option<SecretValue>,
}

/// A single named secret.
#[derive(Debug, Clone, Deserialize)]
pub struct SecretValue {
    pub secret: String,
}

/// Secret name → environment variable fallback mapping.
const SECRET_ENV_VARS: &[(&str, &str)] = &[
    ("jwt", "AGROGATE_JWT_SECRET"),
    ("google", "GOOGLE_API_KEY"),
];

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided)
    /// 2. `~/.agrogate/config.toml`
    /// 3. `/etc/agrogate/config.toml`
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_config_path(explicit_path)?;
        let content = fs::read_to_string(&path).map_err(|e| {
            AgrogateError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            AgrogateError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(path.to_path_buf());
            }
            return Err(AgrogateError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".agrogate").join("config.toml");
            if user_config.exists() {
                return Ok(user_config);
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/agrogate/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }

        Err(AgrogateError::Configuration(
            "No config file found. Create ~/.agrogate/config.toml or /etc/agrogate/config.toml"
                .to_string(),
        ))
    }
}

impl Secrets {
    /// Load secrets from the standard locations with permission checks.
    ///
    /// Resolution order:
    /// 1. `~/.agrogate/secrets.toml` (if exists, must be 0600)
    /// 2. `/etc/agrogate/secrets.toml` (if exists, must be 0600)
    ///
    /// Returns empty secrets if no file exists (values may come from env vars).
    pub fn load() -> Result<Self> {
        if let Some(home) = dirs::home_dir() {
            let user_secrets = home.join(".agrogate").join("secrets.toml");
            if user_secrets.exists() {
                Self::check_permissions(&user_secrets)?;
                return Self::load_from_file(&user_secrets);
            }
        }

        let system_secrets = PathBuf::from("/etc/agrogate/secrets.toml");
        if system_secrets.exists() {
            Self::check_permissions(&system_secrets)?;
            return Self::load_from_file(&system_secrets);
        }

        Ok(Secrets::default())
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AgrogateError::Configuration(format!("Failed to read secrets file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            AgrogateError::Configuration(format!("Failed to parse secrets file {path:?}: {e}"))
        })
    }

    /// Check that the secrets file has secure permissions (0600 or 0400).
    #[cfg(unix)]
    fn check_permissions(path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let metadata = fs::metadata(path).map_err(|e| {
            AgrogateError::Configuration(format!("Failed to stat secrets file {path:?}: {e}"))
        })?;

        let mode = metadata.permissions().mode();
        // Reject if group or other bits are set
        if mode & 0o077 != 0 {
            return Err(AgrogateError::Configuration(format!(
                "Secrets file {path:?} has insecure permissions {:o}. Must be 0600 or 0400.",
                mode & 0o777
            )));
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn check_permissions(_path: &Path) -> Result<()> {
        // Permission check not available on non-Unix platforms
        Ok(())
    }

    /// Get a secret by name, falling back to the corresponding environment
    /// variable.
    pub fn secret(&self, name: &str) -> Option<String> {
        let from_file = match name {
            "jwt" => self.jwt.as_ref(),
            "google" => self.google.as_ref(),
            _ => None,
        }
        .map(|s| s.secret.clone());

        from_file.or_else(|| {
            SECRET_ENV_VARS
                .iter()
                .find(|(secret_name, _)| *secret_name == name)
                .and_then(|(_, env_var)| std::env::var(env_var).ok())
        })
    }
}
