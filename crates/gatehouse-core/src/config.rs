//! Configuration management for Gatehouse.
//!
//! Loads configuration from ${GATEHOUSE_HOME}/config.toml with sensible defaults.
//! Connection settings resolve with precedence env > config > default.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable for the hosted auth service base URL.
pub const SERVICE_URL_ENV: &str = "GATEHOUSE_SERVICE_URL";
/// Environment variable for the public (anon) API key.
pub const ANON_KEY_ENV: &str = "GATEHOUSE_ANON_KEY";
/// Environment variable for the password reset redirect URL.
pub const RESET_REDIRECT_ENV: &str = "GATEHOUSE_RESET_REDIRECT";

/// Which auth backend the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// GoTrue-compatible hosted service (default).
    #[default]
    Hosted,
    /// Local in-memory stand-in (offline demo mode).
    Memory,
}

impl BackendKind {
    pub fn display_name(self) -> &'static str {
        match self {
            BackendKind::Hosted => "hosted",
            BackendKind::Memory => "memory",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hosted" => Ok(BackendKind::Hosted),
            "memory" => Ok(BackendKind::Memory),
            other => anyhow::bail!("Unknown backend '{other}'. Expected 'hosted' or 'memory'."),
        }
    }
}

/// Path resolution for Gatehouse configuration and data directories.
pub mod paths {
    //! `GATEHOUSE_HOME` resolution order:
    //! 1. `GATEHOUSE_HOME` environment variable (if set)
    //! 2. ~/.config/gatehouse (default)

    use std::path::PathBuf;

    /// Returns the Gatehouse home directory.
    pub fn gatehouse_home() -> PathBuf {
        if let Ok(home) = std::env::var("GATEHOUSE_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .map_or_else(|| PathBuf::from(".gatehouse"), |h| h.join(".config").join("gatehouse"))
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        gatehouse_home().join("config.toml")
    }

    /// Returns the path to the persisted session file.
    pub fn session_path() -> PathBuf {
        gatehouse_home().join("session.json")
    }

    /// Returns the directory for log files.
    pub fn logs_dir() -> PathBuf {
        gatehouse_home().join("logs")
    }
}

/// Returns the default config template with comments.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Auth backend to use.
    pub backend: BackendKind,
    /// Base URL of the hosted auth service (e.g. `https://<project>.supabase.co`).
    pub service_url: Option<String>,
    /// Public API key sent with every request.
    pub anon_key: Option<String>,
    /// Where password reset emails send the user.
    pub password_reset_redirect: Option<String>,
    /// Per-request timeout in seconds (0 disables the timeout).
    pub request_timeout_secs: u64,
    /// Persist the session to `${GATEHOUSE_HOME}/session.json`.
    pub persist_session: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            service_url: None,
            anon_key: None,
            password_reset_redirect: None,
            request_timeout_secs: Self::DEFAULT_REQUEST_TIMEOUT_SECS,
            persist_session: true,
        }
    }
}

impl Config {
    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

    /// Loads configuration from the default path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    ///
    /// # Errors
    /// Returns an error if the file exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        if self.request_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.request_timeout_secs))
        }
    }

    /// Returns the validated service URL (env > config).
    ///
    /// # Errors
    /// Returns an error if no URL is configured or the URL is malformed.
    pub fn effective_service_url(&self) -> Result<String> {
        let url = resolve_setting(
            std::env::var(SERVICE_URL_ENV).ok(),
            self.service_url.as_deref(),
        )
        .with_context(|| {
            format!(
                "No auth service URL configured. Set {SERVICE_URL_ENV} or service_url in {}.",
                paths::config_path().display()
            )
        })?;
        validate_url(&url)?;
        Ok(url.trim_end_matches('/').to_string())
    }

    /// Returns the anon key (env > config).
    ///
    /// # Errors
    /// Returns an error if no key is configured.
    pub fn effective_anon_key(&self) -> Result<String> {
        resolve_setting(std::env::var(ANON_KEY_ENV).ok(), self.anon_key.as_deref()).with_context(
            || {
                format!(
                    "No anon key configured. Set {ANON_KEY_ENV} or anon_key in {}.",
                    paths::config_path().display()
                )
            },
        )
    }

    /// Returns the password reset redirect URL, if any (env > config).
    pub fn effective_reset_redirect(&self) -> Option<String> {
        resolve_setting(
            std::env::var(RESET_REDIRECT_ENV).ok(),
            self.password_reset_redirect.as_deref(),
        )
    }

    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

/// Picks the first non-blank value: env first, then config.
fn resolve_setting(env_value: Option<String>, config_value: Option<&str>) -> Option<String> {
    env_value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| config_value.map(str::trim).filter(|v| !v.is_empty()))
        .map(ToString::to_string)
}

fn validate_url(url: &str) -> Result<()> {
    let parsed =
        url::Url::parse(url).with_context(|| format!("Invalid auth service URL: {url}"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("Invalid auth service URL: {url} (expected http or https)");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nonexistent.toml");

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.backend, BackendKind::Hosted);
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.persist_session);
        assert!(config.service_url.is_none());
    }

    #[test]
    fn test_load_partial_config_merges_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(
            &config_path,
            "backend = \"memory\"\nservice_url = \"https://demo.example.com\"\n",
        )
        .unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.backend, BackendKind::Memory);
        assert_eq!(
            config.service_url.as_deref(),
            Some("https://demo.example.com")
        );
        assert!(config.persist_session);
    }

    #[test]
    fn test_load_invalid_toml_is_error() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "backend = [").unwrap();

        let err = Config::load_from(&config_path).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config"));
    }

    #[test]
    fn test_init_creates_config_with_template() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("subdir").join("config.toml");

        Config::init(&config_path).unwrap();

        assert!(config_path.exists());
        let contents = fs::read_to_string(&config_path).unwrap();
        assert!(contents.contains("backend ="));
        assert!(contents.contains("# service_url ="));

        // Template must parse back into the defaults.
        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_init_fails_if_exists() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(&config_path, "").unwrap();

        let result = Config::init(&config_path);
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_setting_prefers_env() {
        assert_eq!(
            resolve_setting(Some("https://env".into()), Some("https://config")).as_deref(),
            Some("https://env")
        );
        assert_eq!(
            resolve_setting(Some("   ".into()), Some("https://config")).as_deref(),
            Some("https://config")
        );
        assert_eq!(resolve_setting(None, Some("  ")), None);
    }

    #[test]
    fn test_validate_url_rejects_non_http() {
        assert!(validate_url("https://abc.supabase.co").is_ok());
        assert!(validate_url("ftp://abc").is_err());
        assert!(validate_url("not a url").is_err());
    }

    #[test]
    fn test_backend_kind_from_str() {
        assert_eq!("Memory".parse::<BackendKind>().unwrap(), BackendKind::Memory);
        assert_eq!(" hosted ".parse::<BackendKind>().unwrap(), BackendKind::Hosted);
        assert!("firebase".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_request_timeout_zero_disables() {
        let config = Config {
            request_timeout_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.request_timeout(), None);
        assert_eq!(
            Config::default().request_timeout(),
            Some(Duration::from_secs(30))
        );
    }
}
