//! Application configuration for Curricle.
//!
//! User config lives at `~/.curricle/curricle.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CurricleError, Result};
use crate::types::Scope;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "curricle.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".curricle";

// ---------------------------------------------------------------------------
// Config structs (matching curricle.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Catalog backend settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Encyclopedia API settings.
    #[serde(default)]
    pub wikipedia: WikipediaConfig,

    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Backend credential env var names.
    #[serde(default)]
    pub auth: AuthConfig,
}

/// `[backend]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the catalog backend.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Default institution URI slug for scoped commands.
    #[serde(default)]
    pub institution: Option<String>,

    /// Default department URI slug for scoped commands.
    #[serde(default)]
    pub department: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            institution: None,
            department: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:5000/".into()
}

/// `[wikipedia]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikipediaConfig {
    /// MediaWiki API endpoint used for search and metadata.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WikipediaConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_url() -> String {
    "https://en.wikipedia.org/w/api.php".into()
}
fn default_timeout_secs() -> u64 {
    10
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Rows per page for paged unit/topic listings.
    #[serde(default = "default_items_per_page")]
    pub items_per_page: u64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            items_per_page: default_items_per_page(),
        }
    }
}

fn default_items_per_page() -> u64 {
    20
}

/// `[auth]` section. Names of the env vars holding backend credentials
/// (never the credentials themselves).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Env var holding the backend username.
    #[serde(default = "default_username_env")]
    pub username_env: String,

    /// Env var holding the backend password.
    #[serde(default = "default_password_env")]
    pub password_env: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username_env: default_username_env(),
            password_env: default_password_env(),
        }
    }
}

fn default_username_env() -> String {
    "CURRICLE_USER".into()
}
fn default_password_env() -> String {
    "CURRICLE_PASS".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.curricle/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CurricleError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.curricle/curricle.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CurricleError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| CurricleError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| CurricleError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| CurricleError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CurricleError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

// ---------------------------------------------------------------------------
// Scope and credential resolution
// ---------------------------------------------------------------------------

/// Resolve the working institution/department scope. CLI flags win over
/// the config file; an unset pair is a config error.
pub fn resolve_scope(
    config: &AppConfig,
    institution: Option<&str>,
    department: Option<&str>,
) -> Result<Scope> {
    let institution = institution
        .map(str::to_string)
        .or_else(|| config.backend.institution.clone())
        .ok_or_else(|| {
            CurricleError::config(
                "no institution selected. Pass --inst or set backend.institution in the config file.",
            )
        })?;

    let department = department
        .map(str::to_string)
        .or_else(|| config.backend.department.clone())
        .ok_or_else(|| {
            CurricleError::config(
                "no department selected. Pass --dept or set backend.department in the config file.",
            )
        })?;

    Ok(Scope::new(institution, department))
}

/// Read backend credentials from the env vars named in `[auth]`.
pub fn load_credentials(config: &AppConfig) -> Result<(String, String)> {
    let user_var = &config.auth.username_env;
    let pass_var = &config.auth.password_env;

    let user = std::env::var(user_var).ok().filter(|v| !v.is_empty());
    let pass = std::env::var(pass_var).ok().filter(|v| !v.is_empty());

    match (user, pass) {
        (Some(user), Some(pass)) => Ok((user, pass)),
        _ => Err(CurricleError::config(format!(
            "backend credentials not found. Set the {user_var} and {pass_var} environment variables."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("base_url"));
        assert!(toml_str.contains("CURRICLE_USER"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.items_per_page, 20);
        assert_eq!(parsed.wikipedia.api_url, "https://en.wikipedia.org/w/api.php");
        assert_eq!(parsed.wikipedia.timeout_secs, 10);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[backend]
base_url = "https://catalog.example.edu/"
institution = "mq"
department = "computing"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.backend.base_url, "https://catalog.example.edu/");
        assert_eq!(config.backend.institution.as_deref(), Some("mq"));
        assert_eq!(config.defaults.items_per_page, 20);
    }

    #[test]
    fn scope_flags_override_config() {
        let mut config = AppConfig::default();
        config.backend.institution = Some("mq".into());
        config.backend.department = Some("computing".into());

        let scope = resolve_scope(&config, None, None).expect("scope from config");
        assert_eq!(scope.to_string(), "mq/computing");

        let scope = resolve_scope(&config, Some("uts"), None).expect("flag overrides");
        assert_eq!(scope.institution, "uts");
        assert_eq!(scope.department, "computing");
    }

    #[test]
    fn scope_missing_is_config_error() {
        let config = AppConfig::default();
        let err = resolve_scope(&config, None, Some("computing")).unwrap_err();
        assert!(err.to_string().contains("no institution selected"));
    }

    #[test]
    fn credentials_missing_is_config_error() {
        let mut config = AppConfig::default();
        // Use unique env var names to avoid interfering with other tests
        config.auth.username_env = "CURRICLE_TEST_NO_USER_98131".into();
        config.auth.password_env = "CURRICLE_TEST_NO_PASS_98131".into();
        let err = load_credentials(&config).unwrap_err();
        assert!(err.to_string().contains("CURRICLE_TEST_NO_USER_98131"));
    }
}
