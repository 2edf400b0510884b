//! Studio configuration.
//!
//! Resolution order for the config file:
//! 1. explicit path (command-line argument)
//! 2. `TRYON_CONFIG` environment variable
//! 3. `<config dir>/tryon/config.toml`
//! 4. built-in defaults
//!
//! An explicit or env-named file must exist. The platform file is optional.
//! Keys missing from a file fall back to their defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::domain::TryOnError;

pub const CONFIG_ENV_VAR: &str = "TRYON_CONFIG";
const APP_DIR: &str = "tryon";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// Quiet period after the last selection change before a preview is requested.
    pub settle_delay_ms: u64,
    /// Where saved looks and measurements are kept.
    pub data_dir: PathBuf,
    /// Suggested file name for downloads.
    pub export_file_name: String,
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub base_url: String,
    pub image_model: String,
    pub text_model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 800,
            data_dir: default_data_dir(),
            export_file_name: "look.png".to_string(),
            gateway: GatewayConfig::default(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            image_model: "gemini-2.5-flash-image-preview".to_string(),
            text_model: "gemini-2.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 60,
        }
    }
}

impl StudioConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn from_toml(contents: &str) -> Result<Self, TryOnError> {
        toml::from_str(contents).map_err(|e| TryOnError::Config(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, TryOnError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| TryOnError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml(&contents)
            .map_err(|e| TryOnError::Config(format!("{}: {e}", path.display())))
    }

    /// Load using the resolution order in the module docs.
    pub fn load(explicit: Option<&Path>) -> Result<Self, TryOnError> {
        let env_path = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        match resolve_config_path(explicit, env_path, default_config_file()) {
            ConfigSource::Required(path) => {
                debug!(path = %path.display(), "loading config");
                Self::from_file(&path)
            }
            ConfigSource::Optional(path) if path.exists() => {
                debug!(path = %path.display(), "loading config");
                Self::from_file(&path)
            }
            ConfigSource::Optional(_) | ConfigSource::Defaults => Ok(Self::default()),
        }
    }
}

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn api_key(&self) -> Result<String, TryOnError> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| TryOnError::Config(format!("{} is not set", self.api_key_env)))
    }
}

#[derive(Debug, PartialEq)]
enum ConfigSource {
    Required(PathBuf),
    Optional(PathBuf),
    Defaults,
}

fn resolve_config_path(
    explicit: Option<&Path>,
    env_path: Option<PathBuf>,
    platform_path: Option<PathBuf>,
) -> ConfigSource {
    if let Some(path) = explicit {
        return ConfigSource::Required(path.to_path_buf());
    }
    if let Some(path) = env_path.filter(|p| !p.as_os_str().is_empty()) {
        return ConfigSource::Required(path);
    }
    match platform_path {
        Some(path) => ConfigSource::Optional(path),
        None => ConfigSource::Defaults,
    }
}

fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("./tryon_data"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_file_gives_defaults() {
        let config = StudioConfig::from_toml("").unwrap();
        assert_eq!(config, StudioConfig::default());
        assert_eq!(config.settle_delay(), Duration::from_millis(800));
        assert_eq!(config.export_file_name, "look.png");
        assert_eq!(config.gateway.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn partial_file_overrides_only_what_it_names() {
        let config = StudioConfig::from_toml(
            r#"
            settle_delay_ms = 250
            data_dir = "/tmp/looks"

            [gateway]
            text_model = "local-text"
            "#,
        )
        .unwrap();

        assert_eq!(config.settle_delay_ms, 250);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/looks"));
        assert_eq!(config.gateway.text_model, "local-text");
        assert_eq!(config.gateway.api_key_env, "GEMINI_API_KEY");
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let err = StudioConfig::from_toml("settle_delay_ms = \"soon\"").unwrap_err();
        assert!(matches!(err, TryOnError::Config(_)));
    }

    #[test]
    fn explicit_path_wins_over_env_and_platform() {
        let source = resolve_config_path(
            Some(Path::new("/a.toml")),
            Some(PathBuf::from("/b.toml")),
            Some(PathBuf::from("/c.toml")),
        );
        assert_eq!(source, ConfigSource::Required(PathBuf::from("/a.toml")));
    }

    #[test]
    fn env_path_wins_over_platform() {
        let source = resolve_config_path(
            None,
            Some(PathBuf::from("/b.toml")),
            Some(PathBuf::from("/c.toml")),
        );
        assert_eq!(source, ConfigSource::Required(PathBuf::from("/b.toml")));
    }

    #[test]
    fn platform_file_is_optional() {
        let source = resolve_config_path(None, None, Some(PathBuf::from("/c.toml")));
        assert_eq!(source, ConfigSource::Optional(PathBuf::from("/c.toml")));
        assert_eq!(resolve_config_path(None, None, None), ConfigSource::Defaults);
    }

    #[test]
    fn explicit_file_must_exist() {
        let dir = TempDir::new().unwrap();
        let err = StudioConfig::load(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert!(matches!(err, TryOnError::Config(_)));
    }

    #[test]
    fn explicit_file_is_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "export_file_name = \"mine.png\"").unwrap();

        let config = StudioConfig::load(Some(&path)).unwrap();
        assert_eq!(config.export_file_name, "mine.png");
    }
}
