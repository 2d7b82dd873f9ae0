use crate::error::ErrorCode;
use crate::sort::SortDirection;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Env var naming the snapshot data directory.
pub const DATA_DIR_ENV: &str = "SNAPLIST_DATA_DIR";

/// The config file exists but is not valid TOML for [`UserConfig`].
#[derive(Debug, thiserror::Error)]
#[error("invalid config {}: {message}", .path.display())]
pub struct ConfigParseError {
    pub path: PathBuf,
    pub message: String,
}

impl ConfigParseError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::ConfigParseError
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListDefaults {
    #[serde(default)]
    pub default_sort: SortDirection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub list: ListDefaults,
}

#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfig {
    pub user: UserConfig,
    pub data_dir: PathBuf,
}

/// Location of the user config file, if the platform has a config dir.
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("snaplist/config.toml"))
}

pub fn load_user_config() -> Result<UserConfig> {
    match user_config_path() {
        Some(path) => load_config_from(&path),
        None => Ok(UserConfig::default()),
    }
}

/// Parse the config at `path`. A missing file yields defaults.
pub fn load_config_from(path: &Path) -> Result<UserConfig> {
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content).map_err(|err| {
        ConfigParseError {
            path: path.to_path_buf(),
            message: err.message().to_string(),
        }
        .into()
    })
}

/// Load the user config and settle the data directory.
pub fn resolve_config(cli_data_dir: Option<PathBuf>) -> Result<EffectiveConfig> {
    let user = load_user_config()?;

    let env_dir = env::var_os(DATA_DIR_ENV).map(PathBuf::from);
    let data_dir = resolve_data_dir(cli_data_dir, env_dir, user.data_dir.clone());
    tracing::debug!(data_dir = %data_dir.display(), "resolved data directory");

    Ok(EffectiveConfig { user, data_dir })
}

/// Flag, then env, then config file, then the platform data dir.
#[must_use]
pub fn resolve_data_dir(
    cli: Option<PathBuf>,
    env_dir: Option<PathBuf>,
    user: Option<PathBuf>,
) -> PathBuf {
    cli.or(env_dir)
        .or(user)
        .or_else(|| dirs::data_dir().map(|dir| dir.join("snaplist")))
        .unwrap_or_else(|| PathBuf::from(".snaplist"))
}
