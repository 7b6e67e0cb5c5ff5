//! Settings resolution: CLI flag (or its environment variable) over the TOML
//! file over built-in defaults.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use bookclub_core::{OutputFormat, Settings};
use directories::ProjectDirs;

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DATABASE_FILE_NAME: &str = "bookclub.db";

/// Values taken from the command line. clap fills these from the
/// `BOOKCLUB_*` environment variables when the flag is absent.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub token: Option<String>,
    pub user: Option<String>,
    pub api_url: Option<String>,
    pub json: bool,
}

pub fn project_dirs() -> anyhow::Result<ProjectDirs> {
    ProjectDirs::from("dev", "bookclub", "bookclub").context("resolve project dirs")
}

/// `default_config` is only read when it exists; an explicit `--config`
/// path must exist.
pub fn load_settings(overrides: &Overrides, default_config: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = match (&overrides.config, default_config) {
        (Some(path), _) => read_settings_file(path)?,
        (None, Some(path)) if path.is_file() => read_settings_file(path)?,
        _ => Settings::default(),
    };

    if let Some(token) = &overrides.token {
        settings.token = Some(token.clone());
    }
    if let Some(user) = &overrides.user {
        settings.user_id = Some(user.clone());
    }
    if let Some(api_url) = &overrides.api_url {
        settings.api_base_url = api_url.clone();
    }
    if overrides.json {
        settings.output = OutputFormat::Json;
    }
    settings.normalize();
    Ok(settings)
}

pub fn read_settings_file(path: &Path) -> anyhow::Result<Settings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read config file {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parse config file {}", path.display()))
}

pub fn database_path(settings: &Settings, dirs: Option<&ProjectDirs>) -> Option<PathBuf> {
    match (&settings.data_dir, dirs) {
        (Some(dir), _) => Some(PathBuf::from(dir).join(DATABASE_FILE_NAME)),
        (None, Some(dirs)) => Some(dirs.data_dir().join(DATABASE_FILE_NAME)),
        (None, None) => None,
    }
}
