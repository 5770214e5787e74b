use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::wekan::WekanOpts;

/// Optional on-disk fallback for the environment variables, at
/// `~/.wekan-sync/config.toml`. Every field the environment sets wins over
/// the file.
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    base_url: Option<String>,
    api_token: Option<String>,
    username: Option<String>,
    password: Option<String>,
    user_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Wekan base URL, trailing slash trimmed.
    pub base_url: String,
    pub token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Acting user id: assignee filter, comment author, board-listing scope.
    pub user_id: String,
}

fn config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".wekan-sync")
        .join("config.toml")
}

fn load_file(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

impl Config {
    pub fn load() -> Result<Self> {
        let file = load_file(&config_path())?;
        Self::load_from(env_var, file)
    }

    /// Merge per field: a set environment variable wins over the file.
    fn load_from(lookup: impl Fn(&str) -> Option<String>, file: FileConfig) -> Result<Self> {
        Self::resolve(
            lookup("WEKAN_BASE_URL").or(file.base_url),
            lookup("WEKAN_API_TOKEN").or(file.api_token),
            lookup("WEKAN_USERNAME").or(file.username),
            lookup("WEKAN_PASSWORD").or(file.password),
            lookup("WEKAN_USER_ID").or(file.user_id),
        )
    }

    fn resolve(
        base_url: Option<String>,
        token: Option<String>,
        username: Option<String>,
        password: Option<String>,
        user_id: Option<String>,
    ) -> Result<Self> {
        let Some(base_url) = base_url else {
            bail!("WEKAN_BASE_URL is required");
        };
        let has_login = username.is_some() && password.is_some();
        if token.is_none() && !has_login {
            bail!("Set WEKAN_API_TOKEN or both WEKAN_USERNAME and WEKAN_PASSWORD");
        }
        let Some(user_id) = user_id else {
            bail!("WEKAN_USER_ID is required");
        };
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            username,
            password,
            user_id,
        })
    }

    pub fn wekan_opts(&self) -> WekanOpts {
        WekanOpts {
            base_url: self.base_url.clone(),
            token: self.token.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}
