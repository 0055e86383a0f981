use anyhow::{anyhow, Result};
use brainstorm_core::agents::DEFAULT_AGENTS_URL;
use brainstorm_core::api::DEFAULT_API_BASE_URL;
use brainstorm_core::discussion::DEFAULT_USER_ID;
use brainstorm_core::SyncOptions;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub agents_url: String,
    pub user_id: String,
    pub auto_fetch: bool,
    pub inactivity_secs: u64,
    /// Room id -> discussion id on the service.
    pub room_discussions: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            agents_url: DEFAULT_AGENTS_URL.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            auto_fetch: true,
            inactivity_secs: 30,
            room_discussions: HashMap::new(),
        }
    }

    /// Loads the config file (defaults when missing), then applies
    /// `BRAINSTORM_API_URL` / `BRAINSTORM_AGENTS_URL`.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::get_config_path()?)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    pub fn save_user_id(user_id: &str) -> Result<()> {
        let mut config = Self::load_from(&Self::get_config_path()?).unwrap_or_else(|_| Self::new());
        config.user_id = user_id.to_string();
        config.save()
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("BRAINSTORM_API_URL").filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url;
        }
        if let Some(url) = var("BRAINSTORM_AGENTS_URL").filter(|v| !v.trim().is_empty()) {
            self.agents_url = url;
        }
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            auto_fetch: self.auto_fetch,
            inactivity_threshold: Duration::from_secs(self.inactivity_secs.max(1)),
        }
    }

    pub fn discussion_for(&self, room_id: &str) -> Option<String> {
        self.room_discussions.get(room_id).cloned()
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("brainstorm").join("config.json"))
    }
}
