use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub const CONFIG_PATH_ENV: &str = "PODIUM_CONFIG";
pub const API_BASE_URL_ENV: &str = "PODIUM_API_BASE_URL";
const DEFAULT_CONFIG_FILE: &str = "podium.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct PodiumConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: u64,
    /// The one judge allowed to move the event on to the next performer.
    #[serde(default = "default_designated_judge_email")]
    pub designated_judge_email: String,
}

impl Default for PodiumConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            poll_interval_seconds: default_poll_interval_seconds(),
            designated_judge_email: default_designated_judge_email(),
        }
    }
}

impl PodiumConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds.max(1))
    }

    pub fn is_designated_judge(&self, email: Option<&str>) -> bool {
        email.is_some_and(|email| email == self.designated_judge_email)
    }
}

fn default_api_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_poll_interval_seconds() -> u64 {
    5
}

fn default_designated_judge_email() -> String {
    "judge1@sjsu.edu".to_string()
}

/// Loads `podium.toml` (or the file named by `PODIUM_CONFIG`), then applies the
/// base URL override from `PODIUM_API_BASE_URL`.
pub fn load_podium_config() -> Result<PodiumConfig> {
    let config_path = std::env::var(CONFIG_PATH_ENV)
        .ok()
        .filter(|path| !path.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());
    let base_url_override = std::env::var(API_BASE_URL_ENV).ok();
    load_from(Path::new(&config_path), base_url_override.as_deref())
}

fn load_from(config_path: &Path, base_url_override: Option<&str>) -> Result<PodiumConfig> {
    let mut config = if config_path.exists() {
        let raw = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        parse_config(&raw).with_context(|| format!("Failed to parse {}", config_path.display()))?
    } else {
        info!(
            "{} not found, using defaults",
            config_path.display()
        );
        PodiumConfig::default()
    };

    if let Some(url) = base_url_override.map(str::trim).filter(|url| !url.is_empty()) {
        info!("API base URL overridden from {API_BASE_URL_ENV}: {url}");
        config.api_base_url = url.to_string();
    }
    config.api_base_url = config.api_base_url.trim_end_matches('/').to_string();

    Ok(config)
}

fn parse_config(raw: &str) -> Result<PodiumConfig> {
    Ok(toml::from_str::<PodiumConfig>(raw)?)
}
