use crate::{Error, Result, TimeWindow};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default location of the optional settings file (extension resolved by `config`)
pub const DEFAULT_SETTINGS_FILE: &str = "config/repopulse";

/// Runtime settings.
///
/// Layered from built-in defaults, an optional `config/repopulse.{yaml,toml,json}`
/// file and finally plain environment variables (`GITHUB_TOKEN`, `SMTP_SERVER`,
/// ...), which win.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub github_token: Option<String>,
    pub github_api_url: String,
    pub data_dir: PathBuf,
    pub config_dir: PathBuf,
    pub reference_utc_offset_hours: i32,
    pub lookback_days: u32,
    pub trending_languages: Vec<String>,
    pub trending_per_language: usize,
    pub trending_created_within_days: u32,
    pub http_timeout_secs: u64,
    pub api_port: u16,
    pub cors_origins: Vec<String>,

    pub smtp_server: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,

    pub llm_provider: Option<String>,
    pub llm_model: Option<String>,
    pub zhipu_api_key: Option<String>,
    pub zhipu_base_url: Option<String>,
    pub ollama_base_url: Option<String>,
    pub translate_to: String,
    pub digest_summary: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            github_token: None,
            github_api_url: "https://api.github.com".to_string(),
            data_dir: PathBuf::from("data"),
            config_dir: PathBuf::from("config"),
            reference_utc_offset_hours: crate::window::DEFAULT_UTC_OFFSET_HOURS,
            lookback_days: 7,
            trending_languages: vec!["python".to_string(), "java".to_string()],
            trending_per_language: 5,
            trending_created_within_days: 7,
            http_timeout_secs: 30,
            api_port: 8000,
            cors_origins: Vec::new(),
            smtp_server: None,
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            llm_provider: None,
            llm_model: None,
            zhipu_api_key: None,
            zhipu_base_url: None,
            ollama_base_url: None,
            translate_to: "zh".to_string(),
            digest_summary: false,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_SETTINGS_FILE)
    }

    /// Load with `base` as the settings file stem; a missing file is fine
    pub fn load_from(base: &str) -> Result<Self> {
        let settings: Settings = Config::builder()
            .add_source(File::with_name(base).required(false))
            .add_source(
                Environment::default()
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("trending_languages")
                    .with_list_parse_key("cors_origins"),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.lookback_days == 0 {
            return Err(Error::InvalidWindow("lookback_days must be positive".to_string()));
        }
        if self.trending_created_within_days == 0 {
            return Err(Error::InvalidWindow(
                "trending_created_within_days must be positive".to_string(),
            ));
        }
        self.time_window().map(|_| ())
    }

    pub fn time_window(&self) -> Result<TimeWindow> {
        TimeWindow::from_offset_hours(self.reference_utc_offset_hours)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Non-blank GitHub token, if any
    pub fn github_token(&self) -> Option<&str> {
        non_blank(&self.github_token)
    }

    pub fn snapshot_dir(&self) -> PathBuf {
        self.data_dir.join("repo_activities")
    }

    pub fn trending_dir(&self) -> PathBuf {
        self.data_dir.join("trending")
    }

    pub fn tracked_repos_file(&self) -> PathBuf {
        self.config_dir.join("tracked_repos.json")
    }

    pub fn tasks_file(&self) -> PathBuf {
        self.config_dir.join("scheduled_tasks.json")
    }
}

pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
