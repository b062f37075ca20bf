use crate::error::{ApplyError, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_OUTPUT_DIR: &str = "outputs/todolist-md";
pub const DEFAULT_THRESHOLD: f64 = 0.85;
pub const DEFAULT_MATCH_FLOOR: f64 = 0.2;
pub const DEFAULT_MODEL: &str = "gpt-5-mini";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "todolist-md", "todolist-apply")
}

fn default_config_dir() -> PathBuf {
    if let Some(dirs) = project_dirs() {
        return dirs.config_dir().to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".todolist-apply")
}

pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os("TODOLIST_APPLY_CONFIG") {
        return PathBuf::from(path);
    }
    default_config_dir().join("config.toml")
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub credentials: CredentialsConfig,
    pub policy: PolicyConfig,
    pub drive: DriveConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PathsConfig {
    pub suggestions: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let output_dir = PathBuf::from(DEFAULT_OUTPUT_DIR);
        Self {
            suggestions: output_dir.join("llm_suggestions_apply.json"),
            output_dir,
        }
    }
}

impl PathsConfig {
    pub fn backups_dir(&self) -> PathBuf {
        self.output_dir.join("backups")
    }

    pub fn records_dir(&self) -> PathBuf {
        self.output_dir.join("filter_records")
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CredentialsConfig {
    pub client_secret_path: PathBuf,
    pub refresh_token_path: PathBuf,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        let dir = default_config_dir();
        Self {
            client_secret_path: dir.join("gog-client-secret.json"),
            refresh_token_path: dir.join("todolist_drive_oauth.json"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PolicyConfig {
    /// Similarity at or above which a suggestion counts as unchanged.
    pub threshold: f64,
    /// Minimum score for a document line to anchor an insertion.
    pub match_floor: f64,
    pub model: String,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            match_floor: DEFAULT_MATCH_FLOOR,
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DriveConfig {
    pub token_url: String,
    pub api_base: String,
    pub upload_base: String,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            api_base: "https://www.googleapis.com/drive/v3".to_string(),
            upload_base: "https://www.googleapis.com/upload/drive/v3".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Config::default();
        };
        match toml::from_str::<Config>(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to parse config.toml ({}), using defaults: {e}", path.display());
                Config::default()
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("threshold", self.policy.threshold),
            ("match_floor", self.policy.match_floor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ApplyError::Config(format!(
                    "policy.{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.policy.model.trim().is_empty() {
            return Err(ApplyError::Config("policy.model must not be empty".to_string()));
        }
        Ok(())
    }
}
