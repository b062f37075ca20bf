use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("No suggestions file found at {}", .0.display())]
    SuggestionsNotFound(PathBuf),

    #[error("suggestions batch has no fileSuggestions entries")]
    NoFileSuggestions,

    #[error("config: {0}")]
    Config(String),

    #[error("credentials: {0}")]
    Credentials(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ApplyError {
    fn from(err: reqwest::Error) -> Self {
        ApplyError::Request(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ApplyError>;
