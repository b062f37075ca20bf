use crate::config::CredentialsConfig;
use crate::error::{ApplyError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const ENV_CLIENT_ID: &str = "TODOLIST_CLIENT_ID";
const ENV_CLIENT_SECRET: &str = "TODOLIST_CLIENT_SECRET";
const ENV_REFRESH_TOKEN: &str = "TODOLIST_REFRESH_TOKEN";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

/// Supplies the client pair and refresh token used for the token exchange.
pub trait CredentialsProvider {
    fn load(&self) -> Result<OAuthCredentials>;
}

/// Environment variables win when all three are set, otherwise the files from config.
pub fn resolve(config: &CredentialsConfig) -> Box<dyn CredentialsProvider> {
    match EnvCredentials::from_env() {
        Some(env) => {
            tracing::debug!("using OAuth credentials from environment");
            Box::new(env)
        }
        None => Box::new(FileCredentials::new(
            config.client_secret_path.clone(),
            config.refresh_token_path.clone(),
        )),
    }
}

#[derive(Deserialize, Default)]
struct ClientSecretFile {
    installed: Option<ClientSection>,
    web: Option<ClientSection>,
}

#[derive(Deserialize, Default)]
struct ClientSection {
    client_id: Option<String>,
    client_secret: Option<String>,
}

#[derive(Deserialize)]
struct RefreshTokenFile {
    refresh_token: Option<String>,
}

pub struct FileCredentials {
    client_secret_path: PathBuf,
    refresh_token_path: PathBuf,
}

impl FileCredentials {
    pub fn new(client_secret_path: PathBuf, refresh_token_path: PathBuf) -> Self {
        Self {
            client_secret_path,
            refresh_token_path,
        }
    }
}

impl CredentialsProvider for FileCredentials {
    fn load(&self) -> Result<OAuthCredentials> {
        let secret: ClientSecretFile = read_json(&self.client_secret_path)?;
        let installed = secret.installed.unwrap_or_default();
        let web = secret.web.unwrap_or_default();
        let client_id = present(installed.client_id).or(web.client_id);
        let client_secret = present(installed.client_secret).or(web.client_secret);

        let token: RefreshTokenFile = read_json(&self.refresh_token_path)?;

        Ok(OAuthCredentials {
            client_id: required(client_id, "client_id", &self.client_secret_path)?,
            client_secret: required(client_secret, "client_secret", &self.client_secret_path)?,
            refresh_token: required(token.refresh_token, "refresh_token", &self.refresh_token_path)?,
        })
    }
}

pub struct EnvCredentials {
    credentials: OAuthCredentials,
}

impl EnvCredentials {
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Some(Self {
            credentials: OAuthCredentials {
                client_id: value(ENV_CLIENT_ID)?,
                client_secret: value(ENV_CLIENT_SECRET)?,
                refresh_token: value(ENV_REFRESH_TOKEN)?,
            },
        })
    }
}

impl CredentialsProvider for EnvCredentials {
    fn load(&self) -> Result<OAuthCredentials> {
        Ok(self.credentials.clone())
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| {
        ApplyError::Credentials(format!("cannot read {}: {e}", path.display()))
    })?;
    serde_json::from_str(&content)
        .map_err(|e| ApplyError::Credentials(format!("invalid JSON in {}: {e}", path.display())))
}

/// Blank values count as absent so the `web` section can fill them.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required(value: Option<String>, field: &str, path: &Path) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApplyError::Credentials(format!(
            "{field} missing in {}",
            path.display()
        ))),
    }
}
