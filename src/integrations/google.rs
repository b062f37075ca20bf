use crate::config::DriveConfig;
use crate::credentials::OAuthCredentials;
use crate::error::{ApplyError, Result};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;

const METADATA_FIELDS: &str = "id,name,mimeType,modifiedTime,headRevisionId";
const DEFAULT_MIME_TYPE: &str = "text/markdown";

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    error: String,
    error_description: Option<String>,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub modified_time: Option<String>,
    #[serde(default)]
    pub head_revision_id: Option<String>,
}

impl FileMetadata {
    pub fn upload_mime_type(&self) -> &str {
        self.mime_type.as_deref().unwrap_or(DEFAULT_MIME_TYPE)
    }
}

/// Exchanges the refresh token for a short-lived access token.
pub fn refresh_access_token(
    client: &Client,
    config: &DriveConfig,
    credentials: &OAuthCredentials,
) -> Result<String> {
    let resp = client
        .post(&config.token_url)
        .form(&[
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("refresh_token", credentials.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ])
        .send()?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().unwrap_or_default();
        return Err(ApplyError::Request(format!(
            "Token refresh failed: {}",
            format_oauth_error(status, &body)
        )));
    }

    let token: TokenResponse = resp.json()?;
    Ok(token.access_token)
}

pub struct DriveClient {
    client: Client,
    config: DriveConfig,
    access_token: String,
}

impl DriveClient {
    pub fn new(client: Client, config: DriveConfig, access_token: String) -> Self {
        Self {
            client,
            config,
            access_token,
        }
    }

    pub fn connect(config: &DriveConfig, credentials: &OAuthCredentials) -> Result<Self> {
        let client = Client::new();
        let access_token = refresh_access_token(&client, config, credentials)?;
        tracing::info!("obtained Drive access token");
        Ok(Self::new(client, config.clone(), access_token))
    }

    pub fn fetch_metadata(&self, file_id: &str) -> Result<FileMetadata> {
        let url = format!("{}/files/{file_id}", self.config.api_base);
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .query(&[("fields", METADATA_FIELDS)])
            .send()?;
        let resp = ensure_success(resp, "Metadata fetch")?;
        Ok(resp.json()?)
    }

    pub fn download(&self, file_id: &str) -> Result<String> {
        let url = format!("{}/files/{file_id}", self.config.api_base);
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .query(&[("alt", "media")])
            .send()?;
        let resp = ensure_success(resp, "Download")?;
        Ok(resp.text()?)
    }

    pub fn upload(&self, file_id: &str, content: String, mime_type: &str) -> Result<()> {
        let url = format!("{}/files/{file_id}", self.config.upload_base);
        let resp = self
            .client
            .patch(url)
            .bearer_auth(&self.access_token)
            .query(&[("uploadType", "media"), ("supportsAllDrives", "true")])
            .header(CONTENT_TYPE, mime_type)
            .body(content)
            .send()?;
        ensure_success(resp, "Upload")?;
        Ok(())
    }
}

fn ensure_success(
    resp: reqwest::blocking::Response,
    action: &str,
) -> Result<reqwest::blocking::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    let detail = truncate_error(body.trim());
    if detail.is_empty() {
        Err(ApplyError::Request(format!("{action} failed: HTTP {status}")))
    } else {
        Err(ApplyError::Request(format!("{action} failed: HTTP {status}: {detail}")))
    }
}

fn format_oauth_error(status: reqwest::StatusCode, body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return format!("HTTP {}", status);
    }

    let summary = if let Ok(err) = serde_json::from_str::<TokenErrorResponse>(trimmed) {
        if let Some(desc) = err.error_description {
            format!("{} ({})", desc, err.error)
        } else {
            err.error
        }
    } else {
        truncate_error(trimmed)
    };
    format!("HTTP {}: {}", status, summary)
}

fn truncate_error(message: &str) -> String {
    let mut out = message.replace(['\n', '\r'], " ");
    if out.len() > 240 {
        let mut cut = 240;
        while !out.is_char_boundary(cut) {
            cut -= 1;
        }
        out.truncate(cut);
        out.push_str("...");
    }
    out
}
