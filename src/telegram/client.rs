use super::types::{ApiResponse, Update, User};
use crate::config::TelegramConfig;
use crate::error::{NotifyError, TransportError};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Slack added to the long-poll timeout before the HTTP request itself times out
const POLL_REQUEST_SLACK: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Minimal Telegram Bot API client
pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            base_url: format!(
                "{}/bot{}",
                config.api_url.trim_end_matches('/'),
                config.token
            ),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    /// Verify the credential and return the bot account
    pub async fn get_me(&self) -> Result<User, TransportError> {
        let request = self
            .http
            .get(self.method_url("getMe"))
            .timeout(REQUEST_TIMEOUT);
        let user: User = self.execute("getMe", request).await?;
        info!(
            "Authorized on account {}",
            user.username.as_deref().unwrap_or(&user.first_name)
        );
        Ok(user)
    }

    /// Long-poll for updates newer than `offset`
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout: Duration,
    ) -> Result<Vec<Update>, TransportError> {
        let request = self
            .http
            .post(self.method_url("getUpdates"))
            .timeout(timeout + POLL_REQUEST_SLACK)
            .json(&json!({
                "offset": offset,
                "timeout": timeout.as_secs(),
                "allowed_updates": ["message"],
            }));
        self.execute("getUpdates", request).await
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        let request = self
            .http
            .post(self.method_url("sendMessage"))
            .timeout(REQUEST_TIMEOUT)
            .json(&json!({ "chat_id": chat_id, "text": text }));
        let _: serde_json::Value = self.execute("sendMessage", request).await?;
        debug!("Sent text message to {}", chat_id);
        Ok(())
    }

    pub async fn send_photo(&self, chat_id: i64, path: &Path) -> Result<(), NotifyError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| NotifyError::PhotoRead {
                path: path.display().to_string(),
                source,
            })?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "photo.jpg".to_string());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("image/jpeg")
            .map_err(|e| NotifyError::Transport(TransportError::Http(e.without_url())))?;
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("photo", part);

        let request = self
            .http
            .post(self.method_url("sendPhoto"))
            .timeout(REQUEST_TIMEOUT * 2)
            .multipart(form);
        let _: serde_json::Value = self.execute("sendPhoto", request).await?;
        debug!("Sent photo {} to {}", path.display(), chat_id);
        Ok(())
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, TransportError> {
        // Strip URLs from errors, they carry the bot token
        let response = request.send().await.map_err(|e| e.without_url())?;
        let status = response.status();
        let body: ApiResponse<T> = response.json().await.map_err(|e| e.without_url())?;
        unwrap_response(method, status, body)
    }
}

pub(crate) fn unwrap_response<T>(
    method: &str,
    status: reqwest::StatusCode,
    body: ApiResponse<T>,
) -> Result<T, TransportError> {
    if !body.ok {
        let description = body
            .description
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());

        if status == reqwest::StatusCode::UNAUTHORIZED || body.error_code == Some(401) {
            return Err(TransportError::Unauthorized { description });
        }

        return Err(TransportError::Api {
            code: body.error_code,
            description,
        });
    }

    body.result.ok_or_else(|| TransportError::EmptyResult {
        method: method.to_string(),
    })
}
