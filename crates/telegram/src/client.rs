use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use moodtrack_core::{SEND_MAX_ATTEMPTS, SEND_RETRY_BACKOFF_SECS};
use moodtrack_service::{InlineButton, Transport, TransportError};
use serde::de::DeserializeOwned;

use crate::error::TelegramError;
use crate::types::{ApiResponse, InlineKeyboardButton, InlineKeyboardMarkup};

const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// How long one HTTP attempt may take. Must exceed the long-poll timeout,
/// which rides over the same client.
const HTTP_TIMEOUT: Duration = Duration::from_secs(50);

/// Bot API client. One instance per bot token, cheap to clone.
#[derive(Clone)]
pub struct BotClient {
    client: reqwest::Client,
    base_url: String,
}

impl std::fmt::Debug for BotClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotClient").field("base_url", &"***").finish()
    }
}

impl BotClient {
    pub fn new(token: &str) -> Result<Self, TelegramError> {
        Self::with_api_url(token, DEFAULT_API_URL, HTTP_TIMEOUT)
    }

    /// Point the client at a different API host with a custom per-attempt
    /// timeout. Used by tests; `new` is the production path.
    pub fn with_api_url(
        token: &str,
        api_url: &str,
        timeout: Duration,
    ) -> Result<Self, TelegramError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = format!("{}/bot{token}", api_url.trim_end_matches('/'));
        Ok(Self { client, base_url })
    }

    /// One Bot API call, no retry.
    pub(crate) async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &serde_json::Value,
    ) -> Result<T, TelegramError> {
        let response = self
            .client
            .post(format!("{}/{method}", self.base_url))
            .json(payload)
            .send()
            .await?;
        let body = response.text().await?;
        Self::parse_response(method, &body)
    }

    /// A Bot API call retried on timeout-class failures: bounded attempts
    /// with a fixed backoff. Everything else propagates immediately.
    async fn call_with_retry<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &serde_json::Value,
    ) -> Result<T, TelegramError> {
        for attempt in 1..=SEND_MAX_ATTEMPTS {
            if attempt > 1 {
                tokio::time::sleep(Duration::from_secs(SEND_RETRY_BACKOFF_SECS)).await;
                tracing::warn!(method, attempt, "retrying timed-out send");
            }
            match self.call(method, payload).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_timeout() && attempt < SEND_MAX_ATTEMPTS => continue,
                Err(e) if e.is_timeout() => {
                    return Err(TelegramError::RetriesExhausted { attempts: SEND_MAX_ATTEMPTS });
                },
                Err(e) => return Err(e),
            }
        }
        Err(TelegramError::RetriesExhausted { attempts: SEND_MAX_ATTEMPTS })
    }

    fn parse_response<T: DeserializeOwned>(
        method: &str,
        body: &str,
    ) -> Result<T, TelegramError> {
        let parsed: ApiResponse<T> =
            serde_json::from_str(body).map_err(|source| TelegramError::UnexpectedResponse {
                context: method.to_owned(),
                source,
            })?;
        if !parsed.ok {
            return Err(TelegramError::Api {
                code: parsed.error_code.unwrap_or_default(),
                description: parsed
                    .description
                    .unwrap_or_else(|| "no description".to_owned()),
            });
        }
        parsed.result.ok_or_else(|| TelegramError::Api {
            code: 0,
            description: format!("{method}: ok response without result"),
        })
    }

    pub(crate) async fn send_message(
        &self,
        user_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), TelegramError> {
        let mut payload = serde_json::json!({ "chat_id": user_id, "text": text });
        if let Some(keyboard) = keyboard {
            payload["reply_markup"] = serde_json::to_value(keyboard)
                .map_err(|source| TelegramError::UnexpectedResponse {
                    context: "sendMessage reply_markup".to_owned(),
                    source,
                })?;
        }
        self.call_with_retry::<serde_json::Value>("sendMessage", &payload).await?;
        Ok(())
    }

    async fn send_photo_file(&self, user_id: i64, photo: &Path) -> Result<(), TelegramError> {
        let bytes = tokio::fs::read(photo).await.map_err(|source| TelegramError::PhotoRead {
            path: photo.to_path_buf(),
            source,
        })?;
        let file_name = photo
            .file_name()
            .map_or_else(|| "graph.svg".to_owned(), |n| n.to_string_lossy().into_owned());

        // Multipart forms are single-use, so the retry loop rebuilds one
        // per attempt from the bytes read above.
        for attempt in 1..=SEND_MAX_ATTEMPTS {
            if attempt > 1 {
                tokio::time::sleep(Duration::from_secs(SEND_RETRY_BACKOFF_SECS)).await;
                tracing::warn!(attempt, "retrying timed-out photo upload");
            }
            let form = reqwest::multipart::Form::new()
                .text("chat_id", user_id.to_string())
                .part(
                    "document",
                    reqwest::multipart::Part::bytes(bytes.clone()).file_name(file_name.clone()),
                );
            let result = async {
                let response = self
                    .client
                    .post(format!("{}/sendDocument", self.base_url))
                    .multipart(form)
                    .send()
                    .await?;
                let body = response.text().await?;
                Self::parse_response::<serde_json::Value>("sendDocument", &body)
            }
            .await;
            match result {
                Ok(_) => return Ok(()),
                Err(e) if e.is_timeout() && attempt < SEND_MAX_ATTEMPTS => continue,
                Err(e) if e.is_timeout() => {
                    return Err(TelegramError::RetriesExhausted { attempts: SEND_MAX_ATTEMPTS });
                },
                Err(e) => return Err(e),
            }
        }
        Err(TelegramError::RetriesExhausted { attempts: SEND_MAX_ATTEMPTS })
    }

    pub(crate) async fn answer_callback_query(&self, query_id: &str) -> Result<(), TelegramError> {
        self.call::<serde_json::Value>(
            "answerCallbackQuery",
            &serde_json::json!({ "callback_query_id": query_id }),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl Transport for BotClient {
    async fn send_text(&self, user_id: i64, text: &str) -> Result<(), TransportError> {
        Ok(self.send_message(user_id, text, None).await?)
    }

    async fn send_keyboard(
        &self,
        user_id: i64,
        text: &str,
        keyboard: &[Vec<InlineButton>],
    ) -> Result<(), TransportError> {
        let markup = InlineKeyboardMarkup {
            inline_keyboard: keyboard
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|b| InlineKeyboardButton {
                            text: b.text.clone(),
                            callback_data: b.payload.clone(),
                        })
                        .collect()
                })
                .collect(),
        };
        Ok(self.send_message(user_id, text, Some(markup)).await?)
    }

    async fn send_photo(&self, user_id: i64, photo: &Path) -> Result<(), TransportError> {
        Ok(self.send_photo_file(user_id, photo).await?)
    }
}
