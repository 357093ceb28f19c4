use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use crate::logging::LogContext;
use crate::notification::{NotificationError, NotificationSink};

#[derive(Debug, Serialize)]
struct SendMessagePayload<'a> {
    chat_id: &'a str,
    text: &'a str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<u16>,
    #[serde(default)]
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    #[serde(default)]
    retry_after: Option<u64>,
}

/// Telegram Bot API `sendMessage` client
pub struct TelegramNotifier {
    client: Client,
    url: String,
}

impl TelegramNotifier {
    pub fn new(api_base: &str, bot_token: &str) -> Result<Self, NotificationError> {
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;

        Ok(Self {
            client,
            url: format!("{}/bot{}/sendMessage", api_base.trim_end_matches('/'), bot_token),
        })
    }
}

#[async_trait]
impl NotificationSink for TelegramNotifier {
    async fn send(&self, chat_id: &str, text: &str) -> Result<(), NotificationError> {
        let payload = SendMessagePayload {
            chat_id,
            text,
            disable_web_page_preview: true,
        };

        let response = self.client.post(&self.url).json(&payload).send().await?;
        let status = response.status();
        let body = response.text().await?;

        let parsed: Option<TelegramResponse> = serde_json::from_str(&body).ok();
        let error = match parsed {
            Some(reply) if reply.ok && status.is_success() => {
                LogContext::new("telegram", "send_message")
                    .with_metadata("chat_id", json!(chat_id))
                    .debug("Message delivered");
                return Ok(());
            }
            Some(reply) => {
                let code = reply.error_code.unwrap_or(status.as_u16());
                if code == StatusCode::TOO_MANY_REQUESTS.as_u16() {
                    NotificationError::RateLimited {
                        retry_after: reply.parameters.and_then(|p| p.retry_after).unwrap_or(1),
                    }
                } else {
                    NotificationError::Api {
                        code,
                        description: reply.description.unwrap_or_default(),
                    }
                }
            }
            None if status == StatusCode::TOO_MANY_REQUESTS => NotificationError::RateLimited { retry_after: 1 },
            None => NotificationError::Api {
                code: status.as_u16(),
                description: body,
            },
        };

        LogContext::new("telegram", "send_message")
            .with_metadata("chat_id", json!(chat_id))
            .with_metadata("status", json!(status.as_u16()))
            .warn(&format!("Telegram rejected message: {}", error));
        Err(error)
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}
