// src/telegram.rs

//! Telegram Bot API delivery channel.
//!
//! Thin client over the HTTP Bot API. Transport failures surface as
//! `AppError::Http`; API-level refusals come back as a decoded envelope
//! with `ok = false` so the notifier can degrade its formatting mode.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;
use crate::models::TelegramConfig;

/// Production Bot API endpoint.
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Formatting mode for an outgoing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    MarkdownV2,
    Html,
    Plain,
}

impl ParseMode {
    /// Bot API `parse_mode` value; plain text sends none.
    pub fn as_api_value(self) -> Option<&'static str> {
        match self {
            ParseMode::MarkdownV2 => Some("MarkdownV2"),
            ParseMode::Html => Some("HTML"),
            ParseMode::Plain => None,
        }
    }
}

/// Decoded Bot API response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct SendOutcome {
    pub ok: bool,

    #[serde(default)]
    pub result: Option<SentMessage>,

    #[serde(default)]
    pub description: Option<String>,
}

/// The slice of the sent message the pipeline cares about.
#[derive(Debug, Clone, Deserialize)]
pub struct SentMessage {
    pub message_id: i64,
}

impl SendOutcome {
    /// Transport-assigned message ID, present on success.
    pub fn message_id(&self) -> Option<i64> {
        self.result.as_ref().map(|m| m.message_id)
    }

    /// API error description, for logs and alerts.
    pub fn error_description(&self) -> &str {
        self.description.as_deref().unwrap_or("unknown error")
    }
}

/// Trait for outbound message delivery.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// Send a plain message.
    async fn send_text(&self, chat_id: &str, text: &str, mode: ParseMode) -> Result<SendOutcome>;

    /// Send a photo by URL with a caption.
    async fn send_photo(
        &self,
        chat_id: &str,
        photo_url: &str,
        caption: &str,
        mode: ParseMode,
    ) -> Result<SendOutcome>;
}

/// Bot API client.
pub struct TelegramClient {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
}

impl TelegramClient {
    /// Create a client against the production API.
    pub fn new(client: reqwest::Client, config: &TelegramConfig) -> Self {
        Self::with_api_base(client, config, TELEGRAM_API_BASE)
    }

    /// Create a client against a custom API base (used by tests).
    pub fn with_api_base(
        client: reqwest::Client,
        config: &TelegramConfig,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into(),
            bot_token: config.bot_token.clone(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.bot_token, method)
    }

    async fn post(&self, method: &str, mut params: Vec<(&str, String)>, mode: ParseMode) -> Result<SendOutcome> {
        if let Some(value) = mode.as_api_value() {
            params.push(("parse_mode", value.to_string()));
        }

        // The API answers 400 with a decodable envelope on bad requests, so
        // the status code is not checked here.
        let outcome = self
            .client
            .post(self.method_url(method))
            .form(&params)
            .send()
            .await?
            .json::<SendOutcome>()
            .await?;
        Ok(outcome)
    }
}

#[async_trait]
impl DeliveryChannel for TelegramClient {
    async fn send_text(&self, chat_id: &str, text: &str, mode: ParseMode) -> Result<SendOutcome> {
        let params = vec![
            ("chat_id", chat_id.to_string()),
            ("text", text.to_string()),
        ];
        self.post("sendMessage", params, mode).await
    }

    async fn send_photo(
        &self,
        chat_id: &str,
        photo_url: &str,
        caption: &str,
        mode: ParseMode,
    ) -> Result<SendOutcome> {
        let params = vec![
            ("chat_id", chat_id.to_string()),
            ("photo", photo_url.to_string()),
            ("caption", caption.to_string()),
        ];
        self.post("sendPhoto", params, mode).await
    }
}
