//! HTTP client for the Telegram Bot API.
//!
//! Every method is a `POST {api_url}/bot{token}/{method}` with a JSON body;
//! the response envelope is checked for `ok` before the result is returned.

use async_trait::async_trait;
use helpdesk_core::transport::{ChatTransport, Outbound, Reply, TransportError};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::keyboard::{inline_keyboard, InlineKeyboardMarkup};
use crate::types::{ApiResponse, Update};

/// Errors from the Bot API layer.
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    /// The HTTP request itself failed (network, DNS, TLS, decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The Bot API answered with `ok = false`.
    #[error("Telegram API error ({code}): {description}")]
    Api { code: i32, description: String },
}

impl TelegramError {
    /// `editMessageText` was asked to write the text the message already has.
    pub fn is_message_not_modified(&self) -> bool {
        matches!(self, TelegramError::Api { description, .. } if description.contains("message is not modified"))
    }
}

impl From<TelegramError> for TransportError {
    fn from(err: TelegramError) -> Self {
        TransportError(err.to_string())
    }
}

#[derive(Serialize)]
struct GetUpdates<'a> {
    offset: i64,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Serialize)]
struct EditMessageText<'a> {
    chat_id: i64,
    message_id: i64,
    text: &'a str,
    parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Serialize)]
struct AnswerCallbackQuery<'a> {
    callback_query_id: &'a str,
}

const PARSE_MODE: &str = "HTML";

/// Bot API client for a single bot token.
#[derive(Clone)]
pub struct TelegramApi {
    client: reqwest::Client,
    base_url: String,
}

impl TelegramApi {
    /// * `api_url` - Base URL, e.g. `https://api.telegram.org`.
    pub fn new(api_url: &str, token: &str) -> Self {
        Self::with_client(reqwest::Client::new(), api_url, token)
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: &str, token: &str) -> Self {
        Self {
            client,
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
        }
    }

    /// Long-poll for updates with ids at or above `offset`.
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        self.call(
            "getUpdates",
            &GetUpdates {
                offset,
                timeout: timeout_secs,
                allowed_updates: &["message", "callback_query"],
            },
        )
        .await
    }

    pub async fn send_message(&self, chat_id: i64, reply: &Reply) -> Result<(), TelegramError> {
        let _: serde_json::Value = self
            .call(
                "sendMessage",
                &SendMessage {
                    chat_id,
                    text: &reply.text,
                    parse_mode: PARSE_MODE,
                    reply_markup: inline_keyboard(&reply.choices),
                },
            )
            .await?;
        Ok(())
    }

    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        reply: &Reply,
    ) -> Result<(), TelegramError> {
        let _: serde_json::Value = self
            .call(
                "editMessageText",
                &EditMessageText {
                    chat_id,
                    message_id,
                    text: &reply.text,
                    parse_mode: PARSE_MODE,
                    reply_markup: inline_keyboard(&reply.choices),
                },
            )
            .await?;
        Ok(())
    }

    pub async fn answer_callback_query(&self, callback_query_id: &str) -> Result<(), TelegramError> {
        let _: bool = self
            .call("answerCallbackQuery", &AnswerCallbackQuery { callback_query_id })
            .await?;
        Ok(())
    }

    // ---- private helpers ----

    /// Invoke a method and unwrap the `ok`/`result` envelope.
    ///
    /// The Bot API reports failures with a JSON envelope on non-2xx codes
    /// too, so the body is parsed regardless of the HTTP status.
    async fn call<B: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<T, TelegramError> {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, method))
            .json(body)
            .send()
            .await?;
        let status = response.status();
        let envelope: ApiResponse<T> = response.json().await?;

        match envelope {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse {
                error_code,
                description,
                ..
            } => Err(TelegramError::Api {
                code: error_code.unwrap_or_else(|| i32::from(status.as_u16())),
                description: description.unwrap_or_else(|| format!("{method} returned no result")),
            }),
        }
    }
}

#[async_trait]
impl ChatTransport for TelegramApi {
    async fn send(&self, message: &Outbound) -> Result<(), TransportError> {
        match message {
            Outbound::Send { chat_id, reply } => Ok(self.send_message(*chat_id, reply).await?),
            Outbound::Edit {
                chat_id,
                message_id,
                reply,
            } => {
                // A stale message cannot be edited; send the screen afresh.
                // An unchanged one already shows it.
                match self.edit_message_text(*chat_id, *message_id, reply).await {
                    Ok(()) => Ok(()),
                    Err(e) if e.is_message_not_modified() => {
                        tracing::debug!(chat_id, message_id, "Screen unchanged, nothing to edit");
                        Ok(())
                    }
                    Err(e) => {
                        tracing::debug!(chat_id, message_id, error = %e, "Edit failed, sending new message");
                        Ok(self.send_message(*chat_id, reply).await?)
                    }
                }
            }
        }
    }

    async fn acknowledge(&self, callback_id: &str) -> Result<(), TransportError> {
        Ok(self.answer_callback_query(callback_id).await?)
    }
}
