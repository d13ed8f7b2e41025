//! Telegram Bot API client.
//!
//! Covers the slice of the API the bot needs: long-polled updates, inline
//! query answers, audio upload (which yields the reusable file_id), and
//! resending by file_id.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::AudioPublisher;
use crate::domain::{FileRef, PreparedAudio};

/// Errors from the messaging host.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("request to messaging host failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("messaging host rejected the call: {0}")]
    Api(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Response envelope from the Bot API
#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

impl<T> TelegramResponse<T> {
    fn into_result(self) -> Result<T, PublishError> {
        if self.ok {
            self.result
                .ok_or_else(|| PublishError::Api("response carried no result".to_string()))
        } else {
            Err(PublishError::Api(self.description.unwrap_or_default()))
        }
    }
}

// ---------------------------------------------------------------------
// Inbound update types
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub inline_query: Option<InlineQuery>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub language_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
    pub audio: Option<Audio>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Audio {
    pub file_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InlineQuery {
    pub id: String,
    pub from: User,
    pub query: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

// ---------------------------------------------------------------------
// Outbound inline answer types
// ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineQueryResultArticle {
    #[serde(rename = "type")]
    pub result_type: &'static str,
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub input_message_content: InputTextMessageContent,
    pub reply_markup: InlineKeyboardMarkup,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputTextMessageContent {
    pub message_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

// ---------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------

/// Telegram Bot API client
pub struct TelegramApi {
    /// Bot token
    bot_token: String,
    /// HTTP client
    client: reqwest::Client,
}

impl TelegramApi {
    pub fn new(bot_token: String) -> Self {
        Self {
            bot_token,
            client: reqwest::Client::new(),
        }
    }

    /// Build API URL
    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{}", self.bot_token, method)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &serde_json::Value,
    ) -> Result<T, PublishError> {
        let response = self
            .client
            .post(self.api_url(method))
            .json(payload)
            .send()
            .await?;

        let envelope: TelegramResponse<T> = response.json().await?;
        envelope.into_result()
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(
        &self,
        offset: i64,
        poll_timeout: Duration,
    ) -> Result<Vec<Update>, PublishError> {
        let response = self
            .client
            .post(self.api_url("getUpdates"))
            // Outlive the server-side hold by a margin
            .timeout(poll_timeout + Duration::from_secs(10))
            .json(&serde_json::json!({
                "offset": offset,
                "timeout": poll_timeout.as_secs(),
                "allowed_updates": ["message", "inline_query", "callback_query"],
            }))
            .send()
            .await?;

        let envelope: TelegramResponse<Vec<Update>> = response.json().await?;
        envelope.into_result()
    }

    /// Answer an inline query with a bounded list of display results.
    pub async fn answer_inline_query(
        &self,
        inline_query_id: &str,
        results: &[InlineQueryResultArticle],
        cache_time: u32,
    ) -> Result<(), PublishError> {
        let _: bool = self
            .call(
                "answerInlineQuery",
                &serde_json::json!({
                    "inline_query_id": inline_query_id,
                    "results": results,
                    "cache_time": cache_time,
                }),
            )
            .await?;
        Ok(())
    }

    /// Acknowledge a callback so the client stops its spinner.
    pub async fn answer_callback_query(&self, callback_query_id: &str) -> Result<(), PublishError> {
        let _: bool = self
            .call(
                "answerCallbackQuery",
                &serde_json::json!({ "callback_query_id": callback_query_id }),
            )
            .await?;
        Ok(())
    }

    /// Send a text message; returns the new message id.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<i64, PublishError> {
        let message: Message = self
            .call(
                "sendMessage",
                &serde_json::json!({ "chat_id": chat_id, "text": text }),
            )
            .await?;
        Ok(message.message_id)
    }

    /// Replace the text of an existing bot message.
    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
    ) -> Result<(), PublishError> {
        // The API returns the edited Message or `true`; either way we only
        // care that the call succeeded.
        let _: serde_json::Value = self
            .call(
                "editMessageText",
                &serde_json::json!({
                    "chat_id": chat_id,
                    "message_id": message_id,
                    "text": text,
                }),
            )
            .await?;
        Ok(())
    }

    /// Upload a local audio file. Telegram stores it and returns a
    /// file_id reusable for future resends without re-uploading.
    pub async fn send_audio_file(
        &self,
        chat_id: i64,
        audio: &PreparedAudio,
    ) -> Result<FileRef, PublishError> {
        let file_name = audio
            .path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        let file_bytes = tokio::fs::read(&audio.path).await?;

        let file_part = Part::bytes(file_bytes)
            .file_name(file_name)
            .mime_str("audio/mpeg")?;

        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("title", audio.title.clone())
            .part("audio", file_part);

        if let Some(ref performer) = audio.performer {
            form = form.text("performer", performer.clone());
        }
        if let Some(duration) = audio.duration_secs {
            form = form.text("duration", duration.to_string());
        }

        let response = self
            .client
            .post(self.api_url("sendAudio"))
            .multipart(form)
            .send()
            .await?;

        let envelope: TelegramResponse<Message> = response.json().await?;
        let message = envelope.into_result()?;

        message
            .audio
            .map(|a| FileRef::new(a.file_id))
            .ok_or_else(|| PublishError::Api("upload response carried no audio".to_string()))
    }

    /// Resend a previously uploaded audio by its durable reference.
    pub async fn send_audio_ref(
        &self,
        chat_id: i64,
        file_ref: &FileRef,
    ) -> Result<(), PublishError> {
        let _: Message = self
            .call(
                "sendAudio",
                &serde_json::json!({
                    "chat_id": chat_id,
                    "audio": file_ref.as_str(),
                }),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl AudioPublisher for TelegramApi {
    async fn publish_file(
        &self,
        chat_id: i64,
        audio: &PreparedAudio,
    ) -> Result<FileRef, PublishError> {
        self.send_audio_file(chat_id, audio).await
    }

    async fn publish_ref(&self, chat_id: i64, file_ref: &FileRef) -> Result<(), PublishError> {
        self.send_audio_ref(chat_id, file_ref).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url() {
        let client = TelegramApi::new("TOKEN".to_string());
        assert_eq!(
            client.api_url("sendMessage"),
            "https://api.telegram.org/botTOKEN/sendMessage"
        );
    }

    #[test]
    fn test_envelope_ok() {
        let envelope: TelegramResponse<i64> =
            serde_json::from_str(r#"{"ok": true, "result": 42}"#).unwrap();
        assert_eq!(envelope.into_result().unwrap(), 42);
    }

    #[test]
    fn test_envelope_error_carries_description() {
        let envelope: TelegramResponse<i64> =
            serde_json::from_str(r#"{"ok": false, "description": "Bad Request"}"#).unwrap();
        match envelope.into_result() {
            Err(PublishError::Api(msg)) => assert_eq!(msg, "Bad Request"),
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_update_deserialization() {
        let payload = r#"{
            "update_id": 7,
            "callback_query": {
                "id": "cb1",
                "from": {"id": 99, "language_code": "es"},
                "message": {"message_id": 3, "chat": {"id": -100}, "text": "hi"},
                "data": "dl|abc123"
            }
        }"#;

        let update: Update = serde_json::from_str(payload).unwrap();
        let callback = update.callback_query.unwrap();
        assert_eq!(callback.from.id, 99);
        assert_eq!(callback.data.as_deref(), Some("dl|abc123"));
        assert_eq!(callback.message.unwrap().chat.id, -100);
    }

    #[test]
    fn test_upload_response_extracts_file_id() {
        let envelope: TelegramResponse<Message> = serde_json::from_str(
            r#"{"ok": true, "result": {
                "message_id": 10,
                "chat": {"id": 5},
                "audio": {"file_id": "CQACAgIAAxkBAAE"}
            }}"#,
        )
        .unwrap();

        let message = envelope.into_result().unwrap();
        assert_eq!(message.audio.unwrap().file_id, "CQACAgIAAxkBAAE");
    }
}
