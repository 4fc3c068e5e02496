use std::sync::Arc;

use log::*;
use reqwest::Client;

use crate::{
    config::TelegramConfig,
    data_objects::{SendMessage, TelegramResponse},
    rest::{build_client, send_request},
    ProcessorApiError,
};

const MARKDOWN_SPECIAL: &[char] =
    &['_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!', '\\'];

/// Escapes every MarkdownV2 control character with a backslash.
pub fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        if MARKDOWN_SPECIAL.contains(&c) {
            result.push('\\');
        }
        result.push(c);
    }
    result
}

/// Sends chat messages through the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramApi {
    config: TelegramConfig,
    client: Arc<Client>,
}

impl TelegramApi {
    pub fn new(config: TelegramConfig) -> Result<Self, ProcessorApiError> {
        let client = build_client(Client::builder(), config.timeout)?;
        Ok(Self { config, client: Arc::new(client) })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.config.api_url.trim_end_matches('/'), self.config.bot_token.reveal())
    }

    /// Sends `text` to `chat_id`. The text must already be MarkdownV2-escaped.
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), ProcessorApiError> {
        let body = SendMessage { chat_id, text, parse_mode: "MarkdownV2" };
        let req = self.client.post(self.url("sendMessage")).json(&body);
        let response: TelegramResponse = send_request(req, telegram_error_message).await?;
        if !response.ok {
            let reason = response.description.unwrap_or_else(|| "unknown error".to_string());
            return Err(ProcessorApiError::Rejected(reason));
        }
        trace!("Telegram message sent to {chat_id}");
        Ok(())
    }
}

fn telegram_error_message(body: &str) -> String {
    serde_json::from_str::<TelegramResponse>(body)
        .ok()
        .and_then(|r| r.description)
        .unwrap_or_else(|| body.to_string())
}
