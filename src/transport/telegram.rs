use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::{InboundMessage, MessageSink};

const API_BASE: &str = "https://api.telegram.org";
/// Headroom on top of the long-poll timeout before reqwest gives up.
const HTTP_GRACE_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub username: Option<String>,
}

impl Update {
    /// Updates that are not plain messages (edits, joins, polls) yield `None`.
    pub fn into_inbound(self) -> Option<InboundMessage> {
        let message = self.message?;
        Some(InboundMessage {
            chat_id: message.chat.id,
            sender: message.from.and_then(|user| user.username),
            text: message.text,
        })
    }
}

#[derive(Serialize)]
struct GetUpdatesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: [&'static str; 1],
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
}

/// Minimal Bot API client: long polling in, plain text out.
#[derive(Clone)]
pub struct TelegramClient {
    client: reqwest::Client,
    base_url: String,
    poll_timeout_secs: u64,
}

impl TelegramClient {
    pub fn new(token: &str, poll_timeout_secs: u64) -> Result<Self> {
        Self::with_base_url(API_BASE, token, poll_timeout_secs)
    }

    pub fn with_base_url(api_base: &str, token: &str, poll_timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(poll_timeout_secs.saturating_add(HTTP_GRACE_SECS)))
            .build()
            .context("Failed to create Telegram HTTP client")?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{}", api_base.trim_end_matches('/'), token),
            poll_timeout_secs,
        })
    }

    /// Long-poll for updates with id `>= offset`.
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>> {
        let request = GetUpdatesRequest {
            offset,
            timeout: self.poll_timeout_secs,
            allowed_updates: ["message"],
        };
        self.call("getUpdates", &request).await
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let request = SendMessageRequest { chat_id, text };
        let _: serde_json::Value = self.call("sendMessage", &request).await?;
        Ok(())
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, method);
        // the URL embeds the token, so errors are reported without it
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|err| anyhow!("{method} request failed: {}", err.without_url()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| anyhow!("{method} response unreadable: {}", err.without_url()))?;

        parse_response(method, status.as_u16(), &text)
    }
}

fn parse_response<T: DeserializeOwned>(method: &str, status: u16, body: &str) -> Result<T> {
    let parsed: ApiResponse<T> = serde_json::from_str(body)
        .with_context(|| format!("{method} returned HTTP {status} with an unparseable body"))?;

    if !parsed.ok {
        let reason = parsed.description.unwrap_or_else(|| "no description".into());
        return Err(anyhow!("{method} rejected (HTTP {status}): {reason}"));
    }
    parsed
        .result
        .ok_or_else(|| anyhow!("{method} returned ok without a result"))
}

/// The configured destination chat, reached through a [`TelegramClient`].
#[derive(Clone)]
pub struct ChatDestination {
    client: TelegramClient,
    chat_id: i64,
}

impl ChatDestination {
    pub fn new(client: TelegramClient, chat_id: i64) -> Self {
        Self { client, chat_id }
    }
}

#[async_trait]
impl MessageSink for ChatDestination {
    async fn send_text(&self, text: &str) -> Result<()> {
        self.client
            .send_message(self.chat_id, text)
            .await
            .with_context(|| format!("sending to chat {}", self.chat_id))
    }
}
