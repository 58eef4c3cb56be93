//! Telegram Bot API：`sendMessage` 与 `getUpdates`。

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::Notify;
use crate::base_system::context::Config;
use crate::network::{HttpClient, Reply, TransportError, excerpt};

/// Bot API 的传输层。
pub trait BotTransport {
    fn get(&self, url: &str, timeout: Duration) -> Result<Reply, TransportError>;
    fn post_json(&self, url: &str, payload: &Value, timeout: Duration)
    -> Result<Reply, TransportError>;
}

impl BotTransport for HttpClient {
    fn get(&self, url: &str, timeout: Duration) -> Result<Reply, TransportError> {
        HttpClient::get(self, url, timeout)
    }

    fn post_json(
        &self,
        url: &str,
        payload: &Value,
        timeout: Duration,
    ) -> Result<Reply, TransportError> {
        HttpClient::post_json(self, url, payload, timeout)
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'static str,
}

#[derive(Deserialize)]
struct Updates {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    result: Vec<Update>,
}

#[derive(Deserialize)]
struct Update {
    message: Option<IncomingMessage>,
}

#[derive(Deserialize)]
struct IncomingMessage {
    chat: Chat,
}

#[derive(Deserialize)]
struct Chat {
    id: i64,
}

pub struct TelegramNotifier<T> {
    transport: T,
    send_url: String,
    updates_url: String,
    chat_id: Option<i64>,
    timeout: Duration,
}

impl<T: BotTransport> TelegramNotifier<T> {
    pub fn new(transport: T, config: &Config) -> Self {
        Self {
            transport,
            send_url: config.bot_method_url("sendMessage"),
            updates_url: config.bot_method_url("getUpdates"),
            chat_id: config.has_recipient().then_some(config.chat_id),
            timeout: config.request_timeout(),
        }
    }

    /// 从最近的对话中找出 Chat ID，供首次配置时使用。
    pub fn discover_recipient(&self) -> Option<i64> {
        info!("Attempting to get Chat ID...");
        let reply = match self.transport.get(&self.updates_url, self.timeout) {
            Ok(reply) => reply,
            Err(err) => {
                error!("Error getting Chat ID: {err}");
                error!("Please use @userinfobot to get Chat ID manually");
                return None;
            }
        };
        if !reply.is_ok() {
            error!(
                "getUpdates returned status {}: {}",
                reply.status,
                excerpt(&reply.text(), 200)
            );
            error!("Please use @userinfobot to get Chat ID manually");
            return None;
        }

        match latest_chat_id(&reply.body) {
            Ok(Some(chat_id)) => {
                info!("Successfully found Chat ID: {chat_id}");
                info!("Please copy this Chat ID to the CHAT_ID variable");
                Some(chat_id)
            }
            Ok(None) => {
                error!(
                    "No messages found. Please start a conversation with the bot (send /start)"
                );
                None
            }
            Err(err) => {
                error!("Error getting Chat ID: {err}");
                error!("Please use @userinfobot to get Chat ID manually");
                None
            }
        }
    }
}

impl<T: BotTransport> Notify for TelegramNotifier<T> {
    fn send(&self, message: &str) {
        let Some(chat_id) = self.chat_id else {
            error!("Please set CHAT_ID before running");
            return;
        };

        let escaped = html_escape(message);
        let payload = SendMessage {
            chat_id,
            text: &escaped,
            parse_mode: "HTML",
        };
        let payload = match serde_json::to_value(&payload) {
            Ok(v) => v,
            Err(err) => {
                error!("Failed to encode Telegram message: {err}");
                return;
            }
        };

        match self.transport.post_json(&self.send_url, &payload, self.timeout) {
            Ok(reply) if reply.is_success() => debug!("Telegram message delivered"),
            Ok(reply) => warn!(
                "Telegram rejected message with status {}: {}",
                reply.status,
                excerpt(&reply.text(), 200)
            ),
            Err(err) => error!("Failed to send Telegram message: {err}"),
        }
    }
}

/// 最近一条带 `message` 的更新的发送方 Chat ID。
fn latest_chat_id(body: &[u8]) -> Result<Option<i64>, serde_json::Error> {
    let updates: Updates = serde_json::from_slice(body)?;
    if !updates.ok {
        return Ok(None);
    }
    Ok(updates
        .result
        .iter()
        .rev()
        .find_map(|u| u.message.as_ref().map(|m| m.chat.id)))
}

/// 消息以 HTML 模式发送，正文中的 `<`、`>`、`&` 需转义。
pub fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}
