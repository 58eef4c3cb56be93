//! 阻塞式 HTTP 访问层。
//!
//! - `client` — 基于 `reqwest::blocking` 的共享客户端
//!
//! 上层（文件探测、Bot 通知）只依赖 `Reply` / `TransportError`，
//! 通过各自的 trait 接入，便于测试时替换。

pub mod client;

pub use client::HttpClient;

use std::borrow::Cow;

use thiserror::Error;

/// 传输层错误：超时、连接失败、读取响应体失败等。
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("failed to read response body: {0}")]
    Body(String),
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let msg = err.to_string();
        if err.is_timeout() {
            TransportError::Timeout(msg)
        } else if err.is_connect() {
            TransportError::Connect(msg)
        } else if err.is_body() || err.is_decode() {
            TransportError::Body(msg)
        } else {
            TransportError::Other(msg)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Reply {
    pub status: u16,
    pub content_length: Option<u64>,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// 按字符截断，避免在多字节 UTF-8 字符中间切断。
pub fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}
