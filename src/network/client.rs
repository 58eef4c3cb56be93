use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, ACCEPT_ENCODING, CONNECTION, CONTENT_LENGTH, HeaderMap, HeaderValue};
use serde_json::Value;

use super::{Reply, TransportError};

/// 单个连接池，探测、下载、通知共用。超时按请求单独设置。
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new() -> anyhow::Result<Self> {
        // reqwest 未启用 gzip 解码，要求服务端按原样返回，保证写盘的字节即文件内容。
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(concat!("file-monitor/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub fn head(&self, url: &str, timeout: Duration) -> Result<Reply, TransportError> {
        let resp = self.client.head(url).timeout(timeout).send()?;
        Ok(Reply {
            status: resp.status().as_u16(),
            content_length: header_content_length(resp.headers()),
            body: Vec::new(),
        })
    }

    /// 读取完整响应体；传输中途断开同样返回 `TransportError`。
    pub fn get(&self, url: &str, timeout: Duration) -> Result<Reply, TransportError> {
        let resp = self.client.get(url).timeout(timeout).send()?;
        let status = resp.status().as_u16();
        let content_length = header_content_length(resp.headers());
        let body = resp.bytes()?.to_vec();
        Ok(Reply {
            status,
            content_length,
            body,
        })
    }

    pub fn post_json(
        &self,
        url: &str,
        payload: &Value,
        timeout: Duration,
    ) -> Result<Reply, TransportError> {
        let resp = self
            .client
            .post(url)
            .json(payload)
            .timeout(timeout)
            .send()?;
        let status = resp.status().as_u16();
        let body = resp.bytes()?.to_vec();
        Ok(Reply {
            status,
            content_length: None,
            body,
        })
    }
}

// HEAD 响应没有响应体，reqwest 的 content_length() 不可靠，直接读头。
fn header_content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}
