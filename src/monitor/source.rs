use std::time::Duration;

use crate::network::{HttpClient, Reply, TransportError};

/// 远端文件服务：`probe` 只取元信息，`fetch` 读取完整内容。
pub trait FileSource {
    fn probe(&self, url: &str, timeout: Duration) -> Result<Reply, TransportError>;
    fn fetch(&self, url: &str, timeout: Duration) -> Result<Reply, TransportError>;
}

impl FileSource for HttpClient {
    fn probe(&self, url: &str, timeout: Duration) -> Result<Reply, TransportError> {
        self.head(url, timeout)
    }

    fn fetch(&self, url: &str, timeout: Duration) -> Result<Reply, TransportError> {
        self.get(url, timeout)
    }
}
