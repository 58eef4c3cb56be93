//! 测试用的内存文件服务与手动时钟。

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use super::scheduler::Clock;
use super::source::FileSource;
use crate::network::{Reply, TransportError};

#[derive(Debug, Clone)]
pub(crate) struct FakeFile {
    status: u16,
    content_length: Option<u64>,
    body: Vec<u8>,
    fetch_status: Option<u16>,
    probe_fails: bool,
    fetch_fails: bool,
}

impl FakeFile {
    pub(crate) fn ok(body: &[u8]) -> Self {
        Self {
            status: 200,
            content_length: Some(body.len() as u64),
            body: body.to_vec(),
            fetch_status: None,
            probe_fails: false,
            fetch_fails: false,
        }
    }

    pub(crate) fn status(status: u16) -> Self {
        Self {
            status,
            content_length: None,
            body: Vec::new(),
            fetch_status: None,
            probe_fails: false,
            fetch_fails: false,
        }
    }

    pub(crate) fn unreachable() -> Self {
        Self {
            probe_fails: true,
            fetch_fails: true,
            ..Self::status(200)
        }
    }

    pub(crate) fn with_length(mut self, len: u64) -> Self {
        self.content_length = Some(len);
        self
    }

    pub(crate) fn without_length(mut self) -> Self {
        self.content_length = None;
        self
    }

    pub(crate) fn with_body(mut self, body: &[u8]) -> Self {
        self.body = body.to_vec();
        self
    }

    /// HEAD 照常返回，GET 返回另一个状态码。
    pub(crate) fn fetch_status(mut self, status: u16) -> Self {
        self.fetch_status = Some(status);
        self
    }

    /// HEAD 正常，GET 在读取响应体时断开。
    pub(crate) fn failing_fetch(mut self) -> Self {
        self.fetch_fails = true;
        self
    }
}

#[derive(Default)]
struct Served {
    files: HashMap<String, FakeFile>,
    probes: Vec<String>,
    fetches: Vec<String>,
}

/// 未登记的 URL 一律返回 404。克隆体共享同一份状态。
#[derive(Clone, Default)]
pub(crate) struct FakeSource {
    inner: Rc<RefCell<Served>>,
}

impl FakeSource {
    pub(crate) fn serve(&self, url: &str, file: FakeFile) {
        self.inner.borrow_mut().files.insert(url.to_string(), file);
    }

    pub(crate) fn probes(&self) -> Vec<String> {
        self.inner.borrow().probes.clone()
    }

    pub(crate) fn fetches(&self) -> Vec<String> {
        self.inner.borrow().fetches.clone()
    }

    pub(crate) fn probe_count(&self, url: &str) -> usize {
        self.inner.borrow().probes.iter().filter(|u| *u == url).count()
    }
}

impl FileSource for FakeSource {
    fn probe(&self, url: &str, _timeout: Duration) -> Result<Reply, TransportError> {
        let mut inner = self.inner.borrow_mut();
        inner.probes.push(url.to_string());
        match inner.files.get(url) {
            None => Ok(Reply {
                status: 404,
                ..Reply::default()
            }),
            Some(f) if f.probe_fails => Err(TransportError::Connect(format!("{url}: refused"))),
            Some(f) => Ok(Reply {
                status: f.status,
                content_length: f.content_length,
                body: Vec::new(),
            }),
        }
    }

    fn fetch(&self, url: &str, _timeout: Duration) -> Result<Reply, TransportError> {
        let mut inner = self.inner.borrow_mut();
        inner.fetches.push(url.to_string());
        match inner.files.get(url) {
            None => Ok(Reply {
                status: 404,
                body: b"Not Found".to_vec(),
                ..Reply::default()
            }),
            Some(f) if f.fetch_fails => {
                Err(TransportError::Body(format!("{url}: connection reset")))
            }
            Some(f) => Ok(Reply {
                status: f.fetch_status.unwrap_or(f.status),
                content_length: f.content_length,
                body: f.body.clone(),
            }),
        }
    }
}

#[derive(Clone)]
pub(crate) struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl ManualClock {
    pub(crate) fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
        }
    }

    pub(crate) fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}
