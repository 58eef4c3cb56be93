use std::time::Duration;

use super::source::FileSource;
use crate::network::TransportError;

#[derive(Debug)]
pub enum Existence {
    Present { size: u64 },
    Missing { status: u16 },
    /// 传输失败，按“不存在”处理
    Unreachable(TransportError),
}

impl Existence {
    /// `(exists, size_bytes)`
    pub fn found(&self) -> (bool, u64) {
        match self {
            Existence::Present { size } => (true, *size),
            _ => (false, 0),
        }
    }
}

pub struct ExistenceChecker {
    timeout: Duration,
}

impl ExistenceChecker {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn check<S: FileSource + ?Sized>(&self, source: &S, url: &str) -> Existence {
        match source.probe(url, self.timeout) {
            Ok(reply) if reply.is_ok() => Existence::Present {
                size: reply.content_length.unwrap_or(0),
            },
            Ok(reply) => Existence::Missing {
                status: reply.status,
            },
            Err(err) => Existence::Unreachable(err),
        }
    }
}
