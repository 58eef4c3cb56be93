//! 扫描循环：从游标当前位置逐个编号、逐个扩展名探测，直到越过结束编号。
//!
//! 所有单个候选的错误都在这里被吸收为“未找到”或“未下载”，
//! 一个坏 URL 不会中断本轮其余候选。

use std::collections::HashSet;
use std::io;
use std::path::Path;

use tracing::{debug, error, info};

use super::candidate::{Candidate, ScanCursor};
use super::checker::{Existence, ExistenceChecker};
use super::downloader::{DownloadOutcome, Downloader, to_mb};
use super::source::FileSource;
use super::status::StatusReporter;
use crate::base_system::context::Config;
use crate::base_system::shutdown::ShutdownSignal;
use crate::notify::Notify;

/// 一轮扫描的汇总。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub found: u64,
    pub downloaded: u64,
    pub wrapped: bool,
    pub interrupted: bool,
    pub next_index: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CandidateOutcome {
    AlreadySeen,
    NotFound,
    FoundOnly,
    Downloaded,
}

pub struct Scanner<S, N> {
    source: S,
    notifier: N,
    checker: ExistenceChecker,
    downloader: Downloader,
    file_base_url: String,
    extensions: Vec<String>,
    cursor: ScanCursor,
    seen: HashSet<String>,
    shutdown: Option<ShutdownSignal>,
}

impl<S: FileSource, N: Notify> Scanner<S, N> {
    /// 下载目录不存在时创建。
    pub fn new(config: &Config, source: S, notifier: N) -> io::Result<Self> {
        Ok(Self {
            source,
            notifier,
            checker: ExistenceChecker::new(config.request_timeout()),
            downloader: Downloader::new(&config.download_dir, config.download_timeout())?,
            file_base_url: config.file_base_url(),
            extensions: config.extensions.clone(),
            cursor: ScanCursor::new(config.start_index, config.end_index),
            seen: HashSet::new(),
            shutdown: None,
        })
    }

    /// 收到中断后，在两个候选之间结束本轮。
    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn download_dir(&self) -> &Path {
        self.downloader.dir()
    }

    pub fn cursor(&self) -> &ScanCursor {
        &self.cursor
    }

    pub fn has_seen(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    pub fn scan(&mut self, status: &mut StatusReporter) -> PassSummary {
        info!("Starting file check...");
        info!("Current check index: {}", self.cursor.current());

        let mut summary = PassSummary::default();
        'pass: loop {
            let index = self.cursor.current();
            let candidates: Vec<Candidate> = self
                .extensions
                .iter()
                .map(|ext| Candidate::new(index, ext.as_str()))
                .collect();

            for candidate in &candidates {
                if self.stop_requested() {
                    info!("Shutdown requested, stopping scan at index {index}");
                    summary.interrupted = true;
                    break 'pass;
                }
                match self.process(candidate) {
                    CandidateOutcome::Downloaded => {
                        summary.found += 1;
                        summary.downloaded += 1;
                    }
                    CandidateOutcome::FoundOnly => summary.found += 1,
                    CandidateOutcome::NotFound | CandidateOutcome::AlreadySeen => {}
                }
            }

            if self.cursor.advance() {
                info!(
                    "Completed full check cycle ({}-{}), resetting to {}",
                    self.cursor.start(),
                    self.cursor.end(),
                    self.cursor.start()
                );
                summary.wrapped = true;
                break;
            }
        }

        summary.next_index = self.cursor.current();
        status.record(summary.found, summary.downloaded);
        status.set_current_index(summary.next_index);
        debug!(?summary, "scan pass finished");
        summary
    }

    fn stop_requested(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|s| s.is_requested())
    }

    fn process(&mut self, candidate: &Candidate) -> CandidateOutcome {
        let url = candidate.url(&self.file_base_url);
        if self.seen.contains(&url) {
            return CandidateOutcome::AlreadySeen;
        }

        let file_name = candidate.file_name();
        info!("Checking file: {file_name}");

        let size = match self.checker.check(&self.source, &url) {
            Existence::Present { size } => size,
            Existence::Missing { status } => {
                debug!("{file_name} not available (status {status})");
                return CandidateOutcome::NotFound;
            }
            Existence::Unreachable(err) => {
                let msg = format!("Error checking file existence: {err}");
                error!("{msg}");
                self.notifier.send(&msg);
                return CandidateOutcome::NotFound;
            }
        };

        self.notifier.send(&format!(
            "❗️New file found: {file_name}\n📦 Size: {:.2} MB\n👉 Attempting to download...",
            to_mb(size)
        ));

        info!("Downloading file: {file_name}");
        match self.downloader.download(&self.source, &url, &file_name) {
            DownloadOutcome::Saved(saved) => {
                if saved.renamed {
                    info!("File already exists, renamed to: {}", saved.file_name);
                }
                let msg = saved.summary();
                info!("{msg}");
                debug!("saved to {}", saved.path.display());
                self.notifier.send(&msg);
                self.seen.insert(url);
                CandidateOutcome::Downloaded
            }
            DownloadOutcome::Rejected { status, excerpt } => {
                let msg = format!(
                    "File download failed: {file_name}\nStatus code: {status}\nResponse: {excerpt}"
                );
                error!("{msg}");
                self.notifier.send(&msg);
                CandidateOutcome::FoundOnly
            }
            DownloadOutcome::Failed(err) => {
                let msg = format!("Error downloading file: {file_name}\nError: {err}");
                error!("{msg}");
                self.notifier.send(&msg);
                CandidateOutcome::FoundOnly
            }
        }
    }
}
