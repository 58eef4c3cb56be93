//! 下载已确认存在的文件并写盘。

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use thiserror::Error;

use super::source::FileSource;
use crate::network::{TransportError, excerpt};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
const EXCERPT_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

#[derive(Debug)]
pub struct SavedFile {
    pub file_name: String,
    pub path: PathBuf,
    pub bytes: u64,
    pub elapsed: Duration,
    /// 因重名而改用了带序号的文件名
    pub renamed: bool,
}

impl SavedFile {
    pub fn size_mb(&self) -> f64 {
        to_mb(self.bytes)
    }

    pub fn speed_mb_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= f64::EPSILON {
            return 0.0;
        }
        self.size_mb() / secs
    }

    pub fn summary(&self) -> String {
        format!(
            "File download completed: {}\n📦 Size: {:.2} MB\n⚡ Speed: {:.2} MB/s\n⏱ Time: {:.2} seconds",
            self.file_name,
            self.size_mb(),
            self.speed_mb_per_sec(),
            self.elapsed.as_secs_f64()
        )
    }
}

#[derive(Debug)]
pub enum DownloadOutcome {
    Saved(SavedFile),
    /// 服务端返回非 200
    Rejected { status: u16, excerpt: String },
    Failed(DownloadError),
}

pub struct Downloader {
    dir: PathBuf,
    timeout: Duration,
}

impl Downloader {
    /// 目录不存在时创建。
    pub fn new(dir: impl Into<PathBuf>, timeout: Duration) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, timeout })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn download<S: FileSource + ?Sized>(
        &self,
        source: &S,
        url: &str,
        file_name: &str,
    ) -> DownloadOutcome {
        let started = Instant::now();
        let reply = match source.fetch(url, self.timeout) {
            Ok(reply) => reply,
            Err(err) => return DownloadOutcome::Failed(err.into()),
        };

        if !reply.is_ok() {
            return DownloadOutcome::Rejected {
                status: reply.status,
                excerpt: excerpt(&reply.text(), EXCERPT_CHARS),
            };
        }

        let path = resolve_target(&self.dir, file_name);
        if let Err(source) = write_new(&path, &reply.body) {
            return DownloadOutcome::Failed(DownloadError::Write { path, source });
        }

        let final_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.to_string());
        DownloadOutcome::Saved(SavedFile {
            renamed: final_name != file_name,
            file_name: final_name,
            path,
            bytes: reply.body.len() as u64,
            elapsed: started.elapsed(),
        })
    }
}

/// 找到一个不存在的目标路径：`file_5.txt` → `file_5_1.txt` → `file_5_2.txt` …
pub fn resolve_target(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let as_path = Path::new(file_name);
    let stem = as_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());
    let ext = as_path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut counter = 1u64;
    loop {
        let next = dir.join(format!("{stem}_{counter}{ext}"));
        if !next.exists() {
            return next;
        }
        counter += 1;
    }
}

// create_new：即使目标在 resolve 之后才出现，也不会覆盖
fn write_new(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let file = OpenOptions::new().write(true).create_new(true).open(path)?;
    fill_or_discard(path, file, bytes)
}

// 写到一半失败时删除残缺文件，重试时沿用原文件名
fn fill_or_discard<W: Write>(path: &Path, mut writer: W, bytes: &[u8]) -> io::Result<()> {
    let written = writer.write_all(bytes).and_then(|()| writer.flush());
    if written.is_err() {
        drop(writer);
        let _ = fs::remove_file(path);
    }
    written
}

pub fn to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}
