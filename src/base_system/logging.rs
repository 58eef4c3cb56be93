use std::fs;
use std::io;
use std::panic;
use std::path::{Path, PathBuf};

use time::macros::format_description;
use tracing::error;
use tracing_appender::non_blocking::{self, WorkerGuard};
use tracing_appender::rolling;
use tracing_subscriber::Layer;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use super::local_time;

const LOG_FILE_PREFIX: &str = "file_monitor";

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("logging already initialized")]
    AlreadyInitialized,
    #[error("subscriber init failed: {0}")]
    SubscriberInit(#[from] tracing_subscriber::util::TryInitError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("time formatting failed: {0}")]
    Time(#[from] time::error::Format),
}

#[derive(Clone, Copy, Debug)]
pub struct LogOptions {
    pub debug: bool,
    pub use_color: bool,
    pub console: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            debug: false,
            use_color: true,
            console: true,
        }
    }
}

/// 控制台 + 按日期命名的日志文件。
///
/// drop 时刷新文件写入线程，需在 `main` 中持有到进程结束。
pub struct LogSystem {
    log_file: PathBuf,
    _guard: WorkerGuard,
}

impl LogSystem {
    pub fn init(options: LogOptions, logs_dir: &Path) -> Result<Self, LogError> {
        fs::create_dir_all(logs_dir)?;
        let file_name = dated_log_name()?;
        let log_file = logs_dir.join(&file_name);

        // 同一天重启时追加到同一个文件
        let file_appender = rolling::never(logs_dir, &file_name);
        let (file_writer, guard) = non_blocking::NonBlockingBuilder::default()
            .lossy(false)
            .finish(file_appender);

        let console_level = if options.debug {
            LevelFilter::DEBUG
        } else {
            LevelFilter::INFO
        };

        let console_writer: BoxMakeWriter = if options.console {
            BoxMakeWriter::new(io::stdout)
        } else {
            BoxMakeWriter::new(io::sink)
        };

        let console_layer = fmt::layer()
            .with_target(false)
            .with_level(true)
            .with_ansi(options.use_color)
            .with_writer(console_writer)
            .with_filter(console_level);

        let file_layer = fmt::layer()
            .with_target(false)
            .with_level(true)
            .with_ansi(false)
            .with_writer(file_writer)
            .with_filter(LevelFilter::DEBUG);

        tracing_subscriber::registry()
            .with(console_layer)
            .with(file_layer)
            .try_init()
            .map_err(|e| {
                let msg = e.to_string();
                if msg.contains("global subscriber") || msg.contains("already") {
                    LogError::AlreadyInitialized
                } else {
                    LogError::SubscriberInit(e)
                }
            })?;

        install_panic_hook();

        Ok(Self {
            log_file,
            _guard: guard,
        })
    }

    pub fn log_file(&self) -> &Path {
        &self.log_file
    }
}

fn install_panic_hook() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        if let Some(location) = info.location() {
            error!("panic at {}:{}: {}", location.file(), location.line(), info);
        } else {
            error!("panic: {info}");
        }
        previous(info);
    }));
}

fn dated_log_name() -> Result<String, LogError> {
    let date = local_time::now().format(format_description!("[year][month][day]"))?;
    Ok(format!("{LOG_FILE_PREFIX}_{date}.log"))
}
