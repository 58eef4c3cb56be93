//! File Monitor：轮询 Bot 文件端点，发现新文档即下载并通过 Telegram 通知。
//!
//! 代码结构（读代码入口）：
//! - `base_system`：配置/日志/本地时间/中断信号等基础设施
//! - `network`：阻塞式 HTTP 客户端
//! - `notify`：Telegram 通知与 Chat ID 获取
//! - `monitor`：扫描循环、下载、状态报告与定时调度

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use tracing::{debug, error, info};

mod base_system;
mod monitor;
mod network;
mod notify;

use base_system::config::{load_env_file, write_env_template};
use base_system::context::{Config, DEFAULT_LOG_DIR};
use base_system::logging::{LogOptions, LogSystem};
use base_system::shutdown::ShutdownSignal;
use monitor::scheduler::Clock;
use monitor::source::FileSource;
use monitor::{Driver, Scanner, SystemClock};
use network::HttpClient;
use notify::{Notify, TelegramNotifier};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Parser)]
#[command(name = "file-monitor")]
#[command(about = "Watch a bot file endpoint for new documents and report to Telegram")]
struct Cli {
    /// 启用调试日志输出
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// 指定 .env 文件（默认在当前目录查找）
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// 查询 Bot 最近收到的消息并打印 Chat ID 后退出
    #[arg(long, default_value_t = false)]
    discover_chat_id: bool,

    /// 生成带注释的 .env 模板后退出
    #[arg(long, value_name = "PATH")]
    write_env_template: Option<PathBuf>,

    /// 显示版本信息后退出
    #[arg(long, default_value_t = false)]
    version: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("File Monitor v{}", VERSION);
        return Ok(());
    }

    if let Some(path) = cli.write_env_template.as_deref() {
        write_env_template::<Config>(path)?;
        println!("Environment template written to {}", path.display());
        return Ok(());
    }

    // 必须在任何线程启动之前读取本地时区
    base_system::local_time::init();

    let env_file = load_env_file(cli.env_file.as_deref())?;
    let loaded = Config::from_env();
    let log_dir = loaded
        .as_ref()
        .map(|c| c.log_dir.clone())
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_LOG_DIR));
    let log = init_logging(cli.debug, &log_dir)?;
    info!("=== Logging system initialized ===");
    info!("Log file created: {}", log.log_file().display());
    if let Some(path) = env_file {
        info!("Environment loaded from {}", path.display());
    }

    let config = loaded.inspect_err(|err| error!("{err}"))?;
    let client = HttpClient::new().context("init HTTP client")?;

    if cli.discover_chat_id {
        return discover_chat_id(client, &config);
    }

    config.validate().inspect_err(|err| error!("{err}"))?;
    info!("Configuration validation passed");
    debug!("Current configuration:\n{}", config.describe());

    let result = monitor_until_stopped(client, &config, log.log_file());
    info!("=== File Monitor System Stopped ===");
    result
}

fn init_logging(debug: bool, log_dir: &Path) -> Result<LogSystem> {
    let opts = LogOptions {
        debug,
        ..LogOptions::default()
    };
    LogSystem::init(opts, log_dir).map_err(|e| anyhow!(e))
}

fn discover_chat_id(client: HttpClient, config: &Config) -> Result<()> {
    if config.bot_token.is_empty() {
        bail!("BOT_TOKEN not set, please check .env file");
    }
    let notifier = TelegramNotifier::new(client, config);
    match notifier.discover_recipient() {
        Some(chat_id) => {
            println!("{chat_id}");
            Ok(())
        }
        None => Err(anyhow!("no Chat ID discovered")),
    }
}

fn monitor_until_stopped(client: HttpClient, config: &Config, log_file: &Path) -> Result<()> {
    let shutdown = ShutdownSignal::install().context("install Ctrl+C handler")?;
    let notifier = TelegramNotifier::new(client.clone(), config);
    let scanner = Scanner::new(config, client, notifier)
        .with_context(|| format!("create {}", config.download_dir.display()))?
        .with_shutdown(shutdown.clone());
    let mut driver = Driver::new(config, scanner, SystemClock);

    driver
        .notifier()
        .send(&startup_message(config, driver.scanner().download_dir()));

    supervise(&mut driver, &shutdown, log_file)
}

/// 运行到中断为止；驱动内部 panic 时通知运维并返回错误。
fn supervise<S: FileSource, N: Notify, C: Clock>(
    driver: &mut Driver<S, N, C>,
    shutdown: &ShutdownSignal,
    log_file: &Path,
) -> Result<()> {
    match panic::catch_unwind(AssertUnwindSafe(|| driver.run(shutdown))) {
        Ok(()) => {
            driver.notifier().send("🛑 File Monitor System Stopped");
            Ok(())
        }
        Err(payload) => {
            let msg = format!("System error occurred: {}", panic_reason(payload.as_ref()));
            error!("{msg}");
            driver.notifier().send(&format!(
                "⚠️ {msg}\nPlease check log file: {}",
                log_file.display()
            ));
            Err(anyhow!(msg))
        }
    }
}

fn startup_message(config: &Config, download_dir: &Path) -> String {
    format!(
        "🤖 File Monitor System Started\n\
         📂 File save location: {}\n\
         📝 Supported file types: {}\n\
         📋 Log file location: {}\n\
         ⏰ Status report will be sent every {} hours\n\
         ❗ Immediate notification for new files",
        absolute(download_dir).display(),
        config.extensions.join(", "),
        absolute(&config.log_dir).display(),
        config.report_interval_hours
    )
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::monitor::testing::{FakeSource, ManualClock};
    use crate::network::{Reply, TransportError};
    use crate::notify::testing::RecordingNotifier;

    struct ExplodingSource;

    impl FileSource for ExplodingSource {
        fn probe(&self, _url: &str, _timeout: Duration) -> Result<Reply, TransportError> {
            panic!("probe exploded");
        }

        fn fetch(&self, _url: &str, _timeout: Duration) -> Result<Reply, TransportError> {
            panic!("fetch exploded");
        }
    }

    fn driver_with<S: FileSource>(
        dir: &Path,
        source: S,
        notifier: RecordingNotifier,
    ) -> Driver<S, RecordingNotifier, ManualClock> {
        let config = Config {
            end_index: 0,
            extensions: vec!["txt".into()],
            download_dir: dir.to_path_buf(),
            ..Config::default()
        };
        let scanner = Scanner::new(&config, source, notifier).unwrap();
        Driver::new(&config, scanner, ManualClock::new())
    }

    fn fired() -> ShutdownSignal {
        let (trigger, signal) = ShutdownSignal::pair();
        trigger.fire();
        signal
    }

    #[test]
    fn interrupt_sends_stop_message_and_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = RecordingNotifier::default();
        let mut driver = driver_with(dir.path(), FakeSource::default(), notifier.clone());

        supervise(&mut driver, &fired(), Path::new("logs/file_monitor.log")).unwrap();

        assert_eq!(
            notifier.messages(),
            vec!["🛑 File Monitor System Stopped".to_string()]
        );
    }

    #[test]
    fn panic_in_driver_notifies_operator_and_fails() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = RecordingNotifier::default();
        let mut driver = driver_with(dir.path(), ExplodingSource, notifier.clone());

        let err = supervise(&mut driver, &fired(), Path::new("logs/file_monitor.log"))
            .unwrap_err();

        assert_eq!(err.to_string(), "System error occurred: probe exploded");
        assert_eq!(
            notifier.messages(),
            vec![
                "⚠️ System error occurred: probe exploded\nPlease check log file: logs/file_monitor.log"
                    .to_string()
            ]
        );
        assert_eq!(notifier.count_containing("Stopped"), 0);
    }

    #[test]
    fn startup_message_lists_locations_and_interval() {
        let config = Config {
            extensions: vec!["txt".into(), "zip".into()],
            report_interval_hours: 4,
            ..Config::default()
        };
        let msg = startup_message(&config, Path::new("/srv/files"));
        assert!(msg.starts_with("🤖 File Monitor System Started\n"));
        assert!(msg.contains("📂 File save location: /srv/files\n"));
        assert!(msg.contains("📝 Supported file types: txt, zip\n"));
        assert!(msg.contains("every 4 hours"));
    }

    #[test]
    fn panic_reason_reads_common_payloads() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("boom 1"));
        assert_eq!(panic_reason(owned.as_ref()), "boom 1");
        let fixed: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_reason(fixed.as_ref()), "static");
        let other: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_reason(other.as_ref()), "unknown panic");
    }

    #[test]
    fn cli_parses_flags() {
        let cli = Cli::parse_from(["file-monitor", "--debug", "--env-file", "prod.env"]);
        assert!(cli.debug);
        assert_eq!(cli.env_file, Some(PathBuf::from("prod.env")));
        assert!(!cli.discover_chat_id);
    }
}
