//! 全局配置结构（Config）与默认值。
//!
//! 该模块同时提供生成 `.env` 模板的字段元信息。

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use super::config::{
    ConfigError, ConfigSpec, EnvLookup, FieldMeta, ProcessEnv, read_parsed, read_string,
};

pub const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_DOWNLOAD_DIR: &str = "downloaded_files";
const DEFAULT_API_BASE_URL: &str = "https://api.telegram.org";
const DEFAULT_EXTENSIONS: &str = "txt,zip";
const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 60 * 60;

#[derive(Debug, Clone, Serialize)]
pub struct Config {
    // 通知配置
    #[serde(skip_serializing)]
    pub bot_token: String,
    pub chat_id: i64,

    // 监控配置
    #[serde(skip_serializing)]
    pub monitor_token: String,
    pub check_interval_minutes: u64,
    pub report_interval_hours: u64,
    pub start_index: u64,
    pub end_index: u64,
    pub extensions: Vec<String>,

    // 网络配置
    pub api_base_url: String,
    pub request_timeout: u64,
    pub download_timeout: u64,

    // 路径配置
    pub download_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: 0,
            monitor_token: String::new(),
            check_interval_minutes: default_check_interval(),
            report_interval_hours: default_report_interval(),
            start_index: 0,
            end_index: default_end_index(),
            extensions: parse_extensions(DEFAULT_EXTENSIONS),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: default_request_timeout(),
            download_timeout: default_download_timeout(),
            download_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
        }
    }
}

impl ConfigSpec for Config {
    fn fields() -> &'static [FieldMeta] {
        static FIELDS: [FieldMeta; 13] = [
            FieldMeta {
                name: "BOT_TOKEN",
                description: "用于发送通知的机器人 Token",
                default: "",
            },
            FieldMeta {
                name: "CHAT_ID",
                description: "接收通知的 Chat ID（可用 --discover-chat-id 获取）",
                default: "0",
            },
            FieldMeta {
                name: "MONITOR_TOKEN",
                description: "被监控文件端点所属机器人的 Token",
                default: "",
            },
            FieldMeta {
                name: "DOWNLOAD_DIR",
                description: "文件保存目录",
                default: DEFAULT_DOWNLOAD_DIR,
            },
            FieldMeta {
                name: "LOG_DIR",
                description: "日志目录",
                default: DEFAULT_LOG_DIR,
            },
            FieldMeta {
                name: "CHECK_INTERVAL",
                description: "扫描间隔（分钟）",
                default: "5",
            },
            FieldMeta {
                name: "REPORT_INTERVAL",
                description: "状态报告间隔（小时）",
                default: "6",
            },
            FieldMeta {
                name: "START_INDEX",
                description: "扫描起始编号（含）",
                default: "0",
            },
            FieldMeta {
                name: "END_INDEX",
                description: "扫描结束编号（含）",
                default: "100",
            },
            FieldMeta {
                name: "SUPPORTED_EXTENSIONS",
                description: "支持的扩展名，逗号分隔",
                default: DEFAULT_EXTENSIONS,
            },
            FieldMeta {
                name: "API_BASE_URL",
                description: "Bot API 与文件服务地址",
                default: DEFAULT_API_BASE_URL,
            },
            FieldMeta {
                name: "REQUEST_TIMEOUT",
                description: "探测/通知请求超时时间（秒）",
                default: "10",
            },
            FieldMeta {
                name: "DOWNLOAD_TIMEOUT",
                description: "下载请求超时时间（秒）",
                default: "30",
            },
        ];
        &FIELDS
    }

    fn from_lookup<L: EnvLookup>(lookup: &L) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            bot_token: read_string(lookup, "BOT_TOKEN", ""),
            chat_id: read_parsed(lookup, "CHAT_ID", defaults.chat_id)?,
            monitor_token: read_string(lookup, "MONITOR_TOKEN", ""),
            check_interval_minutes: read_parsed(
                lookup,
                "CHECK_INTERVAL",
                defaults.check_interval_minutes,
            )?,
            report_interval_hours: read_parsed(
                lookup,
                "REPORT_INTERVAL",
                defaults.report_interval_hours,
            )?,
            start_index: read_parsed(lookup, "START_INDEX", defaults.start_index)?,
            end_index: read_parsed(lookup, "END_INDEX", defaults.end_index)?,
            extensions: lookup
                .get("SUPPORTED_EXTENSIONS")
                .map(|raw| parse_extensions(&raw))
                .unwrap_or(defaults.extensions),
            api_base_url: read_string(lookup, "API_BASE_URL", DEFAULT_API_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            request_timeout: read_parsed(lookup, "REQUEST_TIMEOUT", defaults.request_timeout)?,
            download_timeout: read_parsed(lookup, "DOWNLOAD_TIMEOUT", defaults.download_timeout)?,
            download_dir: PathBuf::from(read_string(
                lookup,
                "DOWNLOAD_DIR",
                DEFAULT_DOWNLOAD_DIR,
            )),
            log_dir: PathBuf::from(read_string(lookup, "LOG_DIR", DEFAULT_LOG_DIR)),
        })
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&ProcessEnv)
    }

    /// 启动前校验；任何一项失败都视为致命错误。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot_token.is_empty() {
            return Err(ConfigError::Validation("BOT_TOKEN not set".to_string()));
        }
        if self.chat_id == 0 {
            return Err(ConfigError::Validation("CHAT_ID not set".to_string()));
        }
        if self.monitor_token.is_empty() {
            return Err(ConfigError::Validation("MONITOR_TOKEN not set".to_string()));
        }
        if self.start_index > self.end_index {
            return Err(ConfigError::Validation(
                "START_INDEX must be less than or equal to END_INDEX".to_string(),
            ));
        }
        if self.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "SUPPORTED_EXTENSIONS not set".to_string(),
            ));
        }
        if self.check_interval_minutes == 0 || self.report_interval_hours == 0 {
            return Err(ConfigError::Validation(
                "CHECK_INTERVAL and REPORT_INTERVAL must be greater than zero".to_string(),
            ));
        }
        if self.check_interval_minutes.checked_mul(SECS_PER_MINUTE).is_none()
            || self.report_interval_hours.checked_mul(SECS_PER_HOUR).is_none()
        {
            return Err(ConfigError::Validation(
                "CHECK_INTERVAL or REPORT_INTERVAL is too large".to_string(),
            ));
        }
        if self.request_timeout == 0 || self.download_timeout == 0 {
            return Err(ConfigError::Validation(
                "REQUEST_TIMEOUT and DOWNLOAD_TIMEOUT must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn has_recipient(&self) -> bool {
        self.chat_id != 0
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_minutes.saturating_mul(SECS_PER_MINUTE))
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_hours.saturating_mul(SECS_PER_HOUR))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout)
    }

    /// 被监控的文件目录，例如 `https://api.telegram.org/file/bot<token>/documents`。
    pub fn file_base_url(&self) -> String {
        format!(
            "{}/file/bot{}/documents",
            self.api_base_url, self.monitor_token
        )
    }

    pub fn bot_method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base_url, self.bot_token, method)
    }

    /// 不含 Token 的配置摘要，用于 debug 日志。
    pub fn describe(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|err| format!("<unavailable: {err}>"))
    }
}

pub fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|ext| ext.trim().trim_start_matches('.'))
        .filter(|ext| !ext.is_empty())
        .map(str::to_string)
        .collect()
}

fn default_check_interval() -> u64 {
    5
}

fn default_report_interval() -> u64 {
    6
}

fn default_end_index() -> u64 {
    100
}

fn default_request_timeout() -> u64 {
    10
}

fn default_download_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::base_system::config::generate_env_template;

    fn lookup(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn valid() -> HashMap<String, String> {
        lookup(&[
            ("BOT_TOKEN", "123:abc"),
            ("CHAT_ID", "-1001"),
            ("MONITOR_TOKEN", "456:def"),
        ])
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = Config::from_lookup(&valid()).unwrap();
        assert_eq!(cfg.check_interval_minutes, 5);
        assert_eq!(cfg.report_interval_hours, 6);
        assert_eq!((cfg.start_index, cfg.end_index), (0, 100));
        assert_eq!(cfg.extensions, vec!["txt", "zip"]);
        assert_eq!(cfg.download_dir, PathBuf::from("downloaded_files"));
        assert_eq!(cfg.request_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.download_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.chat_id, -1001);
        cfg.validate().unwrap();
    }

    #[test]
    fn builds_file_and_bot_urls() {
        let mut env = valid();
        env.insert("API_BASE_URL".into(), "http://localhost:8081/".into());
        let cfg = Config::from_lookup(&env).unwrap();
        assert_eq!(
            cfg.file_base_url(),
            "http://localhost:8081/file/bot456:def/documents"
        );
        assert_eq!(
            cfg.bot_method_url("sendMessage"),
            "http://localhost:8081/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn extensions_are_trimmed_and_blank_entries_dropped() {
        assert_eq!(parse_extensions(" txt, .zip ,,pdf "), vec!["txt", "zip", "pdf"]);
        assert!(parse_extensions(" , ").is_empty());
    }

    #[test]
    fn validation_rejects_missing_required_values() {
        for missing in ["BOT_TOKEN", "CHAT_ID", "MONITOR_TOKEN"] {
            let mut env = valid();
            env.remove(missing);
            let cfg = Config::from_lookup(&env).unwrap();
            let err = cfg.validate().unwrap_err();
            assert!(err.to_string().contains(missing), "{missing}: {err}");
        }
    }

    #[test]
    fn validation_rejects_zero_chat_id() {
        let mut env = valid();
        env.insert("CHAT_ID".into(), "0".into());
        let cfg = Config::from_lookup(&env).unwrap();
        assert!(!cfg.has_recipient());
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validation_rejects_inverted_range_and_empty_extensions() {
        let mut env = valid();
        env.insert("START_INDEX".into(), "10".into());
        env.insert("END_INDEX".into(), "9".into());
        let cfg = Config::from_lookup(&env).unwrap();
        assert!(cfg.validate().unwrap_err().to_string().contains("START_INDEX"));

        let mut env = valid();
        env.insert("SUPPORTED_EXTENSIONS".into(), ",".into());
        let cfg = Config::from_lookup(&env).unwrap();
        assert!(
            cfg.validate()
                .unwrap_err()
                .to_string()
                .contains("SUPPORTED_EXTENSIONS")
        );
    }

    #[test]
    fn validation_rejects_intervals_that_overflow_seconds() {
        let mut env = valid();
        env.insert("CHECK_INTERVAL".into(), u64::MAX.to_string());
        let cfg = Config::from_lookup(&env).unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("too large"), "{err}");
        assert_eq!(cfg.check_interval(), Duration::from_secs(u64::MAX));

        let mut env = valid();
        env.insert("REPORT_INTERVAL".into(), (u64::MAX / 3_600 + 1).to_string());
        let cfg = Config::from_lookup(&env).unwrap();
        assert!(cfg.validate().is_err());

        let mut env = valid();
        env.insert("REPORT_INTERVAL".into(), (u64::MAX / 3_600).to_string());
        Config::from_lookup(&env).unwrap().validate().unwrap();
    }

    #[test]
    fn validation_rejects_zero_timeouts() {
        for name in ["REQUEST_TIMEOUT", "DOWNLOAD_TIMEOUT"] {
            let mut env = valid();
            env.insert(name.into(), "0".into());
            let cfg = Config::from_lookup(&env).unwrap();
            let err = cfg.validate().unwrap_err();
            assert!(err.to_string().contains(name), "{name}: {err}");
        }
    }

    #[test]
    fn unparsable_number_is_reported_with_its_name() {
        let mut env = valid();
        env.insert("END_INDEX".into(), "-3".into());
        let err = Config::from_lookup(&env).unwrap_err();
        assert!(err.to_string().contains("END_INDEX"));
    }

    #[test]
    fn describe_omits_tokens() {
        let cfg = Config::from_lookup(&valid()).unwrap();
        let dump = cfg.describe();
        assert!(!dump.contains("123:abc"));
        assert!(!dump.contains("456:def"));
        assert!(dump.contains("download_dir"));
    }

    #[test]
    fn template_lists_every_variable() {
        let template = generate_env_template::<Config>();
        for field in Config::fields() {
            assert!(template.contains(&format!("{}=", field.name)));
        }
        assert!(template.contains("SUPPORTED_EXTENSIONS=txt,zip"));
    }
}
