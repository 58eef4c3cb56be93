//! 环境变量配置读取与带注释模板生成。

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to load env file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
    #[error("{0}, please check .env file")]
    Validation(String),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldMeta {
    pub name: &'static str,
    pub description: &'static str,
    pub default: &'static str,
}

/// 变量来源。进程环境之外，测试里用 `HashMap` 代替。
pub trait EnvLookup {
    fn get(&self, name: &str) -> Option<String>;
}

pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvLookup for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}

pub trait ConfigSpec: Sized {
    fn fields() -> &'static [FieldMeta];
    fn from_lookup<L: EnvLookup>(lookup: &L) -> Result<Self, ConfigError>;
}

/// 预加载 `.env` 文件到进程环境。
///
/// - 指定了路径：文件必须存在且可解析
/// - 未指定：尝试当前目录向上查找 `.env`，找不到不算错误
///
/// 已存在的环境变量不会被覆盖。
pub fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    match path {
        Some(p) => dotenvy::from_path(p)
            .map(|_| Some(p.to_path_buf()))
            .map_err(|source| ConfigError::EnvFile {
                path: p.to_path_buf(),
                source,
            }),
        None => match dotenvy::dotenv() {
            Ok(found) => Ok(Some(found)),
            Err(err) if err.not_found() => Ok(None),
            Err(source) => Err(ConfigError::EnvFile {
                path: PathBuf::from(".env"),
                source,
            }),
        },
    }
}

/// 读取字符串变量；缺失或全空白时回落到默认值。
pub fn read_string<L: EnvLookup>(lookup: &L, name: &str, default: &str) -> String {
    lookup
        .get(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

pub fn read_parsed<L, T>(lookup: &L, name: &'static str, default: T) -> Result<T, ConfigError>
where
    L: EnvLookup,
    T: FromStr,
{
    let Some(raw) = lookup.get(name) else {
        return Ok(default);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(default);
    }
    trimmed.parse::<T>().map_err(|_| ConfigError::Invalid {
        name,
        value: raw.clone(),
    })
}

pub fn write_env_template<T: ConfigSpec>(path: &Path) -> Result<(), ConfigError> {
    ensure_parent(path)?;
    fs::write(path, generate_env_template::<T>()).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn generate_env_template<T: ConfigSpec>() -> String {
    let mut lines = Vec::new();
    for field in T::fields() {
        if !field.description.is_empty() {
            lines.push(format!("# {}", field.description.replace('\n', "\n# ")));
        }
        lines.push(format!("{}={}", field.name, field.default));
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn ensure_parent(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn read_parsed_falls_back_on_missing_or_blank() {
        let lookup = env(&[("BLANK", "   ")]);
        assert_eq!(read_parsed(&lookup, "MISSING", 7u64).unwrap(), 7);
        assert_eq!(read_parsed(&lookup, "BLANK", 3u64).unwrap(), 3);
    }

    #[test]
    fn read_parsed_rejects_garbage() {
        let lookup = env(&[("CHECK_INTERVAL", "five")]);
        let err = read_parsed(&lookup, "CHECK_INTERVAL", 5u64).unwrap_err();
        match err {
            ConfigError::Invalid { name, value } => {
                assert_eq!(name, "CHECK_INTERVAL");
                assert_eq!(value, "five");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn read_string_trims() {
        let lookup = env(&[("DOWNLOAD_DIR", "  files \n")]);
        assert_eq!(read_string(&lookup, "DOWNLOAD_DIR", "x"), "files");
        assert_eq!(read_string(&lookup, "LOG_DIR", "logs"), "logs");
    }

    #[test]
    fn explicit_env_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.env");
        let err = load_env_file(Some(&missing)).unwrap_err();
        assert!(matches!(err, ConfigError::EnvFile { .. }));
    }
}
