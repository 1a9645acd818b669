use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// 应用配置的根结构。
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub overlay: OverlayConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            source: SourceConfig::default(),
            overlay: OverlayConfig::default(),
        }
    }
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `PAPYAR_CONFIG`，否则寻找
    /// `./config/default.toml`。若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os("PAPYAR_CONFIG") {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 文档来源。抓取由外部协作方完成，这里只保存拼接链接所需的
/// 基地址。
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "SourceConfig::default_metadata_base_url")]
    pub metadata_base_url: String,
    #[serde(default = "SourceConfig::default_transcription_base_url")]
    pub transcription_base_url: String,
    #[serde(default = "SourceConfig::default_overlay_base_url")]
    pub overlay_base_url: String,
}

impl SourceConfig {
    fn default_metadata_base_url() -> String {
        "https://papyri.info/hgv".to_string()
    }

    fn default_transcription_base_url() -> String {
        "https://papyri.info/ddbdp".to_string()
    }

    fn default_overlay_base_url() -> String {
        "https://localhost:8443/ar".to_string()
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            metadata_base_url: Self::default_metadata_base_url(),
            transcription_base_url: Self::default_transcription_base_url(),
            overlay_base_url: Self::default_overlay_base_url(),
        }
    }
}

/// 覆盖层呈现参数。垂直留空是渲染方在面板 z 偏移之外附加的
/// 固定间距，不参与纯投影计算。
#[derive(Debug, Clone, Deserialize)]
pub struct OverlayConfig {
    #[serde(default = "OverlayConfig::default_vertical_clearance")]
    pub vertical_clearance: f64,
}

impl OverlayConfig {
    fn default_vertical_clearance() -> f64 {
        0.5
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            vertical_clearance: Self::default_vertical_clearance(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn built_in_defaults_cover_every_section() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.source.metadata_base_url, "https://papyri.info/hgv");
        assert_eq!(
            cfg.source.transcription_base_url,
            "https://papyri.info/ddbdp"
        );
        assert!((cfg.overlay.vertical_clearance - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn load_from_temp_file() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(
            file,
            r#"
            [logging]
            level = "debug"

            [source]
            metadata_base_url = "https://example.org/meta"

            [overlay]
            vertical_clearance = 0.75
            "#
        )
        .unwrap();

        let cfg = AppConfig::from_file(file.path()).expect("load config");
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.source.metadata_base_url, "https://example.org/meta");
        // untouched sections keep their defaults
        assert_eq!(
            cfg.source.transcription_base_url,
            "https://papyri.info/ddbdp"
        );
        assert!((cfg.overlay.vertical_clearance - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(file, "logging = 3").unwrap();
        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
