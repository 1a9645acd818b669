use std::fs;
use std::path::Path;

use papyar_core::layout::PageLayout;
use thiserror::Error;

pub mod alto;
pub mod tei;
pub mod token;

mod scanner;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("读取文件 {path:?} 失败: {source}")]
    ReadError {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 版面描述缺少必要字段或字段不合法。对当前加载是致命错误，
    /// 由外部的错误展示协作方呈现给用户，不做重试。
    #[error("版面描述不合法: {0}")]
    MalformedLayout(String),
    /// 元数据或转写 XML 无法扫描。
    #[error("文档不合法: {0}")]
    MalformedDocument(String),
    #[error("页面令牌不合法: {0}")]
    MalformedToken(String),
}

/// 版面来源的抽象。具体实现负责把外部格式解析为 `PageLayout`。
pub trait LayoutLoader {
    fn load(&self, path: &Path) -> Result<PageLayout, IoError>;
}

/// 从文件系统读取 ALTO 风格版面文档的加载器。
pub struct AltoFacade;

impl AltoFacade {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AltoFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutLoader for AltoFacade {
    fn load(&self, path: &Path) -> Result<PageLayout, IoError> {
        let data = fs::read_to_string(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        alto::extract(&data)
    }
}
