//! 错误类型（模块）
use std::path::PathBuf;
use thiserror::Error;

/// 对外错误类型：只覆盖“无法启动 / 顶层失败”的情况；
/// 单个节点、单轮扫描的错误在内部消化，不会走到这里。
#[derive(Debug, Error)]
pub enum ScoutError {
    /// 功能在配置中被关闭
    #[error("{0} is disabled in configuration.")]
    Disabled(&'static str),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ScoutError>;
