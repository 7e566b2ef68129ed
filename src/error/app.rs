//! 应用通用错误

use super::{MusicError, ParseError};

/// 应用通用错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 序列化错误
    #[error("JSON 序列化失败: {0}")]
    Serde(#[from] serde_json::Error),

    /// 音轨错误
    #[error("音轨错误: {0}")]
    Music(#[from] MusicError),

    /// 命令解析错误
    #[error("命令解析失败: {0}")]
    Parse(#[from] ParseError),

    /// 其他错误
    #[error("{0}")]
    Other(String),
}
