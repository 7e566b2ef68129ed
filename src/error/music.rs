//! 音轨加载与播放相关错误

use std::path::PathBuf;

use crate::assets::HandleId;

/// 音轨管理错误类型
#[derive(Debug, thiserror::Error)]
pub enum MusicError {
    /// 名称未注册
    #[error("未知音轨: {0}")]
    UnknownTrack(String),

    /// 句柄已卸载或从未加载
    #[error("未知句柄: {0}")]
    UnknownHandle(HandleId),

    /// 打开音频文件失败
    #[error("打开音频文件失败({}): {source}", .path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 解码音频失败
    #[error("解码音频失败({}): {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// 文件不存在
    #[error("音频文件不存在: {}", .0.display())]
    FileNotFound(PathBuf),

    /// 音频输出流创建失败
    #[error("创建音频输出流失败: {0}")]
    OutputStream(String),

    /// Seek 失败
    #[error("Seek 失败({}): {reason}", .path.display())]
    Seek { path: PathBuf, reason: String },
}

impl MusicError {
    /// 名称或句柄不存在（调用方传入了无效的标识）
    pub fn is_missing(&self) -> bool {
        matches!(
            self,
            MusicError::UnknownTrack(_) | MusicError::UnknownHandle(_)
        )
    }

    /// 加载阶段的失败（文件或解码问题）
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            MusicError::OpenFile { .. } | MusicError::Decode { .. } | MusicError::FileNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_track_display() {
        let err = MusicError::UnknownTrack("drums".to_string());
        assert_eq!(err.to_string(), "未知音轨: drums");
        assert!(err.is_missing());
        assert!(!err.is_load_failure());
    }

    #[test]
    fn test_open_file_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "文件未找到");
        let err = MusicError::OpenFile {
            path: PathBuf::from("music/bass.ogg"),
            source: io_err,
        };
        assert!(err.to_string().contains("music/bass.ogg"));
        assert!(err.to_string().contains("文件未找到"));
        assert!(err.is_load_failure());
    }

    #[test]
    fn test_unknown_handle_display() {
        let err = MusicError::UnknownHandle(HandleId::from_raw(7));
        assert_eq!(err.to_string(), "未知句柄: #7");
    }
}
