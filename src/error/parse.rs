//! 控制命令解析错误

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("空命令")]
    Empty,

    #[error("未知命令: {0}")]
    UnknownCommand(String),

    /// 缺少必填参数
    #[error("{command} 缺少参数: {what}")]
    MissingArgument {
        command: &'static str,
        what: &'static str,
    },

    /// 参数无法解析为数字
    #[error("{command} 参数无效: {value}")]
    InvalidNumber { command: &'static str, value: String },
}
