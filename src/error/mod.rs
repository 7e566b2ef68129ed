//! 统一错误处理模块
//!
//! 提供各模块的结构化错误类型，替代 String 错误。

mod app;
mod music;
mod parse;

pub use app::AppError;
pub use music::MusicError;
pub use parse::ParseError;
