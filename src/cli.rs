use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "dynamic-music",
    version,
    about = "分层动态音乐播放器：命名音轨、同步播放与淡入淡出"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// 覆盖数据目录（默认走系统 data_local_dir）
    #[arg(long, env = "DYNAMIC_MUSIC_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// 覆盖日志目录（默认 `{data_dir}/logs`）
    #[arg(long, env = "DYNAMIC_MUSIC_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// 覆盖日志过滤（等价于设置 RUST_LOG）
    #[arg(long, env = "RUST_LOG")]
    pub log_filter: Option<String>,

    /// 不打开音频设备，只检查文件是否存在
    #[arg(long, env = "DYNAMIC_MUSIC_NO_AUDIO")]
    pub no_audio: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 同步播放多个音轨，淡入后持续播放，结束前淡出
    Play {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// 目标音量 (0..1)，默认沿用设置
        #[arg(long)]
        volume: Option<f32>,

        /// 淡入时长，默认沿用设置
        #[arg(long)]
        fade_in_ms: Option<u64>,

        /// 淡出时长，默认沿用设置
        #[arg(long)]
        fade_out_ms: Option<u64>,

        /// 播放秒数，不指定则直到 Ctrl-C
        #[arg(long)]
        seconds: Option<u64>,
    },

    /// 交互式控制（从 stdin 读取命令）
    Shell {
        /// 启动时加载的音轨
        files: Vec<PathBuf>,
    },

    /// 打印当前生效的设置
    Settings {
        /// 将当前设置写回 settings.json
        #[arg(long)]
        save: bool,
    },
}
