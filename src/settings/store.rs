use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicSettings {
    // 播放设置
    /// 新加入音轨的初始音量
    #[serde(default = "default_volume")]
    pub volume: f32,
    /// CLI 未指定时使用的淡入淡出时长
    #[serde(default = "default_fade_ms")]
    pub default_fade_ms: u64,

    // 工作线程设置
    /// 淡入淡出的刷新间隔
    #[serde(default = "default_fade_tick_ms")]
    pub fade_tick_ms: u64,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for MusicSettings {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            default_fade_ms: default_fade_ms(),
            fade_tick_ms: default_fade_tick_ms(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

// 默认值函数（用于 serde default）
fn default_volume() -> f32 { 1.0 }
fn default_fade_ms() -> u64 { 1500 }
fn default_fade_tick_ms() -> u64 { 20 }
fn default_channel_capacity() -> usize { 64 }

/// 默认数据目录（系统 data_local_dir，不可用时退回临时目录）
pub fn default_data_dir() -> PathBuf {
    ProjectDirs::from("dev", "dynamic-music", "dynamic-music")
        .map(|p| p.data_local_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join("dynamic-music"))
}

pub fn load_settings(data_dir: &Path) -> MusicSettings {
    let p = settings_path(data_dir);
    let Ok(bytes) = fs::read(&p) else {
        return MusicSettings::default();
    };
    match serde_json::from_slice(&bytes) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(path = %p.display(), err = %e, "设置文件解析失败，使用默认设置");
            MusicSettings::default()
        }
    }
}

pub fn save_settings(data_dir: &Path, s: &MusicSettings) -> std::io::Result<()> {
    fs::create_dir_all(data_dir)?;
    let p = settings_path(data_dir);
    let tmp = p.with_extension("json.tmp");
    let bytes = serde_json::to_vec_pretty(s).map_err(std::io::Error::other)?;
    fs::write(&tmp, bytes)?;
    if let Err(e) = fs::rename(&tmp, &p) {
        let _ = fs::remove_file(&p);
        fs::rename(&tmp, &p).map_err(|_| e)?;
    }
    Ok(())
}

pub fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join("settings.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(load_settings(dir.path()), MusicSettings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let data_dir = dir.path().join("nested");
        let s = MusicSettings {
            volume: 0.5,
            default_fade_ms: 800,
            ..MusicSettings::default()
        };
        save_settings(&data_dir, &s).expect("save");
        assert_eq!(load_settings(&data_dir), s);
        assert!(!settings_path(&data_dir).with_extension("json.tmp").exists());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(settings_path(dir.path()), br#"{"volume":0.25}"#).expect("write");
        let s = load_settings(dir.path());
        assert_eq!(s.volume, 0.25);
        assert_eq!(s.fade_tick_ms, 20);
        assert_eq!(s.channel_capacity, 64);
    }

    #[test]
    fn test_corrupt_file_gives_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(settings_path(dir.path()), b"{not json").expect("write");
        assert_eq!(load_settings(dir.path()), MusicSettings::default());
    }
}
