//! File logging for the player. Audio output shares the terminal with the
//! shell, so nothing is written to stdout; records go to a daily rolling file.

use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const LOG_FILE: &str = "dynamic-music.log";

/// Decoder crates log per packet at debug level.
const DEFAULT_FILTER: &str = "info,symphonia=warn,rodio=warn";

/// Keeps the background writer alive; dropping it flushes pending records.
#[must_use = "dropping the guard stops the log writer"]
pub struct LogGuard {
    _writer: WorkerGuard,
    dir: PathBuf,
}

impl LogGuard {
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// Overrides `{data_dir}/logs`.
    pub dir: Option<PathBuf>,
    /// Overrides `RUST_LOG`.
    pub filter: Option<String>,
}

pub fn init(data_dir: &Path, cfg: LogConfig) -> LogGuard {
    let dir = log_dir(data_dir, cfg.dir);
    let filter = env_filter(cfg.filter.as_deref());

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&dir, LOG_FILE));
    let layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_thread_names(true)
        .with_writer(writer);

    if tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .is_err()
    {
        eprintln!("tracing subscriber already installed, keeping it");
    }
    tracing::info!(dir = %dir.display(), file = LOG_FILE, "logging ready");

    LogGuard {
        _writer: guard,
        dir,
    }
}

/// First writable directory of: the explicit one, `{data_dir}/logs`, the
/// system temp dir.
fn log_dir(data_dir: &Path, explicit: Option<PathBuf>) -> PathBuf {
    let wanted = explicit.unwrap_or_else(|| data_dir.join("logs"));
    if fs::create_dir_all(&wanted).is_ok() {
        return wanted;
    }
    let fallback = std::env::temp_dir().join("dynamic-music-logs");
    if let Err(e) = fs::create_dir_all(&fallback) {
        eprintln!("cannot create log dir {}: {e}", fallback.display());
    }
    fallback
}

fn env_filter(explicit: Option<&str>) -> EnvFilter {
    match explicit.map(str::trim) {
        Some(directives) if !directives.is_empty() => {
            EnvFilter::try_new(directives).unwrap_or_else(|e| {
                eprintln!("invalid log filter {directives:?}: {e}");
                EnvFilter::new(DEFAULT_FILTER)
            })
        }
        _ => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_dir_defaults_under_data_dir() {
        let data = tempfile::tempdir().expect("tempdir");
        let dir = log_dir(data.path(), None);
        assert_eq!(dir, data.path().join("logs"));
        assert!(dir.is_dir());
    }

    #[test]
    fn test_log_dir_falls_back_when_unwritable() {
        let data = tempfile::tempdir().expect("tempdir");
        let blocker = data.path().join("file");
        std::fs::write(&blocker, b"x").expect("write");

        let dir = log_dir(data.path(), Some(blocker.join("logs")));
        assert_eq!(dir, std::env::temp_dir().join("dynamic-music-logs"));
    }

    #[test]
    fn test_explicit_filter_wins_and_bad_filter_falls_back() {
        assert!(env_filter(Some(" debug ")).to_string().contains("debug"));
        let fallback = env_filter(Some("rodio=loudest")).to_string();
        assert!(fallback.contains("symphonia=warn"));
    }
}
