use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::{Music, MusicLoader};
use crate::error::MusicError;

/// Loader for running without an audio device (tests, `--no-audio`).
#[derive(Debug, Default)]
pub struct NullLoader {
    require_files: bool,
    loads: usize,
}

impl NullLoader {
    /// Accepts any path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects paths that do not exist on disk.
    pub fn checked() -> Self {
        Self {
            require_files: true,
            loads: 0,
        }
    }

    pub fn loads(&self) -> usize {
        self.loads
    }
}

impl MusicLoader for NullLoader {
    type Music = NullMusic;

    fn load(&mut self, path: &Path) -> Result<NullMusic, MusicError> {
        if self.require_files && !path.is_file() {
            return Err(MusicError::FileNotFound(path.to_path_buf()));
        }
        self.loads += 1;
        Ok(NullMusic::new(path))
    }
}

#[derive(Debug)]
pub struct NullMusic {
    path: PathBuf,
    volume: f32,
    playing: bool,
    offset: Duration,
    started_at: Option<Instant>,
}

impl NullMusic {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            volume: 1.0,
            playing: false,
            offset: Duration::ZERO,
            started_at: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Music for NullMusic {
    fn play(&mut self) -> Result<(), MusicError> {
        if !self.playing {
            self.playing = true;
            self.started_at = Some(Instant::now());
        }
        Ok(())
    }

    fn pause(&mut self) {
        if self.playing {
            self.offset = self.position();
            self.started_at = None;
            self.playing = false;
        }
    }

    fn stop(&mut self) {
        self.playing = false;
        self.started_at = None;
        self.offset = Duration::ZERO;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn position(&self) -> Duration {
        let running = self.started_at.map(|t| t.elapsed()).unwrap_or_default();
        self.offset.saturating_add(running)
    }

    fn set_position(&mut self, position: Duration) -> Result<(), MusicError> {
        self.offset = position;
        if self.playing {
            self.started_at = Some(Instant::now());
        }
        Ok(())
    }
}
