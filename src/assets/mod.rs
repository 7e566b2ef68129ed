//! Loaded audio handles and the loader seam.
//!
//! `AssetManager` is the single owner of every loaded handle. Callers refer to
//! handles through [`HandleId`], never through the handle itself.

mod manager;
mod null_loader;
mod rodio_loader;

use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::error::MusicError;

pub use manager::AssetManager;
pub use null_loader::{NullLoader, NullMusic};
pub use rodio_loader::{RodioLoader, RodioMusic};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(u64);

impl HandleId {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A playable audio stream owned by the asset manager.
pub trait Music: Send {
    /// Starts or resumes playback. Playing after `stop` restarts from the beginning.
    fn play(&mut self) -> Result<(), MusicError>;
    fn pause(&mut self);
    fn stop(&mut self);
    fn is_playing(&self) -> bool;
    fn set_volume(&mut self, volume: f32);
    fn volume(&self) -> f32;
    fn position(&self) -> Duration;
    fn set_position(&mut self, position: Duration) -> Result<(), MusicError>;
}

/// Turns a file path into a [`Music`] handle.
pub trait MusicLoader {
    type Music: Music;

    fn load(&mut self, path: &Path) -> Result<Self::Music, MusicError>;
}
