use std::path::PathBuf;

/// Which tracks a command applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tracks {
    All,
    Named(Vec<String>),
}

impl Tracks {
    pub fn named<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Tracks::Named(names.into_iter().map(Into::into).collect())
    }

    /// `All` for an empty list, `Named` otherwise.
    pub fn from_names(names: Vec<String>) -> Self {
        if names.is_empty() {
            Tracks::All
        } else {
            Tracks::Named(names)
        }
    }
}

#[derive(Debug)]
pub enum MusicCommand {
    Add {
        paths: Vec<PathBuf>,
    },
    Remove {
        tracks: Tracks,
    },
    Rename {
        old: String,
        new: String,
    },
    Play {
        tracks: Tracks,
    },
    Pause {
        tracks: Tracks,
    },
    Stop {
        tracks: Tracks,
    },
    SetVolume {
        volume: f32,
        tracks: Tracks,
    },
    /// `volume: None` fades to each track's own volume.
    FadeIn {
        duration_ms: u64,
        volume: Option<f32>,
        tracks: Tracks,
    },
    /// `volume: None` fades to silence.
    FadeOut {
        duration_ms: u64,
        volume: Option<f32>,
        tracks: Tracks,
    },
    ListTracks,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackStatus {
    pub name: String,
    pub handle: u64,
    pub volume: f32,
    pub playing: bool,
    pub fading: bool,
    pub position_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MusicEvent {
    Added { tracks: Vec<String> },
    Removed { tracks: Vec<String> },
    Renamed { old: String, new: String },
    Playing { tracks: Vec<String> },
    Paused { tracks: Vec<String> },
    Stopped { tracks: Vec<String> },
    VolumeChanged { volume: f32, tracks: Vec<String> },
    FadeStarted { duration_ms: u64, tracks: Vec<String> },
    FadeFinished { tracks: Vec<String> },
    TrackList { tracks: Vec<TrackStatus> },
    Error(String),
}
