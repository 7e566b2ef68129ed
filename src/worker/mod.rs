//! Music engine actor: owns a [`DynamicMusic`](crate::music::DynamicMusic) on a
//! dedicated thread and advances its fades on a fixed tick.

mod engine;
mod messages;

use tokio::sync::mpsc;

use crate::settings::MusicSettings;

pub use messages::{MusicCommand, MusicEvent, TrackStatus, Tracks};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MusicBackend {
    /// Default output device through rodio.
    Rodio,
    /// No audio device; files are checked for existence only.
    Null,
}

pub fn spawn_music_worker(
    backend: MusicBackend,
    settings: MusicSettings,
) -> (mpsc::Sender<MusicCommand>, mpsc::Receiver<MusicEvent>) {
    let capacity = settings.channel_capacity.max(1);
    let (tx_cmd, rx_cmd) = mpsc::channel::<MusicCommand>(capacity);
    let (tx_evt, rx_evt) = mpsc::channel::<MusicEvent>(capacity);

    engine::spawn(backend, rx_cmd, tx_evt, settings);

    (tx_cmd, rx_evt)
}
