use rodio::mixer::Mixer;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{Music, MusicLoader};
use crate::error::MusicError;

/// Loads tracks onto the default output device.
pub struct RodioLoader {
    mixer: Mixer,
    #[allow(dead_code)]
    stream: OutputStream,
}

impl RodioLoader {
    pub fn open_default() -> Result<Self, MusicError> {
        let stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| MusicError::OutputStream(e.to_string()))?;
        let mixer = stream.mixer().clone();
        tracing::info!("音频输出已打开");
        Ok(Self { mixer, stream })
    }
}

impl MusicLoader for RodioLoader {
    type Music = RodioMusic;

    fn load(&mut self, path: &Path) -> Result<RodioMusic, MusicError> {
        let sink = build_sink(&self.mixer, path)?;
        Ok(RodioMusic {
            mixer: self.mixer.clone(),
            path: path.to_path_buf(),
            sink,
            volume: 1.0,
            stopped: false,
        })
    }
}

/// One decoded file on its own sink.
///
/// A rodio sink cannot be rewound once stopped, so `stop` drops the queued
/// source and the next `play` or `set_position` decodes the file again.
pub struct RodioMusic {
    mixer: Mixer,
    path: PathBuf,
    sink: Sink,
    volume: f32,
    stopped: bool,
}

impl RodioMusic {
    fn rebuild(&mut self) -> Result<(), MusicError> {
        let sink = build_sink(&self.mixer, &self.path)?;
        sink.set_volume(self.volume);
        self.sink = sink;
        self.stopped = false;
        tracing::debug!(path = %self.path.display(), "sink rebuilt");
        Ok(())
    }
}

impl Music for RodioMusic {
    fn play(&mut self) -> Result<(), MusicError> {
        if self.stopped || self.sink.empty() {
            self.rebuild()?;
        }
        self.sink.play();
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn stop(&mut self) {
        self.sink.stop();
        self.stopped = true;
    }

    fn is_playing(&self) -> bool {
        !self.stopped && !self.sink.is_paused() && !self.sink.empty()
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        self.sink.set_volume(volume);
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn position(&self) -> Duration {
        if self.stopped {
            Duration::ZERO
        } else {
            self.sink.get_pos()
        }
    }

    fn set_position(&mut self, position: Duration) -> Result<(), MusicError> {
        if self.stopped {
            self.rebuild()?;
        }
        self.sink.try_seek(position).map_err(|e| MusicError::Seek {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }
}

fn build_sink(mixer: &Mixer, path: &Path) -> Result<Sink, MusicError> {
    let decoder = decode_file(path)?;
    let sink = Sink::connect_new(mixer);
    sink.pause();
    sink.append(decoder);
    Ok(sink)
}

fn decode_file(path: &Path) -> Result<Decoder<BufReader<File>>, MusicError> {
    let file = File::open(path).map_err(|source| MusicError::OpenFile {
        path: path.to_path_buf(),
        source,
    })?;
    Decoder::new(BufReader::new(file)).map_err(|e| MusicError::Decode {
        path: path.to_path_buf(),
        source: Box::new(e),
    })
}
