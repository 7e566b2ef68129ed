use std::collections::HashSet;
use std::time::Duration;
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use super::MusicBackend;
use super::messages::{MusicCommand, MusicEvent, TrackStatus, Tracks};
use crate::assets::{MusicLoader, NullLoader, RodioLoader};
use crate::error::MusicError;
use crate::music::DynamicMusic;
use crate::settings::MusicSettings;

pub(super) struct MusicEngine<L: MusicLoader> {
    music: DynamicMusic<L>,
    settings: MusicSettings,
}

impl<L: MusicLoader> MusicEngine<L> {
    pub(super) fn new(loader: L, settings: MusicSettings) -> Self {
        Self {
            music: DynamicMusic::new(loader),
            settings,
        }
    }

    async fn run(
        mut self,
        mut rx_cmd: mpsc::Receiver<MusicCommand>,
        tx_evt: mpsc::Sender<MusicEvent>,
    ) {
        let tick = Duration::from_millis(self.settings.fade_tick_ms.max(1));
        let mut fade_tick = tokio::time::interval(tick);
        fade_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            select! {
                biased;
                _ = fade_tick.tick(), if self.music.has_fades() => {
                    for evt in self.tick_fades() {
                        let _ = tx_evt.send(evt).await;
                    }
                }
                maybe_cmd = rx_cmd.recv() => {
                    let Some(cmd) = maybe_cmd else {
                        break;
                    };
                    let evt = match self.apply(cmd) {
                        Ok(evt) => evt,
                        Err(e) => {
                            tracing::warn!(err = %e, "命令执行失败");
                            MusicEvent::Error(e.to_string())
                        }
                    };
                    let _ = tx_evt.send(evt).await;
                }
            }
        }

        tracing::info!(tracks = self.music.len(), "MusicWorker 已退出");
    }

    pub(super) fn tick_fades(&mut self) -> Vec<MusicEvent> {
        self.music
            .update()
            .into_iter()
            .map(|id| {
                let tracks = self.music.names_for(id);
                tracing::debug!(%id, ?tracks, "fade finished");
                MusicEvent::FadeFinished { tracks }
            })
            .collect()
    }

    pub(super) fn apply(&mut self, cmd: MusicCommand) -> Result<MusicEvent, MusicError> {
        match cmd {
            MusicCommand::Add { paths } => {
                let before: HashSet<String> = self.music.track_names().into_iter().collect();
                self.music.add(paths.as_slice())?;
                let added: Vec<String> = self
                    .music
                    .track_names()
                    .into_iter()
                    .filter(|n| !before.contains(n))
                    .collect();
                if !added.is_empty() {
                    self.music.set_volume(self.settings.volume, added.as_slice())?;
                }
                Ok(MusicEvent::Added { tracks: added })
            }
            MusicCommand::Remove { tracks } => {
                let names = self.names_of(&tracks);
                match tracks {
                    Tracks::All => self.music.remove_all()?,
                    Tracks::Named(n) => self.music.remove(n.as_slice())?,
                };
                Ok(MusicEvent::Removed { tracks: names })
            }
            MusicCommand::Rename { old, new } => {
                self.music.change_track_name(&old, &new)?;
                Ok(MusicEvent::Renamed { old, new })
            }
            MusicCommand::Play { tracks } => {
                match &tracks {
                    Tracks::All => self.music.play_all()?,
                    Tracks::Named(n) => self.music.play(n.as_slice())?,
                };
                Ok(MusicEvent::Playing {
                    tracks: self.names_of(&tracks),
                })
            }
            MusicCommand::Pause { tracks } => {
                match &tracks {
                    Tracks::All => self.music.pause_all()?,
                    Tracks::Named(n) => self.music.pause(n.as_slice())?,
                };
                Ok(MusicEvent::Paused {
                    tracks: self.names_of(&tracks),
                })
            }
            MusicCommand::Stop { tracks } => {
                match &tracks {
                    Tracks::All => self.music.stop_all()?,
                    Tracks::Named(n) => self.music.stop(n.as_slice())?,
                };
                Ok(MusicEvent::Stopped {
                    tracks: self.names_of(&tracks),
                })
            }
            MusicCommand::SetVolume { volume, tracks } => {
                match &tracks {
                    Tracks::All => self.music.set_volume_all(volume)?,
                    Tracks::Named(n) => self.music.set_volume(volume, n.as_slice())?,
                };
                Ok(MusicEvent::VolumeChanged {
                    volume,
                    tracks: self.names_of(&tracks),
                })
            }
            MusicCommand::FadeIn {
                duration_ms,
                volume,
                tracks,
            } => {
                let d = Duration::from_millis(duration_ms);
                match (&tracks, volume) {
                    (Tracks::All, None) => self.music.fade_in_all(d)?,
                    (Tracks::All, Some(v)) => self.music.fade_in_all_to(d, v)?,
                    (Tracks::Named(n), None) => self.music.fade_in(d, n.as_slice())?,
                    (Tracks::Named(n), Some(v)) => self.music.fade_in_to(d, v, n.as_slice())?,
                };
                Ok(MusicEvent::FadeStarted {
                    duration_ms,
                    tracks: self.names_of(&tracks),
                })
            }
            MusicCommand::FadeOut {
                duration_ms,
                volume,
                tracks,
            } => {
                let d = Duration::from_millis(duration_ms);
                match (&tracks, volume) {
                    (Tracks::All, None) => self.music.fade_out_all(d)?,
                    (Tracks::All, Some(v)) => self.music.fade_out_all_to(d, v)?,
                    (Tracks::Named(n), None) => self.music.fade_out(d, n.as_slice())?,
                    (Tracks::Named(n), Some(v)) => self.music.fade_out_to(d, v, n.as_slice())?,
                };
                Ok(MusicEvent::FadeStarted {
                    duration_ms,
                    tracks: self.names_of(&tracks),
                })
            }
            MusicCommand::ListTracks => Ok(MusicEvent::TrackList {
                tracks: self.track_status()?,
            }),
        }
    }

    fn names_of(&self, tracks: &Tracks) -> Vec<String> {
        match tracks {
            Tracks::All => self.music.track_names(),
            Tracks::Named(n) => n.clone(),
        }
    }

    fn track_status(&self) -> Result<Vec<TrackStatus>, MusicError> {
        self.music
            .track_names()
            .into_iter()
            .map(|name| {
                Ok(TrackStatus {
                    handle: self.music.handle_of(&name)?.raw(),
                    volume: self.music.volume(&name)?,
                    playing: self.music.is_playing(&name)?,
                    fading: self.music.is_fading(&name)?,
                    position_ms: self.music.position(&name)?.as_millis() as u64,
                    name,
                })
            })
            .collect()
    }
}

pub(super) fn spawn(
    backend: MusicBackend,
    rx_cmd: mpsc::Receiver<MusicCommand>,
    tx_evt: mpsc::Sender<MusicEvent>,
    settings: MusicSettings,
) {
    let spawned = std::thread::Builder::new()
        .name("music-worker".to_owned())
        .spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    tracing::error!(err = %e, "初始化 tokio runtime 失败");
                    let _ = tx_evt.blocking_send(MusicEvent::Error(format!(
                        "初始化 tokio runtime 失败: {e}"
                    )));
                    return;
                }
            };

            rt.block_on(async move {
                tracing::info!(?backend, "MusicWorker 已启动");
                match backend {
                    MusicBackend::Rodio => match RodioLoader::open_default() {
                        Ok(loader) => {
                            MusicEngine::new(loader, settings).run(rx_cmd, tx_evt).await;
                        }
                        Err(e) => {
                            tracing::error!(err = %e, "初始化音频输出失败");
                            let _ = tx_evt.send(MusicEvent::Error(e.to_string())).await;
                        }
                    },
                    MusicBackend::Null => {
                        MusicEngine::new(NullLoader::checked(), settings)
                            .run(rx_cmd, tx_evt)
                            .await;
                    }
                }
            });
        });

    if let Err(e) = spawned {
        tracing::error!(err = %e, "failed to spawn music worker thread");
    }
}
