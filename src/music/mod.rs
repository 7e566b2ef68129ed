//! Named tracks over an [`AssetManager`], played in sync and faded by tick.
//!
//! Names are keys into the registry and point at [`HandleId`]s. A handle can
//! carry several names (aliases); it is unloaded only when its last name goes.

mod fade;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;
use std::time::{Duration, Instant};

use crate::assets::{AssetManager, HandleId, Music, MusicLoader};
use crate::error::MusicError;

pub use fade::{Fade, FadeScheduler};

pub struct DynamicMusic<L: MusicLoader> {
    tracks: HashMap<String, HandleId>,
    assets: AssetManager<L>,
    fades: FadeScheduler,
}

impl<L: MusicLoader> DynamicMusic<L> {
    pub fn new(loader: L) -> Self {
        Self::with_assets(AssetManager::new(loader))
    }

    pub fn with_assets(assets: AssetManager<L>) -> Self {
        Self {
            tracks: HashMap::new(),
            assets,
            fades: FadeScheduler::new(),
        }
    }

    /// Loads the given files, blocking until all are loaded, and registers each
    /// under its path. Paths whose name is already registered are skipped; a
    /// path still loaded under an alias is bound to that handle without a load.
    pub fn add<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<&mut Self, MusicError> {
        let mut queued = HashSet::new();
        let mut rebound: Vec<(String, HandleId)> = Vec::new();
        for path in paths {
            let path = path.as_ref();
            let name = track_name(path);
            if self.tracks.contains_key(&name) || !queued.insert(name.clone()) {
                tracing::debug!(name = %name, "track already registered");
                continue;
            }
            if let Some(id) = self.assets.id_for(path)
                && self.tracks.values().any(|h| *h == id)
            {
                rebound.push((name, id));
                continue;
            }
            self.assets.load(path);
        }

        let loaded = self.assets.finish_loading()?;
        let added = loaded.len() + rebound.len();
        for (path, id) in loaded {
            self.tracks.insert(track_name(&path), id);
        }
        for (name, id) in rebound {
            tracing::debug!(name = %name, %id, "path bound to loaded handle");
            self.tracks.insert(name, id);
        }
        tracing::info!(added, total = self.tracks.len(), "tracks added");
        Ok(self)
    }

    /// Removes the given names. A handle is unloaded once no name refers to it.
    /// Fails without removing anything if one of the names is unknown.
    pub fn remove(&mut self, names: &[impl AsRef<str>]) -> Result<&mut Self, MusicError> {
        self.resolve(names)?;
        for name in names {
            if let Some(id) = self.tracks.remove(name.as_ref()) {
                self.release_if_orphaned(id);
            }
        }
        tracing::info!(removed = names.len(), total = self.tracks.len(), "tracks removed");
        Ok(self)
    }

    pub fn remove_all(&mut self) -> Result<&mut Self, MusicError> {
        let ids: BTreeSet<HandleId> = self.tracks.drain().map(|(_, id)| id).collect();
        for id in ids {
            self.release(id);
        }
        tracing::info!("all tracks removed");
        Ok(self)
    }

    /// Binds `new` to the handle of `old`. `old` stays registered.
    pub fn change_track_name(&mut self, old: &str, new: &str) -> Result<&mut Self, MusicError> {
        let id = self.handle_of(old)?;
        if old == new {
            return Ok(self);
        }
        if let Some(prev) = self.tracks.insert(new.to_owned(), id)
            && prev != id
        {
            self.release_if_orphaned(prev);
        }
        tracing::debug!(old, new, %id, "track alias added");
        Ok(self)
    }

    /// Plays the named tracks, moving every track after the first to the first
    /// track's position.
    pub fn play(&mut self, names: &[impl AsRef<str>]) -> Result<&mut Self, MusicError> {
        let ids = self.resolve(names)?;
        self.play_handles(&ids)?;
        Ok(self)
    }

    pub fn play_all(&mut self) -> Result<&mut Self, MusicError> {
        let ids = self.all_handles();
        self.play_handles(&ids)?;
        Ok(self)
    }

    /// Pauses the named tracks and aligns them to the first one's position.
    /// Fades running on them are frozen until they play again.
    pub fn pause(&mut self, names: &[impl AsRef<str>]) -> Result<&mut Self, MusicError> {
        let ids = self.resolve(names)?;
        self.pause_handles(&ids)?;
        Ok(self)
    }

    pub fn pause_all(&mut self) -> Result<&mut Self, MusicError> {
        let ids = self.all_handles();
        self.pause_handles(&ids)?;
        Ok(self)
    }

    pub fn stop(&mut self, names: &[impl AsRef<str>]) -> Result<&mut Self, MusicError> {
        let ids = self.resolve(names)?;
        self.stop_handles(&ids)?;
        Ok(self)
    }

    pub fn stop_all(&mut self) -> Result<&mut Self, MusicError> {
        let ids = self.all_handles();
        self.stop_handles(&ids)?;
        Ok(self)
    }

    /// Sets the volume, clamped to `0.0..=1.0`. Cancels fades on those tracks.
    pub fn set_volume(
        &mut self,
        volume: f32,
        names: &[impl AsRef<str>],
    ) -> Result<&mut Self, MusicError> {
        let ids = self.resolve(names)?;
        self.set_volume_handles(volume, &ids)?;
        Ok(self)
    }

    pub fn set_volume_all(&mut self, volume: f32) -> Result<&mut Self, MusicError> {
        let ids = self.all_handles();
        self.set_volume_handles(volume, &ids)?;
        Ok(self)
    }

    /// Fades the named tracks in from silence to their current volume, or to
    /// full volume when they are currently silent. On a track that is not
    /// playing the fade waits until it plays.
    pub fn fade_in(
        &mut self,
        duration: Duration,
        names: &[impl AsRef<str>],
    ) -> Result<&mut Self, MusicError> {
        let ids = self.resolve(names)?;
        self.start_fade_in(duration, None, &ids)?;
        Ok(self)
    }

    pub fn fade_in_all(&mut self, duration: Duration) -> Result<&mut Self, MusicError> {
        let ids = self.all_handles();
        self.start_fade_in(duration, None, &ids)?;
        Ok(self)
    }

    /// Fades the named tracks in to `volume`. A volume outside `0.0..=1.0`
    /// falls back to the behaviour of [`fade_in`](Self::fade_in).
    pub fn fade_in_to(
        &mut self,
        duration: Duration,
        volume: f32,
        names: &[impl AsRef<str>],
    ) -> Result<&mut Self, MusicError> {
        let ids = self.resolve(names)?;
        self.start_fade_in(duration, Some(volume), &ids)?;
        Ok(self)
    }

    pub fn fade_in_all_to(&mut self, duration: Duration, volume: f32) -> Result<&mut Self, MusicError> {
        let ids = self.all_handles();
        self.start_fade_in(duration, Some(volume), &ids)?;
        Ok(self)
    }

    /// Fades the named tracks out from their current volume to silence.
    pub fn fade_out(
        &mut self,
        duration: Duration,
        names: &[impl AsRef<str>],
    ) -> Result<&mut Self, MusicError> {
        let ids = self.resolve(names)?;
        self.start_fade_out(duration, None, &ids)?;
        Ok(self)
    }

    pub fn fade_out_all(&mut self, duration: Duration) -> Result<&mut Self, MusicError> {
        let ids = self.all_handles();
        self.start_fade_out(duration, None, &ids)?;
        Ok(self)
    }

    /// Fades the named tracks out to `volume`. A volume outside `0.0..=1.0`
    /// fades to silence.
    pub fn fade_out_to(
        &mut self,
        duration: Duration,
        volume: f32,
        names: &[impl AsRef<str>],
    ) -> Result<&mut Self, MusicError> {
        let ids = self.resolve(names)?;
        self.start_fade_out(duration, Some(volume), &ids)?;
        Ok(self)
    }

    pub fn fade_out_all_to(&mut self, duration: Duration, volume: f32) -> Result<&mut Self, MusicError> {
        let ids = self.all_handles();
        self.start_fade_out(duration, Some(volume), &ids)?;
        Ok(self)
    }

    /// Advances every running fade to the current time.
    pub fn update(&mut self) -> Vec<HandleId> {
        self.update_at(Instant::now())
    }

    /// Advances every running fade to `now` and returns the handles whose fade
    /// completed on this tick.
    pub fn update_at(&mut self, now: Instant) -> Vec<HandleId> {
        let assets = &mut self.assets;
        self.fades.tick(now, |id, volume| {
            if let Some(music) = assets.get_mut(id) {
                music.set_volume(volume);
            }
        })
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tracks.contains_key(name)
    }

    pub fn handle_of(&self, name: &str) -> Result<HandleId, MusicError> {
        self.tracks
            .get(name)
            .copied()
            .ok_or_else(|| MusicError::UnknownTrack(name.to_owned()))
    }

    /// Every name bound to `id`, sorted.
    pub fn names_for(&self, id: HandleId) -> Vec<String> {
        let mut names: Vec<String> = self
            .tracks
            .iter()
            .filter(|(_, h)| **h == id)
            .map(|(n, _)| n.clone())
            .collect();
        names.sort();
        names
    }

    pub fn track_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tracks.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn volume(&self, name: &str) -> Result<f32, MusicError> {
        Ok(self.music(self.handle_of(name)?)?.volume())
    }

    pub fn position(&self, name: &str) -> Result<Duration, MusicError> {
        Ok(self.music(self.handle_of(name)?)?.position())
    }

    pub fn is_playing(&self, name: &str) -> Result<bool, MusicError> {
        Ok(self.music(self.handle_of(name)?)?.is_playing())
    }

    pub fn is_fading(&self, name: &str) -> Result<bool, MusicError> {
        Ok(self.fades.is_fading(self.handle_of(name)?))
    }

    pub fn has_fades(&self) -> bool {
        !self.fades.is_empty()
    }

    pub fn assets(&self) -> &AssetManager<L> {
        &self.assets
    }

    fn music(&self, id: HandleId) -> Result<&L::Music, MusicError> {
        self.assets.get(id).ok_or(MusicError::UnknownHandle(id))
    }

    fn music_mut(&mut self, id: HandleId) -> Result<&mut L::Music, MusicError> {
        self.assets.get_mut(id).ok_or(MusicError::UnknownHandle(id))
    }

    /// Maps names to handles, in order and without duplicates. Fails on the
    /// first unknown name.
    fn resolve(&self, names: &[impl AsRef<str>]) -> Result<Vec<HandleId>, MusicError> {
        let mut ids: Vec<HandleId> = Vec::with_capacity(names.len());
        for name in names {
            let id = self.handle_of(name.as_ref())?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    /// Distinct handles in load order.
    fn all_handles(&self) -> Vec<HandleId> {
        let ids: BTreeSet<HandleId> = self.tracks.values().copied().collect();
        ids.into_iter().collect()
    }

    fn release_if_orphaned(&mut self, id: HandleId) {
        if !self.tracks.values().any(|h| *h == id) {
            self.release(id);
        }
    }

    fn release(&mut self, id: HandleId) {
        self.fades.cancel(id);
        if let Err(e) = self.assets.unload(id) {
            tracing::warn!(%id, err = %e, "unload failed");
        }
    }

    fn play_handles(&mut self, ids: &[HandleId]) -> Result<(), MusicError> {
        let Some((&first, rest)) = ids.split_first() else {
            return Ok(());
        };
        let now = Instant::now();

        self.resume_fade(first, now)?;
        self.music_mut(first)?.play()?;
        let position = self.music(first)?.position();

        for &id in rest {
            self.resume_fade(id, now)?;
            let music = self.music_mut(id)?;
            music.play()?;
            music.set_position(position)?;
        }
        tracing::debug!(tracks = ids.len(), position_ms = position.as_millis() as u64, "play");
        Ok(())
    }

    /// Unfreezes the fade on `id` and writes its current volume before the
    /// track becomes audible.
    fn resume_fade(&mut self, id: HandleId, now: Instant) -> Result<(), MusicError> {
        self.fades.resume(id, now);
        if let Some(volume) = self.fades.get(id).map(|f| f.volume_at(now)) {
            self.music_mut(id)?.set_volume(volume);
        }
        Ok(())
    }

    /// Starts `fade`, frozen when its track is not playing.
    fn schedule(&mut self, fade: Fade, now: Instant) -> Result<(), MusicError> {
        let id = fade.handle();
        let playing = self.music(id)?.is_playing();
        self.fades.start(fade);
        if !playing {
            self.fades.pause(id, now);
        }
        Ok(())
    }

    fn pause_handles(&mut self, ids: &[HandleId]) -> Result<(), MusicError> {
        let Some((&first, rest)) = ids.split_first() else {
            return Ok(());
        };
        let now = Instant::now();

        self.music_mut(first)?.pause();
        self.fades.pause(first, now);
        let position = self.music(first)?.position();

        for &id in rest {
            let music = self.music_mut(id)?;
            music.pause();
            music.set_position(position)?;
            self.fades.pause(id, now);
        }
        tracing::debug!(tracks = ids.len(), position_ms = position.as_millis() as u64, "pause");
        Ok(())
    }

    fn stop_handles(&mut self, ids: &[HandleId]) -> Result<(), MusicError> {
        for &id in ids {
            self.fades.cancel(id);
            self.music_mut(id)?.stop();
        }
        tracing::debug!(tracks = ids.len(), "stop");
        Ok(())
    }

    fn set_volume_handles(&mut self, volume: f32, ids: &[HandleId]) -> Result<(), MusicError> {
        let volume = clamp_volume(volume);
        for &id in ids {
            self.fades.cancel(id);
            self.music_mut(id)?.set_volume(volume);
        }
        tracing::debug!(tracks = ids.len(), volume, "set volume");
        Ok(())
    }

    fn start_fade_in(
        &mut self,
        duration: Duration,
        volume: Option<f32>,
        ids: &[HandleId],
    ) -> Result<(), MusicError> {
        let now = Instant::now();
        for &id in ids {
            let target = match volume.filter(|v| (0.0..=1.0).contains(v)) {
                Some(v) => v,
                None => self.music(id)?.volume(),
            };
            let target = if target == 0.0 { 1.0 } else { target };
            self.schedule(Fade::new(id, 0.0, target, duration, now), now)?;
        }
        tracing::debug!(tracks = ids.len(), duration_ms = duration.as_millis() as u64, "fade in");
        Ok(())
    }

    fn start_fade_out(
        &mut self,
        duration: Duration,
        volume: Option<f32>,
        ids: &[HandleId],
    ) -> Result<(), MusicError> {
        let now = Instant::now();
        let target = volume.filter(|v| (0.0..=1.0).contains(v)).unwrap_or(0.0);
        for &id in ids {
            let from = self.music(id)?.volume();
            self.schedule(Fade::new(id, from, target, duration, now), now)?;
        }
        tracing::debug!(tracks = ids.len(), duration_ms = duration.as_millis() as u64, "fade out");
        Ok(())
    }
}

fn track_name(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}
