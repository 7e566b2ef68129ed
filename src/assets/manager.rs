use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::{HandleId, Music, MusicLoader};
use crate::error::MusicError;

struct LoadedAsset<M> {
    path: PathBuf,
    music: M,
    ref_count: usize,
}

pub struct AssetManager<L: MusicLoader> {
    loader: L,
    queue: Vec<PathBuf>,
    assets: HashMap<HandleId, LoadedAsset<L::Music>>,
    by_path: HashMap<PathBuf, HandleId>,
    next_id: u64,
}

impl<L: MusicLoader> AssetManager<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            queue: Vec::new(),
            assets: HashMap::new(),
            by_path: HashMap::new(),
            next_id: 0,
        }
    }

    /// Queues a load request. Nothing is read until [`finish_loading`](Self::finish_loading).
    pub fn load(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.queue.contains(&path) {
            self.queue.push(path);
        }
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Loads every queued request in order, blocking until all are done.
    ///
    /// Loading is all-or-nothing: when one request fails, every reference taken
    /// by this batch is released again before the error is returned.
    pub fn finish_loading(&mut self) -> Result<Vec<(PathBuf, HandleId)>, MusicError> {
        let queue = std::mem::take(&mut self.queue);
        let mut done: Vec<(PathBuf, HandleId)> = Vec::with_capacity(queue.len());

        for path in queue {
            match self.load_now(&path) {
                Ok(id) => done.push((path, id)),
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        err = %e,
                        rolled_back = done.len(),
                        "load failed, releasing batch"
                    );
                    for (_, id) in done {
                        let _ = self.unload(id);
                    }
                    return Err(e);
                }
            }
        }

        Ok(done)
    }

    fn load_now(&mut self, path: &Path) -> Result<HandleId, MusicError> {
        if let Some(&id) = self.by_path.get(path)
            && let Some(asset) = self.assets.get_mut(&id)
        {
            asset.ref_count += 1;
            tracing::debug!(%id, path = %path.display(), refs = asset.ref_count, "asset already loaded");
            return Ok(id);
        }

        let music = self.loader.load(path)?;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        let id = HandleId::from_raw(self.next_id);
        self.assets.insert(
            id,
            LoadedAsset {
                path: path.to_path_buf(),
                music,
                ref_count: 1,
            },
        );
        self.by_path.insert(path.to_path_buf(), id);
        tracing::debug!(%id, path = %path.display(), "asset loaded");
        Ok(id)
    }

    /// Releases one reference. Returns `true` when the handle was disposed.
    pub fn unload(&mut self, id: HandleId) -> Result<bool, MusicError> {
        let Some(asset) = self.assets.get_mut(&id) else {
            return Err(MusicError::UnknownHandle(id));
        };
        asset.ref_count = asset.ref_count.saturating_sub(1);
        if asset.ref_count > 0 {
            return Ok(false);
        }

        if let Some(mut asset) = self.assets.remove(&id) {
            asset.music.stop();
            self.by_path.remove(&asset.path);
            tracing::debug!(%id, path = %asset.path.display(), "asset unloaded");
        }
        Ok(true)
    }

    pub fn get(&self, id: HandleId) -> Option<&L::Music> {
        self.assets.get(&id).map(|a| &a.music)
    }

    pub fn get_mut(&mut self, id: HandleId) -> Option<&mut L::Music> {
        self.assets.get_mut(&id).map(|a| &mut a.music)
    }

    pub fn id_for(&self, path: &Path) -> Option<HandleId> {
        self.by_path.get(path).copied()
    }

    pub fn path_of(&self, id: HandleId) -> Option<&Path> {
        self.assets.get(&id).map(|a| a.path.as_path())
    }

    pub fn is_loaded(&self, path: &Path) -> bool {
        self.by_path.contains_key(path)
    }

    pub fn ref_count(&self, id: HandleId) -> Option<usize> {
        self.assets.get(&id).map(|a| a.ref_count)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn loader_mut(&mut self) -> &mut L {
        &mut self.loader
    }
}
