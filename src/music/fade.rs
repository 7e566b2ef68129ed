use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::assets::HandleId;

/// Linear volume ramp on one handle, advanced by the owner's tick.
#[derive(Debug, Clone)]
pub struct Fade {
    handle: HandleId,
    from: f32,
    to: f32,
    start: Instant,
    duration: Duration,
    paused_at: Option<Instant>,
    paused_total: Duration,
}

impl Fade {
    pub fn new(handle: HandleId, from: f32, to: f32, duration: Duration, now: Instant) -> Self {
        Self {
            handle,
            from,
            to,
            start: now,
            duration: duration.max(Duration::from_millis(1)),
            paused_at: None,
            paused_total: Duration::ZERO,
        }
    }

    pub fn handle(&self) -> HandleId {
        self.handle
    }

    pub fn target(&self) -> f32 {
        self.to
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn pause(&mut self, now: Instant) {
        if self.paused_at.is_none() {
            self.paused_at = Some(now);
        }
    }

    pub fn resume(&mut self, now: Instant) {
        if let Some(at) = self.paused_at.take() {
            self.paused_total = self
                .paused_total
                .saturating_add(now.saturating_duration_since(at));
        }
    }

    /// Fraction of the ramp completed at `now`, in `0.0..=1.0`.
    pub fn progress(&self, now: Instant) -> f32 {
        let now = self.paused_at.unwrap_or(now);
        let elapsed = now
            .saturating_duration_since(self.start)
            .saturating_sub(self.paused_total);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    pub fn volume_at(&self, now: Instant) -> f32 {
        let t = self.progress(now);
        if t >= 1.0 {
            return self.to;
        }
        self.from + (self.to - self.from) * t
    }
}

/// At most one running fade per handle.
#[derive(Debug, Default)]
pub struct FadeScheduler {
    fades: HashMap<HandleId, Fade>,
}

impl FadeScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fade, replacing any fade already running on the same handle.
    pub fn start(&mut self, fade: Fade) -> Option<Fade> {
        self.fades.insert(fade.handle, fade)
    }

    pub fn cancel(&mut self, handle: HandleId) -> bool {
        self.fades.remove(&handle).is_some()
    }

    pub fn pause(&mut self, handle: HandleId, now: Instant) {
        if let Some(fade) = self.fades.get_mut(&handle) {
            fade.pause(now);
        }
    }

    pub fn resume(&mut self, handle: HandleId, now: Instant) {
        if let Some(fade) = self.fades.get_mut(&handle) {
            fade.resume(now);
        }
    }

    pub fn get(&self, handle: HandleId) -> Option<&Fade> {
        self.fades.get(&handle)
    }

    pub fn is_fading(&self, handle: HandleId) -> bool {
        self.fades.contains_key(&handle)
    }

    pub fn is_empty(&self) -> bool {
        self.fades.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fades.len()
    }

    /// Writes the current volume of every running fade through `apply` and
    /// returns the handles whose fade completed. Paused fades are skipped.
    pub fn tick(&mut self, now: Instant, mut apply: impl FnMut(HandleId, f32)) -> Vec<HandleId> {
        let mut finished = Vec::new();
        for (handle, fade) in &self.fades {
            if fade.is_paused() {
                continue;
            }
            apply(*handle, fade.volume_at(now));
            if fade.progress(now) >= 1.0 {
                finished.push(*handle);
            }
        }
        for handle in &finished {
            self.fades.remove(handle);
        }
        finished.sort();
        finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> HandleId {
        HandleId::from_raw(n)
    }

    #[test]
    fn test_volume_ramps_linearly() {
        let t0 = Instant::now();
        let fade = Fade::new(id(1), 0.0, 0.8, Duration::from_millis(1000), t0);
        assert_eq!(fade.volume_at(t0), 0.0);
        let mid = fade.volume_at(t0 + Duration::from_millis(500));
        assert!((mid - 0.4).abs() < 1e-4);
        assert_eq!(fade.volume_at(t0 + Duration::from_secs(5)), 0.8);
    }

    #[test]
    fn test_paused_time_is_excluded() {
        let t0 = Instant::now();
        let mut fade = Fade::new(id(1), 1.0, 0.0, Duration::from_millis(1000), t0);
        fade.pause(t0 + Duration::from_millis(250));
        assert!((fade.progress(t0 + Duration::from_secs(10)) - 0.25).abs() < 1e-4);
        fade.resume(t0 + Duration::from_millis(1250));
        assert!((fade.progress(t0 + Duration::from_millis(1500)) - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_zero_duration_completes_on_first_tick() {
        let t0 = Instant::now();
        let mut scheduler = FadeScheduler::new();
        scheduler.start(Fade::new(id(3), 0.0, 1.0, Duration::ZERO, t0));

        let mut seen = Vec::new();
        let done = scheduler.tick(t0 + Duration::from_millis(1), |h, v| seen.push((h, v)));
        assert_eq!(done, vec![id(3)]);
        assert_eq!(seen, vec![(id(3), 1.0)]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_start_replaces_running_fade() {
        let t0 = Instant::now();
        let mut scheduler = FadeScheduler::new();
        scheduler.start(Fade::new(id(1), 0.0, 1.0, Duration::from_secs(1), t0));
        let old = scheduler.start(Fade::new(id(1), 1.0, 0.0, Duration::from_secs(1), t0));
        assert_eq!(old.map(|f| f.target()), Some(1.0));
        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.get(id(1)).map(Fade::target), Some(0.0));
    }

    #[test]
    fn test_tick_skips_paused_fades() {
        let t0 = Instant::now();
        let mut scheduler = FadeScheduler::new();
        scheduler.start(Fade::new(id(1), 0.0, 1.0, Duration::from_millis(100), t0));
        scheduler.start(Fade::new(id(2), 0.0, 1.0, Duration::from_millis(100), t0));
        scheduler.pause(id(2), t0);

        let mut applied = Vec::new();
        let done = scheduler.tick(t0 + Duration::from_secs(1), |h, _| applied.push(h));
        assert_eq!(done, vec![id(1)]);
        assert_eq!(applied, vec![id(1)]);
        assert!(scheduler.is_fading(id(2)));
        assert!(scheduler.cancel(id(2)));
        assert!(!scheduler.cancel(id(2)));
    }
}
