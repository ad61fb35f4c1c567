//! Shared simulation clock.
//!
//! `elapsed` and `delta` are scaled by `time_scale`, so every timer that reads
//! them (boost cooldown, request buffers, degeneration grace) freezes while the
//! simulation is paused. A time scale of zero means paused.
use bevy_ecs::prelude::Resource;

/// Highest accepted time scale.
pub const MAX_TIME_SCALE: f32 = 2.0;
/// Default fixed tick length in seconds.
pub const DEFAULT_FIXED_DELTA: f32 = 0.02;

#[derive(Resource, Clone, Copy, Debug)]
pub struct WorldTime {
    /// Scaled seconds since the simulation started.
    pub elapsed: f32,
    /// Scaled length of the current tick.
    pub delta: f32,
    pub time_scale: f32,
    /// Unscaled tick length fed to the simulation.
    pub fixed_delta: f32,
    pub frame_count: u64,
    /// Time scale to restore when unpausing. Negative when none was cached.
    cached_time_scale: f32,
}

impl Default for WorldTime {
    fn default() -> Self {
        WorldTime {
            elapsed: 0.0,
            delta: 0.0,
            time_scale: 1.0,
            fixed_delta: DEFAULT_FIXED_DELTA,
            frame_count: 0,
            cached_time_scale: -1.0,
        }
    }
}

impl WorldTime {
    pub fn with_time_scale(mut self, scale: f32) -> Self {
        self.set_time_scale(scale);
        self
    }

    pub fn with_fixed_delta(mut self, fixed_delta: f32) -> Self {
        self.fixed_delta = fixed_delta;
        self
    }

    /// Set the time scale, clamped to [0, MAX_TIME_SCALE].
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.clamp(0.0, MAX_TIME_SCALE);
    }

    pub fn paused(&self) -> bool {
        self.time_scale == 0.0
    }

    /// Pause or resume. Returns true when the state actually changed.
    ///
    /// Pausing caches the current scale; resuming restores it, or falls back
    /// to 1.0 when nothing positive was cached.
    pub fn set_paused(&mut self, paused: bool) -> bool {
        if self.paused() == paused {
            return false;
        }
        if paused {
            self.cached_time_scale = self.time_scale;
            self.time_scale = 0.0;
        } else if self.cached_time_scale > 0.0 {
            let cached = self.cached_time_scale;
            self.set_time_scale(cached);
        } else {
            self.time_scale = 1.0;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_scale_is_clamped() {
        let mut wt = WorldTime::default();
        wt.set_time_scale(5.0);
        assert_eq!(wt.time_scale, 2.0);
        wt.set_time_scale(-1.0);
        assert_eq!(wt.time_scale, 0.0);
        assert!(wt.paused());
    }

    #[test]
    fn pause_caches_and_restores_scale() {
        let mut wt = WorldTime::default().with_time_scale(1.5);
        assert!(wt.set_paused(true));
        assert!(wt.paused());
        assert!(!wt.set_paused(true));
        assert!(wt.set_paused(false));
        assert_eq!(wt.time_scale, 1.5);
    }

    #[test]
    fn resume_without_cache_uses_one() {
        let mut wt = WorldTime::default().with_time_scale(0.0);
        assert!(wt.paused());
        assert!(wt.set_paused(false));
        assert_eq!(wt.time_scale, 1.0);
    }
}
