//! Time update system and pause control.
//!
//! Updates the shared [`WorldTime`](crate::resources::worldtime::WorldTime)
//! resource once per tick, applying `time_scale` to the provided delta.
use bevy_ecs::prelude::*;
use log::info;

use crate::events::pause::PauseChangedEvent;
use crate::resources::worldtime::WorldTime;

/// Update elapsed and delta seconds on the `WorldTime` resource.
///
/// `dt` is expected to be the unscaled tick delta in seconds. The system
/// applies the current `time_scale` and writes both `elapsed` and `delta`.
pub fn update_world_time(world: &mut World, dt: f32) {
    let mut wt = world.resource_mut::<WorldTime>();
    let scaled_dt = dt * wt.time_scale;
    wt.elapsed += scaled_dt;
    wt.delta = scaled_dt;
    wt.frame_count += 1;
}

/// Pause or resume the simulation.
///
/// Triggers [`PauseChangedEvent`] only when the state actually changes.
/// Returns whether it did.
pub fn set_paused(world: &mut World, paused: bool) -> bool {
    let changed = world.resource_mut::<WorldTime>().set_paused(paused);
    if changed {
        info!("Simulation {}", if paused { "paused" } else { "resumed" });
        world.trigger(PauseChangedEvent { paused });
    }
    changed
}

/// Run condition: the clock is not paused.
pub fn time_is_running(time: Res<WorldTime>) -> bool {
    !time.paused()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_delta_accumulates() {
        let mut world = World::new();
        world.insert_resource(WorldTime::default().with_time_scale(0.5));
        update_world_time(&mut world, 0.02);
        update_world_time(&mut world, 0.02);
        let wt = world.resource::<WorldTime>();
        assert!((wt.elapsed - 0.02).abs() < 1e-6);
        assert!((wt.delta - 0.01).abs() < 1e-6);
        assert_eq!(wt.frame_count, 2);
    }

    #[test]
    fn paused_clock_stands_still() {
        let mut world = World::new();
        world.insert_resource(WorldTime::default());
        update_world_time(&mut world, 0.02);
        assert!(set_paused(&mut world, true));
        assert!(!set_paused(&mut world, true));
        update_world_time(&mut world, 0.02);
        let wt = world.resource::<WorldTime>();
        assert!((wt.elapsed - 0.02).abs() < 1e-6);
        assert_eq!(wt.delta, 0.0);
    }
}
