//! Shooting-star spawner.
//!
//! A [`SpawnClock`] counts frames and fires whenever
//! `frame_counter % next_interval == 0`.  After each spawn the interval is
//! re-rolled, so the gap to the next star depends on where the counter sits
//! relative to the new modulus rather than being exactly one interval long.

use crate::config::SkyConfig;
use crate::particle::Particle;
use crate::world::WorldState;
use bevy::prelude::*;
use rand::Rng;

/// Frame counter plus the current spawn modulus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnClock {
    frame_counter: u64,
    next_interval: u32,
}

impl SpawnClock {
    pub fn new(initial_interval: u32) -> Self {
        Self {
            frame_counter: 0,
            next_interval: initial_interval.max(1),
        }
    }

    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    pub fn next_interval(&self) -> u32 {
        self.next_interval
    }

    /// Advance one frame, wrapping to 0 on reaching `wrap`.  Returns `true` when
    /// this frame should spawn.
    pub fn tick(&mut self, wrap: u64) -> bool {
        self.frame_counter += 1;
        if self.frame_counter >= wrap {
            self.frame_counter = 0;
        }
        self.frame_counter % u64::from(self.next_interval) == 0
    }

    /// Pick the next interval uniformly from `min..=max`.
    pub fn reroll<R: Rng + ?Sized>(&mut self, min: u32, max: u32, rng: &mut R) {
        self.next_interval = rng.gen_range(min..=max).max(1);
    }
}

/// Horizontal spawn position for a star of `radius`, kept fully on-surface
/// whenever the surface is wide enough to allow it.
pub fn spawn_x<R: Rng + ?Sized>(width: f32, radius: f32, rng: &mut R) -> f32 {
    let upper = (width - radius).max(radius);
    (rng.gen::<f32>() * width - radius).clamp(radius, upper)
}

/// Run one frame of spawner logic.  Returns `true` if a star was added to
/// `world.active`.
pub fn run_spawner<R: Rng + ?Sized>(
    world: &mut WorldState,
    config: &SkyConfig,
    rng: &mut R,
) -> bool {
    if !world.spawn_clock.tick(config.frame_counter_wrap) {
        return false;
    }

    let radius = config.spawn_radius;
    let position = Vec2::new(spawn_x(world.bounds.width, radius, rng), config.spawn_y);
    world
        .active
        .push(Particle::bouncing(position, radius, config.star_color, config, rng));
    world
        .spawn_clock
        .reroll(config.spawn_interval_min, config.spawn_interval_max, rng);

    debug!(
        "Spawned shooting star at x = {:.1} (frame {}, next interval {})",
        position.x,
        world.spawn_clock.frame_counter(),
        world.spawn_clock.next_interval()
    );
    true
}
