//! World state: the three particle collections, the spawn clock, and the
//! current surface bounds.
//!
//! All per-frame mutation goes through [`crate::simulation::run_frame`]; a
//! resize replaces the bounds and calls [`WorldState::init`] on the same
//! thread, so the next frame always sees a freshly reset world.

use crate::config::SkyConfig;
use crate::particle::Particle;
use crate::spawner::SpawnClock;
use bevy::prelude::*;
use rand::Rng;

/// Size of the drawing surface.  The floor line is its bottom edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceBounds {
    pub width: f32,
    pub height: f32,
}

impl SurfaceBounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// `y` coordinate particles bounce off.
    pub fn floor(&self) -> f32 {
        self.height
    }
}

#[derive(Resource, Debug, Clone)]
pub struct WorldState {
    pub bounds: SurfaceBounds,
    /// Background stars: rendered every frame, never integrated.
    pub ambient: Vec<Particle>,
    /// Shooting stars, in spawn order.
    pub active: Vec<Particle>,
    /// Shards from shatters, in emission order.
    pub fragments: Vec<Particle>,
    pub spawn_clock: SpawnClock,
}

impl WorldState {
    /// A world sized to `bounds` and already populated by [`init`](Self::init).
    pub fn new<R: Rng + ?Sized>(bounds: SurfaceBounds, config: &SkyConfig, rng: &mut R) -> Self {
        let mut world = Self {
            bounds,
            ambient: Vec::new(),
            active: Vec::new(),
            fragments: Vec::new(),
            spawn_clock: SpawnClock::new(config.initial_spawn_interval),
        };
        world.init(config, rng);
        world
    }

    /// Clear every collection and scatter a fresh set of background stars.
    ///
    /// The spawn clock keeps running across inits.
    pub fn init<R: Rng + ?Sized>(&mut self, config: &SkyConfig, rng: &mut R) {
        self.active.clear();
        self.fragments.clear();
        self.ambient.clear();

        let bounds = self.bounds;
        self.ambient.extend(
            (0..config.ambient_star_count).map(|_| ambient_star(bounds, config, &mut *rng)),
        );
    }

    /// Adopt new surface bounds and reinitialize.
    pub fn resize<R: Rng + ?Sized>(
        &mut self,
        bounds: SurfaceBounds,
        config: &SkyConfig,
        rng: &mut R,
    ) {
        self.bounds = bounds;
        self.init(config, rng);
    }

    /// Drop shooting stars whose radius has reached zero or below.  Returns the
    /// number removed.  Order of the survivors is preserved.
    pub fn remove_expired_particles(&mut self) -> usize {
        retain_live(&mut self.active)
    }

    /// Drop fragments whose ttl has run out.  Returns the number removed.
    pub fn remove_expired_fragments(&mut self) -> usize {
        retain_live(&mut self.fragments)
    }
}

fn retain_live(particles: &mut Vec<Particle>) -> usize {
    let before = particles.len();
    particles.retain(|p| !p.is_expired());
    before - particles.len()
}

/// A static background star: uniform position over the surface, radius in
/// `[0, ambient_max_radius)`.  Its velocity is assigned but never used.
fn ambient_star<R: Rng + ?Sized>(
    bounds: SurfaceBounds,
    config: &SkyConfig,
    rng: &mut R,
) -> Particle {
    let position = Vec2::new(
        rng.gen::<f32>() * bounds.width,
        rng.gen::<f32>() * bounds.height,
    );
    let radius = rng.gen::<f32>() * config.ambient_max_radius;
    Particle::bouncing(position, radius, config.ambient_star_color, config, rng)
}
