//! Frame loop: the per-frame step function and the Bevy plugin that drives it.
//!
//! [`run_frame`] is plain Rust over a [`DrawSurface`] and an `Rng`, so the
//! whole frame (physics, shattering, spawning, moving layers) is testable
//! without an `App`.  The static layers only change with the surface size, so
//! [`draw_backdrop`] records them once into the [`Backdrop`] resource and
//! again after each resize.  The systems below only adapt both to ECS
//! resources and window events.

use crate::canvas::{DrawList, DrawSurface, Glow, Layer};
use crate::config::{self, SkyConfig};
use crate::scenery::Scenery;
use crate::spawner;
use crate::world::{SurfaceBounds, WorldState};
use bevy::prelude::*;
use bevy::window::{PrimaryWindow, WindowResized};
use rand::Rng;

/// What happened during one call to [`run_frame`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub spawned: bool,
    pub shatters: u32,
    pub expired_particles: usize,
    pub expired_fragments: usize,
}

/// Draw the layers that only depend on the surface size: sky, ambient stars,
/// mountains, ground, moon.
pub fn draw_backdrop<S: DrawSurface>(
    world: &WorldState,
    scenery: &Scenery,
    surface: &mut S,
    glow: Glow,
) {
    scenery.draw_sky(surface);
    surface.scoped(|s| {
        s.set_layer(Layer::AmbientStars);
        for star in &world.ambient {
            star.render(s, glow);
        }
    });
    scenery.draw_mountains(surface);
    scenery.draw_ground(surface);
    scenery.draw_moon(surface);
}

/// Advance the world one frame and draw the moving layers onto `surface`.
///
/// Shooting stars go on [`Layer::ShootingStars`] and fragments on
/// [`Layer::Fragments`], between the ground and the moon.  The spawner runs
/// after fragments so a new star is first drawn on the following frame.
pub fn run_frame<S, R>(
    world: &mut WorldState,
    surface: &mut S,
    config: &SkyConfig,
    rng: &mut R,
) -> FrameReport
where
    S: DrawSurface,
    R: Rng + ?Sized,
{
    let glow = config.glow();
    let bounds = world.bounds;
    let mut report = FrameReport::default();

    surface.scoped(|s| {
        s.set_layer(Layer::ShootingStars);
        for particle in world.active.iter_mut() {
            report.shatters += particle.integrate(bounds, config, rng, &mut world.fragments);
            if !particle.is_expired() {
                particle.render(s, glow);
            }
        }
    });
    report.expired_particles = world.remove_expired_particles();

    // Fragments never shatter, so nothing is ever pushed here.
    let mut no_fragments = Vec::new();
    surface.scoped(|s| {
        s.set_layer(Layer::Fragments);
        for fragment in world.fragments.iter_mut() {
            fragment.integrate(bounds, config, rng, &mut no_fragments);
            if !fragment.is_expired() {
                fragment.render(s, glow);
            }
        }
    });
    report.expired_fragments = world.remove_expired_fragments();

    report.spawned = spawner::run_spawner(world, config, rng);
    report
}

// ── Resources ─────────────────────────────────────────────────────────────────

/// Recorded static layers for the current surface size.
#[derive(Resource, Debug, Clone)]
pub struct Backdrop {
    pub bounds: SurfaceBounds,
    pub commands: DrawList,
    /// Starts at 1 and goes up by one on every rebuild.
    pub generation: u64,
}

impl Backdrop {
    fn record(world: &WorldState, scenery: &Scenery, config: &SkyConfig, generation: u64) -> Self {
        let mut commands = DrawList::new();
        draw_backdrop(world, scenery, &mut commands, config.glow());
        Self {
            bounds: world.bounds,
            commands,
            generation,
        }
    }
}

/// Shapes recorded by the latest [`run_frame`].
#[derive(Resource, Debug, Clone, Default)]
pub struct FrameDraw(pub DrawList);

/// Running totals for logging and tests.
#[derive(Resource, Debug, Clone, Default)]
pub struct SkyStats {
    pub frames: u64,
    pub spawned: u64,
    pub shatters: u64,
    pub resets: u64,
    pub last_frame: FrameReport,
}

impl SkyStats {
    fn record(&mut self, report: FrameReport) {
        self.frames += 1;
        self.spawned += u64::from(report.spawned);
        self.shatters += u64::from(report.shatters);
        self.last_frame = report;
    }
}

// ── Plugin ────────────────────────────────────────────────────────────────────

pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SkyConfig>()
            .init_resource::<SkyStats>()
            .init_resource::<FrameDraw>()
            .add_message::<WindowResized>()
            .add_systems(Startup, setup_sky.after(config::load_sky_config))
            .add_systems(Update, (resize_system, frame_system).chain());
    }
}

// ── Systems ───────────────────────────────────────────────────────────────────

/// Build the world, scenery, and backdrop at the primary window's size, or at
/// the configured initial size when running headless.
pub fn setup_sky(
    mut commands: Commands,
    config: Res<SkyConfig>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    let bounds = windows
        .iter()
        .next()
        .map(|w| SurfaceBounds::new(w.width(), w.height()))
        .unwrap_or_else(|| SurfaceBounds::new(config.initial_width, config.initial_height));

    let world = WorldState::new(bounds, &config, &mut rand::thread_rng());
    let scenery = Scenery::new(bounds, &config);
    commands.insert_resource(Backdrop::record(&world, &scenery, &config, 1));
    commands.insert_resource(world);
    commands.insert_resource(scenery);
    info!("Night sky ready at {}x{}", bounds.width, bounds.height);
}

/// Reinitialize everything size-dependent when the window changes size.
///
/// Only the last resize of a frame matters; earlier ones in the same batch are
/// skipped.
pub fn resize_system(
    mut resized: MessageReader<WindowResized>,
    config: Res<SkyConfig>,
    mut world: ResMut<WorldState>,
    mut scenery: ResMut<Scenery>,
    mut backdrop: ResMut<Backdrop>,
    mut stats: ResMut<SkyStats>,
) {
    let Some(event) = resized.read().last() else {
        return;
    };
    let bounds = SurfaceBounds::new(event.width, event.height);

    world.resize(bounds, &config, &mut rand::thread_rng());
    *scenery = Scenery::new(bounds, &config);
    let generation = backdrop.generation + 1;
    *backdrop = Backdrop::record(&world, &scenery, &config, generation);
    stats.resets += 1;
    info!(
        "Surface resized to {}x{}; sky reset",
        bounds.width, bounds.height
    );
}

/// Run one frame of the simulation into [`FrameDraw`].
pub fn frame_system(
    config: Res<SkyConfig>,
    mut world: ResMut<WorldState>,
    mut frame: ResMut<FrameDraw>,
    mut stats: ResMut<SkyStats>,
) {
    frame.0.clear();
    let report = run_frame(&mut world, &mut frame.0, &config, &mut rand::thread_rng());
    stats.record(report);

    if report.shatters > 0 {
        debug!(
            "Frame {}: {} shatter(s), {} fragment(s) live",
            stats.frames,
            report.shatters,
            world.fragments.len()
        );
    }
}
