//! Centralised simulation, scenery, and spawn constants.
//!
//! All tuneable values live here so they can be found, reasoned-about, and
//! modified in one place.  [`crate::config::SkyConfig::default`] mirrors every
//! value below; `assets/night_sky.toml` can override any subset at startup.
//!
//! Units are surface pixels and frames.  The simulation advances one step per
//! rendered frame, so velocities are pixels/frame and accelerations are
//! pixels/frame².

use bevy::color::Srgba;

// ── Surface ───────────────────────────────────────────────────────────────────

/// Initial drawing-surface width before the first resize event arrives.
pub const INITIAL_SURFACE_WIDTH: f32 = 1200.0;

/// Initial drawing-surface height.
pub const INITIAL_SURFACE_HEIGHT: f32 = 680.0;

// ── Shooting stars ───────────────────────────────────────────────────────────

/// Gravity added to a bouncing particle's vertical velocity every frame.
pub const STAR_GRAVITY: f32 = 1.0;

/// Fraction of velocity kept after bouncing off the floor or a wall.
///
/// Lower values make stars lose energy faster; 1.0 is a perfectly elastic bounce.
pub const STAR_FRICTION: f32 = 0.8;

/// Horizontal launch speed spread: `vx = (u - 0.5) * STAR_HORIZONTAL_SPREAD`.
pub const STAR_HORIZONTAL_SPREAD: f32 = 8.0;

/// Initial downward speed of every bouncing particle.
pub const STAR_INITIAL_FALL_SPEED: f32 = 3.0;

/// Radius of a freshly spawned shooting star.
pub const SPAWN_RADIUS: f32 = 9.0;

/// Spawn height.  Negative values start the star above the visible area.
pub const SPAWN_Y: f32 = -100.0;

/// Radius lost per shatter.  A default star survives `SPAWN_RADIUS / 3 = 3` hits.
pub const SHATTER_RADIUS_DECREMENT: f32 = 3.0;

// ── Fragments ─────────────────────────────────────────────────────────────────

/// Fragments emitted by a single shatter.
pub const FRAGMENT_COUNT: usize = 8;

/// Radius of every fragment.
pub const FRAGMENT_RADIUS: f32 = 2.0;

/// Gravity applied to fragments; much weaker than [`STAR_GRAVITY`] so shards float.
pub const FRAGMENT_GRAVITY: f32 = 0.1;

/// Floor rebound factor for fragments.
pub const FRAGMENT_FRICTION: f32 = 0.8;

/// Frames a fragment lives.
pub const FRAGMENT_TTL: u32 = 100;

/// Per-frame opacity loss factor: `opacity -= FRAGMENT_FADE_RATE * ttl`.
///
/// With a 100-frame TTL the total fade is `0.0001 * (99 + 98 + ... + 0) = 0.495`,
/// so fragments vanish at roughly half opacity.
pub const FRAGMENT_FADE_RATE: f32 = 0.0001;

/// Fragment horizontal speed spread: `vx = (u - 0.5) * FRAGMENT_HORIZONTAL_SPREAD`.
pub const FRAGMENT_HORIZONTAL_SPREAD: f32 = 10.0;

/// Fragment vertical speed spread: `vy = (u - 0.5) * FRAGMENT_VERTICAL_SPREAD`.
pub const FRAGMENT_VERTICAL_SPREAD: f32 = 30.0;

// ── Ambient stars ─────────────────────────────────────────────────────────────

/// Number of static background stars created by every world init.
pub const AMBIENT_STAR_COUNT: usize = 200;

/// Exclusive upper bound on background star radius.
pub const AMBIENT_MAX_RADIUS: f32 = 3.0;

// ── Spawner ───────────────────────────────────────────────────────────────────

/// Spawn interval used until the first shooting star appears.
pub const INITIAL_SPAWN_INTERVAL: u32 = 75;

/// Inclusive lower bound of the re-rolled spawn interval (frames).
pub const SPAWN_INTERVAL_MIN: u32 = 125;

/// Inclusive upper bound of the re-rolled spawn interval (frames).
pub const SPAWN_INTERVAL_MAX: u32 = 200;

/// The frame counter resets to zero on reaching this value.
pub const FRAME_COUNTER_WRAP: u64 = 1_000_000_000;

// ── Scenery ───────────────────────────────────────────────────────────────────

/// Ground strip height as a fraction of surface height.
pub const GROUND_HEIGHT_FRACTION: f32 = 0.09;

/// Const equivalent of `Srgba::rgb_u8`, which is not a `const fn`.
const fn rgb_u8(r: u8, g: u8, b: u8) -> Srgba {
    Srgba::rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
}

/// Mountain layers, back to front: `(peaks, height fraction, colour)`.
pub const MOUNTAIN_LAYERS: [(u32, f32, Srgba); 3] = [
    (1, 0.7, rgb_u8(0x38, 0x45, 0x51)),
    (2, 0.6, rgb_u8(0x2B, 0x38, 0x43)),
    (3, 0.4, rgb_u8(0x26, 0x33, 0x3E)),
];

/// How far each mountain base spreads past its slot, as a fraction of surface height.
pub const MOUNTAIN_BASE_OVERHANG: f32 = 0.2;

/// Moon radius in pixels.
pub const MOON_RADIUS: f32 = 50.0;

/// Moon centre as a fraction of surface width.
pub const MOON_X_FRACTION: f32 = 0.5;

/// Moon centre as a fraction of surface height.
pub const MOON_Y_FRACTION: f32 = 0.25;

/// Glow (shadow blur) radius drawn around every star.
pub const GLOW_BLUR: f32 = 20.0;

// ── Palette ───────────────────────────────────────────────────────────────────

pub const SKY_TOP_COLOR: Srgba = rgb_u8(0x00, 0x1a, 0x33);
pub const SKY_BOTTOM_COLOR: Srgba = rgb_u8(0x0c, 0x3c, 0x64);
pub const GROUND_COLOR: Srgba = rgb_u8(0x18, 0x20, 0x28);
pub const STAR_COLOR: Srgba = rgb_u8(0xE3, 0xEA, 0xEF);
pub const AMBIENT_STAR_COLOR: Srgba = Srgba::WHITE;
pub const FRAGMENT_COLOR: Srgba = rgb_u8(227, 234, 239);
pub const GLOW_COLOR: Srgba = rgb_u8(0xE3, 0xEA, 0xEF);

/// Moon core colour; the radial gradient fades from this to fully transparent.
pub const MOON_COLOR: Srgba = Srgba::new(1.0, 1.0, 1.0, 0.8);
