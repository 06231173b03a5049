//! Starfall: an animated night sky.
//!
//! Shooting stars fall from above the screen, bounce off the ground and the
//! window edges, and shatter into fading fragments on every bounce.  The
//! backdrop is a gradient sky with static stars, layered mountains, a ground
//! strip, and a moon.  Shapes are recorded through [`canvas::DrawSurface`]
//! and shown as `Mesh2d` entities by [`graphics::GraphicsPlugin`].

pub mod canvas;
pub mod config;
pub mod constants;
pub mod error;
pub mod graphics;
pub mod particle;
pub mod scenery;
pub mod simulation;
pub mod spawner;
pub mod world;
