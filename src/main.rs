use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::window::WindowResolution;

use starfall::config;
use starfall::constants::{INITIAL_SURFACE_HEIGHT, INITIAL_SURFACE_WIDTH};
use starfall::graphics::GraphicsPlugin;
use starfall::simulation::SimulationPlugin;

fn main() {
    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Starfall".into(),
                        resolution: WindowResolution::new(
                            INITIAL_SURFACE_WIDTH as u32,
                            INITIAL_SURFACE_HEIGHT as u32,
                        ),
                        ..Default::default()
                    }),
                    ..Default::default()
                })
                .set(LogPlugin {
                    filter: "info,wgpu=error,naga=warn".into(),
                    ..Default::default()
                }),
        )
        .add_plugins((SimulationPlugin, GraphicsPlugin))
        // Load config first so the sky is built with the final values.
        .add_systems(Startup, config::load_sky_config)
        .run();
}
