//! Static backdrop layers: sky, mountains, ground, moon.
//!
//! Everything here depends only on the surface size, so it is built once per
//! size in [`Scenery::new`] and drawn once per size into the backdrop.

use crate::canvas::{ColorStop, DrawSurface, Layer, LinearGradient, Paint, RadialGradient};
use crate::config::SkyConfig;
use crate::world::SurfaceBounds;
use bevy::prelude::*;
use serde::Deserialize;

/// One silhouette layer: `peaks` equal-width triangles rising
/// `height_fraction` of the surface height above its bottom edge.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MountainLayer {
    pub peaks: u32,
    pub height_fraction: f32,
    #[serde(deserialize_with = "crate::config::hex_color")]
    pub color: Srgba,
}

#[derive(Resource, Debug, Clone)]
pub struct Scenery {
    bounds: SurfaceBounds,
    sky: LinearGradient,
    moon: RadialGradient,
    moon_radius: f32,
    layers: Vec<MountainLayer>,
    base_overhang: f32,
    ground_height: f32,
    ground_color: Srgba,
}

impl Scenery {
    pub fn new(bounds: SurfaceBounds, config: &SkyConfig) -> Self {
        let moon_center = Vec2::new(
            bounds.width * config.moon_x_fraction,
            bounds.height * config.moon_y_fraction,
        );
        let moon = RadialGradient {
            center: moon_center,
            inner_radius: 0.0,
            outer_radius: config.moon_radius,
            stops: vec![
                ColorStop::new(0.0, config.moon_color),
                ColorStop::new(1.0, config.moon_color.with_alpha(0.0)),
            ],
        };

        Self {
            bounds,
            sky: LinearGradient::vertical(
                bounds.height,
                config.sky_top_color,
                config.sky_bottom_color,
            ),
            moon,
            moon_radius: config.moon_radius,
            layers: config.mountain_layers.clone(),
            base_overhang: config.mountain_base_overhang,
            ground_height: config.ground_height_fraction * bounds.height,
            ground_color: config.ground_color,
        }
    }

    /// Paint the sky gradient over the whole surface.
    pub fn draw_sky<S: DrawSurface>(&self, surface: &mut S) {
        surface.scoped(|s| {
            s.set_layer(Layer::Sky);
            s.set_fill(Paint::Linear(self.sky.clone()));
            s.set_glow(None);
            s.fill_rect(Vec2::ZERO, Vec2::new(self.bounds.width, self.bounds.height));
        });
    }

    /// Every mountain layer, back to front.
    pub fn draw_mountains<S: DrawSurface>(&self, surface: &mut S) {
        for layer in &self.layers {
            let height = layer.height_fraction * self.bounds.height;
            let peaks = mountain_peaks(self.bounds, layer.peaks, height, self.base_overhang);
            surface.scoped(|s| {
                s.set_layer(Layer::Mountains);
                s.set_fill(Paint::Solid(layer.color));
                s.set_glow(None);
                for triangle in &peaks {
                    s.fill_polygon(triangle);
                }
            });
        }
    }

    pub fn draw_ground<S: DrawSurface>(&self, surface: &mut S) {
        surface.scoped(|s| {
            s.set_layer(Layer::Ground);
            s.set_fill(Paint::Solid(self.ground_color));
            s.set_glow(None);
            s.fill_rect(
                Vec2::new(0.0, self.bounds.height - self.ground_height),
                Vec2::new(self.bounds.width, self.ground_height),
            );
        });
    }

    /// The moon's only halo is its own radial gradient.
    pub fn draw_moon<S: DrawSurface>(&self, surface: &mut S) {
        surface.scoped(|s| {
            s.set_layer(Layer::Moon);
            s.set_fill(Paint::Radial(self.moon.clone()));
            s.set_glow(None);
            s.fill_circle(self.moon.center, self.moon_radius);
        });
    }
}

/// Triangles for a range of `count` peaks across the surface width.
///
/// Peak `i` spans `[i·w − o, i·w + w + o]` at the base, where `w` is the
/// surface width over `count` and `o` is `overhang_fraction` of the surface
/// height, so neighbouring peaks overlap.  Its apex sits `height` above the
/// bottom edge at the peak's centre.
pub fn mountain_peaks(
    bounds: SurfaceBounds,
    count: u32,
    height: f32,
    overhang_fraction: f32,
) -> Vec<[Vec2; 3]> {
    if count == 0 {
        return Vec::new();
    }
    let w = bounds.width / count as f32;
    let base = bounds.height;
    let overhang = overhang_fraction * bounds.height;

    (0..count)
        .map(|i| {
            let left = i as f32 * w;
            [
                Vec2::new(left - overhang, base),
                Vec2::new(left + w / 2.0, base - height),
                Vec2::new(left + w + overhang, base),
            ]
        })
        .collect()
}
