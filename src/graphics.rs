//! Presentation: camera plus the `Mesh2d` entities that show the recorded sky.
//!
//! ## Design
//!
//! The frame loop records shapes into two [`DrawList`](crate::canvas::DrawList)s:
//! the static [`Backdrop`] and the per-frame [`FrameDraw`].  This module turns
//! both into meshes:
//!
//! | System                    | Schedule | Purpose                                         |
//! |---------------------------|----------|-------------------------------------------------|
//! | `setup_camera`            | Startup  | Spawn the 2D camera                             |
//! | `setup_backdrop_material` | Startup  | Create the shared white [`BackdropMaterial`]    |
//! | `rebuild_backdrop_system` | Update   | Respawn backdrop meshes after a rebuild         |
//! | `sync_particles_system`   | Update   | Move the pooled star/fragment entities          |
//!
//! Backdrop shapes carry their colours as vertex colours and share one white
//! [`ColorMaterial`], so they are built once per surface size.  Stars and
//! fragments reuse a pool of slot entities, each with its own material whose
//! alpha carries the fragment's opacity.  Meshes for the moving layers are
//! cached by radius, colour, and glow.
//!
//! Depth comes from [`Layer::z`], plus a small step per shape so later shapes
//! in a layer land on top.

use crate::canvas::{DrawCommand, Glow, Layer, Paint, Shape};
use crate::simulation::{self, Backdrop, FrameDraw};
use crate::world::{SurfaceBounds, WorldState};
use bevy::prelude::*;
use bevy::sprite_render::AlphaMode2d;
use bevy_asset::RenderAssetUsages;
use bevy_mesh::{Indices, PrimitiveTopology};
use std::collections::HashMap;

/// Rim vertices per circle ring.
const CIRCLE_SIDES: u32 = 32;
/// Rings in a glow halo, the last one fully transparent.
const GLOW_RINGS: u32 = 6;
/// The halo fades out this many blur radii past the circle's edge.
const GLOW_REACH: f32 = 1.5;
const DEPTH_STEP: f32 = 1e-4;
const MAX_LAYER_DEPTH: f32 = 0.99;

// ── Resources / components ────────────────────────────────────────────────────

/// Shared white, alpha-blended material for every backdrop mesh.
#[derive(Resource)]
pub struct BackdropMaterial(pub Handle<ColorMaterial>);

/// Star and fragment meshes already uploaded, keyed by their look.
#[derive(Resource, Default)]
pub struct ParticleMeshes(HashMap<MeshKey, Handle<Mesh>>);

/// Marker for entities spawned from the current [`Backdrop`].
#[derive(Component)]
pub struct BackdropShape;

/// One reusable entity for drawing a star or fragment.
#[derive(Component)]
pub struct ParticleSlot {
    material: Handle<ColorMaterial>,
}

// ── Plugin ────────────────────────────────────────────────────────────────────

pub struct GraphicsPlugin;

impl Plugin for GraphicsPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ClearColor(Color::BLACK))
            .init_resource::<ParticleMeshes>()
            .add_systems(Startup, (setup_camera, setup_backdrop_material))
            .add_systems(
                Update,
                (
                    rebuild_backdrop_system.after(simulation::resize_system),
                    sync_particles_system.after(simulation::frame_system),
                ),
            );
    }
}

// ── Startup systems ───────────────────────────────────────────────────────────

/// Setup camera for 2D rendering
pub fn setup_camera(mut commands: Commands) {
    // Default Camera2d maps one world unit to one logical pixel.
    commands.spawn(Camera2d);
    info!("Camera spawned");
}

pub fn setup_backdrop_material(
    mut commands: Commands,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    let handle = materials.add(blended(Color::WHITE));
    commands.insert_resource(BackdropMaterial(handle));
}

// ── Update systems ────────────────────────────────────────────────────────────

/// Replace the backdrop meshes whenever [`Backdrop`] has been rebuilt.
pub fn rebuild_backdrop_system(
    mut commands: Commands,
    backdrop: Res<Backdrop>,
    material: Res<BackdropMaterial>,
    mut meshes: ResMut<Assets<Mesh>>,
    shapes: Query<(Entity, &Mesh2d), With<BackdropShape>>,
) {
    if !backdrop.is_changed() {
        return;
    }

    for (entity, mesh) in shapes.iter() {
        meshes.remove(&mesh.0);
        commands.entity(entity).despawn();
    }

    let recorded = backdrop.commands.commands();
    for (index, command) in recorded.iter().enumerate() {
        let mesh = meshes.add(command_mesh(backdrop.bounds, command));
        commands.spawn((
            Mesh2d(mesh),
            MeshMaterial2d(material.0.clone()),
            Transform::from_xyz(0.0, 0.0, depth(command.layer, index)),
            BackdropShape,
        ));
    }
    debug!(
        "Backdrop generation {}: {} shapes",
        backdrop.generation,
        recorded.len()
    );
}

/// Point one pooled entity at each star and fragment drawn this frame.
///
/// New slots are spawned when the frame draws more than the pool holds;
/// unused slots are hidden.
pub fn sync_particles_system(
    mut commands: Commands,
    frame: Res<FrameDraw>,
    world: Res<WorldState>,
    mut cache: ResMut<ParticleMeshes>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    mut slots: Query<(&ParticleSlot, &mut Mesh2d, &mut Transform, &mut Visibility)>,
) {
    let mut pool = slots.iter_mut();
    let sprites = frame
        .0
        .commands()
        .iter()
        .enumerate()
        .filter_map(|(index, command)| ParticleSprite::new(world.bounds, index, command));

    for sprite in sprites {
        let mesh = cache
            .0
            .entry(sprite.key)
            .or_insert_with(|| meshes.add(sprite.mesh()))
            .clone();
        let color = Color::srgba(1.0, 1.0, 1.0, sprite.alpha);

        match pool.next() {
            Some((slot, mut mesh2d, mut transform, mut visibility)) => {
                if mesh2d.0 != mesh {
                    mesh2d.0 = mesh;
                }
                transform.translation = sprite.translation;
                visibility.set_if_neq(Visibility::Inherited);
                if let Some(material) = materials.get_mut(&slot.material) {
                    material.color = color;
                }
            }
            None => {
                let material = materials.add(blended(color));
                commands.spawn((
                    ParticleSlot {
                        material: material.clone(),
                    },
                    Mesh2d(mesh),
                    MeshMaterial2d(material),
                    Transform::from_translation(sprite.translation),
                    Visibility::Inherited,
                ));
            }
        }
    }

    for (_, _, _, mut visibility) in pool {
        visibility.set_if_neq(Visibility::Hidden);
    }
}

fn blended(color: Color) -> ColorMaterial {
    ColorMaterial {
        color,
        alpha_mode: AlphaMode2d::Blend,
        ..default()
    }
}

// ── Coordinates ───────────────────────────────────────────────────────────────

/// Surface pixel (origin top-left, `y` down) to world units (origin at the
/// centre, `y` up).
pub fn to_world(bounds: SurfaceBounds, p: Vec2) -> Vec2 {
    Vec2::new(p.x - bounds.width / 2.0, bounds.height / 2.0 - p.y)
}

/// `z` of the `index`-th recorded shape.
fn depth(layer: Layer, index: usize) -> f32 {
    layer.z() + (index as f32 * DEPTH_STEP).min(MAX_LAYER_DEPTH)
}

// ── Moving layers ─────────────────────────────────────────────────────────────

/// Radius, opaque fill, and glow as raw bits.
type MeshKey = [u32; 9];

/// A star or fragment ready to be shown by a [`ParticleSlot`].
#[derive(Debug, Clone, PartialEq)]
struct ParticleSprite {
    key: MeshKey,
    radius: f32,
    /// Fill with full alpha; the real alpha goes on the material.
    color: Srgba,
    glow: Option<Glow>,
    alpha: f32,
    translation: Vec3,
}

impl ParticleSprite {
    /// `None` for anything but a solid circle.
    fn new(bounds: SurfaceBounds, index: usize, command: &DrawCommand) -> Option<Self> {
        let Shape::Circle { center, radius } = command.shape else {
            return None;
        };
        let Paint::Solid(fill) = command.fill else {
            return None;
        };
        let color = fill.with_alpha(1.0);
        let glow = command.glow.map_or([0.0; 5], |g| {
            [g.color.red, g.color.green, g.color.blue, g.color.alpha, g.blur]
        });
        let key = [
            radius,
            color.red,
            color.green,
            color.blue,
            glow[0],
            glow[1],
            glow[2],
            glow[3],
            glow[4],
        ]
        .map(f32::to_bits);

        Some(Self {
            key,
            radius,
            color,
            glow: command.glow,
            alpha: fill.alpha,
            translation: to_world(bounds, center).extend(depth(command.layer, index)),
        })
    }

    fn mesh(&self) -> Mesh {
        let rings = circle_rings(Vec2::ZERO, self.radius, &Paint::Solid(self.color), self.glow);
        ring_mesh(Vec2::ZERO, &rings)
    }
}

// ── Mesh construction ─────────────────────────────────────────────────────────

/// Mesh for one backdrop shape, positioned in world units.
pub fn command_mesh(bounds: SurfaceBounds, command: &DrawCommand) -> Mesh {
    match &command.shape {
        Shape::Rect { origin, size } => rect_mesh(bounds, *origin, *size, &command.fill),
        Shape::Polygon(points) => polygon_mesh(bounds, points, &command.fill),
        Shape::Circle { center, radius } => {
            let rings = circle_rings(*center, *radius, &command.fill, command.glow);
            ring_mesh(to_world(bounds, *center), &rings)
        }
    }
}

/// Rectangle cut into horizontal bands at each gradient stop, so a vertical
/// gradient is reproduced exactly by vertex colours.
fn rect_mesh(bounds: SurfaceBounds, origin: Vec2, size: Vec2, paint: &Paint) -> Mesh {
    let top = origin.y.min(origin.y + size.y);
    let bottom = origin.y.max(origin.y + size.y);
    let mut rows = vec![top, bottom];
    if let Paint::Linear(gradient) = paint {
        rows.extend(
            gradient
                .stops
                .iter()
                .map(|stop| gradient.start.lerp(gradient.end, stop.offset).y)
                .filter(|y| *y > top && *y < bottom),
        );
    }
    rows.sort_by(f32::total_cmp);
    rows.dedup();

    let mut mesh = MeshBuilder::default();
    let mut previous: Option<(u32, u32)> = None;
    for y in rows {
        let left = Vec2::new(origin.x, y);
        let right = Vec2::new(origin.x + size.x, y);
        let l = mesh.vertex(to_world(bounds, left), paint.sample(left));
        let r = mesh.vertex(to_world(bounds, right), paint.sample(right));
        if let Some((prev_l, prev_r)) = previous {
            mesh.triangle(prev_l, prev_r, r);
            mesh.triangle(prev_l, r, l);
        }
        previous = Some((l, r));
    }
    mesh.build()
}

/// Triangle fan over a convex polygon.
fn polygon_mesh(bounds: SurfaceBounds, points: &[Vec2], paint: &Paint) -> Mesh {
    let mut mesh = MeshBuilder::default();
    let vertices: Vec<u32> = points
        .iter()
        .map(|p| mesh.vertex(to_world(bounds, *p), paint.sample(*p)))
        .collect();
    for pair in vertices.windows(2).skip(1) {
        mesh.triangle(vertices[0], pair[0], pair[1]);
    }
    mesh.build()
}

/// Concentric `(radius, colour)` rings from the centre outward.
///
/// The fill gets a ring at the centre, one at each radial stop, and one at
/// the edge.  A glow adds a halo from the edge outward whose alpha follows a
/// gaussian with `sigma = blur / 2`, weakened for circles smaller than sigma.
/// `center` is only used to sample the paint.
fn circle_rings(
    center: Vec2,
    radius: f32,
    paint: &Paint,
    glow: Option<Glow>,
) -> Vec<(f32, Srgba)> {
    let mut radii = vec![0.0, radius];
    if let Paint::Radial(gradient) = paint {
        let span = gradient.outer_radius - gradient.inner_radius;
        radii.extend(
            gradient
                .stops
                .iter()
                .map(|stop| gradient.inner_radius + span * stop.offset)
                .filter(|r| *r > 0.0 && *r < radius),
        );
    }
    radii.sort_by(f32::total_cmp);
    radii.dedup();

    let mut rings: Vec<(f32, Srgba)> = radii
        .into_iter()
        .map(|r| (r, paint.sample(center + Vec2::new(r, 0.0))))
        .collect();

    if let Some(glow) = glow.filter(|g| g.blur > 0.0) {
        let sigma = glow.blur / 2.0;
        let strength = 0.5 * (radius / sigma).min(1.0);
        for step in 0..=GLOW_RINGS {
            let d = glow.blur * GLOW_REACH * step as f32 / GLOW_RINGS as f32;
            let falloff = if step == GLOW_RINGS {
                0.0
            } else {
                (-0.5 * (d / sigma).powi(2)).exp()
            };
            let alpha = glow.color.alpha * strength * falloff;
            rings.push((radius + d, glow.color.with_alpha(alpha)));
        }
    }
    rings
}

/// Disc and annuli around `origin` from [`circle_rings`].
fn ring_mesh(origin: Vec2, rings: &[(f32, Srgba)]) -> Mesh {
    let mut mesh = MeshBuilder::default();
    let mut previous: Option<Vec<u32>> = None;

    for &(radius, color) in rings {
        let ring: Vec<u32> = if radius <= 0.0 {
            vec![mesh.vertex(origin, color)]
        } else {
            (0..CIRCLE_SIDES)
                .map(|i| {
                    let angle = std::f32::consts::TAU * i as f32 / CIRCLE_SIDES as f32;
                    mesh.vertex(origin + Vec2::from_angle(angle) * radius, color)
                })
                .collect()
        };

        if let Some(inner) = &previous {
            let n = ring.len();
            for i in 0..n {
                let j = (i + 1) % n;
                match inner.as_slice() {
                    [centre] => mesh.triangle(*centre, ring[i], ring[j]),
                    _ => {
                        mesh.triangle(inner[i], ring[i], ring[j]);
                        mesh.triangle(inner[i], ring[j], inner[j]);
                    }
                }
            }
        }
        previous = Some(ring);
    }
    mesh.build()
}

fn linear(color: Srgba) -> [f32; 4] {
    let c = LinearRgba::from(color);
    [c.red, c.green, c.blue, c.alpha]
}

/// Accumulates vertex-coloured triangles in world units.
#[derive(Default)]
struct MeshBuilder {
    positions: Vec<[f32; 3]>,
    colors: Vec<[f32; 4]>,
    indices: Vec<u32>,
}

impl MeshBuilder {
    fn vertex(&mut self, p: Vec2, color: Srgba) -> u32 {
        self.positions.push([p.x, p.y, 0.0]);
        self.colors.push(linear(color));
        (self.positions.len() - 1) as u32
    }

    /// Add a triangle wound counter-clockwise whatever order the corners
    /// come in.
    fn triangle(&mut self, a: u32, b: u32, c: u32) {
        let at = |i: u32| {
            let p = self.positions[i as usize];
            Vec2::new(p[0], p[1])
        };
        let cross = (at(b) - at(a)).perp_dot(at(c) - at(a));
        if cross < 0.0 {
            self.indices.extend_from_slice(&[a, c, b]);
        } else {
            self.indices.extend_from_slice(&[a, b, c]);
        }
    }

    fn build(self) -> Mesh {
        let (min, max) = self.positions.iter().fold(
            (Vec2::splat(f32::MAX), Vec2::splat(f32::MIN)),
            |(min, max), p| {
                let p = Vec2::new(p[0], p[1]);
                (min.min(p), max.max(p))
            },
        );
        let extent = (max - min).max(Vec2::splat(f32::EPSILON));
        let uvs: Vec<[f32; 2]> = self
            .positions
            .iter()
            .map(|p| {
                let uv = (Vec2::new(p[0], p[1]) - min) / extent;
                [uv.x, 1.0 - uv.y]
            })
            .collect();
        let normals = vec![[0.0, 0.0, 1.0]; self.positions.len()];

        let mut mesh = Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::RENDER_WORLD,
        );
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, self.positions);
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
        mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, self.colors);
        mesh.insert_indices(Indices::U32(self.indices));
        mesh
    }
}
