//! Immediate-mode drawing interface and the draw list that records it.
//!
//! ## Design
//!
//! The frame loop never talks to Bevy directly.  It draws through the
//! [`DrawSurface`] trait, which mirrors a browser-style 2D context: a current
//! fill [`Paint`], an optional [`Glow`] (shadow blur), a target [`Layer`], and a
//! save/restore stack for all three.  [`DrawList`] implements the trait by
//! recording one [`DrawCommand`] per shape; [`crate::graphics`] turns those
//! commands into `Mesh2d` entities, and tests inspect them directly.
//!
//! Coordinates are surface pixels with the origin at the top-left and `y`
//! growing downward.

use bevy::prelude::{Srgba, Vec2};

// ── Paints ────────────────────────────────────────────────────────────────────

/// A colour stop at `offset ∈ [0, 1]` along a gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub offset: f32,
    pub color: Srgba,
}

impl ColorStop {
    pub fn new(offset: f32, color: Srgba) -> Self {
        Self { offset, color }
    }
}

/// Linear gradient between two points.  Pixels beyond either end take the
/// nearest end colour.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearGradient {
    pub start: Vec2,
    pub end: Vec2,
    pub stops: Vec<ColorStop>,
}

impl LinearGradient {
    /// Top-to-bottom gradient spanning `height` pixels.
    pub fn vertical(height: f32, top: Srgba, bottom: Srgba) -> Self {
        Self {
            start: Vec2::ZERO,
            end: Vec2::new(0.0, height),
            stops: vec![ColorStop::new(0.0, top), ColorStop::new(1.0, bottom)],
        }
    }

    fn offset_at(&self, p: Vec2) -> f32 {
        let axis = self.end - self.start;
        let len_sq = axis.length_squared();
        if len_sq <= f32::EPSILON {
            return 0.0;
        }
        (p - self.start).dot(axis) / len_sq
    }
}

/// Concentric radial gradient: offset 0 at `inner_radius`, 1 at `outer_radius`.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialGradient {
    pub center: Vec2,
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub stops: Vec<ColorStop>,
}

impl RadialGradient {
    fn offset_at(&self, p: Vec2) -> f32 {
        let span = self.outer_radius - self.inner_radius;
        if span <= f32::EPSILON {
            return 1.0;
        }
        (p.distance(self.center) - self.inner_radius) / span
    }
}

/// Fill source for rectangles, circles, and polygons.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Srgba),
    Linear(LinearGradient),
    Radial(RadialGradient),
}

impl Default for Paint {
    fn default() -> Self {
        Paint::Solid(Srgba::BLACK)
    }
}

impl Paint {
    /// Colour of this paint at surface point `p`.
    pub fn sample(&self, p: Vec2) -> Srgba {
        match self {
            Paint::Solid(color) => *color,
            Paint::Linear(gradient) => sample_stops(&gradient.stops, gradient.offset_at(p)),
            Paint::Radial(gradient) => sample_stops(&gradient.stops, gradient.offset_at(p)),
        }
    }
}

/// Interpolate between stops in premultiplied space so fades to a transparent
/// stop keep their hue instead of darkening toward black.
fn sample_stops(stops: &[ColorStop], t: f32) -> Srgba {
    let (Some(first), Some(last)) = (stops.first(), stops.last()) else {
        return Srgba::NONE;
    };
    let t = t.clamp(0.0, 1.0);
    if t <= first.offset {
        return first.color;
    }
    if t >= last.offset {
        return last.color;
    }

    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t >= a.offset && t <= b.offset {
            let span = b.offset - a.offset;
            let k = if span > f32::EPSILON {
                (t - a.offset) / span
            } else {
                1.0
            };
            return lerp_premultiplied(a.color, b.color, k);
        }
    }
    last.color
}

fn lerp_premultiplied(a: Srgba, b: Srgba, k: f32) -> Srgba {
    let alpha = a.alpha + (b.alpha - a.alpha) * k;
    if alpha <= f32::EPSILON {
        return Srgba::NONE;
    }
    let channel = |ca: f32, cb: f32| (ca * a.alpha + (cb * b.alpha - ca * a.alpha) * k) / alpha;
    Srgba::new(
        channel(a.red, b.red),
        channel(a.green, b.green),
        channel(a.blue, b.blue),
        alpha,
    )
}

/// Soft halo drawn beneath filled circles, like a 2D context's shadow with no offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glow {
    pub color: Srgba,
    /// Blur radius in pixels; the halo reaches roughly this far past the edge.
    pub blur: f32,
}

/// Depth band a shape is drawn into, back to front.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    #[default]
    Sky,
    AmbientStars,
    Mountains,
    Ground,
    ShootingStars,
    Fragments,
    Moon,
}

impl Layer {
    /// Base `z` for the layer.  Shapes within a layer are stacked above it in
    /// draw order, never reaching the next layer.
    pub fn z(self) -> f32 {
        self as u8 as f32
    }
}

/// The mutable drawing state captured by [`DrawSurface::save`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawState {
    pub fill: Paint,
    pub glow: Option<Glow>,
    pub layer: Layer,
}

// ── Surface trait ─────────────────────────────────────────────────────────────

/// Immediate-mode drawing context the render loop draws through.
///
/// Glow only applies to [`fill_circle`](DrawSurface::fill_circle); rectangles and
/// polygons are always drawn crisp.
pub trait DrawSurface {
    /// Push a copy of the current fill, glow, and layer.
    fn save(&mut self);
    /// Pop the state pushed by the matching [`save`](DrawSurface::save).  No-op on
    /// an empty stack.
    fn restore(&mut self);

    fn set_fill(&mut self, paint: Paint);
    fn set_glow(&mut self, glow: Option<Glow>);
    fn set_layer(&mut self, layer: Layer);

    fn fill_rect(&mut self, origin: Vec2, size: Vec2);
    /// Fill a circle.  Non-positive (or NaN) radii draw nothing.
    fn fill_circle(&mut self, center: Vec2, radius: f32);
    /// Fill a convex polygon.  Fewer than three points draw nothing.
    fn fill_polygon(&mut self, points: &[Vec2]);

    /// Run `draw` between a `save`/`restore` pair.
    fn scoped<F>(&mut self, draw: F)
    where
        Self: Sized,
        F: FnOnce(&mut Self),
    {
        self.save();
        draw(self);
        self.restore();
    }
}

// ── Draw list ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rect { origin: Vec2, size: Vec2 },
    Circle { center: Vec2, radius: f32 },
    Polygon(Vec<Vec2>),
}

/// One recorded shape with the state it was drawn under.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub shape: Shape,
    pub fill: Paint,
    /// Always `None` for rectangles and polygons.
    pub glow: Option<Glow>,
    pub layer: Layer,
}

/// Records shapes in draw order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
    state: DrawState,
    stack: Vec<DrawState>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Drop recorded commands.  Drawing state is kept.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    #[cfg(test)]
    pub fn state(&self) -> &DrawState {
        &self.state
    }

    fn record(&mut self, shape: Shape, glow: Option<Glow>) {
        self.commands.push(DrawCommand {
            shape,
            fill: self.state.fill.clone(),
            glow,
            layer: self.state.layer,
        });
    }
}

impl DrawSurface for DrawList {
    fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn set_fill(&mut self, paint: Paint) {
        self.state.fill = paint;
    }

    fn set_glow(&mut self, glow: Option<Glow>) {
        self.state.glow = glow;
    }

    fn set_layer(&mut self, layer: Layer) {
        self.state.layer = layer;
    }

    fn fill_rect(&mut self, origin: Vec2, size: Vec2) {
        self.record(Shape::Rect { origin, size }, None);
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32) {
        if !(radius > 0.0) {
            return;
        }
        let glow = self.state.glow.filter(|g| g.blur > 0.0);
        self.record(Shape::Circle { center, radius }, glow);
    }

    fn fill_polygon(&mut self, points: &[Vec2]) {
        if points.len() < 3 {
            return;
        }
        self.record(Shape::Polygon(points.to_vec()), None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::color::Alpha;

    const RED: Srgba = Srgba::new(1.0, 0.0, 0.0, 1.0);
    const BLUE: Srgba = Srgba::new(0.0, 0.0, 1.0, 1.0);

    fn glow() -> Glow {
        Glow {
            color: BLUE,
            blur: 10.0,
        }
    }

    // ── Gradients ─────────────────────────────────────────────────────────────

    #[test]
    fn vertical_gradient_runs_top_to_bottom() {
        let gradient = LinearGradient::vertical(100.0, RED, BLUE);
        let paint = Paint::Linear(gradient);

        assert_eq!(paint.sample(Vec2::new(50.0, 0.0)), RED);
        assert_eq!(paint.sample(Vec2::new(50.0, 100.0)), BLUE);
        let mid = paint.sample(Vec2::new(0.0, 50.0));
        assert!((mid.red - 0.5).abs() < 1e-4);
        assert!((mid.blue - 0.5).abs() < 1e-4);
    }

    #[test]
    fn gradient_clamps_beyond_its_ends() {
        let paint = Paint::Linear(LinearGradient::vertical(10.0, RED, BLUE));
        assert_eq!(paint.sample(Vec2::new(0.0, -50.0)), RED);
        assert_eq!(paint.sample(Vec2::new(0.0, 500.0)), BLUE);
    }

    #[test]
    fn radial_fade_to_transparent_keeps_hue() {
        let paint = Paint::Radial(RadialGradient {
            center: Vec2::ZERO,
            inner_radius: 0.0,
            outer_radius: 10.0,
            stops: vec![
                ColorStop::new(0.0, Srgba::new(1.0, 1.0, 1.0, 0.8)),
                ColorStop::new(1.0, Srgba::NONE),
            ],
        });

        let halfway = paint.sample(Vec2::new(5.0, 0.0));
        assert!((halfway.alpha - 0.4).abs() < 1e-4);
        assert!((halfway.red - 1.0).abs() < 1e-4, "hue must not darken");
        assert_eq!(paint.sample(Vec2::new(20.0, 0.0)).alpha, 0.0);
    }

    #[test]
    fn empty_stop_list_samples_transparent() {
        assert_eq!(sample_stops(&[], 0.5), Srgba::NONE);
    }

    // ── Recording ─────────────────────────────────────────────────────────────

    #[test]
    fn commands_keep_draw_order_and_state() {
        let mut list = DrawList::new();
        list.set_layer(Layer::Mountains);
        list.set_fill(Paint::Solid(RED));
        list.fill_rect(Vec2::ZERO, Vec2::splat(40.0));
        list.set_fill(Paint::Solid(BLUE.with_alpha(0.5)));
        list.fill_polygon(&[Vec2::ZERO, Vec2::X, Vec2::Y]);

        let commands = list.commands();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].fill, Paint::Solid(RED));
        assert_eq!(
            commands[1].shape,
            Shape::Polygon(vec![Vec2::ZERO, Vec2::X, Vec2::Y])
        );
        assert_eq!(commands[1].fill, Paint::Solid(BLUE.with_alpha(0.5)));
        assert!(commands.iter().all(|c| c.layer == Layer::Mountains));
    }

    #[test]
    fn glow_is_recorded_for_circles_only() {
        let mut list = DrawList::new();
        list.set_glow(Some(glow()));
        list.fill_circle(Vec2::new(20.0, 20.0), 5.0);
        list.fill_rect(Vec2::ZERO, Vec2::ONE);

        assert_eq!(list.commands()[0].glow, Some(glow()));
        assert_eq!(list.commands()[1].glow, None);
    }

    #[test]
    fn zero_blur_glow_is_dropped() {
        let mut list = DrawList::new();
        list.set_glow(Some(Glow {
            color: RED,
            blur: 0.0,
        }));
        list.fill_circle(Vec2::ZERO, 3.0);
        assert_eq!(list.commands()[0].glow, None);
    }

    #[test]
    fn non_positive_radius_draws_nothing() {
        let mut list = DrawList::new();
        list.fill_circle(Vec2::new(20.0, 20.0), 0.0);
        list.fill_circle(Vec2::new(20.0, 20.0), -3.0);
        list.fill_circle(Vec2::new(20.0, 20.0), f32::NAN);
        assert!(list.commands().is_empty());
    }

    #[test]
    fn degenerate_polygon_is_ignored() {
        let mut list = DrawList::new();
        list.fill_polygon(&[Vec2::ZERO, Vec2::ONE]);
        assert!(list.commands().is_empty());
    }

    #[test]
    fn clear_keeps_state() {
        let mut list = DrawList::new();
        list.set_layer(Layer::Moon);
        list.fill_rect(Vec2::ZERO, Vec2::ONE);
        list.clear();
        assert!(list.commands().is_empty());
        assert_eq!(list.state().layer, Layer::Moon);
    }

    // ── State stack ───────────────────────────────────────────────────────────

    #[test]
    fn restore_brings_back_fill_glow_and_layer() {
        let mut list = DrawList::new();
        list.set_fill(Paint::Solid(RED));
        list.scoped(|l| {
            l.set_fill(Paint::Solid(BLUE));
            l.set_glow(Some(glow()));
            l.set_layer(Layer::Fragments);
        });
        assert_eq!(list.state().fill, Paint::Solid(RED));
        assert_eq!(list.state().glow, None);
        assert_eq!(list.state().layer, Layer::Sky);
    }

    #[test]
    fn restore_on_empty_stack_is_a_no_op() {
        let mut list = DrawList::new();
        list.set_fill(Paint::Solid(RED));
        list.restore();
        assert_eq!(list.state().fill, Paint::Solid(RED));
    }

    #[test]
    fn layers_stack_back_to_front() {
        let order = [
            Layer::Sky,
            Layer::AmbientStars,
            Layer::Mountains,
            Layer::Ground,
            Layer::ShootingStars,
            Layer::Fragments,
            Layer::Moon,
        ];
        assert!(order.windows(2).all(|w| w[0].z() < w[1].z()));
    }
}
