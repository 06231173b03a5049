//! Shooting stars and their fragments.
//!
//! ## Design
//!
//! Both entity kinds share one physics shape, [`Motion`], and differ only in
//! their [`ParticleKind`] tag:
//!
//! | Kind       | Gravity | Side walls      | Shatters | Expires when  |
//! |------------|---------|-----------------|----------|---------------|
//! | `Bouncing` | strong  | bounce + shatter| yes      | `radius <= 0` |
//! | `Fragment` | weak    | pass through    | no       | `ttl == 0`    |
//!
//! [`Particle::integrate`] and [`Particle::render`] dispatch on the tag.
//! Shattering appends new fragments to a caller-supplied `Vec`, so the frame
//! loop decides where they live; this module owns no collections.

use crate::canvas::{DrawSurface, Glow, Paint};
use crate::config::SkyConfig;
use crate::world::SurfaceBounds;
use bevy::prelude::*;
use rand::Rng;

// ── Types ─────────────────────────────────────────────────────────────────────

/// Position, size, and per-frame integration parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    /// Centre in surface pixels (`y` grows downward).
    pub position: Vec2,
    /// Pixels per frame.
    pub velocity: Vec2,
    pub radius: f32,
    /// Fraction of speed kept after a bounce, in `(0, 1]`.
    pub friction: f32,
    /// Added to `velocity.y` every frame the particle is not bouncing off the floor.
    pub gravity: f32,
}

impl Motion {
    /// Reflect off the floor if this frame's step would cross it, otherwise
    /// accelerate downward.  Returns `true` on a bounce.
    fn bounce_floor(&mut self, floor: f32) -> bool {
        if self.position.y + self.radius + self.velocity.y > floor {
            self.velocity.y = -self.velocity.y * self.friction;
            true
        } else {
            self.velocity.y += self.gravity;
            false
        }
    }

    /// Reflect off the left or right edge.  Returns `true` on a bounce.
    fn bounce_walls(&mut self, width: f32) -> bool {
        let right = self.position.x + self.radius + self.velocity.x > width;
        let left = self.position.x - self.radius <= 0.0;
        if right || left {
            self.velocity.x = -self.velocity.x * self.friction;
            true
        } else {
            false
        }
    }

    fn advance(&mut self) {
        self.position += self.velocity;
    }
}

/// Capability tag distinguishing full shooting stars from their shards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParticleKind {
    /// Falls, bounces off floor and walls, shatters on every bounce.
    Bouncing,
    /// Short-lived shard: fades out and expires after `ttl` frames.
    Fragment { ttl: u32, opacity: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub motion: Motion,
    pub color: Srgba,
    pub kind: ParticleKind,
}

// ── Construction ──────────────────────────────────────────────────────────────

impl Particle {
    /// A bouncing particle with a random horizontal drift and a fixed initial
    /// fall speed.
    pub fn bouncing<R: Rng + ?Sized>(
        position: Vec2,
        radius: f32,
        color: Srgba,
        config: &SkyConfig,
        rng: &mut R,
    ) -> Self {
        let velocity = Vec2::new(
            (rng.gen::<f32>() - 0.5) * config.star_horizontal_spread,
            config.star_initial_fall_speed,
        );
        Self {
            motion: Motion {
                position,
                velocity,
                radius,
                friction: config.star_friction,
                gravity: config.star_gravity,
            },
            color,
            kind: ParticleKind::Bouncing,
        }
    }

    /// A fully opaque fragment flung in a random direction from `position`.
    pub fn fragment<R: Rng + ?Sized>(position: Vec2, config: &SkyConfig, rng: &mut R) -> Self {
        let velocity = Vec2::new(
            (rng.gen::<f32>() - 0.5) * config.fragment_horizontal_spread,
            (rng.gen::<f32>() - 0.5) * config.fragment_vertical_spread,
        );
        Self {
            motion: Motion {
                position,
                velocity,
                radius: config.fragment_radius,
                friction: config.fragment_friction,
                gravity: config.fragment_gravity,
            },
            color: config.fragment_color,
            kind: ParticleKind::Fragment {
                ttl: config.fragment_ttl,
                opacity: 1.0,
            },
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn can_fragment(&self) -> bool {
        matches!(self.kind, ParticleKind::Bouncing)
    }

    /// Whether the frame loop should drop this particle.
    ///
    /// Uses `radius <= 0` rather than equality: a decrement that overshoots
    /// zero must still remove the particle.
    pub fn is_expired(&self) -> bool {
        match self.kind {
            ParticleKind::Bouncing => self.motion.radius <= 0.0,
            ParticleKind::Fragment { ttl, .. } => ttl == 0,
        }
    }

    #[cfg(test)]
    pub fn ttl(&self) -> Option<u32> {
        match self.kind {
            ParticleKind::Fragment { ttl, .. } => Some(ttl),
            ParticleKind::Bouncing => None,
        }
    }

    /// Alpha this particle is drawn with before clamping.
    pub fn opacity(&self) -> f32 {
        match self.kind {
            ParticleKind::Fragment { opacity, .. } => opacity,
            ParticleKind::Bouncing => self.color.alpha,
        }
    }

    // ── Simulation ────────────────────────────────────────────────────────────

    /// Advance one frame.  Returns the number of shatters this step (0, 1 or 2).
    ///
    /// Bouncing particles check the floor, then the side walls, then move with
    /// the already-reflected velocity.  The two checks are independent: a
    /// corner hit shatters twice and emits two batches of fragments.
    pub fn integrate<R: Rng + ?Sized>(
        &mut self,
        bounds: SurfaceBounds,
        config: &SkyConfig,
        rng: &mut R,
        fragments: &mut Vec<Particle>,
    ) -> u32 {
        match self.kind {
            ParticleKind::Bouncing => {
                let mut shatters = 0;
                if self.motion.bounce_floor(bounds.floor()) {
                    self.shatter(config, rng, fragments);
                    shatters += 1;
                }
                // Uses the radius left by a floor shatter in this same step.
                if self.motion.bounce_walls(bounds.width) {
                    self.shatter(config, rng, fragments);
                    shatters += 1;
                }
                self.motion.advance();
                shatters
            }
            ParticleKind::Fragment {
                ref mut ttl,
                ref mut opacity,
            } => {
                self.motion.bounce_floor(bounds.floor());
                self.motion.advance();
                *ttl = ttl.saturating_sub(1);
                // Decay slows as ttl falls, so shards never fully disappear before expiring.
                *opacity -= config.fragment_fade_rate * *ttl as f32;
                0
            }
        }
    }

    /// Lose `shatter_radius_decrement` of radius and emit `fragment_count`
    /// fragments at the current position.  Returns the number of fragments
    /// appended; fragments themselves never shatter.
    pub fn shatter<R: Rng + ?Sized>(
        &mut self,
        config: &SkyConfig,
        rng: &mut R,
        fragments: &mut Vec<Particle>,
    ) -> usize {
        if !self.can_fragment() {
            return 0;
        }
        let origin = self.motion.position;
        self.motion.radius -= config.shatter_radius_decrement;
        fragments.extend(
            (0..config.fragment_count).map(|_| Particle::fragment(origin, config, &mut *rng)),
        );
        debug!(
            "Shattered at ({:.1}, {:.1}); radius now {:.1}",
            origin.x, origin.y, self.motion.radius
        );
        config.fragment_count
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    /// Draw as a glowing filled circle.  Fragments use their opacity as alpha.
    pub fn render<S: DrawSurface>(&self, surface: &mut S, glow: Glow) {
        let color = self.color.with_alpha(self.opacity().clamp(0.0, 1.0));
        surface.scoped(|s| {
            s.set_fill(Paint::Solid(color));
            s.set_glow(Some(glow));
            s.fill_circle(self.motion.position, self.motion.radius);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DrawList, Shape};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn star(position: Vec2, velocity: Vec2, radius: f32) -> Particle {
        Particle {
            motion: Motion {
                position,
                velocity,
                radius,
                friction: 0.8,
                gravity: 1.0,
            },
            color: Srgba::WHITE,
            kind: ParticleKind::Bouncing,
        }
    }

    // ── Bouncing particles ────────────────────────────────────────────────────

    #[test]
    fn floor_bounce_reflects_and_shatters_at_pre_move_position() {
        let config = SkyConfig::default();
        let bounds = SurfaceBounds::new(10_000.0, 580.0);
        let mut p = star(Vec2::new(100.0, 100.0), Vec2::new(2.0, 3.0), 9.0);
        let mut fragments = Vec::new();
        let mut rng = rng();

        for _ in 0..1000 {
            let before = p.motion;
            let will_hit = before.position.y + before.radius + before.velocity.y > 580.0;
            let shatters = p.integrate(bounds, &config, &mut rng, &mut fragments);

            if will_hit {
                assert_eq!(shatters, 1);
                assert_eq!(p.motion.velocity.y, -before.velocity.y * 0.8);
                assert_eq!(fragments.len(), 8);
                assert!(fragments
                    .iter()
                    .all(|f| f.motion.position == before.position));
                assert_eq!(p.motion.radius, 6.0);
                return;
            }
            assert_eq!(shatters, 0);
            assert_eq!(p.motion.velocity.y, before.velocity.y + 1.0);
        }
        panic!("particle never reached the floor");
    }

    #[test]
    fn radius_only_changes_through_shatter() {
        let config = SkyConfig::default();
        let bounds = SurfaceBounds::new(300.0, 300.0);
        let mut rng = rng();
        let mut p =
            Particle::bouncing(Vec2::new(150.0, 0.0), 9.0, Srgba::WHITE, &config, &mut rng);
        let mut fragments = Vec::new();

        for _ in 0..500 {
            let before = p.motion.radius;
            let shatters = p.integrate(bounds, &config, &mut rng, &mut fragments);
            let after = p.motion.radius;
            assert!(after <= before, "radius must be non-increasing");
            assert_eq!(before - after, shatters as f32 * config.shatter_radius_decrement);
            if p.is_expired() {
                return;
            }
        }
        panic!("a bouncing star should eventually shatter to nothing");
    }

    #[test]
    fn corner_hit_shatters_twice() {
        let config = SkyConfig::default();
        let bounds = SurfaceBounds::new(1000.0, 580.0);
        let mut p = star(Vec2::new(995.0, 575.0), Vec2::new(3.0, 3.0), 9.0);
        let mut fragments = Vec::new();

        let shatters = p.integrate(bounds, &config, &mut rng(), &mut fragments);

        assert_eq!(shatters, 2);
        assert_eq!(fragments.len(), 16);
        assert_eq!(p.motion.radius, 3.0);
        assert_eq!(p.motion.velocity, Vec2::new(-3.0 * 0.8, -3.0 * 0.8));
    }

    #[test]
    fn left_edge_contact_counts_as_a_wall_hit() {
        let config = SkyConfig::default();
        let bounds = SurfaceBounds::new(1000.0, 580.0);
        let mut p = star(Vec2::new(9.0, 100.0), Vec2::new(-2.0, 0.0), 9.0);
        let mut fragments = Vec::new();

        assert_eq!(p.integrate(bounds, &config, &mut rng(), &mut fragments), 1);
        assert_eq!(p.motion.velocity.x, 1.6);
    }

    #[test]
    fn every_shatter_emits_a_full_batch() {
        let config = SkyConfig::default();
        let mut p = star(Vec2::new(40.0, 50.0), Vec2::ZERO, 9.0);
        let mut fragments = Vec::new();
        let mut rng = rng();

        for batch in 1..=3 {
            assert_eq!(p.shatter(&config, &mut rng, &mut fragments), 8);
            assert_eq!(fragments.len(), batch * 8);
        }
        assert!(fragments.iter().all(|f| f.motion.position == Vec2::new(40.0, 50.0)));
        assert!(fragments.iter().all(|f| f.motion.radius == 2.0));
        assert!(p.is_expired());
    }

    #[test]
    fn overshooting_radius_still_expires() {
        let config = SkyConfig::default();
        let mut p = star(Vec2::new(40.0, 50.0), Vec2::ZERO, 4.0);
        let mut fragments = Vec::new();
        let mut rng = rng();

        p.shatter(&config, &mut rng, &mut fragments);
        assert!(!p.is_expired());
        p.shatter(&config, &mut rng, &mut fragments);
        assert_eq!(p.motion.radius, -2.0);
        assert!(p.is_expired(), "negative radius must be treated as dead");
    }

    // ── Fragments ─────────────────────────────────────────────────────────────

    #[test]
    fn fragment_ttl_counts_down_to_expiry() {
        let config = SkyConfig::default();
        let bounds = SurfaceBounds::new(800.0, 600.0);
        let mut rng = rng();
        let mut f = Particle::fragment(Vec2::new(400.0, 300.0), &config, &mut rng);
        let mut sink = Vec::new();

        for expected in (1..config.fragment_ttl).rev() {
            f.integrate(bounds, &config, &mut rng, &mut sink);
            assert_eq!(f.ttl(), Some(expected));
            assert!(!f.is_expired());
        }
        f.integrate(bounds, &config, &mut rng, &mut sink);
        assert_eq!(f.ttl(), Some(0));
        assert!(f.is_expired());

        f.integrate(bounds, &config, &mut rng, &mut sink);
        assert_eq!(f.ttl(), Some(0), "ttl never underflows");
        assert!(sink.is_empty(), "fragments never spawn fragments");
    }

    #[test]
    fn fragment_fade_slows_as_ttl_falls() {
        let config = SkyConfig::default();
        let bounds = SurfaceBounds::new(800.0, 600.0);
        let mut rng = rng();
        let mut f = Particle::fragment(Vec2::new(400.0, 300.0), &config, &mut rng);
        let mut sink = Vec::new();

        f.integrate(bounds, &config, &mut rng, &mut sink);
        let first_drop = 1.0 - f.opacity();
        assert!((first_drop - 0.0001 * 99.0).abs() < 1e-6);

        for _ in 1..config.fragment_ttl {
            f.integrate(bounds, &config, &mut rng, &mut sink);
        }
        assert!((f.opacity() - (1.0 - 0.495)).abs() < 1e-4);
    }

    #[test]
    fn fragment_passes_through_side_edges() {
        let config = SkyConfig::default();
        let bounds = SurfaceBounds::new(100.0, 600.0);
        let mut rng = rng();
        let mut f = Particle::fragment(Vec2::new(-20.0, 100.0), &config, &mut rng);
        f.motion.velocity = Vec2::new(-4.0, 0.0);
        let mut sink = Vec::new();

        f.integrate(bounds, &config, &mut rng, &mut sink);
        assert_eq!(f.motion.velocity.x, -4.0);
        assert_eq!(f.motion.position.x, -24.0);
        assert_eq!(f.motion.radius, 2.0);
    }

    #[test]
    fn fragment_bounces_off_floor_with_weak_gravity() {
        let config = SkyConfig::default();
        let bounds = SurfaceBounds::new(800.0, 600.0);
        let mut rng = rng();
        let mut f = Particle::fragment(Vec2::new(100.0, 590.0), &config, &mut rng);
        f.motion.velocity = Vec2::new(0.0, 10.0);
        let mut sink = Vec::new();

        f.integrate(bounds, &config, &mut rng, &mut sink);
        assert!((f.motion.velocity.y - (-8.0)).abs() < 1e-5);

        f.motion.position.y = 100.0;
        f.integrate(bounds, &config, &mut rng, &mut sink);
        assert!((f.motion.velocity.y - (-8.0 + 0.1)).abs() < 1e-5);
    }

    #[test]
    fn fragments_cannot_shatter() {
        let config = SkyConfig::default();
        let mut rng = rng();
        let mut f = Particle::fragment(Vec2::ZERO, &config, &mut rng);
        let mut sink = Vec::new();

        assert!(!f.can_fragment());
        assert_eq!(f.shatter(&config, &mut rng, &mut sink), 0);
        assert_eq!(f.motion.radius, 2.0);
        assert!(sink.is_empty());
    }

    #[test]
    fn new_fragments_spread_within_configured_ranges() {
        let config = SkyConfig::default();
        let mut rng = rng();
        for _ in 0..200 {
            let f = Particle::fragment(Vec2::ZERO, &config, &mut rng);
            assert!(f.motion.velocity.x.abs() <= 5.0);
            assert!(f.motion.velocity.y.abs() <= 15.0);
            assert_eq!(f.opacity(), 1.0);
        }
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    #[test]
    fn render_draws_glowing_circle_and_restores_state() {
        let config = SkyConfig::default();
        let mut list = DrawList::new();
        let p = star(Vec2::new(20.0, 20.0), Vec2::ZERO, 5.0);

        p.render(&mut list, config.glow());

        let command = &list.commands()[0];
        assert_eq!(
            command.shape,
            Shape::Circle {
                center: Vec2::new(20.0, 20.0),
                radius: 5.0
            }
        );
        assert_eq!(command.fill, Paint::Solid(Srgba::WHITE));
        assert_eq!(command.glow, Some(config.glow()));
        assert_eq!(list.state().glow, None);
    }

    #[test]
    fn faded_fragment_renders_translucent() {
        let config = SkyConfig::default();
        let mut list = DrawList::new();
        let mut f = Particle::fragment(Vec2::new(10.0, 10.0), &config, &mut rng());
        f.kind = ParticleKind::Fragment {
            ttl: 10,
            opacity: 0.5,
        };

        f.render(&mut list, config.glow());

        assert_eq!(
            list.commands()[0].fill,
            Paint::Solid(config.fragment_color.with_alpha(0.5))
        );
    }

    #[test]
    fn opacity_is_clamped_only_when_drawn() {
        let config = SkyConfig::default();
        let mut list = DrawList::new();
        let mut f = Particle::fragment(Vec2::ZERO, &config, &mut rng());
        f.kind = ParticleKind::Fragment {
            ttl: 10,
            opacity: -0.25,
        };

        f.render(&mut list, config.glow());

        assert_eq!(f.opacity(), -0.25);
        assert_eq!(
            list.commands()[0].fill,
            Paint::Solid(config.fragment_color.with_alpha(0.0))
        );
    }
}
