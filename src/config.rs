//! Runtime sky configuration loaded from `assets/night_sky.toml`.
//!
//! [`SkyConfig`] is a Bevy [`Resource`] that mirrors every constant in
//! [`crate::constants`].  At startup, [`load_sky_config`] reads
//! `assets/night_sky.toml` and overwrites the defaults with any values present in
//! the file.  Missing keys fall back to the compile-time defaults, so a minimal
//! TOML can override just the constants you care about.
//!
//! Colours are written as hex strings (`"#E3EAEF"`, `"#FFFFFFCC"`) and parsed
//! while deserializing, so a bad colour is reported as a parse error with the
//! offending key.
//!
//! ## Tuning workflow
//!
//! 1. Edit `assets/night_sky.toml`.
//! 2. Restart; no recompilation required.
//!
//! Keep `src/constants.rs` in sync: it remains the **authoritative default**
//! source used by `SkyConfig::default()`.

use crate::canvas::Glow;
use crate::constants::*;
use crate::error::{
    validate_fraction, validate_friction, validate_positive, validate_spawn_range, SkyError,
    SkyResult,
};
use crate::scenery::MountainLayer;
use bevy::prelude::*;
use serde::{Deserialize, Deserializer};

/// Location of the optional override file, relative to the working directory.
pub const SKY_CONFIG_PATH: &str = "assets/night_sky.toml";

/// Runtime-tunable simulation and scenery configuration.
///
/// All fields default to the corresponding compile-time constant from
/// `src/constants.rs`.
#[derive(Resource, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SkyConfig {
    // ── Surface ───────────────────────────────────────────────────────────────
    pub initial_width: f32,
    pub initial_height: f32,

    // ── Shooting stars ────────────────────────────────────────────────────────
    pub star_gravity: f32,
    pub star_friction: f32,
    pub star_horizontal_spread: f32,
    pub star_initial_fall_speed: f32,
    pub spawn_radius: f32,
    pub spawn_y: f32,
    pub shatter_radius_decrement: f32,

    // ── Fragments ─────────────────────────────────────────────────────────────
    pub fragment_count: usize,
    pub fragment_radius: f32,
    pub fragment_gravity: f32,
    pub fragment_friction: f32,
    pub fragment_ttl: u32,
    pub fragment_fade_rate: f32,
    pub fragment_horizontal_spread: f32,
    pub fragment_vertical_spread: f32,

    // ── Ambient stars ─────────────────────────────────────────────────────────
    pub ambient_star_count: usize,
    pub ambient_max_radius: f32,

    // ── Spawner ───────────────────────────────────────────────────────────────
    pub initial_spawn_interval: u32,
    pub spawn_interval_min: u32,
    pub spawn_interval_max: u32,
    pub frame_counter_wrap: u64,

    // ── Scenery ───────────────────────────────────────────────────────────────
    pub ground_height_fraction: f32,
    pub mountain_layers: Vec<MountainLayer>,
    pub mountain_base_overhang: f32,
    pub moon_radius: f32,
    pub moon_x_fraction: f32,
    pub moon_y_fraction: f32,
    pub glow_blur: f32,

    // ── Palette ───────────────────────────────────────────────────────────────
    #[serde(deserialize_with = "hex_color")]
    pub sky_top_color: Srgba,
    #[serde(deserialize_with = "hex_color")]
    pub sky_bottom_color: Srgba,
    #[serde(deserialize_with = "hex_color")]
    pub ground_color: Srgba,
    #[serde(deserialize_with = "hex_color")]
    pub star_color: Srgba,
    #[serde(deserialize_with = "hex_color")]
    pub ambient_star_color: Srgba,
    #[serde(deserialize_with = "hex_color")]
    pub fragment_color: Srgba,
    #[serde(deserialize_with = "hex_color")]
    pub glow_color: Srgba,
    #[serde(deserialize_with = "hex_color")]
    pub moon_color: Srgba,
}

impl Default for SkyConfig {
    fn default() -> Self {
        Self {
            // Surface
            initial_width: INITIAL_SURFACE_WIDTH,
            initial_height: INITIAL_SURFACE_HEIGHT,
            // Shooting stars
            star_gravity: STAR_GRAVITY,
            star_friction: STAR_FRICTION,
            star_horizontal_spread: STAR_HORIZONTAL_SPREAD,
            star_initial_fall_speed: STAR_INITIAL_FALL_SPEED,
            spawn_radius: SPAWN_RADIUS,
            spawn_y: SPAWN_Y,
            shatter_radius_decrement: SHATTER_RADIUS_DECREMENT,
            // Fragments
            fragment_count: FRAGMENT_COUNT,
            fragment_radius: FRAGMENT_RADIUS,
            fragment_gravity: FRAGMENT_GRAVITY,
            fragment_friction: FRAGMENT_FRICTION,
            fragment_ttl: FRAGMENT_TTL,
            fragment_fade_rate: FRAGMENT_FADE_RATE,
            fragment_horizontal_spread: FRAGMENT_HORIZONTAL_SPREAD,
            fragment_vertical_spread: FRAGMENT_VERTICAL_SPREAD,
            // Ambient stars
            ambient_star_count: AMBIENT_STAR_COUNT,
            ambient_max_radius: AMBIENT_MAX_RADIUS,
            // Spawner
            initial_spawn_interval: INITIAL_SPAWN_INTERVAL,
            spawn_interval_min: SPAWN_INTERVAL_MIN,
            spawn_interval_max: SPAWN_INTERVAL_MAX,
            frame_counter_wrap: FRAME_COUNTER_WRAP,
            // Scenery
            ground_height_fraction: GROUND_HEIGHT_FRACTION,
            mountain_layers: MOUNTAIN_LAYERS
                .iter()
                .map(|&(peaks, height_fraction, color)| MountainLayer {
                    peaks,
                    height_fraction,
                    color,
                })
                .collect(),
            mountain_base_overhang: MOUNTAIN_BASE_OVERHANG,
            moon_radius: MOON_RADIUS,
            moon_x_fraction: MOON_X_FRACTION,
            moon_y_fraction: MOON_Y_FRACTION,
            glow_blur: GLOW_BLUR,
            // Palette
            sky_top_color: SKY_TOP_COLOR,
            sky_bottom_color: SKY_BOTTOM_COLOR,
            ground_color: GROUND_COLOR,
            star_color: STAR_COLOR,
            ambient_star_color: AMBIENT_STAR_COLOR,
            fragment_color: FRAGMENT_COLOR,
            glow_color: GLOW_COLOR,
            moon_color: MOON_COLOR,
        }
    }
}

impl SkyConfig {
    /// Parse a TOML document and validate the result.
    pub fn from_toml_str(contents: &str) -> SkyResult<Self> {
        let config: SkyConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would stall or destabilise the simulation, e.g. a
    /// zero shatter decrement (stars never die) or an empty spawn range.
    pub fn validate(&self) -> SkyResult<()> {
        validate_positive("initial_width", self.initial_width)?;
        validate_positive("initial_height", self.initial_height)?;
        validate_friction("star_friction", self.star_friction)?;
        validate_friction("fragment_friction", self.fragment_friction)?;
        validate_positive("shatter_radius_decrement", self.shatter_radius_decrement)?;
        validate_positive("spawn_radius", self.spawn_radius)?;
        validate_positive("fragment_ttl", self.fragment_ttl as f32)?;
        validate_positive("frame_counter_wrap", self.frame_counter_wrap as f32)?;
        validate_fraction("ground_height_fraction", self.ground_height_fraction)?;
        validate_spawn_range(self.spawn_interval_min, self.spawn_interval_max)?;
        if self.initial_spawn_interval == 0 {
            return Err(SkyError::UnsafeConstant {
                name: "initial_spawn_interval",
                value: 0.0,
                safe_range: "[1, ∞)",
            });
        }
        if !(self.ambient_max_radius >= 0.0) {
            return Err(SkyError::UnsafeConstant {
                name: "ambient_max_radius",
                value: self.ambient_max_radius as f64,
                safe_range: "[0.0, ∞)",
            });
        }
        Ok(())
    }

    /// Halo drawn around every star and fragment.
    pub fn glow(&self) -> Glow {
        Glow {
            color: self.glow_color,
            blur: self.glow_blur,
        }
    }
}

/// Parse a `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa` colour string.
pub fn parse_hex_color(value: &str) -> SkyResult<Srgba> {
    Srgba::hex(value).map_err(|_| SkyError::InvalidColor {
        value: value.to_string(),
    })
}

/// Serde adapter for hex colour fields.
pub(crate) fn hex_color<'de, D>(deserializer: D) -> Result<Srgba, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    parse_hex_color(&value).map_err(serde::de::Error::custom)
}

/// Startup system: attempt to load `assets/night_sky.toml` and overwrite the
/// `SkyConfig` resource with the values present in the file.
///
/// Missing keys retain their compiled defaults.  Parse and validation errors
/// are logged but do not abort the app.  A missing file is not an error.
pub fn load_sky_config(mut config: ResMut<SkyConfig>) {
    let path = SKY_CONFIG_PATH;
    match std::fs::read_to_string(path) {
        Ok(contents) => match SkyConfig::from_toml_str(&contents) {
            Ok(loaded) => {
                *config = loaded;
                info!("Loaded sky config from {path}");
            }
            Err(e) => {
                warn!("Rejected {path}: {e}; using defaults");
            }
        },
        Err(_) => {
            info!("No {path} found; using compiled defaults");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SkyConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config = SkyConfig::from_toml_str("").expect("empty TOML is valid");
        let defaults = SkyConfig::default();
        assert_eq!(config.fragment_count, defaults.fragment_count);
        assert_eq!(config.star_color, defaults.star_color);
        assert_eq!(config.mountain_layers.len(), 3);
    }

    #[test]
    fn partial_document_overrides_only_named_keys() {
        let config = SkyConfig::from_toml_str(
            r##"
            star_gravity = 0.5
            glow_color = "#ff0000"
            "##,
        )
        .unwrap();
        assert_eq!(config.star_gravity, 0.5);
        assert_eq!(config.glow_color, Srgba::rgb(1.0, 0.0, 0.0));
        assert_eq!(config.star_friction, STAR_FRICTION);
    }

    #[test]
    fn mountain_layers_parse_from_array_of_tables() {
        let config = SkyConfig::from_toml_str(
            r##"
            [[mountain_layers]]
            peaks = 4
            height_fraction = 0.3
            color = "#101010"
            "##,
        )
        .unwrap();
        assert_eq!(config.mountain_layers.len(), 1);
        assert_eq!(config.mountain_layers[0].peaks, 4);
    }

    #[test]
    fn bad_colour_is_a_parse_error() {
        let err = SkyConfig::from_toml_str(r#"star_color = "not-a-colour""#).unwrap_err();
        match err {
            SkyError::ConfigParse { message } => assert!(message.contains("not-a-colour")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_spawn_range_is_rejected() {
        let err = SkyConfig::from_toml_str(
            r#"
            spawn_interval_min = 300
            spawn_interval_max = 200
            "#,
        )
        .unwrap_err();
        assert_eq!(err, SkyError::InvalidSpawnRange { min: 300, max: 200 });
    }

    #[test]
    fn zero_shatter_decrement_is_rejected() {
        let err = SkyConfig::from_toml_str("shatter_radius_decrement = 0.0").unwrap_err();
        assert!(matches!(
            err,
            SkyError::UnsafeConstant {
                name: "shatter_radius_decrement",
                ..
            }
        ));
    }

    #[test]
    fn zero_initial_spawn_interval_is_rejected() {
        assert!(SkyConfig::from_toml_str("initial_spawn_interval = 0").is_err());
    }

    #[test]
    fn parse_hex_color_accepts_alpha_form() {
        let moon = parse_hex_color("#FFFFFFCC").unwrap();
        assert!((moon.alpha - 0.8).abs() < 0.01);
        assert!(parse_hex_color("#12").is_err());
    }

    #[test]
    fn shipped_asset_matches_compiled_defaults() {
        let shipped = SkyConfig::from_toml_str(include_str!("../assets/night_sky.toml"))
            .expect("assets/night_sky.toml must parse");
        let defaults = SkyConfig::default();
        let shape = |c: &SkyConfig| {
            c.mountain_layers
                .iter()
                .map(|l| (l.peaks, l.height_fraction))
                .collect::<Vec<_>>()
        };
        assert_eq!(shape(&shipped), shape(&defaults));
        assert_eq!(shipped.fragment_count, defaults.fragment_count);
        assert_eq!(shipped.spawn_interval_max, defaults.spawn_interval_max);
        assert_eq!(shipped.glow_blur, defaults.glow_blur);
    }
}
