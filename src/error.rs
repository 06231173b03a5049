//! Configuration and palette error types.
//!
//! The frame loop itself has no error paths; everything here is raised while
//! turning `assets/night_sky.toml` into a validated [`SkyConfig`].  Callers log
//! the error and fall back to compiled defaults.
//!
//! [`SkyConfig`]: crate::config::SkyConfig

use std::fmt;

/// Top-level error enum for the night-sky simulation.
#[derive(Debug, Clone, PartialEq)]
pub enum SkyError {
    /// The TOML document could not be deserialized.
    ConfigParse {
        /// Parser message, including line/column when available.
        message: String,
    },

    /// A colour string is not a valid `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa` hex code.
    InvalidColor {
        /// The rejected string.
        value: String,
    },

    /// A tunable is outside its safe operating range.
    UnsafeConstant {
        /// Name of the constant (for logging).
        name: &'static str,
        /// The value that was rejected.
        value: f64,
        /// Human-readable description of the safe range.
        safe_range: &'static str,
    },

    /// `spawn_interval_min..=spawn_interval_max` is empty or starts at zero.
    InvalidSpawnRange { min: u32, max: u32 },
}

impl fmt::Display for SkyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkyError::ConfigParse { message } => {
                write!(f, "failed to parse sky config: {}", message)
            }
            SkyError::InvalidColor { value } => write!(
                f,
                "'{}' is not a valid hex colour (expected #rgb, #rgba, #rrggbb or #rrggbbaa)",
                value
            ),
            SkyError::UnsafeConstant {
                name,
                value,
                safe_range,
            } => write!(
                f,
                "constant '{}' = {} is outside safe range {}",
                name, value, safe_range
            ),
            SkyError::InvalidSpawnRange { min, max } => write!(
                f,
                "spawn interval range [{}, {}] must satisfy 1 <= min <= max",
                min, max
            ),
        }
    }
}

impl std::error::Error for SkyError {}

impl From<toml::de::Error> for SkyError {
    fn from(err: toml::de::Error) -> Self {
        SkyError::ConfigParse {
            message: err.to_string(),
        }
    }
}

/// Convenience alias: a `Result` using `SkyError` as the error type.
pub type SkyResult<T> = Result<T, SkyError>;

// ── Validation helpers ────────────────────────────────────────────────────────

/// Returns an error unless `value` is a rebound factor in `(0, 1]`.
pub fn validate_friction(name: &'static str, value: f32) -> SkyResult<()> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(SkyError::UnsafeConstant {
            name,
            value: value as f64,
            safe_range: "(0.0, 1.0]",
        })
    }
}

/// Returns an error if `value` is not strictly positive (NaN included).
pub fn validate_positive(name: &'static str, value: f32) -> SkyResult<()> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(SkyError::UnsafeConstant {
            name,
            value: value as f64,
            safe_range: "(0.0, ∞)",
        })
    }
}

/// Returns an error unless `value` lies in the half-open unit interval `[0, 1)`.
pub fn validate_fraction(name: &'static str, value: f32) -> SkyResult<()> {
    if (0.0..1.0).contains(&value) {
        Ok(())
    } else {
        Err(SkyError::UnsafeConstant {
            name,
            value: value as f64,
            safe_range: "[0.0, 1.0)",
        })
    }
}

/// Returns an error unless `1 <= min <= max`.
pub fn validate_spawn_range(min: u32, max: u32) -> SkyResult<()> {
    if min >= 1 && min <= max {
        Ok(())
    } else {
        Err(SkyError::InvalidSpawnRange { min, max })
    }
}
