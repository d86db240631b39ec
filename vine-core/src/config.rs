//! Growth, mesh and scatter parameters (optionally loaded from TOML).

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Most surface-following probes one growth step may cast; bounds
/// `ray_cast_step` from below relative to `probe_distance`.
pub const MAX_SURFACE_SCANS: f32 = 1000.0;

/// Everything a [`crate::planter::Planter`] needs to grow and dress vines.
///
/// Missing TOML keys fall back to [`Config::default`]. A config must pass
/// [`Config::validate`] before it is used to grow anything; the constructors
/// of [`crate::tree::Tree`] and [`crate::planter::Planter`] enforce that.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Height of the ribbon and lift of every anchor off the surface.
    pub branch_thickness: f32,
    /// Half-width of the ribbon on each side of the curve.
    pub branch_width: f32,
    /// Curve-time spacing between scattered leaves, in `(0, 1)`.
    pub leaf_step: f32,
    /// Number of independent branches per tree.
    pub branch_count: usize,
    /// Upper bound on anchors per branch (root anchor included).
    pub max_anchor_count: usize,
    /// Direction samples drawn per growth step before giving up on
    /// finding a forward-facing one.
    pub max_direction_tries: usize,
    /// Spacing between surface-following probes.
    pub ray_cast_step: f32,
    /// Reach of every probe ray, and of the surface-following scan.
    pub probe_distance: f32,
    /// Minimum cosine between a proposed direction and the current heading.
    pub min_forward_dot: f32,
    /// Height of scattered leaves above the ribbon.
    pub leaf_lift: f32,
    /// Number of interchangeable leaf models a placement may pick from.
    pub leaf_variants: usize,
    /// Curve samples emitted between two consecutive anchors.
    pub curve_samples_per_segment: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            branch_thickness: 0.1,
            branch_width: 0.5,
            leaf_step: 0.06,
            branch_count: 5,
            max_anchor_count: 20,
            max_direction_tries: 40,
            ray_cast_step: 0.2,
            probe_distance: 2.0,
            min_forward_dot: 0.5,
            leaf_lift: 0.2,
            leaf_variants: 1,
            curve_samples_per_segment: 10,
        }
    }
}

/// Reasons a [`Config`] is rejected.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("branch_thickness must be positive (got {0})")]
    NonPositiveThickness(f32),
    #[error("branch_width must be positive (got {0})")]
    NonPositiveWidth(f32),
    #[error("leaf_step must lie strictly between 0 and 1 (got {0})")]
    LeafStepOutOfRange(f32),
    #[error("{field} must be at least 1")]
    ZeroCount { field: &'static str },
    #[error("ray_cast_step must be positive (got {0})")]
    NonPositiveRayStep(f32),
    #[error("ray_cast_step must be at least {min} for this probe_distance (got {step})")]
    RayStepTooSmall { step: f32, min: f32 },
    #[error("probe_distance must be positive (got {0})")]
    NonPositiveProbeDistance(f32),
    #[error("min_forward_dot must lie in [-1, 1] (got {0})")]
    ForwardDotOutOfRange(f32),
    #[error("leaf_lift must be finite (got {0})")]
    NonFiniteLeafLift(f32),
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl Config {
    /// Checks every constraint, reporting the first violation.
    ///
    /// Comparisons are written so that NaN fails them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.branch_thickness > 0.0) {
            return Err(ConfigError::NonPositiveThickness(self.branch_thickness));
        }
        if !(self.branch_width > 0.0) {
            return Err(ConfigError::NonPositiveWidth(self.branch_width));
        }
        if !(self.leaf_step > 0.0 && self.leaf_step < 1.0) {
            return Err(ConfigError::LeafStepOutOfRange(self.leaf_step));
        }

        let counts = [
            ("branch_count", self.branch_count),
            ("max_anchor_count", self.max_anchor_count),
            ("max_direction_tries", self.max_direction_tries),
            ("leaf_variants", self.leaf_variants),
            ("curve_samples_per_segment", self.curve_samples_per_segment),
        ];
        if let Some((field, _)) = counts.into_iter().find(|&(_, n)| n == 0) {
            return Err(ConfigError::ZeroCount { field });
        }

        if !(self.ray_cast_step > 0.0) {
            return Err(ConfigError::NonPositiveRayStep(self.ray_cast_step));
        }
        if !(self.probe_distance > 0.0) {
            return Err(ConfigError::NonPositiveProbeDistance(self.probe_distance));
        }
        let min_step = self.probe_distance / MAX_SURFACE_SCANS;
        if self.ray_cast_step < min_step {
            return Err(ConfigError::RayStepTooSmall {
                step: self.ray_cast_step,
                min: min_step,
            });
        }
        if !(-1.0..=1.0).contains(&self.min_forward_dot) {
            return Err(ConfigError::ForwardDotOutOfRange(self.min_forward_dot));
        }
        if !self.leaf_lift.is_finite() {
            return Err(ConfigError::NonFiniteLeafLift(self.leaf_lift));
        }
        Ok(())
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: Config = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Serializes to pretty TOML.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
