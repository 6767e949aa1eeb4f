use crate::error::{GalaxyError, Result};
use crate::physics::RotationCurve;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Galaxy parameters. Defaults describe an NGC 3198-like spiral.
///
/// All distances share one arbitrary unit; velocities are normalized so the
/// rigid core reaches 1.0 at `core_radius`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalaxyConfig {
    pub galaxy_radius: f32,
    pub core_radius: f32,
    pub bulge_radius: f32,

    pub disk_star_count: usize,
    pub bulge_star_count: usize,

    pub arm_count: u32,
    /// Turns of the logarithmic-spiral term between the center and the rim.
    pub arm_winding_turns: f32,
    /// Full width of the random angular scatter around each arm, radians.
    pub arm_scatter: f32,
    /// Exponent `k` in `u^k` radial sampling of the disk; `k < 1` favours mid-disk.
    pub disk_radial_exponent: f32,
    pub disk_thickness: f32,
    pub disk_scale_height: f32,
    pub bulge_flattening: f32,

    /// Per-frame angular increment scale for bulge stars.
    pub bulge_angular_scale: f32,
    /// Per-frame angular increment scale for disk stars.
    pub disk_angular_scale: f32,

    pub observed_floor: f32,
    pub observed_decay_scale: f32,

    /// Radius floor used when turning linear into angular velocity.
    pub min_radius: f32,

    pub background_star_count: usize,
    pub background_extent: f32,

    pub chart_samples: usize,

    pub seed: Option<u64>,
}

impl Default for GalaxyConfig {
    fn default() -> Self {
        GalaxyConfig {
            galaxy_radius: 30.0,
            core_radius: 3.0,
            bulge_radius: 6.0,
            disk_star_count: 12_000,
            bulge_star_count: 8_000,
            arm_count: 2,
            arm_winding_turns: 1.25,
            arm_scatter: 0.6,
            disk_radial_exponent: 0.6,
            disk_thickness: 0.3,
            disk_scale_height: 15.0,
            bulge_flattening: 0.6,
            bulge_angular_scale: 0.025,
            disk_angular_scale: 0.02,
            observed_floor: 0.85,
            observed_decay_scale: 20.0,
            min_radius: 0.1,
            background_star_count: 3_000,
            background_extent: 400.0,
            chart_samples: 101,
            seed: None,
        }
    }
}

impl GalaxyConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: GalaxyConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `path` if given, otherwise starts from defaults; `seed` overrides the file.
    pub fn load(path: Option<&Path>, seed: Option<u64>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        if seed.is_some() {
            config.seed = seed;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn rotation_curve(&self) -> RotationCurve {
        RotationCurve {
            core_radius: self.core_radius,
            floor: self.observed_floor,
            decay_scale: self.observed_decay_scale,
        }
    }

    pub fn star_count(&self) -> usize {
        self.bulge_star_count + self.disk_star_count
    }

    /// Rejects configurations that would poison the per-frame loop.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("galaxy_radius", self.galaxy_radius),
            ("core_radius", self.core_radius),
            ("bulge_radius", self.bulge_radius),
            ("min_radius", self.min_radius),
            ("observed_decay_scale", self.observed_decay_scale),
            ("disk_scale_height", self.disk_scale_height),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(format!("{name} must be positive, got {value}")));
            }
        }

        let non_negative = [
            ("arm_scatter", self.arm_scatter),
            ("disk_thickness", self.disk_thickness),
            ("bulge_flattening", self.bulge_flattening),
            ("bulge_angular_scale", self.bulge_angular_scale),
            ("disk_angular_scale", self.disk_angular_scale),
            ("arm_winding_turns", self.arm_winding_turns),
            ("background_extent", self.background_extent),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!("{name} must be non-negative, got {value}")));
            }
        }

        if self.core_radius >= self.galaxy_radius {
            return Err(invalid(format!(
                "core_radius ({}) must be smaller than galaxy_radius ({})",
                self.core_radius, self.galaxy_radius
            )));
        }
        if self.bulge_radius >= self.galaxy_radius {
            return Err(invalid(format!(
                "bulge_radius ({}) must be smaller than galaxy_radius ({})",
                self.bulge_radius, self.galaxy_radius
            )));
        }
        if self.disk_star_count == 0 {
            return Err(invalid("disk_star_count must be at least 1".to_string()));
        }
        if self.arm_count == 0 {
            return Err(invalid("arm_count must be at least 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.observed_floor) {
            return Err(invalid(format!(
                "observed_floor must lie in [0, 1], got {}",
                self.observed_floor
            )));
        }
        if !(self.disk_radial_exponent > 0.0 && self.disk_radial_exponent <= 1.0) {
            return Err(invalid(format!(
                "disk_radial_exponent must lie in (0, 1], got {}",
                self.disk_radial_exponent
            )));
        }
        if self.chart_samples < 2 {
            return Err(invalid("chart_samples must be at least 2".to_string()));
        }
        Ok(())
    }
}

fn invalid(msg: String) -> GalaxyError {
    GalaxyError::InvalidConfig(msg)
}
