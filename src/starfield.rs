//! Procedural star populations.
//!
//! A galaxy is built from two populations sampled with different spatial
//! laws: a dense, flattened bulge of old stars and a thin disk of young
//! stars wound into spiral arms. Each star's angular velocity is computed for
//! both rotation curves at creation, so switching curves at runtime only
//! changes which precomputed value is read.

use crate::config::GalaxyConfig;
use crate::mode::RotationMode;
use crate::physics::{angular_velocity, RotationCurve};
use rand::Rng;
use serde::Serialize;
use std::f32::consts::{PI, TAU};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Population {
    Bulge,
    Disk,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Star {
    pub population: Population,
    /// In-plane distance from the galactic center.
    pub radius: f32,
    pub initial_angle: f32,
    pub height: f32,
    pub color: [f32; 3],
    pub size: f32,
    pub angular_velocity_observed: f32,
    pub angular_velocity_keplerian: f32,
    /// Accumulated orbital angle; the only field that changes after creation.
    pub current_angle: f32,
}

/// Shared inputs for turning a sampled radius into angular velocities.
#[derive(Debug, Clone, Copy)]
struct Kinematics {
    curve: RotationCurve,
    scale: f32,
    min_radius: f32,
}

impl Star {
    fn new(
        population: Population,
        radius: f32,
        angle: f32,
        height: f32,
        color: [f32; 3],
        size: f32,
        kin: &Kinematics,
    ) -> Self {
        let observed = angular_velocity(
            &kin.curve,
            RotationMode::Observed,
            radius,
            kin.scale,
            kin.min_radius,
        );
        let keplerian = angular_velocity(
            &kin.curve,
            RotationMode::Expected,
            radius,
            kin.scale,
            kin.min_radius,
        );
        Star {
            population,
            radius,
            initial_angle: angle,
            height,
            color,
            size,
            angular_velocity_observed: observed,
            angular_velocity_keplerian: keplerian,
            current_angle: angle,
        }
    }

    pub fn angular_velocity(&self, mode: RotationMode) -> f32 {
        match mode {
            RotationMode::Observed => self.angular_velocity_observed,
            RotationMode::Expected => self.angular_velocity_keplerian,
        }
    }

    /// Cartesian position; depends only on radius, height and the current angle.
    pub fn position(&self) -> [f32; 3] {
        let (sin, cos) = self.current_angle.sin_cos();
        [cos * self.radius, self.height, sin * self.radius]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PopulationStats {
    pub count: usize,
    pub mean_radius: f32,
    pub max_radius: f32,
}

#[derive(Debug, Clone, Default)]
pub struct StarField {
    /// Bulge stars first, then disk stars. Order is fixed for the session.
    pub stars: Vec<Star>,
}

impl StarField {
    pub fn generate<R: Rng>(config: &GalaxyConfig, rng: &mut R) -> Self {
        let curve = config.rotation_curve();
        let mut stars = Vec::with_capacity(config.star_count());

        let bulge = Kinematics {
            curve,
            scale: config.bulge_angular_scale,
            min_radius: config.min_radius,
        };
        for _ in 0..config.bulge_star_count {
            stars.push(sample_bulge_star(config, &bulge, rng));
        }

        let disk = Kinematics {
            curve,
            scale: config.disk_angular_scale,
            min_radius: config.min_radius,
        };
        for _ in 0..config.disk_star_count {
            stars.push(sample_disk_star(config, &disk, rng));
        }

        StarField { stars }
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    pub fn stats(&self, population: Population) -> PopulationStats {
        let mut count = 0;
        let mut sum = 0.0_f64;
        let mut max_radius = 0.0_f32;
        for star in self.stars.iter().filter(|s| s.population == population) {
            count += 1;
            sum += star.radius as f64;
            max_radius = max_radius.max(star.radius);
        }
        let mean_radius = if count > 0 { (sum / count as f64) as f32 } else { 0.0 };
        PopulationStats {
            count,
            mean_radius,
            max_radius,
        }
    }
}

/// Bulge star: flattened sphere with `r ~ u²` so density climbs towards the center.
fn sample_bulge_star<R: Rng>(config: &GalaxyConfig, kin: &Kinematics, rng: &mut R) -> Star {
    let r = rng.gen::<f32>().powi(2) * config.bulge_radius;
    let theta = rng.gen::<f32>() * TAU;
    let phi = (2.0 * rng.gen::<f32>() - 1.0).clamp(-1.0, 1.0).acos();

    let x = r * phi.sin() * theta.cos();
    let y = r * phi.cos() * config.bulge_flattening;
    let z = r * phi.sin() * theta.sin();

    // Old stars: red through yellow
    let age = rng.gen::<f32>();
    let color = [1.0, 0.8 - age * 0.3, 0.5 - age * 0.3];

    // Brighter towards the center
    let size = 0.1 + (1.0 - r / config.bulge_radius) * 0.15;

    // Kept unclamped; the radius floor only applies when dividing by it.
    let planar = (x * x + z * z).sqrt();
    let angle = z.atan2(x);

    Star::new(Population::Bulge, planar, angle, y, color, size, kin)
}

/// Disk star: placed on one of the spiral arms with angular scatter.
fn sample_disk_star<R: Rng>(config: &GalaxyConfig, kin: &Kinematics, rng: &mut R) -> Star {
    let arm = rng.gen_range(0..config.arm_count);
    let arm_angle = arm as f32 * TAU / config.arm_count as f32;

    let span = config.galaxy_radius - config.bulge_radius;
    let r = config.bulge_radius + rng.gen::<f32>().powf(config.disk_radial_exponent) * span;

    let spiral = arm_angle + (r / config.galaxy_radius) * 2.0 * PI * config.arm_winding_turns;
    let scatter = (rng.gen::<f32>() - 0.5) * config.arm_scatter;
    let angle = spiral + scatter;

    let height = (rng.gen::<f32>() - 0.5)
        * config.disk_thickness
        * (-r / config.disk_scale_height).exp();

    // Young stars: blue-white
    let t = rng.gen::<f32>();
    let color = [0.7 + t * 0.3, 0.8 + t * 0.2, 0.9 + t * 0.1];

    Star::new(Population::Disk, r, angle, height, color, 0.15, kin)
}

/// Static backdrop of distant stars, uniform in a cube centered on the galaxy.
pub fn background_stars<R: Rng>(config: &GalaxyConfig, rng: &mut R) -> Vec<[f32; 3]> {
    let extent = config.background_extent;
    (0..config.background_star_count)
        .map(|_| {
            [
                (rng.gen::<f32>() - 0.5) * extent,
                (rng.gen::<f32>() - 0.5) * extent,
                (rng.gen::<f32>() - 0.5) * extent,
            ]
        })
        .collect()
}
