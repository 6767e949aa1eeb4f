//! Simulation context: star field, rotation mode and render buffers.
//!
//! The host owns a [`Simulation`] and drives it with [`Simulation::advance_frame`]
//! once per display refresh. Flat position/color/size buffers are kept in
//! star order and never change length after construction, so they can be
//! uploaded straight into GPU vertex buffers.

use crate::chart::ChartInput;
use crate::config::GalaxyConfig;
use crate::error::Result;
use crate::mode::RotationMode;
use crate::starfield::{background_stars, Population, StarField};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

pub struct Simulation {
    config: GalaxyConfig,
    field: StarField,
    background: Vec<[f32; 3]>,
    mode: RotationMode,
    frame: u64,
    seed: u64,
    positions: Vec<f32>,
    colors: Vec<f32>,
    sizes: Vec<f32>,
}

impl Simulation {
    /// Builds a galaxy from `config`, seeded from `config.seed` or from entropy.
    pub fn new(config: GalaxyConfig) -> Result<Self> {
        let seed = config.seed.unwrap_or_else(rand::random);
        Self::with_seed(config, seed)
    }

    pub fn with_seed(config: GalaxyConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(seed);
        let field = StarField::generate(&config, &mut rng);
        let background = background_stars(&config, &mut rng);
        let sim = Self::assemble(config, field, background, seed);
        sim.log_summary();
        Ok(sim)
    }

    /// Wraps a caller-built star field. The buffers take the field's length.
    pub fn from_field(config: GalaxyConfig, field: StarField) -> Result<Self> {
        config.validate()?;
        let seed = config.seed.unwrap_or(0);
        Ok(Self::assemble(config, field, Vec::new(), seed))
    }

    fn assemble(
        config: GalaxyConfig,
        field: StarField,
        background: Vec<[f32; 3]>,
        seed: u64,
    ) -> Self {
        let n = field.len();
        let mut sim = Simulation {
            config,
            field,
            background,
            mode: RotationMode::default(),
            frame: 0,
            seed,
            positions: vec![0.0; n * 3],
            colors: vec![0.0; n * 3],
            sizes: vec![0.0; n],
        };
        sim.write_static_buffers();
        sim.write_positions();
        sim
    }

    fn write_static_buffers(&mut self) {
        for (i, star) in self.field.stars.iter().enumerate() {
            self.colors[i * 3..i * 3 + 3].copy_from_slice(&star.color);
            self.sizes[i] = star.size;
        }
    }

    fn write_positions(&mut self) {
        for (star, out) in self.field.stars.iter().zip(self.positions.chunks_exact_mut(3)) {
            out.copy_from_slice(&star.position());
        }
    }

    fn log_summary(&self) {
        let bulge = self.field.stats(Population::Bulge);
        let disk = self.field.stats(Population::Disk);
        info!(
            "Generated galaxy (seed {}): {} bulge stars (mean r {:.2}), {} disk stars (mean r {:.2}, max r {:.2})",
            self.seed, bulge.count, bulge.mean_radius, disk.count, disk.mean_radius, disk.max_radius
        );
    }

    /// Advances every star by one frame under the current rotation mode.
    pub fn advance_frame(&mut self) {
        // One mode snapshot for the whole frame.
        let mode = self.mode;
        for (star, out) in self
            .field
            .stars
            .iter_mut()
            .zip(self.positions.chunks_exact_mut(3))
        {
            star.current_angle += star.angular_velocity(mode);
            out.copy_from_slice(&star.position());
        }
        self.frame += 1;
    }

    /// Flips between the observed and the expected rotation curve.
    ///
    /// Positions are untouched; only the increment of the next frame changes.
    pub fn toggle_mode(&mut self) -> RotationMode {
        self.set_mode(self.mode.toggled());
        self.mode
    }

    pub fn set_mode(&mut self, mode: RotationMode) {
        if mode != self.mode {
            info!("Rotation mode: {} -> {}", self.mode.as_str(), mode.as_str());
        }
        self.mode = mode;
    }

    /// Rebuilds the star field from a new seed. Star counts, and therefore
    /// buffer lengths, stay the same; the rotation mode is kept.
    pub fn regenerate(&mut self, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        self.field = StarField::generate(&self.config, &mut rng);
        self.background = background_stars(&self.config, &mut rng);
        self.seed = seed;
        self.write_static_buffers();
        self.write_positions();
        self.log_summary();
    }

    pub fn mode(&self) -> RotationMode {
        self.mode
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &GalaxyConfig {
        &self.config
    }

    pub fn field(&self) -> &StarField {
        &self.field
    }

    pub fn star_count(&self) -> usize {
        self.field.len()
    }

    /// Interleaved `x, y, z` per star.
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Interleaved `r, g, b` per star.
    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.colors)
    }

    pub fn background(&self) -> &[[f32; 3]] {
        &self.background
    }

    pub fn chart_input(&self) -> ChartInput {
        ChartInput {
            curve: self.config.rotation_curve(),
            galaxy_radius: self.config.galaxy_radius,
            mode: self.mode,
            samples: self.config.chart_samples,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{keplerian_velocity, observed_velocity};
    use crate::starfield::Star;
    use approx::assert_relative_eq;

    fn small_config() -> GalaxyConfig {
        GalaxyConfig {
            disk_star_count: 500,
            bulge_star_count: 200,
            background_star_count: 10,
            ..Default::default()
        }
    }

    fn single_star_field(config: &GalaxyConfig, radius: f32, angle: f32) -> StarField {
        let curve = config.rotation_curve();
        let scale = config.disk_angular_scale;
        StarField {
            stars: vec![Star {
                population: Population::Disk,
                radius,
                initial_angle: angle,
                height: 0.05,
                color: [1.0, 1.0, 1.0],
                size: 0.15,
                angular_velocity_observed: observed_velocity(&curve, radius) / radius * scale,
                angular_velocity_keplerian: keplerian_velocity(&curve, radius) / radius * scale,
                current_angle: angle,
            }],
        }
    }

    #[test]
    fn test_buffer_lengths() {
        let sim = Simulation::with_seed(small_config(), 1).unwrap();
        assert_eq!(sim.star_count(), 700);
        assert_eq!(sim.positions().len(), 2_100);
        assert_eq!(sim.colors().len(), 2_100);
        assert_eq!(sim.sizes().len(), 700);
        assert_eq!(sim.position_bytes().len(), 2_100 * 4);
        assert_eq!(sim.background().len(), 10);
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let config = GalaxyConfig { disk_star_count: 0, ..small_config() };
        assert!(Simulation::with_seed(config, 1).is_err());
    }

    #[test]
    fn test_toggle_keeps_positions_and_changes_increment() {
        let config = small_config();
        let scale = config.disk_angular_scale;
        let curve = config.rotation_curve();
        let field = single_star_field(&config, 10.0, 0.5);
        let mut sim = Simulation::from_field(config, field).unwrap();

        sim.advance_frame();
        let after_observed = sim.field().stars[0].current_angle;
        assert_relative_eq!(
            after_observed,
            0.5 + observed_velocity(&curve, 10.0) / 10.0 * scale,
            epsilon = 1e-6
        );

        let before_toggle = sim.positions().to_vec();
        assert_eq!(sim.toggle_mode(), RotationMode::Expected);
        assert_eq!(sim.positions(), &before_toggle[..]);
        assert_eq!(sim.field().stars[0].current_angle, after_observed);

        sim.advance_frame();
        assert_relative_eq!(
            sim.field().stars[0].current_angle,
            after_observed + keplerian_velocity(&curve, 10.0) / 10.0 * scale,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_advance_preserves_radius_and_height() {
        let mut sim = Simulation::with_seed(small_config(), 2).unwrap();
        let before: Vec<(f32, f32)> = sim.field().stars.iter().map(|s| (s.radius, s.height)).collect();
        for _ in 0..50 {
            sim.advance_frame();
        }
        assert_eq!(sim.frame(), 50);
        for (star, out) in sim.field().stars.iter().zip(sim.positions().chunks_exact(3)) {
            let planar = (out[0] * out[0] + out[2] * out[2]).sqrt();
            assert_relative_eq!(planar, star.radius, epsilon = 1e-3);
            assert_eq!(out[1], star.height);
        }
        let after: Vec<(f32, f32)> = sim.field().stars.iter().map(|s| (s.radius, s.height)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_regenerate_keeps_lengths_and_mode() {
        let mut sim = Simulation::with_seed(small_config(), 3).unwrap();
        sim.toggle_mode();
        let old = sim.positions().to_vec();
        sim.regenerate(4);
        assert_eq!(sim.positions().len(), old.len());
        assert_ne!(sim.positions(), &old[..]);
        assert_eq!(sim.mode(), RotationMode::Expected);
        assert_eq!(sim.seed(), 4);
    }

    #[test]
    fn test_same_seed_same_positions() {
        let mut a = Simulation::with_seed(small_config(), 9).unwrap();
        let mut b = Simulation::with_seed(small_config(), 9).unwrap();
        for _ in 0..10 {
            a.advance_frame();
            b.advance_frame();
        }
        assert_eq!(a.positions(), b.positions());
        assert_eq!(a.colors(), b.colors());
    }

    #[test]
    fn test_chart_input_tracks_mode() {
        let mut sim = Simulation::with_seed(small_config(), 5).unwrap();
        assert_eq!(sim.chart_input().mode, RotationMode::Observed);
        sim.toggle_mode();
        assert_eq!(sim.chart_input().mode, RotationMode::Expected);
        assert_eq!(sim.chart_input().samples, 101);
    }
}
