//! Galactic rotation curves.
//!
//! Both curves are dimensionless: velocity 1.0 is reached at the edge of the
//! rigid-body core. Inside the core they agree exactly; outside, the
//! Keplerian curve falls off as `1/sqrt(r)` while the observed curve
//! flattens towards `floor`.

use crate::mode::RotationMode;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationCurve {
    pub core_radius: f32,
    /// Asymptotic velocity of the observed curve.
    pub floor: f32,
    /// e-folding radius over which the observed curve settles onto `floor`.
    pub decay_scale: f32,
}

impl Default for RotationCurve {
    fn default() -> Self {
        RotationCurve {
            core_radius: 3.0,
            floor: 0.85,
            decay_scale: 20.0,
        }
    }
}

impl RotationCurve {
    pub fn velocity(&self, mode: RotationMode, r: f32) -> f32 {
        match mode {
            RotationMode::Observed => observed_velocity(self, r),
            RotationMode::Expected => keplerian_velocity(self, r),
        }
    }
}

/// Velocity predicted by Newtonian gravity if the visible core held all the mass.
pub fn keplerian_velocity(curve: &RotationCurve, r: f32) -> f32 {
    if r < curve.core_radius {
        return r / curve.core_radius;
    }
    (curve.core_radius / r).sqrt()
}

/// Flat rotation curve as measured from 21 cm observations.
pub fn observed_velocity(curve: &RotationCurve, r: f32) -> f32 {
    if r < curve.core_radius {
        return r / curve.core_radius;
    }
    curve.floor + (1.0 - curve.floor) * (-r / curve.decay_scale).exp()
}

/// Per-frame angular increment `v(r) / r * scale`.
///
/// `r` is clamped to `min_radius` first so stars at the very center still
/// get a finite increment.
pub fn angular_velocity(
    curve: &RotationCurve,
    mode: RotationMode,
    r: f32,
    scale: f32,
    min_radius: f32,
) -> f32 {
    let r = r.max(min_radius);
    curve.velocity(mode, r) / r * scale
}

/// Samples `(r, v)` pairs of one curve on `samples` evenly spaced radii in `[0, max_radius]`.
pub fn sample_curve(
    curve: &RotationCurve,
    mode: RotationMode,
    max_radius: f32,
    samples: usize,
) -> Vec<(f32, f32)> {
    let steps = samples.max(2) - 1;
    (0..=steps)
        .map(|i| {
            let r = i as f32 / steps as f32 * max_radius;
            (r, curve.velocity(mode, r))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn curve() -> RotationCurve {
        RotationCurve::default()
    }

    #[test]
    fn test_curves_agree_inside_core() {
        let c = curve();
        for i in 0..300 {
            let r = i as f32 * 0.01;
            assert!(r < c.core_radius);
            assert_eq!(keplerian_velocity(&c, r), r / c.core_radius);
            assert_eq!(observed_velocity(&c, r), r / c.core_radius);
        }
    }

    #[test]
    fn test_zero_radius_has_zero_velocity() {
        let c = curve();
        assert_eq!(keplerian_velocity(&c, 0.0), 0.0);
        assert_eq!(observed_velocity(&c, 0.0), 0.0);
    }

    #[test]
    fn test_curves_diverge_beyond_core() {
        let c = curve();
        // The observed curve starts just under the Keplerian one at the core
        // edge and overtakes it within a few percent of the core radius.
        let threshold = c.core_radius * 1.1;
        let mut previous_gap = 0.0_f32;
        let mut r = threshold;
        while r < 500.0 {
            let gap = observed_velocity(&c, r) - keplerian_velocity(&c, r);
            assert!(gap >= 0.0, "curves crossed back at r = {r}");
            assert!(gap >= previous_gap, "gap shrank at r = {r}");
            previous_gap = gap;
            r += 0.5;
        }
    }

    #[test]
    fn test_asymptotes() {
        let c = curve();
        for r in [3.0_f32, 10.0, 30.0, 100.0, 1.0e4] {
            assert!(observed_velocity(&c, r) <= 1.0);
            assert!(observed_velocity(&c, r) >= c.floor);
        }
        assert_relative_eq!(observed_velocity(&c, 1.0e6), c.floor, epsilon = 1e-6);
        assert!(keplerian_velocity(&c, 1.0e6) < 0.002);
    }

    #[test]
    fn test_angular_velocity_guard() {
        let c = curve();
        let w = angular_velocity(&c, RotationMode::Observed, 0.0, 0.02, 0.1);
        assert!(w.is_finite());
        assert_relative_eq!(w, (0.1 / 3.0) / 0.1 * 0.02, epsilon = 1e-7);

        let w = angular_velocity(&c, RotationMode::Expected, 10.0, 0.02, 0.1);
        assert_relative_eq!(w, (0.3_f32).sqrt() / 10.0 * 0.02, epsilon = 1e-7);
    }

    #[test]
    fn test_sample_curve_covers_range() {
        let c = curve();
        let samples = sample_curve(&c, RotationMode::Observed, 30.0, 101);
        assert_eq!(samples.len(), 101);
        assert_eq!(samples[0], (0.0, 0.0));
        assert_relative_eq!(samples[100].0, 30.0);
        assert_relative_eq!(samples[10].0, 3.0, epsilon = 1e-5);
    }
}
