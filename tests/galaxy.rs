use approx::assert_relative_eq;
use galaxy::chart::{draw_chart, paint_overlay, SvgCanvas};
use galaxy::physics::{keplerian_velocity, observed_velocity};
use galaxy::starfield::Population;
use galaxy::{GalaxyConfig, RotationMode, Simulation};

fn reference_config() -> GalaxyConfig {
    GalaxyConfig {
        core_radius: 3.0,
        galaxy_radius: 30.0,
        disk_star_count: 12_000,
        bulge_star_count: 2_000,
        background_star_count: 100,
        ..Default::default()
    }
}

#[test]
fn test_reference_galaxy_populations() {
    let sim = Simulation::with_seed(reference_config(), 42).unwrap();
    let field = sim.field();

    let disk = field.stats(Population::Disk);
    assert_eq!(disk.count, 12_000);
    assert!(disk.max_radius <= 30.0 + 1e-4);

    for star in field.stars.iter().filter(|s| s.population == Population::Disk) {
        assert!(star.radius >= 3.0 && star.radius <= 30.0 + 1e-4);
        assert!(star.angular_velocity_observed.is_finite());
        assert!(star.angular_velocity_keplerian.is_finite());
        // Across the disk the flat curve always outpaces the Keplerian one.
        assert!(star.angular_velocity_observed >= star.angular_velocity_keplerian);
    }
    assert!(field.stars.iter().all(|s| s.angular_velocity(RotationMode::Observed).is_finite()));
}

#[test]
fn test_same_seed_reproduces_galaxy() {
    let a = Simulation::with_seed(reference_config(), 7).unwrap();
    let b = Simulation::with_seed(reference_config(), 7).unwrap();
    assert_eq!(a.field().stats(Population::Disk), b.field().stats(Population::Disk));
    assert_eq!(a.field().stats(Population::Bulge), b.field().stats(Population::Bulge));
    assert_eq!(a.positions(), b.positions());
    assert_eq!(a.colors(), b.colors());
}

#[test]
fn test_toggle_mid_run_continues_from_current_angle() {
    let mut sim = Simulation::with_seed(reference_config(), 11).unwrap();
    for _ in 0..30 {
        sim.advance_frame();
    }
    let before: Vec<f32> = sim.field().stars.iter().map(|s| s.current_angle).collect();
    let positions_before = sim.positions().to_vec();

    assert_eq!(sim.toggle_mode(), RotationMode::Expected);
    // Switching curves alone never moves a star.
    assert_eq!(sim.positions(), positions_before.as_slice());

    sim.advance_frame();
    for (star, prev) in sim.field().stars.iter().zip(&before) {
        assert_relative_eq!(
            star.current_angle,
            prev + star.angular_velocity_keplerian,
            epsilon = 1e-4
        );
    }
    assert_eq!(sim.frame(), 31);
}

#[test]
fn test_outer_disk_lags_under_keplerian_curve() {
    let curve = reference_config().rotation_curve();
    let r = 25.0;
    assert!(observed_velocity(&curve, r) > 0.8);
    assert!(keplerian_velocity(&curve, r) < 0.4);
}

#[test]
fn test_chart_backends_are_idempotent() {
    let sim = Simulation::with_seed(reference_config(), 5).unwrap();
    let input = sim.chart_input();

    let ctx = egui::Context::default();
    let frame = |ctx: &egui::Context| {
        let raw = egui::RawInput {
            screen_rect: Some(egui::Rect::from_min_size(
                egui::Pos2::ZERO,
                egui::vec2(900.0, 600.0),
            )),
            ..Default::default()
        };
        ctx.run(raw, |ctx| {
            paint_overlay(ctx, &input, 16.0);
        })
        .shapes
        .len()
    };
    let first = frame(&ctx);
    assert!(first > 0);
    assert_eq!(frame(&ctx), first);

    let mut svg = SvgCanvas::new();
    draw_chart(&mut svg, 300.0, 180.0, &input);
    let doc = svg.finish();
    draw_chart(&mut svg, 300.0, 180.0, &input);
    assert_eq!(svg.finish(), doc);
    assert!(doc.contains("THE GAP"));
}
