//! Rotation-curve comparison chart.
//!
//! [`draw_chart`] plots the Keplerian and the observed curve on any
//! [`Canvas`], shades the gap between them beyond the core radius and
//! highlights the curve belonging to the active [`RotationMode`]. Drawing is
//! a pure function of its inputs: every call starts by resetting the canvas
//! to the requested size.

pub mod painter;
pub mod svg;

use crate::mode::RotationMode;
use crate::physics::{sample_curve, RotationCurve};

pub use painter::{paint_overlay, PainterCanvas};
pub use svg::SvgCanvas;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color { r, g, b, a }
    }

    pub fn alpha(&self) -> f32 {
        self.a as f32 / 255.0
    }

    pub fn to_css(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("rgba({},{},{},{:.3})", self.r, self.g, self.b, self.alpha())
        }
    }
}

/// 2D drawing surface in logical pixels, origin top-left, y down.
pub trait Canvas {
    /// Resets the surface to `width` x `height` and clears it.
    fn begin(&mut self, width: f32, height: f32);
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color);
    fn stroke_polyline(&mut self, points: &[(f32, f32)], color: Color, width: f32);
    /// Fills the region between two polylines sampled at the same x positions.
    fn fill_band(&mut self, upper: &[(f32, f32)], lower: &[(f32, f32)], color: Color);
    /// Draws `text` with its baseline at `y`.
    fn fill_text(&mut self, text: &str, x: f32, y: f32, size: f32, color: Color);
}

/// Everything the chart depends on besides the canvas size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartInput {
    pub curve: RotationCurve,
    pub galaxy_radius: f32,
    pub mode: RotationMode,
    pub samples: usize,
}

/// Colors follow the original galaxy view, where the idle Keplerian curve is
/// the darker green and the active one the lighter.
#[derive(Debug, Clone, Copy)]
pub struct ChartStyle {
    pub padding: f32,
    pub background: Color,
    pub axis: Color,
    pub axis_label: Color,
    pub keplerian_active: Color,
    pub keplerian_idle: Color,
    pub observed_active: Color,
    pub observed_idle: Color,
    pub gap_fill: Color,
    pub gap_title: Color,
    pub gap_note: Color,
    pub active_width: f32,
    pub idle_width: f32,
}

impl Default for ChartStyle {
    fn default() -> Self {
        ChartStyle {
            padding: 40.0,
            background: Color::rgba(0, 0, 0, 77),
            axis: Color::rgb(0x44, 0x44, 0x44),
            axis_label: Color::rgb(0x88, 0x88, 0x88),
            keplerian_active: Color::rgb(0x88, 0xff, 0x88),
            keplerian_idle: Color::rgb(0x44, 0xff, 0x44),
            observed_active: Color::rgb(0xff, 0x44, 0x44),
            observed_idle: Color::rgb(0xff, 0x88, 0x88),
            gap_fill: Color::rgba(255, 100, 100, 38),
            gap_title: Color::rgb(0xff, 0x66, 0x66),
            gap_note: Color::rgb(0xaa, 0x44, 0x44),
            active_width: 3.0,
            idle_width: 2.0,
        }
    }
}

impl ChartStyle {
    fn mode_label(&self, mode: RotationMode) -> Color {
        match mode {
            RotationMode::Observed => Color::rgb(0xff, 0x66, 0x66),
            RotationMode::Expected => Color::rgb(0x66, 0xff, 0x66),
        }
    }
}

/// Maps `(radius, velocity)` into canvas coordinates.
struct Plot {
    left: f32,
    bottom: f32,
    width: f32,
    height: f32,
    galaxy_radius: f32,
}

impl Plot {
    fn point(&self, r: f32, v: f32) -> (f32, f32) {
        (
            self.left + r / self.galaxy_radius * self.width,
            self.bottom - v * self.height,
        )
    }
}

pub fn draw_chart<C: Canvas + ?Sized>(canvas: &mut C, width: f32, height: f32, input: &ChartInput) {
    draw_chart_styled(canvas, width, height, input, &ChartStyle::default());
}

pub fn draw_chart_styled<C: Canvas + ?Sized>(
    canvas: &mut C,
    width: f32,
    height: f32,
    input: &ChartInput,
    style: &ChartStyle,
) {
    let w = width.max(1.0);
    let h = height.max(1.0);
    let pad = style.padding;

    canvas.begin(w, h);
    canvas.fill_rect(0.0, 0.0, w, h, style.background);

    canvas.stroke_polyline(&[(pad, pad), (pad, h - pad), (w - pad, h - pad)], style.axis, 1.0);
    canvas.fill_text("VELOCITY", pad - 35.0, pad + 20.0, 11.0, style.axis_label);
    canvas.fill_text("DISTANCE FROM CENTER", w / 2.0 - 40.0, h - 10.0, 11.0, style.axis_label);

    let plot = Plot {
        left: pad,
        bottom: h - pad,
        width: (w - 2.0 * pad).max(0.0),
        height: (h - 2.0 * pad).max(0.0),
        galaxy_radius: input.galaxy_radius,
    };

    let curve = &input.curve;
    let keplerian_samples =
        sample_curve(curve, RotationMode::Expected, input.galaxy_radius, input.samples);
    let observed_samples =
        sample_curve(curve, RotationMode::Observed, input.galaxy_radius, input.samples);
    let keplerian: Vec<(f32, f32)> = keplerian_samples
        .iter()
        .map(|&(r, v)| plot.point(r, v))
        .collect();
    let observed: Vec<(f32, f32)> = observed_samples
        .iter()
        .map(|&(r, v)| plot.point(r, v))
        .collect();

    let (upper, lower) = gap_band(&plot, curve, &observed_samples);
    if upper.len() >= 2 {
        canvas.fill_band(&upper, &lower, style.gap_fill);
    }

    let (kep_color, kep_width, obs_color, obs_width) = match input.mode {
        RotationMode::Observed => (
            style.keplerian_idle,
            style.idle_width,
            style.observed_active,
            style.active_width,
        ),
        RotationMode::Expected => (
            style.keplerian_active,
            style.active_width,
            style.observed_idle,
            style.idle_width,
        ),
    };
    // Active curve last so it sits on top.
    match input.mode {
        RotationMode::Observed => {
            canvas.stroke_polyline(&keplerian, kep_color, kep_width);
            canvas.stroke_polyline(&observed, obs_color, obs_width);
        }
        RotationMode::Expected => {
            canvas.stroke_polyline(&observed, obs_color, obs_width);
            canvas.stroke_polyline(&keplerian, kep_color, kep_width);
        }
    }

    canvas.fill_text("THE GAP", w - pad - 60.0, h / 2.0 - 20.0, 12.0, style.gap_title);
    canvas.fill_text("DARK MATTER?", w - pad - 60.0, h / 2.0 - 5.0, 10.0, style.gap_note);
    canvas.fill_text(
        input.mode.label(),
        pad,
        pad - 10.0,
        11.0,
        style.mode_label(input.mode),
    );
}

/// Edges of the region between the curves for `r >= core_radius`: the
/// observed curve on top, the Keplerian one below, both starting at the
/// exact core radius.
fn gap_band(
    plot: &Plot,
    curve: &RotationCurve,
    samples: &[(f32, f32)],
) -> (Vec<(f32, f32)>, Vec<(f32, f32)>) {
    let core = curve.core_radius;
    if core >= plot.galaxy_radius {
        return (Vec::new(), Vec::new());
    }
    let radii: Vec<f32> = std::iter::once(core)
        .chain(samples.iter().map(|&(r, _)| r).filter(|&r| r > core))
        .collect();
    let upper = radii
        .iter()
        .map(|&r| plot.point(r, curve.velocity(RotationMode::Observed, r)))
        .collect();
    let lower = radii
        .iter()
        .map(|&r| plot.point(r, curve.velocity(RotationMode::Expected, r)))
        .collect();
    (upper, lower)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records draw calls so tests can inspect what the chart asked for.
    #[derive(Default)]
    struct Recorder {
        size: (f32, f32),
        calls: Vec<String>,
        strokes: Vec<(Color, f32, usize)>,
        texts: Vec<(String, Color)>,
        bands: Vec<(Vec<(f32, f32)>, Vec<(f32, f32)>)>,
    }

    impl Canvas for Recorder {
        fn begin(&mut self, width: f32, height: f32) {
            *self = Recorder::default();
            self.size = (width, height);
        }
        fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, _color: Color) {
            self.calls.push(format!("rect {x} {y} {w} {h}"));
        }
        fn stroke_polyline(&mut self, points: &[(f32, f32)], color: Color, width: f32) {
            self.calls.push(format!("stroke {}", points.len()));
            self.strokes.push((color, width, points.len()));
        }
        fn fill_band(&mut self, upper: &[(f32, f32)], lower: &[(f32, f32)], _color: Color) {
            self.calls.push(format!("band {}", upper.len()));
            self.bands.push((upper.to_vec(), lower.to_vec()));
        }
        fn fill_text(&mut self, text: &str, _x: f32, _y: f32, _size: f32, color: Color) {
            self.calls.push(format!("text {text}"));
            self.texts.push((text.to_string(), color));
        }
    }

    fn input(mode: RotationMode) -> ChartInput {
        ChartInput {
            curve: RotationCurve::default(),
            galaxy_radius: 30.0,
            mode,
            samples: 101,
        }
    }

    #[test]
    fn test_active_curve_is_emphasized() {
        let style = ChartStyle::default();
        let mut rec = Recorder::default();
        draw_chart(&mut rec, 400.0, 250.0, &input(RotationMode::Observed));
        // axes, then idle Keplerian, then active observed
        assert_eq!(rec.strokes.len(), 3);
        assert_eq!(rec.strokes[1], (style.keplerian_idle, 2.0, 101));
        assert_eq!(rec.strokes[2], (style.observed_active, 3.0, 101));

        draw_chart(&mut rec, 400.0, 250.0, &input(RotationMode::Expected));
        assert_eq!(rec.strokes[1], (style.observed_idle, 2.0, 101));
        assert_eq!(rec.strokes[2], (style.keplerian_active, 3.0, 101));
    }

    #[test]
    fn test_mode_label() {
        let mut rec = Recorder::default();
        draw_chart(&mut rec, 400.0, 250.0, &input(RotationMode::Expected));
        let label = rec.texts.last().unwrap();
        assert_eq!(label.0, "SHOWING: EXPECTED");
        assert_eq!(label.1, Color::rgb(0x66, 0xff, 0x66));
    }

    #[test]
    fn test_gap_starts_at_core_radius() {
        let mut rec = Recorder::default();
        draw_chart(&mut rec, 440.0, 280.0, &input(RotationMode::Observed));
        assert_eq!(rec.bands.len(), 1);
        let (upper, lower) = &rec.bands[0];
        // plot spans x in [40, 400] for r in [0, 30]
        let core_x = 40.0 + 3.0 / 30.0 * 360.0;
        assert!((upper[0].0 - core_x).abs() < 1e-3);
        for (&(ux, uy), &(lx, ly)) in upper.iter().zip(lower) {
            assert!(ux >= core_x - 1e-3);
            assert_eq!(ux, lx);
            // observed above Keplerian, except within a hair of the core edge
            if ux > core_x + 40.0 {
                assert!(uy <= ly);
            }
        }
        // samples at r = 3.3 .. 30 plus the exact core point
        assert_eq!(upper.len(), 91);
        assert_eq!(lower.len(), 91);
    }

    #[test]
    fn test_begin_resets_to_requested_size() {
        let mut rec = Recorder::default();
        draw_chart(&mut rec, 400.0, 250.0, &input(RotationMode::Observed));
        let first = rec.calls.clone();
        draw_chart(&mut rec, 800.0, 300.0, &input(RotationMode::Observed));
        assert_eq!(rec.size, (800.0, 300.0));
        draw_chart(&mut rec, 400.0, 250.0, &input(RotationMode::Observed));
        assert_eq!(rec.calls, first);
    }

    #[test]
    fn test_css_colors() {
        assert_eq!(Color::rgb(0xff, 0x44, 0x44).to_css(), "#ff4444");
        assert_eq!(Color::rgba(0, 0, 0, 255).to_css(), "#000000");
        assert!(Color::rgba(255, 100, 100, 38).to_css().starts_with("rgba(255,100,100,0.149"));
    }
}
