//! SVG canvas used by the web viewer.

use super::{Canvas, Color};
use std::fmt::Write;

#[derive(Default)]
pub struct SvgCanvas {
    width: f32,
    height: f32,
    body: String,
}

impl SvgCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(&self) -> String {
        format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.0} {h:.0}">{body}</svg>"##,
            w = self.width,
            h = self.height,
            body = self.body
        )
    }
}

fn points_attr(points: &[(f32, f32)]) -> String {
    let mut out = String::with_capacity(points.len() * 14);
    for (i, (x, y)) in points.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{x:.2},{y:.2}");
    }
    out
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

impl Canvas for SvgCanvas {
    fn begin(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
        self.body.clear();
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        let _ = write!(
            self.body,
            r##"<rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}" fill="{}"/>"##,
            color.to_css()
        );
    }

    fn stroke_polyline(&mut self, points: &[(f32, f32)], color: Color, width: f32) {
        let _ = write!(
            self.body,
            r##"<polyline points="{}" fill="none" stroke="{}" stroke-width="{width}" stroke-linejoin="round"/>"##,
            points_attr(points),
            color.to_css()
        );
    }

    fn fill_band(&mut self, upper: &[(f32, f32)], lower: &[(f32, f32)], color: Color) {
        let points: Vec<(f32, f32)> = upper.iter().chain(lower.iter().rev()).copied().collect();
        let _ = write!(
            self.body,
            r##"<polygon points="{}" fill="{}"/>"##,
            points_attr(&points),
            color.to_css()
        );
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, size: f32, color: Color) {
        let _ = write!(
            self.body,
            r##"<text x="{x:.2}" y="{y:.2}" font-family="Arial, sans-serif" font-size="{size}" fill="{}">{}</text>"##,
            color.to_css(),
            escape(text)
        );
    }
}
