//! egui painter canvas, used for the native viewer's chart overlay.

use super::{draw_chart, Canvas, ChartInput, Color};
use egui::{pos2, vec2, Align2, Color32, FontId, Mesh, Painter, Pos2, Rect, Shape, Stroke};

/// Draws onto an egui [`Painter`], offset so the chart's top-left corner
/// lands at `origin` (in points).
pub struct PainterCanvas<'a> {
    painter: &'a Painter,
    origin: Pos2,
}

impl<'a> PainterCanvas<'a> {
    pub fn new(painter: &'a Painter, origin: Pos2) -> Self {
        PainterCanvas { painter, origin }
    }

    fn at(&self, (x, y): (f32, f32)) -> Pos2 {
        pos2(self.origin.x + x, self.origin.y + y)
    }
}

impl From<Color> for Color32 {
    fn from(c: Color) -> Self {
        Color32::from_rgba_unmultiplied(c.r, c.g, c.b, c.a)
    }
}

impl Canvas for PainterCanvas<'_> {
    // egui repaints every frame, so there is nothing to clear.
    fn begin(&mut self, _width: f32, _height: f32) {}

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        let rect = Rect::from_min_size(self.at((x, y)), vec2(w, h));
        self.painter.rect_filled(rect, 0.0, color);
    }

    fn stroke_polyline(&mut self, points: &[(f32, f32)], color: Color, width: f32) {
        let points: Vec<Pos2> = points.iter().map(|&p| self.at(p)).collect();
        self.painter.add(Shape::line(points, Stroke::new(width, color)));
    }

    fn fill_band(&mut self, upper: &[(f32, f32)], lower: &[(f32, f32)], color: Color) {
        let n = upper.len().min(lower.len());
        if n < 2 {
            return;
        }
        let color = Color32::from(color);
        let mut mesh = Mesh::default();
        for i in 0..n {
            mesh.colored_vertex(self.at(upper[i]), color);
            mesh.colored_vertex(self.at(lower[i]), color);
        }
        // Two triangles per column between consecutive samples.
        for i in 0..(n as u32 - 1) {
            let top = 2 * i;
            mesh.add_triangle(top, top + 1, top + 2);
            mesh.add_triangle(top + 1, top + 3, top + 2);
        }
        self.painter.add(Shape::mesh(mesh));
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, size: f32, color: Color) {
        self.painter.text(
            self.at((x, y)),
            Align2::LEFT_BOTTOM,
            text,
            FontId::proportional(size),
            color.into(),
        );
    }
}

/// Chart width for a screen `screen_width` points wide: a third of the
/// screen, kept readable on small windows and compact on large ones.
pub fn overlay_width(screen_width: f32) -> f32 {
    (screen_width / 3.0).clamp(260.0, 520.0)
}

/// Paints the comparison chart in the bottom-right corner of the screen,
/// `margin` points from the edges, sized from the current screen rect.
pub fn paint_overlay(ctx: &egui::Context, input: &ChartInput, margin: f32) -> Rect {
    let screen = ctx.screen_rect();
    let width = overlay_width(screen.width());
    let height = width * 0.6;
    let origin = screen.right_bottom() - vec2(width + margin, height + margin);

    let painter = ctx.layer_painter(egui::LayerId::new(
        egui::Order::Foreground,
        egui::Id::new("rotation_chart"),
    ));
    let mut canvas = PainterCanvas::new(&painter, origin);
    draw_chart(&mut canvas, width, height, input);
    Rect::from_min_size(origin, vec2(width, height))
}
