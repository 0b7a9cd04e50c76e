//! Stimulus geometry on a 100×100 view box, keyed by [`Shape`].

use gonogo_core::{Color, Shape};
use tiny_skia::{FillRule, Paint, Path, PathBuilder, Pixmap, Rect, Stroke, Transform};

/// Side length of the square every primitive is laid out in.
pub const VIEWBOX: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawPrimitive {
    Circle { cx: f32, cy: f32, r: f32 },
    Rect { x: f32, y: f32, w: f32, h: f32 },
    /// Closed, filled outline.
    Polygon(&'static [(f32, f32)]),
    /// Stroked segments, no fill.
    Strokes {
        lines: &'static [((f32, f32), (f32, f32))],
        width: f32,
    },
}

const TRIANGLE: [(f32, f32); 3] = [(50.0, 10.0), (10.0, 90.0), (90.0, 90.0)];

const ARROW: [(f32, f32); 7] = [
    (50.0, 10.0),
    (10.0, 40.0),
    (40.0, 40.0),
    (40.0, 90.0),
    (60.0, 90.0),
    (60.0, 40.0),
    (90.0, 40.0),
];

const CROSS: [((f32, f32), (f32, f32)); 2] = [
    ((20.0, 20.0), (80.0, 80.0)),
    ((80.0, 20.0), (20.0, 80.0)),
];

pub fn primitive(shape: Shape) -> DrawPrimitive {
    match shape {
        Shape::Circle => DrawPrimitive::Circle {
            cx: 50.0,
            cy: 50.0,
            r: 40.0,
        },
        Shape::Square => DrawPrimitive::Rect {
            x: 10.0,
            y: 10.0,
            w: 80.0,
            h: 80.0,
        },
        Shape::Triangle => DrawPrimitive::Polygon(&TRIANGLE),
        Shape::Arrow => DrawPrimitive::Polygon(&ARROW),
        Shape::Minus => DrawPrimitive::Rect {
            x: 20.0,
            y: 45.0,
            w: 60.0,
            h: 10.0,
        },
        Shape::Cross => DrawPrimitive::Strokes {
            lines: &CROSS,
            width: 10.0,
        },
    }
}

/// Straight RGBA for a stimulus color.
pub fn rgba(color: Color) -> [u8; 4] {
    match color {
        Color::Red => [255, 0, 0, 255],
        Color::Blue => [0, 0, 255, 255],
        Color::Green => [0, 128, 0, 255],
        Color::Yellow => [255, 255, 0, 255],
        Color::Orange => [255, 165, 0, 255],
    }
}

pub fn paint_color(color: Color) -> tiny_skia::Color {
    let [r, g, b, a] = rgba(color);
    tiny_skia::Color::from_rgba8(r, g, b, a)
}

impl DrawPrimitive {
    fn path(&self) -> Option<Path> {
        match *self {
            DrawPrimitive::Circle { cx, cy, r } => PathBuilder::from_circle(cx, cy, r),
            DrawPrimitive::Rect { x, y, w, h } => {
                Rect::from_xywh(x, y, w, h).map(PathBuilder::from_rect)
            }
            DrawPrimitive::Polygon(points) => {
                let (&(x0, y0), rest) = points.split_first()?;
                let mut pb = PathBuilder::new();
                pb.move_to(x0, y0);
                for &(x, y) in rest {
                    pb.line_to(x, y);
                }
                pb.close();
                pb.finish()
            }
            DrawPrimitive::Strokes { lines, .. } => {
                let mut pb = PathBuilder::new();
                for &((x0, y0), (x1, y1)) in lines {
                    pb.move_to(x0, y0);
                    pb.line_to(x1, y1);
                }
                pb.finish()
            }
        }
    }

    /// Paints the primitive into `pixmap`, mapping the view box through `transform`.
    pub fn paint(&self, pixmap: &mut Pixmap, paint: &Paint, transform: Transform) -> bool {
        let Some(path) = self.path() else {
            return false;
        };
        match *self {
            DrawPrimitive::Strokes { width, .. } => {
                let stroke = Stroke {
                    width,
                    ..Stroke::default()
                };
                pixmap.stroke_path(&path, paint, &stroke, transform, None);
            }
            _ => pixmap.fill_path(&path, paint, FillRule::Winding, transform, None),
        }
        true
    }
}

/// Rasterises one stimulus into a transparent `size_px` square.
pub fn rasterize(shape: Shape, color: Color, size_px: u32) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(size_px, size_px)?;
    let mut paint = Paint::default();
    paint.set_color(paint_color(color));
    let scale = size_px as f32 / VIEWBOX;
    primitive(shape)
        .paint(&mut pixmap, &paint, Transform::from_scale(scale, scale))
        .then_some(pixmap)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(pixmap: &Pixmap, x: u32, y: u32) -> bool {
        pixmap.pixel(x, y).is_some_and(|p| p.alpha() == 255)
    }

    fn empty(pixmap: &Pixmap, x: u32, y: u32) -> bool {
        pixmap.pixel(x, y).is_some_and(|p| p.alpha() == 0)
    }

    #[test]
    fn every_shape_rasterises() {
        for shape in Shape::ALL {
            let pm = rasterize(shape, Color::Blue, 64).unwrap();
            assert!(pm.pixels().iter().any(|p| p.alpha() > 0), "{shape} is blank");
        }
    }

    #[test]
    fn geometry_matches_the_view_box() {
        let circle = rasterize(Shape::Circle, Color::Red, 100).unwrap();
        assert!(filled(&circle, 50, 50));
        assert!(empty(&circle, 5, 5));

        let square = rasterize(Shape::Square, Color::Red, 100).unwrap();
        assert!(filled(&square, 12, 12));
        assert!(empty(&square, 5, 50));

        let triangle = rasterize(Shape::Triangle, Color::Red, 100).unwrap();
        assert!(filled(&triangle, 50, 80));
        assert!(empty(&triangle, 15, 15));

        let arrow = rasterize(Shape::Arrow, Color::Red, 100).unwrap();
        assert!(filled(&arrow, 50, 30));
        assert!(filled(&arrow, 50, 80));
        assert!(empty(&arrow, 20, 80));

        let minus = rasterize(Shape::Minus, Color::Red, 100).unwrap();
        assert!(filled(&minus, 50, 50));
        assert!(empty(&minus, 50, 30));

        let cross = rasterize(Shape::Cross, Color::Red, 100).unwrap();
        assert!(filled(&cross, 50, 50));
        assert!(filled(&cross, 30, 30));
        assert!(empty(&cross, 50, 20));
    }

    #[test]
    fn fill_uses_the_palette() {
        for color in Color::ALL {
            let pm = rasterize(Shape::Square, color, 40).unwrap();
            let p = pm.pixel(20, 20).unwrap();
            let [r, g, b, a] = rgba(color);
            assert_eq!([p.red(), p.green(), p.blue(), p.alpha()], [r, g, b, a]);
        }
    }

    #[test]
    fn scales_with_the_requested_size() {
        let pm = rasterize(Shape::Square, Color::Green, 200).unwrap();
        assert_eq!((pm.width(), pm.height()), (200, 200));
        assert!(filled(&pm, 25, 25));
        assert!(empty(&pm, 15, 15));
        assert!(rasterize(Shape::Circle, Color::Green, 0).is_none());
    }
}
