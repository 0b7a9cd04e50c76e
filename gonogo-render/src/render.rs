use crate::shapes::rasterize;
use ab_glyph::{Font, FontVec, Glyph, PxScale, ScaleFont, point};
use anyhow::{Context, Result, anyhow, bail};
use bytemuck::{cast_slice, cast_slice_mut};
use gonogo_core::{Color, Renderer, Shape};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tiny_skia::{Pixmap, PremultipliedColorU8};
use tracing::{debug, trace, warn};

const BACKGROUND: [u8; 4] = [0, 0, 0, 255];
const CAPTION_PX: f32 = 32.0;
const BANNER_PX: f32 = 20.0;
const BANNER_MARGIN: f32 = 16.0;
const LINE_SPACING: f32 = 1.4;

/// Where a block of text lines is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    /// Block centred on the screen centre.
    Center,
    /// Block hanging from the top edge.
    Top,
}

/// Vertical centre of each of `lines` lines.
fn line_centers(anchor: Anchor, lines: usize, size_px: f32, center_y: f32) -> Vec<f32> {
    let step = size_px * LINE_SPACING;
    let first = match anchor {
        Anchor::Center => center_y - step * (lines.saturating_sub(1) as f32) * 0.5,
        Anchor::Top => BANNER_MARGIN + step * 0.5,
    };
    (0..lines).map(|i| first + step * i as f32).collect()
}

fn draw_lines<F: Font>(
    canvas: &mut Pixmap,
    cache: &mut TextCache,
    font: &F,
    text: &str,
    anchor: Anchor,
    center: (f32, f32),
) {
    let lines: Vec<Arc<Pixmap>> = text
        .lines()
        .filter_map(|line| cache.get_or_render(font, line))
        .collect();
    let ys = line_centers(anchor, lines.len(), cache.size_px, center.1);
    for (pm, y) in lines.iter().zip(ys) {
        blit_centered(canvas, pm, (center.0, y));
    }
}

pub fn load_font(path: &Path) -> Result<FontVec> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read font {}", path.display()))?;
    FontVec::try_from_vec(bytes).map_err(|e| anyhow!("invalid font {}: {e}", path.display()))
}

struct TextCache {
    size_px: f32,
    map: HashMap<String, Arc<Pixmap>>,
}

impl TextCache {
    fn new(size_px: f32) -> Self {
        Self {
            size_px,
            map: HashMap::new(),
        }
    }

    fn get_or_render<F: Font>(&mut self, font: &F, text: &str) -> Option<Arc<Pixmap>> {
        if let Some(p) = self.map.get(text) {
            return Some(Arc::clone(p));
        }
        let pm = Arc::new(render_text_pixmap(
            text,
            self.size_px,
            font,
            tiny_skia::Color::WHITE,
        )?);
        self.map.insert(text.to_owned(), Arc::clone(&pm));
        Some(pm)
    }
}

/// Rasterises one line of text into a tight, transparent pixmap.
/// Returns `None` when nothing in `text` has an outline.
pub fn render_text_pixmap<F: Font>(
    text: &str,
    font_size: f32,
    font: &F,
    color: tiny_skia::Color,
) -> Option<Pixmap> {
    let scale = PxScale::from(font_size);
    let sf = font.as_scaled(scale);

    // Lay out along a baseline at the ascent
    let mut pen_x = 0.0f32;
    let mut glyphs = Vec::<Glyph>::new();
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = glyphs.last() {
            pen_x += sf.kern(prev.id, id);
        }
        glyphs.push(Glyph {
            id,
            scale,
            position: point(pen_x, sf.ascent()),
        });
        pen_x += sf.h_advance(id);
    }

    let outlines: Vec<_> = glyphs
        .into_iter()
        .filter_map(|g| font.outline_glyph(g))
        .collect();
    let (min_x, min_y, max_x, max_y) = outlines.iter().map(|o| o.px_bounds()).fold(
        (f32::INFINITY, f32::INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        |(x0, y0, x1, y1), b| (x0.min(b.min.x), y0.min(b.min.y), x1.max(b.max.x), y1.max(b.max.y)),
    );
    if outlines.is_empty() {
        return None;
    }

    let w = (max_x.ceil() - min_x.floor()).max(1.0) as u32;
    let h = (max_y.ceil() - min_y.floor()).max(1.0) as u32;
    let mut pm = Pixmap::new(w, h)?;
    let stride = w as usize;
    let dst = pm.pixels_mut();

    let cu = color.to_color_u8();
    for out in &outlines {
        let b = out.px_bounds();
        out.draw(|x, y, cov| {
            if cov <= f32::EPSILON {
                return;
            }
            let ix = (x as f32 + b.min.x - min_x).floor() as i64;
            let iy = (y as f32 + b.min.y - min_y).floor() as i64;
            if ix < 0 || iy < 0 || ix >= w as i64 || iy >= h as i64 {
                return;
            }
            let i = iy as usize * stride + ix as usize;

            // Premultiply by coverage, then source-over in premultiplied space
            let a = (cov * cu.alpha() as f32 / 255.0).clamp(0.0, 1.0);
            let sa = (a * 255.0) as u8;
            let inv = 1.0 - a;
            let bg = dst[i];
            let mix = |s: u8, d: u8| ((s as f32 * a) as u8).saturating_add((d as f32 * inv) as u8);
            let blended = PremultipliedColorU8::from_rgba(
                mix(cu.red(), bg.red()),
                mix(cu.green(), bg.green()),
                mix(cu.blue(), bg.blue()),
                sa.saturating_add((bg.alpha() as f32 * inv) as u8),
            );
            if let Some(px) = blended {
                dst[i] = px;
            }
        });
    }

    Some(pm)
}

/// Source-over blit of a premultiplied pixmap centred on `pos`, clipped to the canvas.
fn blit_centered(canvas: &mut Pixmap, src: &Pixmap, pos: (f32, f32)) {
    let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);
    let (w, h) = (src.width() as i64, src.height() as i64);
    let x = (pos.0 - w as f32 * 0.5).floor() as i64;
    let y = (pos.1 - h as f32 * 0.5).floor() as i64;

    if x + w <= 0 || y + h <= 0 || x >= cw || y >= ch {
        return;
    }

    let dst_x = x.max(0) as usize;
    let dst_y = y.max(0) as usize;
    let src_x = (-x).max(0) as usize;
    let src_y = (-y).max(0) as usize;
    let copy_w = (w as usize - src_x).min(cw as usize - dst_x);
    let copy_h = (h as usize - src_y).min(ch as usize - dst_y);

    let src_px: &[[u8; 4]] = cast_slice(src.data());
    let canvas_stride = cw as usize;
    let dst_px: &mut [[u8; 4]] = cast_slice_mut(canvas.data_mut());

    for row in 0..copy_h {
        let s0 = (src_y + row) * w as usize + src_x;
        let d0 = (dst_y + row) * canvas_stride + dst_x;
        let src_row = &src_px[s0..s0 + copy_w];
        let dst_row = &mut dst_px[d0..d0 + copy_w];
        for (d, s) in dst_row.iter_mut().zip(src_row) {
            let inv = 255 - s[3] as u32;
            if inv == 0 {
                *d = *s;
                continue;
            }
            for c in 0..4 {
                d[c] = (s[c] as u32 + (d[c] as u32 * inv + 127) / 255) as u8;
            }
        }
    }
}

/// Software renderer: the engine sets what is on screen through [`Renderer`],
/// the window shell asks for a frame with [`SkiaRenderer::render_frame`].
pub struct SkiaRenderer {
    width: u32,
    height: u32,
    center: (f32, f32),
    stimulus_size: u32,

    canvas: Pixmap,
    font: Option<FontVec>,
    text_cache: TextCache,
    banner_cache: TextCache,
    stimulus_cache: HashMap<(Shape, Color), Arc<Pixmap>>,

    current: Option<(Shape, Color)>,
    caption: Option<String>,
    banner: Option<String>,
    warned_no_font: bool,
}

impl SkiaRenderer {
    pub fn new(width: u32, height: u32, stimulus_size: u32) -> Result<Self> {
        let canvas = Pixmap::new(width, height)
            .with_context(|| format!("cannot allocate a {width}x{height} canvas"))?;
        Ok(Self {
            width,
            height,
            center: (width as f32 / 2.0, height as f32 / 2.0),
            stimulus_size,
            canvas,
            font: None,
            text_cache: TextCache::new(CAPTION_PX),
            banner_cache: TextCache::new(BANNER_PX),
            stimulus_cache: HashMap::new(),
            current: None,
            caption: None,
            banner: None,
            warned_no_font: false,
        })
    }

    pub fn set_font(&mut self, font: Option<FontVec>) {
        self.font = font;
        self.text_cache.map.clear();
        self.banner_cache.map.clear();
        self.warned_no_font = false;
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Zero-sized surfaces (minimised windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        let Some(canvas) = Pixmap::new(width, height) else {
            debug!(width, height, "ignoring degenerate resize");
            return;
        };
        self.width = width;
        self.height = height;
        self.center = (width as f32 / 2.0, height as f32 / 2.0);
        self.canvas = canvas;
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn set_stimulus_size(&mut self, px: u32) {
        if px != self.stimulus_size {
            self.stimulus_size = px;
            self.stimulus_cache.clear();
        }
    }

    fn warn_if_no_font(&mut self, text: &Option<String>) {
        if text.is_some() && self.font.is_none() && !self.warned_no_font {
            warn!("no font loaded, captions will not be shown");
            self.warned_no_font = true;
        }
    }

    /// Text drawn centred on screen, one pixmap per line.
    pub fn set_caption(&mut self, caption: Option<String>) {
        self.warn_if_no_font(&caption);
        self.caption = caption;
    }

    pub fn caption(&self) -> Option<&str> {
        self.caption.as_deref()
    }

    /// Smaller text along the top edge, kept clear of the stimulus.
    pub fn set_banner(&mut self, banner: Option<String>) {
        self.warn_if_no_font(&banner);
        self.banner = banner;
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn current(&self) -> Option<(Shape, Color)> {
        self.current
    }

    /// Composes the current screen into an RGBA frame of `width * height * 4` bytes.
    pub fn render_frame(&mut self, frame: &mut [u8]) -> Result<()> {
        if frame.len() != self.canvas.data().len() {
            bail!(
                "frame buffer is {} bytes, expected {} for {}x{}",
                frame.len(),
                self.canvas.data().len(),
                self.width,
                self.height
            );
        }

        let bg: &mut [[u8; 4]] = cast_slice_mut(self.canvas.data_mut());
        bg.fill(BACKGROUND);

        if let Some((shape, color)) = self.current {
            if let Some(pm) = self.stimulus_pixmap(shape, color) {
                blit_centered(&mut self.canvas, &pm, self.center);
            }
        }

        if let Some(font) = &self.font {
            if let Some(banner) = &self.banner {
                draw_lines(
                    &mut self.canvas,
                    &mut self.banner_cache,
                    font,
                    banner,
                    Anchor::Top,
                    self.center,
                );
            }
            if let Some(caption) = &self.caption {
                draw_lines(
                    &mut self.canvas,
                    &mut self.text_cache,
                    font,
                    caption,
                    Anchor::Center,
                    self.center,
                );
            }
        }

        frame.copy_from_slice(self.canvas.data());
        Ok(())
    }

    fn stimulus_pixmap(&mut self, shape: Shape, color: Color) -> Option<Arc<Pixmap>> {
        if let Some(pm) = self.stimulus_cache.get(&(shape, color)) {
            return Some(Arc::clone(pm));
        }
        let pm = Arc::new(rasterize(shape, color, self.stimulus_size)?);
        self.stimulus_cache.insert((shape, color), Arc::clone(&pm));
        Some(pm)
    }
}

impl Renderer for SkiaRenderer {
    fn draw(&mut self, shape: Shape, color: Color) {
        trace!(%shape, %color, "draw");
        self.current = Some((shape, color));
    }

    fn clear(&mut self) {
        trace!("clear");
        self.current = None;
    }
}
