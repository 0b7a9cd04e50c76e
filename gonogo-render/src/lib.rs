pub mod render;
pub mod shapes;

pub use render::{SkiaRenderer, load_font, render_text_pixmap};
pub use shapes::{DrawPrimitive, VIEWBOX, paint_color, primitive, rasterize, rgba};
