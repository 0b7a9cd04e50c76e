use crate::category::{Color, Shape};

/// Presentation surface the trial engine draws stimuli on.
///
/// Both categories are closed enums, so every value handed to `draw` has a
/// drawing; names that do not belong to the sets are rejected when parsed.
pub trait Renderer {
    fn draw(&mut self, shape: Shape, color: Color);
    fn clear(&mut self);
}

impl<R: Renderer + ?Sized> Renderer for &mut R {
    fn draw(&mut self, shape: Shape, color: Color) {
        (**self).draw(shape, color);
    }

    fn clear(&mut self) {
        (**self).clear();
    }
}
