mod renderer;
mod surface;

pub use renderer::{
    draw_ani_frame, draw_placeholder, draw_square, Renderer, PLACEHOLDER_HALF_SIZE_PX,
};
pub use surface::{PixelSurface, SurfaceError};

/// Logical render resolution in pixels. The framebuffer is this size and
/// scales up to whatever the window is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}
