use std::collections::HashMap;
use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use tracing::warn;
use winit::window::Window;

use crate::app::Vec2;
use crate::content::{AniDef, AniFrame, Gallery};

use super::{PixelSurface, Viewport};

const CLEAR_COLOR: [u8; 4] = [20, 22, 28, 255];
const PLACEHOLDER_COLOR: [u8; 4] = [220, 220, 240, 255];
pub const PLACEHOLDER_HALF_SIZE_PX: i32 = 10;

/// Owns the window's framebuffer and the logical screen surface everything
/// composites into. Frames are built on `screen_mut` and pushed to the
/// window with `present`.
pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    screen: PixelSurface,
    viewport: Viewport,
}

impl Renderer {
    pub fn new(window: Arc<Window>, viewport: Viewport) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height, viewport)?;
        Ok(Self {
            window,
            pixels,
            screen: PixelSurface::new(viewport.width, viewport.height),
            viewport,
        })
    }

    fn build_pixels(
        window: Arc<Window>,
        surface_width: u32,
        surface_height: u32,
        viewport: Viewport,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(surface_width, surface_height, window);
        Pixels::new(viewport.width, viewport.height, surface)
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }

    /// Rebuild the surface for a new window size; the logical viewport is
    /// unchanged, the image just scales.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height, self.viewport)?;
        Ok(())
    }

    /// The frame under construction, cleared to the background color.
    pub fn begin_frame(&mut self) -> &mut PixelSurface {
        self.screen.fill(CLEAR_COLOR);
        &mut self.screen
    }

    pub fn screen_mut(&mut self) -> &mut PixelSurface {
        &mut self.screen
    }

    pub fn present(&mut self) -> Result<(), Error> {
        self.pixels.frame_mut().copy_from_slice(self.screen.data());
        self.pixels.render()
    }
}

/// Filled square centered at `(cx, cy)`, clipped to the surface. The
/// stand-in for anything that failed to load a real image.
pub fn draw_square(screen: &mut PixelSurface, cx: i32, cy: i32, half_size: i32, color: [u8; 4]) {
    for y in (cy - half_size)..(cy + half_size) {
        for x in (cx - half_size)..(cx + half_size) {
            if x >= 0 && y >= 0 {
                screen.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

pub fn draw_placeholder(screen: &mut PixelSurface, cx: i32, cy: i32) {
    draw_square(screen, cx, cy, PLACEHOLDER_HALF_SIZE_PX, PLACEHOLDER_COLOR);
}

/// Draw one animation frame at `origin` (screen pixels): layers in order,
/// each placement cut from the image its sprite group resolves to through
/// the skin map (group -> gallery filename). Sprites whose group has no
/// skin resolve through the placeholder path inside the gallery.
pub fn draw_ani_frame(
    screen: &mut PixelSurface,
    def: &AniDef,
    frame: &AniFrame,
    origin: Vec2,
    gallery: &mut Gallery,
    skins: &HashMap<String, String>,
) {
    for layer in &frame.layers {
        for placement in &layer.placements {
            let Some(sprite) = def.sprite(placement.sprite) else {
                warn!(ani = %def.name, sprite = placement.sprite, "ani_sprite_unknown");
                continue;
            };
            let Some(filename) = skins.get(&sprite.group) else {
                continue;
            };
            let image = gallery.image(&sprite.group, filename);
            let dx = origin.x.round() as i32 + placement.dx;
            let dy = origin.y.round() as i32 + placement.dy;
            screen.copy_from(
                image,
                sprite.sx,
                sprite.sy,
                sprite.width,
                sprite.height,
                dx,
                dy,
            );
        }
    }
}
