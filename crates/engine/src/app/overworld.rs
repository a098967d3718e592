use thiserror::Error;
use tracing::warn;

use crate::GameConfig;

use super::camera::{Camera, Rect};
use super::level::Level;
use super::rendering::PixelSurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OverworldError {
    #[error("overworld dimensions must be positive, got {width}x{height}")]
    BadDimensions { width: u32, height: u32 },
}

/// One visible slice of a level: a source crop within the level's bitmap
/// and the screen position it lands at this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleSection {
    pub grid_x: u32,
    pub grid_y: u32,
    pub src_x: i32,
    pub src_y: i32,
    pub width: u32,
    pub height: u32,
    pub dst_x: i32,
    pub dst_y: i32,
}

/// A 2D grid of levels. The overworld owns its levels; a level's stored
/// grid position always matches the slot it occupies. Rows may go ragged
/// between operations, and `measure` keeps the bounding width/height
/// current.
#[derive(Debug, Clone, Default)]
pub struct Overworld {
    name: String,
    matrix: Vec<Vec<Option<Level>>>,
    width: u32,
    height: u32,
}

impl Overworld {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bounding width in levels: the longest row.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Bounding height in levels: the row count.
    pub fn height(&self) -> u32 {
        self.height
    }

    fn measure(&mut self) {
        self.width = self
            .matrix
            .iter()
            .map(|row| row.len() as u32)
            .max()
            .unwrap_or(0);
        self.height = self.matrix.len() as u32;
    }

    /// Normalize the matrix to exactly `width x height`. Levels displaced
    /// by truncation are detached — position reset to (0, 0) — and handed
    /// back to the caller, not destroyed.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<Vec<Level>, OverworldError> {
        if width == 0 || height == 0 {
            return Err(OverworldError::BadDimensions { width, height });
        }
        let mut displaced = Vec::new();

        while self.matrix.len() > height as usize {
            if let Some(row) = self.matrix.pop() {
                displaced.extend(row.into_iter().flatten());
            }
        }
        self.matrix.resize_with(height as usize, Vec::new);
        for row in &mut self.matrix {
            while row.len() > width as usize {
                if let Some(level) = row.pop().flatten() {
                    displaced.push(level);
                }
            }
            row.resize_with(width as usize, || None);
        }

        for level in &mut displaced {
            level.set_position(0, 0);
        }
        self.measure();
        Ok(displaced)
    }

    /// Place a level, growing the matrix as needed (placement never
    /// shrinks it). Returns whatever level previously occupied the slot.
    pub fn add_level(&mut self, mut level: Level, x: u32, y: u32) -> Option<Level> {
        while self.matrix.len() <= y as usize {
            self.matrix.push(Vec::new());
        }
        let row = &mut self.matrix[y as usize];
        while row.len() <= x as usize {
            row.push(None);
        }
        level.set_position(x, y);
        let mut displaced = row[x as usize].replace(level);
        if let Some(previous) = displaced.as_mut() {
            previous.set_position(0, 0);
        }
        self.measure();
        displaced
    }

    /// Empty a slot, returning the detached level with its position reset.
    /// Out-of-bounds coordinates are a no-op warning.
    pub fn remove_level(&mut self, x: u32, y: u32) -> Option<Level> {
        let slot = self
            .matrix
            .get_mut(y as usize)
            .and_then(|row| row.get_mut(x as usize));
        let Some(slot) = slot else {
            warn!(overworld = %self.name, x, y, "remove_level_out_of_bounds");
            return None;
        };
        let mut removed = slot.take();
        if let Some(level) = removed.as_mut() {
            level.set_position(0, 0);
        }
        self.measure();
        removed
    }

    /// Linear scan by level name.
    pub fn level_pos(&self, name: &str) -> Option<(u32, u32)> {
        for (y, row) in self.matrix.iter().enumerate() {
            for (x, slot) in row.iter().enumerate() {
                if slot.as_ref().is_some_and(|level| level.name() == name) {
                    return Some((x as u32, y as u32));
                }
            }
        }
        None
    }

    pub fn level(&self, name: &str) -> Option<&Level> {
        self.level_pos(name)
            .and_then(|(x, y)| self.level_at(x as i32, y as i32))
    }

    pub fn level_mut(&mut self, name: &str) -> Option<&mut Level> {
        let (x, y) = self.level_pos(name)?;
        self.matrix
            .get_mut(y as usize)
            .and_then(|row| row.get_mut(x as usize))
            .and_then(Option::as_mut)
    }

    /// Out-of-range or empty slots read as "no neighbor".
    pub fn level_at(&self, x: i32, y: i32) -> Option<&Level> {
        if x < 0 || y < 0 {
            return None;
        }
        self.matrix
            .get(y as usize)
            .and_then(|row| row.get(x as usize))
            .and_then(Option::as_ref)
    }

    /// Intersect the camera's padded view rectangle with every level-space
    /// rectangle in range and emit one cropped blit instruction per
    /// non-empty overlap. Empty regions produce an empty snapshot, never an
    /// error.
    pub fn snapshot(
        &self,
        camera: &Camera,
        padded: Rect,
        config: &GameConfig,
    ) -> Vec<VisibleSection> {
        let span = config.level_span() as f32;
        let min_x = padded.x;
        let min_y = padded.y;
        let max_x = padded.right();
        let max_y = padded.bottom();

        let min_grid_x = (min_x / span).floor() as i32;
        let max_grid_x = (max_x / span).ceil() as i32 - 1;
        let min_grid_y = (min_y / span).floor() as i32;
        let max_grid_y = (max_y / span).ceil() as i32 - 1;

        let mut sections = Vec::new();
        for grid_y in min_grid_y..=max_grid_y {
            for grid_x in min_grid_x..=max_grid_x {
                if self.level_at(grid_x, grid_y).is_none() {
                    continue;
                }
                let level_x = grid_x as f32 * span;
                let level_y = grid_y as f32 * span;

                let inter_left = level_x.max(min_x);
                let inter_top = level_y.max(min_y);
                let inter_right = (level_x + span).min(max_x);
                let inter_bottom = (level_y + span).min(max_y);
                let width = inter_right - inter_left;
                let height = inter_bottom - inter_top;
                if width <= 0.0 || height <= 0.0 {
                    continue;
                }

                let screen = camera.global_to_screen(inter_left, inter_top);
                sections.push(VisibleSection {
                    grid_x: grid_x as u32,
                    grid_y: grid_y as u32,
                    src_x: (inter_left - level_x).round() as i32,
                    src_y: (inter_top - level_y).round() as i32,
                    width: width.round() as u32,
                    height: height.round() as u32,
                    dst_x: screen.x.round() as i32,
                    dst_y: screen.y.round() as i32,
                });
            }
        }
        sections
    }

    /// Draw each section's source crop at its destination. Pure
    /// side-effecting draw; no state changes.
    pub fn render_visible(&self, screen: &mut PixelSurface, snapshot: &[VisibleSection]) {
        for section in snapshot {
            let Some(level) = self.level_at(section.grid_x as i32, section.grid_y as i32) else {
                continue;
            };
            screen.copy_from(
                level.bitmap(),
                section.src_x,
                section.src_y,
                section.width,
                section.height,
                section.dst_x,
                section.dst_y,
            );
        }
    }
}
