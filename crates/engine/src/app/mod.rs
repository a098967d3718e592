mod anchor;
mod animator;
mod camera;
mod input;
mod level;
mod loop_runner;
mod metrics;
mod overworld;
pub mod rendering;
mod sound;
mod ticker;
mod tiledefs;

pub use anchor::{AnchorArena, AnchorError, AnchorId};
pub use animator::{Animator, AniView};
pub use camera::{Camera, LevelLocation, PlacedPosition, PlayerLocation, Rect};
pub use input::{ActionStates, InputAction, InputSnapshot};
pub use level::{
    decode_matrix_id, decode_positions, encode_chunks, encode_matrix_id, encode_position,
    ChunkDecodeError, Level, LevelError, TilePattern, Tileset,
};
pub use loop_runner::{run_app, run_app_with_metrics, AppError, LoopConfig, Session};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use overworld::{Overworld, OverworldError, VisibleSection};
pub use rendering::{PixelSurface, Renderer, Viewport, PLACEHOLDER_HALF_SIZE_PX};
pub use sound::{LogSoundboard, Soundboard};
pub use ticker::{TickEvent, TickRoster, Ticker, DEFAULT_TICKS_PER_SECOND};
pub use tiledefs::TileDefs;

/// 2D vector in whatever unit the context dictates (pixels or tiles).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}
