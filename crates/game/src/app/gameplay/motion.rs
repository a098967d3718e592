use engine::{
    AnchorArena, AnchorId, Animator, Camera, GameConfig, Level, Overworld, Soundboard,
};
use tracing::warn;

use super::player::{Direction, Player};

/// Tile type that blocks movement.
pub const BLOCK_TYPE: &str = "BLOCK";

/// Everything the per-tick player update needs besides the player itself.
pub struct MotionContext<'a> {
    pub config: &'a GameConfig,
    pub overworld: &'a Overworld,
    pub camera: &'a Camera,
    pub arena: &'a mut AnchorArena,
    pub animator: &'a mut Animator,
    pub soundboard: &'a mut dyn Soundboard,
}

/// Wall probe: offset the collider's four corners by the proposed delta
/// (tile units), floor each corner to a cell, and report contact if any
/// corner's cell carries the BLOCK type. Corners outside the level resolve
/// to no types, so edges fail open and boundary handoff decides what an
/// edge means.
pub fn on_wall(
    level: &Level,
    arena: &AnchorArena,
    collider: AnchorId,
    config: &GameConfig,
    test_x: f32,
    test_y: f32,
) -> bool {
    if arena.units(collider) != config.tile_grid {
        warn!(
            units = arena.units(collider),
            expected = config.tile_grid,
            "collider_units_mismatch"
        );
        return true; // refuse to move on a mismeasured collider
    }
    let size = arena.size(collider);
    let global = arena.global_position(collider);
    let left = (global.x + test_x).floor() as i32;
    let right = (global.x + size.x + test_x).floor() as i32;
    let top = (global.y + test_y).floor() as i32;
    let bottom = (global.y + size.y + test_y).floor() as i32;

    level.tile_has_type(left, top, BLOCK_TYPE)
        || level.tile_has_type(right, top, BLOCK_TYPE)
        || level.tile_has_type(left, bottom, BLOCK_TYPE)
        || level.tile_has_type(right, bottom, BLOCK_TYPE)
}

/// Resolve a proposed move (tile units) into the force (pixels) that
/// actually applies after wall contact.
///
/// Large primary-axis deltas test the full move and back off half a pixel
/// per iteration until clear. Once the delta is small, a four-point probe
/// classifies partial contact: the two probes on each flank pull inward by
/// a growing step-in offset before declaring a side blocked, an open flank
/// slides the player along the perpendicular axis, and a final contact
/// check zeroes the primary axis.
pub fn resolve_walk_force(
    level: &Level,
    arena: &AnchorArena,
    collider: AnchorId,
    config: &GameConfig,
    dir: Direction,
    speed: f32,
    arg_x: f32,
    arg_y: f32,
) -> (f32, f32) {
    let tile_grid = config.tile_grid as f32;
    let speed_px = speed * tile_grid;
    let mut force_x = arg_x * tile_grid;
    let mut force_y = arg_y * tile_grid;

    let mut testing = force_x != 0.0 || force_y != 0.0;
    while testing {
        testing = false;
        let mut test_x = force_x;
        let mut test_y = force_y;
        let is_vertical = dir.is_vertical();
        let force_primary = if is_vertical { force_y } else { force_x };
        let dir_sign = dir.sign();

        if force_primary.abs() >= 2.0 {
            if on_wall(level, arena, collider, config, test_x / tile_grid, test_y / tile_grid) {
                testing = true;
                if is_vertical {
                    force_y -= dir_sign / 2.0;
                } else {
                    force_x -= dir_sign / 2.0;
                }
            }
        } else {
            let mut move_offset = 0.0_f32;
            let mut blocked = [false; 4];
            let mut i = 0;
            while i < 4 {
                test_x = if is_vertical {
                    let reach = (tile_grid * 3.0) / 2.0 - move_offset;
                    if i % 2 == 0 {
                        reach
                    } else {
                        -reach
                    }
                } else if i < 2 {
                    0.0
                } else {
                    (tile_grid / 2.0) * dir_sign
                };
                test_y = if is_vertical {
                    if i < 2 {
                        0.0
                    } else {
                        (tile_grid / 2.0) * dir_sign
                    }
                } else {
                    let reach = tile_grid - move_offset;
                    if i % 2 == 0 {
                        reach
                    } else {
                        -reach
                    }
                };
                if on_wall(level, arena, collider, config, test_x / tile_grid, test_y / tile_grid) {
                    if move_offset < tile_grid / 2.0 {
                        move_offset += 2.0;
                        continue; // retry the same probe, pulled inward
                    }
                    blocked[i] = true;
                }
                i += 1;
            }

            if !blocked[0] && !blocked[2] {
                if is_vertical {
                    force_x += speed_px;
                } else {
                    force_y += speed_px;
                }
            } else if !blocked[1] && !blocked[3] {
                if is_vertical {
                    force_x -= speed_px;
                } else {
                    force_y -= speed_px;
                }
            }

            if on_wall(level, arena, collider, config, test_x / tile_grid, test_y / tile_grid) {
                if is_vertical {
                    force_y = 0.0;
                } else {
                    force_x = 0.0;
                }
            }
        }
    }

    (force_x, force_y)
}

/// Advance the player by a proposed delta (tile units): resolve walls,
/// hand the resulting tile position to the camera for level-boundary
/// resolution, and commit whatever level/position comes back.
pub fn step(player: &mut Player, arg_x: f32, arg_y: f32, ctx: &mut MotionContext<'_>) {
    let Some(level) = ctx.overworld.level(player.level()) else {
        warn!(level = player.level(), "player_level_missing");
        return;
    };
    let (force_x, force_y) = resolve_walk_force(
        level,
        ctx.arena,
        player.collider,
        ctx.config,
        player.dir(),
        player.speed(),
        arg_x,
        arg_y,
    );

    let tile_grid = ctx.config.tile_grid as f32;
    let pos = ctx.arena.position(player.anchor);
    let new_x = pos.x + force_x / tile_grid;
    let new_y = pos.y + force_y / tile_grid;

    let Some(placed) =
        ctx.camera
            .check_player_position(ctx.overworld, player.level(), new_x, new_y, ctx.config)
    else {
        return;
    };
    if placed.level != player.level() {
        player.set_level(ctx.overworld, &placed.level);
    }
    ctx.arena.move_to(player.anchor, placed.x, placed.y);
}
