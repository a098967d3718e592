use tracing::warn;

use crate::GameConfig;

use super::overworld::Overworld;
use super::rendering::Viewport;
use super::Vec2;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// A level's origin in the three spaces the engine works in: overworld grid
/// indices, tile units, and global pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelLocation {
    pub grid_x: u32,
    pub grid_y: u32,
    pub world_x: f32,
    pub world_y: f32,
    pub global_x: f32,
    pub global_y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerLocation {
    pub world_x: f32,
    pub world_y: f32,
    pub global_x: f32,
    pub global_y: f32,
}

/// A player position resolved against level boundaries: the level the
/// player ends up in (possibly a neighbor) and local tile coordinates
/// within it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedPosition {
    pub level: String,
    pub x: f32,
    pub y: f32,
}

/// The viewport's top-left corner in global pixel space, plus padding used
/// to over-fetch level content around the visible area.
#[derive(Debug, Clone, Copy, Default)]
pub struct Camera {
    pub position: Vec2,
    pub padding: f32,
}

impl Camera {
    pub fn new(padding: f32) -> Self {
        Self {
            position: Vec2::default(),
            padding,
        }
    }

    /// Resolve the named level's origin offsets. `None` (with a warning)
    /// when the level is not placed in the overworld.
    pub fn level_location(
        &self,
        overworld: &Overworld,
        level_name: &str,
        config: &GameConfig,
    ) -> Option<LevelLocation> {
        let Some((grid_x, grid_y)) = overworld.level_pos(level_name) else {
            warn!(level = level_name, "level_not_in_overworld");
            return None;
        };
        Some(LevelLocation {
            grid_x,
            grid_y,
            world_x: (grid_x * config.level_grid) as f32,
            world_y: (grid_y * config.level_grid) as f32,
            global_x: (grid_x * config.level_span()) as f32,
            global_y: (grid_y * config.level_span()) as f32,
        })
    }

    /// The player's absolute position: level origin plus the player's tile
    /// offset scaled to pixels.
    pub fn player_location(
        &self,
        overworld: &Overworld,
        level_name: &str,
        player_pos: Vec2,
        config: &GameConfig,
    ) -> Option<PlayerLocation> {
        let level = self.level_location(overworld, level_name, config)?;
        Some(PlayerLocation {
            world_x: level.world_x + player_pos.x,
            world_y: level.world_y + player_pos.y,
            global_x: level.global_x + player_pos.x * config.tile_grid as f32,
            global_y: level.global_y + player_pos.y * config.tile_grid as f32,
        })
    }

    pub fn view_rect(&self, viewport: Viewport) -> Rect {
        Rect {
            x: self.position.x,
            y: self.position.y,
            width: viewport.width as f32,
            height: viewport.height as f32,
        }
    }

    /// The view rect grown by `padding` on all four sides. Visibility
    /// prefetch slack only; never used for clamping.
    pub fn padded_view_rect(&self, viewport: Viewport) -> Rect {
        Rect {
            x: self.position.x - self.padding,
            y: self.position.y - self.padding,
            width: viewport.width as f32 + 2.0 * self.padding,
            height: viewport.height as f32 + 2.0 * self.padding,
        }
    }

    pub fn global_to_screen(&self, global_x: f32, global_y: f32) -> Vec2 {
        Vec2 {
            x: global_x - self.position.x,
            y: global_y - self.position.y,
        }
    }

    pub fn screen_to_global(&self, screen_x: f32, screen_y: f32) -> Vec2 {
        Vec2 {
            x: screen_x + self.position.x,
            y: screen_y + self.position.y,
        }
    }

    /// Resolve an attempted tile-space position against the current level's
    /// boundaries. Each axis is handled independently: crossing an edge
    /// with a neighbor present wraps the coordinate into the neighbor's
    /// local space, otherwise the coordinate clamps. The south clamp stops
    /// one row early so the avatar sprite never hangs past the bottom row.
    /// At most one axis transitions per call.
    pub fn check_player_position(
        &self,
        overworld: &Overworld,
        level_name: &str,
        x: f32,
        y: f32,
        config: &GameConfig,
    ) -> Option<PlacedPosition> {
        let location = self.level_location(overworld, level_name, config)?;
        let grid_x = location.grid_x as i32;
        let grid_y = location.grid_y as i32;
        let level_width = config.level_grid as f32;
        let level_height = config.level_grid as f32;

        let north = overworld.level_at(grid_x, grid_y - 1);
        let east = overworld.level_at(grid_x + 1, grid_y);
        let south = overworld.level_at(grid_x, grid_y + 1);
        let west = overworld.level_at(grid_x - 1, grid_y);

        let min_x = 0.0;
        let max_x = if east.is_some() {
            level_width
        } else {
            level_width - 1.0
        };
        let min_y = 0.0;
        let max_y = if south.is_some() {
            level_height
        } else {
            level_height - 2.0
        };

        let mut new_grid_x = grid_x;
        let mut new_grid_y = grid_y;
        let mut crossed = false;

        let new_x = if x < min_x && west.is_some() {
            new_grid_x -= 1;
            crossed = true;
            level_width - (min_x - x)
        } else if x > max_x && east.is_some() {
            new_grid_x += 1;
            crossed = true;
            x - max_x
        } else {
            x.max(min_x).min(max_x)
        };

        // Only one axis may cross per call; a simultaneous y overshoot
        // clamps and resolves on a later call.
        let new_y = if !crossed && y < min_y && north.is_some() {
            new_grid_y -= 1;
            level_height - (min_y - y)
        } else if !crossed && y > max_y && south.is_some() {
            new_grid_y += 1;
            y - max_y
        } else {
            y.max(min_y).min(max_y)
        };

        let level = overworld
            .level_at(new_grid_x, new_grid_y)
            .map(|next| next.name().to_string())
            .unwrap_or_else(|| level_name.to_string());
        Some(PlacedPosition {
            level,
            x: new_x,
            y: new_y,
        })
    }

    /// Recenter on the player, clamped to the world bounds, snapped to
    /// whole pixels.
    pub fn update(
        &mut self,
        overworld: &Overworld,
        level_name: &str,
        player_pos: Vec2,
        viewport: Viewport,
        config: &GameConfig,
    ) -> bool {
        let Some(player) = self.player_location(overworld, level_name, player_pos, config) else {
            return false;
        };
        let span = config.level_span() as f32;
        let global_width = overworld.width() as f32 * span;
        let global_height = overworld.height() as f32 * span;

        let cam_x = player.global_x - viewport.width as f32 / 2.0;
        let cam_y = player.global_y - viewport.height as f32 / 2.0;
        self.position = Vec2 {
            x: cam_x.min(global_width - viewport.width as f32).max(0.0).round(),
            y: cam_y
                .min(global_height - viewport.height as f32)
                .max(0.0)
                .round(),
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::level::Level;
    use crate::content::Tile;

    fn config() -> GameConfig {
        GameConfig::default()
    }

    fn blank_level(name: &str, config: &GameConfig) -> Level {
        let side = config.level_grid as usize;
        let board = vec![vec![Tile::invalid(); side]; side];
        Level::new(name, board, config).expect("level")
    }

    fn two_by_one_world(config: &GameConfig) -> Overworld {
        let mut overworld = Overworld::new("map1");
        overworld.add_level(blank_level("west", config), 0, 0);
        overworld.add_level(blank_level("east", config), 1, 0);
        overworld
    }

    #[test]
    fn global_and_screen_conversions_are_inverse() {
        let mut camera = Camera::new(0.0);
        camera.position = Vec2 { x: 100.0, y: 50.0 };
        let screen = camera.global_to_screen(130.0, 80.0);
        assert_eq!((screen.x, screen.y), (30.0, 30.0));
        let global = camera.screen_to_global(screen.x, screen.y);
        assert_eq!((global.x, global.y), (130.0, 80.0));
    }

    #[test]
    fn padded_rect_expands_every_side() {
        let camera = Camera {
            position: Vec2 { x: 10.0, y: 20.0 },
            padding: 5.0,
        };
        let viewport = Viewport {
            width: 100,
            height: 60,
        };
        let rect = camera.padded_view_rect(viewport);
        assert_eq!((rect.x, rect.y), (5.0, 15.0));
        assert_eq!((rect.width, rect.height), (110.0, 70.0));
    }

    #[test]
    fn player_location_offsets_by_level_origin() {
        let config = config();
        let overworld = two_by_one_world(&config);
        let camera = Camera::new(0.0);
        let player = camera
            .player_location(
                &overworld,
                "east",
                Vec2 { x: 2.0, y: 3.0 },
                &config,
            )
            .expect("location");
        assert_eq!(player.global_x, 1024.0 + 32.0);
        assert_eq!(player.global_y, 48.0);
    }

    #[test]
    fn missing_level_yields_none() {
        let config = config();
        let overworld = two_by_one_world(&config);
        let camera = Camera::new(0.0);
        assert!(camera
            .level_location(&overworld, "nowhere", &config)
            .is_none());
        assert!(camera
            .check_player_position(&overworld, "nowhere", 1.0, 1.0, &config)
            .is_none());
    }

    #[test]
    fn east_edge_without_neighbor_clamps() {
        let config = config();
        let overworld = two_by_one_world(&config);
        let camera = Camera::new(0.0);
        // "east" has no east neighbor: x clamps at level_grid - 1.
        let placed = camera
            .check_player_position(&overworld, "east", 64.5, 10.0, &config)
            .expect("placed");
        assert_eq!(placed.level, "east");
        assert_eq!(placed.x, 63.0);
    }

    #[test]
    fn east_overshoot_with_neighbor_wraps_into_it() {
        let config = config();
        let overworld = two_by_one_world(&config);
        let camera = Camera::new(0.0);
        // "west" has an east neighbor: past max, the overshoot carries over.
        let placed = camera
            .check_player_position(&overworld, "west", 64.5, 10.0, &config)
            .expect("placed");
        assert_eq!(placed.level, "east");
        assert_eq!(placed.x, 0.5);
    }

    #[test]
    fn position_exactly_at_max_does_not_transition() {
        let config = config();
        let overworld = two_by_one_world(&config);
        let camera = Camera::new(0.0);
        let placed = camera
            .check_player_position(&overworld, "west", 64.0, 10.0, &config)
            .expect("placed");
        assert_eq!(placed.level, "west");
        assert_eq!(placed.x, 64.0);
    }

    #[test]
    fn south_edge_without_neighbor_clamps_one_row_early() {
        let config = config();
        let overworld = two_by_one_world(&config);
        let camera = Camera::new(0.0);
        let placed = camera
            .check_player_position(&overworld, "west", 10.0, 70.0, &config)
            .expect("placed");
        assert_eq!(placed.level, "west");
        // Intentional inset: south clamp is level_grid - 2.
        assert_eq!(placed.y, 62.0);
    }

    #[test]
    fn only_one_axis_transitions_per_call() {
        let config = config();
        let mut overworld = two_by_one_world(&config);
        overworld.add_level(blank_level("southwest", &config), 0, 1);
        let camera = Camera::new(0.0);
        // Overshoot both axes from "west": x wraps east, y only clamps.
        let placed = camera
            .check_player_position(&overworld, "west", 65.0, 65.0, &config)
            .expect("placed");
        assert_eq!(placed.level, "east");
        assert_eq!(placed.x, 1.0);
        assert_eq!(placed.y, 64.0);
    }

    #[test]
    fn update_centers_then_clamps_to_world() {
        let config = config();
        let overworld = two_by_one_world(&config);
        let mut camera = Camera::new(0.0);
        let viewport = Viewport {
            width: 480,
            height: 270,
        };
        // Player near origin: camera clamps to 0.
        assert!(camera.update(
            &overworld,
            "west",
            Vec2 { x: 1.0, y: 1.0 },
            viewport,
            &config
        ));
        assert_eq!((camera.position.x, camera.position.y), (0.0, 0.0));

        // Player deep in the east level: camera clamps to the world edge.
        assert!(camera.update(
            &overworld,
            "east",
            Vec2 { x: 63.0, y: 63.0 },
            viewport,
            &config
        ));
        assert_eq!(camera.position.x, 2.0 * 1024.0 - 480.0);
        assert_eq!(camera.position.y, 1024.0 - 270.0);
    }
}
