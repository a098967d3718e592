use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use engine::{
    AnchorArena, Animator, Camera, Gallery, GameConfig, InputAction, InputSnapshot, Level,
    Overworld, PixelSurface, Soundboard, TickEvent, TileCodec, TileDefs, Tileset, Viewport,
};

use super::player::{Direction, Player, SWORD_TURBO_TICKS};
use crate::app::{PlaySession, PlayState};

const OPEN: &str = "AA";
const WALL: &str = "AB";

/// Records every effect the session plays so tests can assert on audio.
#[derive(Clone, Default)]
struct RecordingBoard {
    played: Rc<RefCell<Vec<(String, f32)>>>,
}

impl RecordingBoard {
    fn names(&self) -> Vec<String> {
        self.played.borrow().iter().map(|(n, _)| n.clone()).collect()
    }

    fn count(&self, name: &str) -> usize {
        self.played.borrow().iter().filter(|(n, _)| n == name).count()
    }
}

impl Soundboard for RecordingBoard {
    fn play(&mut self, name: &str, volume: f32) {
        self.played.borrow_mut().push((name.to_string(), volume));
    }
}

fn test_tileset() -> Tileset {
    let mut defs = TileDefs::new();
    defs.add_codes("BLOCK", [WALL]).expect("block codes");
    Tileset::new("pics1", PixelSurface::new(4, 4), defs)
}

fn level_with_walls(name: &str, walls: &[(u32, u32)], config: &GameConfig) -> Level {
    let codec = TileCodec::new();
    let open = codec.decode_str(OPEN).expect("open tile");
    let wall = codec.decode_str(WALL).expect("wall tile");
    let side = config.level_grid as usize;
    let mut board = vec![vec![open; side]; side];
    for &(x, y) in walls {
        board[y as usize][x as usize] = wall;
    }
    let mut level = Level::new(name, board, config).expect("level");
    level.render(config, &test_tileset());
    level
}

struct WorldSpec<'a> {
    name: &'a str,
    grid: (u32, u32),
    walls: Vec<(u32, u32)>,
}

fn session_with(
    levels: Vec<WorldSpec<'_>>,
    start_level: &str,
    start: (f32, f32),
) -> (PlaySession, RecordingBoard) {
    let config = GameConfig::default();
    let mut overworld = Overworld::new("map1");
    for entry in &levels {
        let level = level_with_walls(entry.name, &entry.walls, &config);
        overworld.add_level(level, entry.grid.0, entry.grid.1);
    }
    let mut arena = AnchorArena::new();
    let player = Player::new(&mut arena, &config, start_level, start.0, start.1);
    let board = RecordingBoard::default();
    let viewport = Viewport {
        width: 480,
        height: 270,
    };
    let state = PlayState {
        config,
        viewport,
        camera: Camera::new(64.0),
        overworld,
        tileset: test_tileset(),
        arena,
        player,
        animator: Animator::new(),
        gallery: Gallery::new("test-assets"),
        soundboard: Box::new(board.clone()),
        input: InputSnapshot::empty(),
        quit: false,
    };
    (PlaySession::new(state), board)
}

fn open_session(start: (f32, f32)) -> (PlaySession, RecordingBoard) {
    session_with(
        vec![WorldSpec {
            name: "solo",
            grid: (0, 0),
            walls: Vec::new(),
        }],
        "solo",
        start,
    )
}

fn held(actions: &[InputAction]) -> InputSnapshot {
    actions
        .iter()
        .fold(InputSnapshot::empty(), |snapshot, &action| {
            snapshot.with_action_down(action, true)
        })
}

/// Run ticks `[from, to)` against the session with the same input held.
fn run_ticks(session: &mut PlaySession, input: InputSnapshot, from: u64, to: u64) {
    for tick_count in from..to {
        let event = TickEvent {
            elapsed: Duration::from_millis(tick_count * 16),
            tick_delay: Duration::from_millis(16),
            tick_count,
        };
        session.tick(&event, &input);
    }
}

fn player_pos(session: &PlaySession) -> (f32, f32) {
    let state = session.state();
    let pos = state.arena.position(state.player.anchor);
    (pos.x, pos.y)
}

#[test]
fn holding_right_walks_east() {
    let (mut session, _) = open_session((10.0, 10.0));
    run_ticks(&mut session, held(&[InputAction::MoveRight]), 1, 9);

    // Pulses land on even ticks: 4 steps of half a tile.
    let (x, y) = player_pos(&session);
    assert!((x - 12.0).abs() < 1e-4, "x was {x}");
    assert!((y - 10.0).abs() < 1e-4, "y was {y}");
    assert_eq!(session.state().player.mode(), "walk");
    assert_eq!(session.state().player.dir(), Direction::Right);
}

#[test]
fn odd_ticks_do_not_pulse() {
    let (mut session, _) = open_session((10.0, 10.0));
    run_ticks(&mut session, held(&[InputAction::MoveRight]), 1, 2);
    assert_eq!(player_pos(&session), (10.0, 10.0));
    run_ticks(&mut session, held(&[InputAction::MoveRight]), 2, 3);
    assert_eq!(player_pos(&session), (10.5, 10.0));
}

#[test]
fn released_keys_return_the_player_to_idle() {
    let (mut session, _) = open_session((10.0, 10.0));
    run_ticks(&mut session, held(&[InputAction::MoveRight]), 1, 5);
    assert_eq!(session.state().player.mode(), "walk");
    run_ticks(&mut session, InputSnapshot::empty(), 5, 9);
    assert_eq!(session.state().player.mode(), "idle");
}

#[test]
fn wall_column_stops_eastward_walking() {
    let walls: Vec<(u32, u32)> = (0..64).map(|y| (12, y)).collect();
    let (mut session, _) = session_with(
        vec![WorldSpec {
            name: "walled",
            grid: (0, 0),
            walls,
        }],
        "walled",
        (10.0, 10.0),
    );
    run_ticks(&mut session, held(&[InputAction::MoveRight]), 1, 41);

    // The collider is a tile wide centered on the anchor, so the anchor
    // can never reach closer than half a tile from the wall face.
    let (x, y) = player_pos(&session);
    assert!(x < 11.5, "x was {x}");
    assert!(x > 10.5, "walked distance missing, x was {x}");
    assert!((y - 10.0).abs() < 1e-4);

    // And the position is at rest: more walking changes nothing.
    let resting = player_pos(&session);
    run_ticks(&mut session, held(&[InputAction::MoveRight]), 41, 61);
    assert_eq!(player_pos(&session), resting);
}

#[test]
fn fully_blocked_player_does_not_move() {
    let mut walls = Vec::new();
    for y in 9..=13 {
        for x in 9..=13 {
            walls.push((x, y));
        }
    }
    let (mut session, _) = session_with(
        vec![WorldSpec {
            name: "boxed",
            grid: (0, 0),
            walls,
        }],
        "boxed",
        (10.0, 10.0),
    );
    run_ticks(&mut session, held(&[InputAction::MoveRight]), 1, 21);
    assert_eq!(player_pos(&session), (10.0, 10.0));
    run_ticks(&mut session, held(&[InputAction::MoveUp]), 21, 41);
    assert_eq!(player_pos(&session), (10.0, 10.0));
}

#[test]
fn corner_contact_slides_along_the_open_side() {
    // One wall tile ahead at head height: the lower flank is open, so
    // walking east should shed into a downward slide.
    let (mut session, _) = session_with(
        vec![WorldSpec {
            name: "corner",
            grid: (0, 0),
            walls: vec![(12, 10)],
        }],
        "corner",
        (10.0, 10.0),
    );
    run_ticks(&mut session, held(&[InputAction::MoveRight]), 1, 41);

    let (x, y) = player_pos(&session);
    assert!(y > 10.4, "expected a downward slide, y was {y}");
    assert!(x > 11.0, "expected eastward progress, x was {x}");
}

#[test]
fn east_overshoot_with_neighbor_wraps_into_it() {
    let (mut session, _) = session_with(
        vec![
            WorldSpec {
                name: "west",
                grid: (0, 0),
                walls: Vec::new(),
            },
            WorldSpec {
                name: "east",
                grid: (1, 0),
                walls: Vec::new(),
            },
        ],
        "west",
        (63.2, 10.0),
    );
    run_ticks(&mut session, held(&[InputAction::MoveRight]), 1, 5);

    assert_eq!(session.state().player.level(), "east");
    let (x, _) = player_pos(&session);
    assert!((x - 0.2).abs() < 1e-3, "wrapped x was {x}");
}

#[test]
fn east_edge_without_neighbor_clamps() {
    let (mut session, _) = open_session((62.5, 10.0));
    run_ticks(&mut session, held(&[InputAction::MoveRight]), 1, 21);

    assert_eq!(session.state().player.level(), "solo");
    let (x, _) = player_pos(&session);
    assert!((x - 63.0).abs() < 1e-4, "clamped x was {x}");
}

#[test]
fn sword_swing_locks_until_turbo_expires_then_shifts_back() {
    let (mut session, board) = session_with(
        vec![WorldSpec {
            name: "solo",
            grid: (0, 0),
            walls: Vec::new(),
        }],
        "solo",
        (10.0, 10.0),
    );
    let sword = held(&[InputAction::Sword]);

    // First pulse at tick 2 signals the gear; the swing holds while the
    // turbo window (signaled + SWORD_TURBO_TICKS) is open.
    run_ticks(&mut session, sword, 1, 2 + SWORD_TURBO_TICKS - 2);
    assert_eq!(session.state().player.mode(), "sword");
    assert_eq!(board.count("sword"), 1);

    // Past the window the gear locks out and shifts back to idle, even
    // though the key is still held.
    run_ticks(&mut session, sword, 2 + SWORD_TURBO_TICKS - 2, 40);
    assert_eq!(session.state().player.mode(), "idle");
    assert_eq!(board.count("sword"), 1);

    // Releasing and pressing again starts a fresh swing.
    run_ticks(&mut session, InputSnapshot::empty(), 40, 44);
    run_ticks(&mut session, sword, 44, 48);
    assert_eq!(session.state().player.mode(), "sword");
    assert_eq!(board.count("sword"), 2);
}

#[test]
fn footsteps_alternate_two_samples_over_the_cycle() {
    let (mut session, board) = session_with(
        vec![WorldSpec {
            name: "solo",
            grid: (0, 0),
            walls: Vec::new(),
        }],
        "solo",
        (10.0, 10.0),
    );
    // 11 walk steps: the cycle is 10 steps with samples at 0 and 5.
    run_ticks(&mut session, held(&[InputAction::MoveDown]), 1, 24);

    let steps: Vec<String> = board
        .names()
        .into_iter()
        .filter(|name| name.starts_with("steps"))
        .collect();
    assert_eq!(steps, vec!["steps", "steps2", "steps"]);
}

#[test]
fn quit_request_propagates_through_the_session() {
    use engine::Session as _;

    let (mut session, _) = open_session((10.0, 10.0));
    assert!(!session.quit_requested());
    run_ticks(
        &mut session,
        InputSnapshot::empty().with_quit_requested(true),
        1,
        2,
    );
    assert!(session.quit_requested());
}

#[test]
fn camera_follows_the_player_between_ticks() {
    let (mut session, _) = session_with(
        vec![
            WorldSpec {
                name: "west",
                grid: (0, 0),
                walls: Vec::new(),
            },
            WorldSpec {
                name: "east",
                grid: (1, 0),
                walls: Vec::new(),
            },
        ],
        "west",
        (32.0, 32.0),
    );
    run_ticks(&mut session, InputSnapshot::empty(), 1, 3);
    let centered = session.state().camera.position;
    // Player at tile (32,32) of the west level: global (512, 512); the
    // camera centers the 480x270 viewport on it.
    assert_eq!(centered.x, 512.0 - 240.0);
    assert_eq!(centered.y, 512.0 - 135.0);
}
