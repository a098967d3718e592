use std::collections::HashMap;

use engine::{AnchorArena, AnchorId, GameConfig, InputAction, InputSnapshot, Overworld};
use tracing::warn;

use super::motion::{self, MotionContext};

/// Sword swings lock the gear for this many ticks before shifting back.
pub const SWORD_TURBO_TICKS: u64 = 20;
/// Footstep samples alternate across a cycle this many walk steps long.
const FOOTSTEP_PERIOD: u32 = 10;
const FOOTSTEP_VOLUME: f32 = 0.6;

const SKIN_TYPES: [&str; 4] = ["SPRITES", "HEAD", "BODY", "SWORD"];

pub const GEAR_IDLE: &str = "idle";
pub const GEAR_WALK: &str = "walk";
pub const GEAR_SWORD: &str = "sword";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up = 0,
    Left = 1,
    Down = 2,
    Right = 3,
}

impl Direction {
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }

    /// Sign of motion along the primary axis.
    pub fn sign(self) -> f32 {
        match self {
            Direction::Up | Direction::Left => -1.0,
            Direction::Down | Direction::Right => 1.0,
        }
    }

    /// Unit step in tile space.
    pub fn delta(self) -> (f32, f32) {
        match self {
            Direction::Up => (0.0, -1.0),
            Direction::Left => (-1.0, 0.0),
            Direction::Down => (0.0, 1.0),
            Direction::Right => (1.0, 0.0),
        }
    }
}

/// Direction keys checked in a fixed order, so multiple held arrows walk
/// in a stable sequence within one tick.
const DIRECTION_KEYS: [(InputAction, Direction); 4] = [
    (InputAction::MoveUp, Direction::Up),
    (InputAction::MoveLeft, Direction::Left),
    (InputAction::MoveDown, Direction::Down),
    (InputAction::MoveRight, Direction::Right),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GearTrigger {
    /// Never triggered by input (idle is the fallback gear).
    None,
    Key(InputAction),
    Arrows,
}

/// One player action state. `gearshifts` is the priority-ordered shortlist
/// of gears this gear may shift into; the first one with active input wins
/// each tick.
#[derive(Debug)]
pub struct Gear {
    pub name: &'static str,
    pub gearshifts: [&'static str; 3],
    pub trigger: GearTrigger,
    /// Hard cap in ticks; 0 means the gear can run indefinitely.
    pub turbo_ticks: u64,
    pub shiftback: Option<&'static str>,
    signaled: Option<u64>,
    turbo_blocked: bool,
}

impl Gear {
    fn new(
        name: &'static str,
        trigger: GearTrigger,
        turbo_ticks: u64,
        shiftback: Option<&'static str>,
    ) -> Self {
        Self {
            name,
            gearshifts: [GEAR_SWORD, GEAR_WALK, GEAR_IDLE],
            trigger,
            turbo_ticks,
            shiftback,
            signaled: None,
            turbo_blocked: false,
        }
    }
}

fn default_gears() -> Vec<Gear> {
    vec![
        Gear::new(GEAR_IDLE, GearTrigger::None, 0, None),
        Gear::new(
            GEAR_SWORD,
            GearTrigger::Key(InputAction::Sword),
            SWORD_TURBO_TICKS,
            Some(GEAR_IDLE),
        ),
        Gear::new(GEAR_WALK, GearTrigger::Arrows, 0, None),
    ]
}

/// The player avatar: level membership, anchors, gear state machine, and
/// input held this tick.
pub struct Player {
    level: String,
    /// Tile-unit position within the level.
    pub anchor: AnchorId,
    /// Tile-unit collision footprint, parented to `anchor`.
    pub collider: AnchorId,
    /// Pixel-unit animation focus in camera screen space.
    pub focus: AnchorId,
    dir: Direction,
    speed: f32,
    gears: Vec<Gear>,
    mode: String,
    held: InputSnapshot,
    sound_step: u32,
    skins: HashMap<String, String>,
}

impl Player {
    pub fn new(arena: &mut AnchorArena, config: &GameConfig, level: &str, x: f32, y: f32) -> Self {
        let anchor = arena.create();
        arena.graticulate(anchor, config.tile_grid);
        arena.resize(anchor, 1.0, 1.0);
        arena.move_to(anchor, x, y);

        let collider = arena.create();
        arena.graticulate(collider, config.tile_grid);
        arena.resize(collider, 1.0, 1.0);
        arena.move_to(collider, -0.5, 0.5);
        if let Err(error) = arena.set_parent(collider, anchor) {
            warn!(%error, "collider_parent_failed");
        }

        let focus = arena.create();
        arena.resize(focus, 32.0, 32.0);

        let skins = HashMap::from([
            ("SPRITES".to_string(), "sprites1".to_string()),
            ("HEAD".to_string(), "head17".to_string()),
            ("BODY".to_string(), "body".to_string()),
            ("SWORD".to_string(), "sword1".to_string()),
        ]);

        Self {
            level: level.to_string(),
            anchor,
            collider,
            focus,
            dir: Direction::Down,
            speed: 0.5,
            gears: default_gears(),
            mode: GEAR_IDLE.to_string(),
            held: InputSnapshot::empty(),
            sound_step: 0,
            skins,
        }
    }

    pub fn level(&self) -> &str {
        &self.level
    }

    /// Reassigning the level validates the name against the overworld; an
    /// unknown name is refused with a warning rather than corrupting the
    /// player's placement.
    pub fn set_level(&mut self, overworld: &Overworld, name: &str) -> bool {
        if overworld.level(name).is_none() {
            warn!(level = name, "player_level_unknown");
            return false;
        }
        self.level = name.to_string();
        true
    }

    pub fn dir(&self) -> Direction {
        self.dir
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    pub fn skins(&self) -> &HashMap<String, String> {
        &self.skins
    }

    /// Swap the image a sprite group draws from ('HEAD' -> 'head104', ...).
    pub fn skin(&mut self, skin_type: &str, filename: &str) -> bool {
        if !SKIN_TYPES.contains(&skin_type) {
            warn!(skin_type, "player_skin_invalid_type");
            return false;
        }
        self.skins
            .insert(skin_type.to_string(), filename.to_string());
        true
    }

    pub fn set_held(&mut self, held: InputSnapshot) {
        self.held = held;
    }

    /// Central per-tick update. The player acts every other tick; each
    /// active tick refocuses the animation anchor and resolves input into
    /// the gear machine.
    pub fn pulse(&mut self, tick_count: u64, ctx: &mut MotionContext<'_>) {
        if tick_count % 2 != 0 {
            return;
        }
        self.refocus(ctx);
        self.update_gears(tick_count, ctx);
    }

    /// Move the focus anchor to the player's current screen position so
    /// the avatar animation renders in the right place.
    fn refocus(&mut self, ctx: &mut MotionContext<'_>) {
        let pos = ctx.arena.position(self.anchor);
        let Some(location) =
            ctx.camera
                .player_location(ctx.overworld, &self.level, pos, ctx.config)
        else {
            return;
        };
        let screen = ctx
            .camera
            .global_to_screen(location.global_x, location.global_y);
        ctx.arena.move_to(self.focus, screen.x, screen.y);
    }

    fn update_gears(&mut self, tick_count: u64, ctx: &mut MotionContext<'_>) {
        // Stamp `signaled` on first press, clear state on release, and
        // collect the gears whose triggers are live and not turbo-blocked.
        let held = self.held;
        let mut active: HashMap<&'static str, Vec<Direction>> = HashMap::new();
        for gear in &mut self.gears {
            match trigger_directions(gear.trigger, held) {
                Some(dirs) => {
                    if !gear.turbo_blocked {
                        if gear.signaled.is_none() {
                            gear.signaled = Some(tick_count);
                        }
                        active.insert(gear.name, dirs);
                    }
                }
                None => {
                    gear.turbo_blocked = false;
                    gear.signaled = None;
                }
            }
        }

        // Walk the current gear's priority shortlist; the first gear with
        // active input decides the tick.
        let shortlist = self
            .gear(&self.mode)
            .map(|gear| gear.gearshifts)
            .unwrap_or([GEAR_SWORD, GEAR_WALK, GEAR_IDLE]);
        let mut enacted = false;
        for name in shortlist {
            let Some(dirs) = active.get(name).cloned() else {
                continue;
            };
            let Some(gear) = self.gear(name) else {
                continue;
            };
            let deadline = match (gear.turbo_ticks, gear.signaled) {
                (ticks, Some(signaled)) if ticks > 0 => Some(signaled + ticks),
                _ => None,
            };
            let blocked = gear.turbo_blocked;
            let shiftback = gear.shiftback;

            if deadline.map_or(true, |deadline| tick_count < deadline) {
                self.run_mode(name, &dirs, ctx);
                enacted = true;
            } else if !blocked {
                // Turbo expired: lock the gear until its key is released
                // and shift back once.
                if let Some(gear) = self.gear_mut(name) {
                    gear.turbo_blocked = true;
                }
                if let Some(back) = shiftback {
                    self.run_mode(back, &[], ctx);
                }
            }
            break;
        }

        if !enacted {
            self.run_mode(GEAR_IDLE, &[], ctx);
        }
    }

    fn gear(&self, name: &str) -> Option<&Gear> {
        self.gears.iter().find(|gear| gear.name == name)
    }

    fn gear_mut(&mut self, name: &str) -> Option<&mut Gear> {
        self.gears.iter_mut().find(|gear| gear.name == name)
    }

    fn run_mode(&mut self, name: &str, dirs: &[Direction], ctx: &mut MotionContext<'_>) {
        if self.mode != name {
            self.gearshift(name, ctx);
        }
        match name {
            GEAR_WALK => self.walk(dirs, ctx),
            GEAR_SWORD => self.slash(),
            _ => {}
        }
    }

    fn gearshift(&mut self, name: &str, ctx: &mut MotionContext<'_>) {
        self.mode = name.to_string();
        if name == GEAR_SWORD {
            ctx.soundboard.play("sword", 1.0);
        }
        ctx.animator.set_active(name, self.dir.index());
    }

    fn walk(&mut self, dirs: &[Direction], ctx: &mut MotionContext<'_>) {
        // Footsteps: two samples alternate at the start and midpoint of
        // the step cycle.
        if self.sound_step == 0 || self.sound_step == FOOTSTEP_PERIOD / 2 {
            let sample = if self.sound_step == 0 { "steps" } else { "steps2" };
            ctx.soundboard.play(sample, FOOTSTEP_VOLUME);
        }
        self.sound_step = (self.sound_step + 1) % FOOTSTEP_PERIOD;

        let speed = self.speed;
        for &dir in dirs {
            self.set_direction(dir, ctx);
            let (dx, dy) = dir.delta();
            motion::step(self, dx * speed, dy * speed, ctx);
        }
    }

    fn slash(&mut self) {
        // The swing itself is animation + gear lock; no world mutation.
    }

    fn set_direction(&mut self, dir: Direction, ctx: &mut MotionContext<'_>) {
        self.dir = dir;
        ctx.animator.set_direction(dir.index());
    }
}

fn trigger_directions(trigger: GearTrigger, held: InputSnapshot) -> Option<Vec<Direction>> {
    match trigger {
        GearTrigger::None => None,
        GearTrigger::Key(action) => held.is_down(action).then(Vec::new),
        GearTrigger::Arrows => {
            let dirs: Vec<Direction> = DIRECTION_KEYS
                .iter()
                .filter(|(action, _)| held.is_down(*action))
                .map(|&(_, dir)| dir)
                .collect();
            (!dirs.is_empty()).then_some(dirs)
        }
    }
}
