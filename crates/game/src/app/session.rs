use engine::app::rendering::{draw_ani_frame, draw_placeholder};
use engine::{
    AnchorArena, Animator, Camera, Gallery, GameConfig, InputSnapshot, Overworld, PixelSurface,
    Session, Soundboard, TickEvent, TickRoster, Tileset, Viewport,
};

use super::gameplay::motion::MotionContext;
use super::gameplay::player::Player;

/// The avatar animation view is 48x48 centered on the focus point.
const AVATAR_VIEW_OFFSET: f32 = -24.0;

/// Everything a running play session owns. Tick slots mutate this through
/// the roster; rendering reads it.
pub struct PlayState {
    pub config: GameConfig,
    pub viewport: Viewport,
    pub camera: Camera,
    pub overworld: Overworld,
    pub tileset: Tileset,
    pub arena: AnchorArena,
    pub player: Player,
    pub animator: Animator,
    pub gallery: Gallery,
    pub soundboard: Box<dyn Soundboard>,
    pub input: InputSnapshot,
    pub quit: bool,
}

impl PlayState {
    fn io_update(&mut self) {
        self.player.set_held(self.input);
        if self.input.quit_requested() {
            self.quit = true;
        }
    }

    fn gameboard_update(&mut self) {
        let pos = self.arena.position(self.player.anchor);
        self.camera.update(
            &self.overworld,
            self.player.level(),
            pos,
            self.viewport,
            &self.config,
        );
    }

    fn animator_update(&mut self) {
        self.animator.tick();
    }

    fn player_pulse(&mut self, event: &TickEvent) {
        let PlayState {
            config,
            camera,
            overworld,
            arena,
            player,
            animator,
            soundboard,
            ..
        } = self;
        let mut ctx = MotionContext {
            config,
            overworld,
            camera,
            arena,
            animator,
            soundboard: soundboard.as_mut(),
        };
        player.pulse(event.tick_count, &mut ctx);
    }
}

/// The session the loop runner drives: a tick roster firing the four
/// fixed slots in registration order, over the shared play state.
pub struct PlaySession {
    state: PlayState,
    roster: TickRoster<PlayState>,
}

impl PlaySession {
    pub fn new(state: PlayState) -> Self {
        let mut roster = TickRoster::new();
        roster.register("input-output", |_event, state: &mut PlayState| {
            state.io_update()
        });
        roster.register("gameboard", |_event, state: &mut PlayState| {
            state.gameboard_update()
        });
        roster.register("animator", |_event, state: &mut PlayState| {
            state.animator_update()
        });
        roster.register("player-pulse", |event, state: &mut PlayState| {
            state.player_pulse(event)
        });
        Self { state, roster }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> &PlayState {
        &self.state
    }

    /// Drive one tick outside the windowed loop (tests, headless runs).
    pub fn tick(&mut self, event: &TickEvent, input: &InputSnapshot) {
        self.state.input = *input;
        self.roster.emit(event, &mut self.state);
    }
}

impl Session for PlaySession {
    fn on_tick(&mut self, event: &TickEvent, input: &InputSnapshot) {
        self.tick(event, input);
    }

    fn render(&mut self, screen: &mut PixelSurface, viewport: Viewport) {
        let state = &mut self.state;
        let padded = state.camera.padded_view_rect(viewport);
        let snapshot = state.overworld.snapshot(&state.camera, padded, &state.config);
        state.overworld.render_visible(screen, &snapshot);

        let focus = state.arena.global_position(state.player.focus);
        let origin = engine::Vec2 {
            x: focus.x + AVATAR_VIEW_OFFSET,
            y: focus.y + AVATAR_VIEW_OFFSET,
        };
        match state.animator.active_frame() {
            Some((def, frame)) => {
                draw_ani_frame(
                    screen,
                    def,
                    frame,
                    origin,
                    &mut state.gallery,
                    state.player.skins(),
                );
            }
            None => {
                // No loaded ani for the current gear: draw the stand-in
                // square at the player's spot.
                draw_placeholder(
                    screen,
                    focus.x.round() as i32,
                    focus.y.round() as i32,
                );
            }
        }
    }

    fn quit_requested(&self) -> bool {
        self.state.quit
    }
}
