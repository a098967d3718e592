use std::collections::HashMap;

use tracing::warn;

use crate::content::{AniDef, AniFrame};

/// Playback state for one animation definition. `state` is the facing
/// direction; multi-frame anis are laid out as consecutive 4-direction
/// groups, so the rendered frame is `cycle * 4 + state` for continuous
/// anis and plain `state` for held stances.
#[derive(Debug, Clone)]
pub struct AniView {
    def: AniDef,
    cycle: usize,
    playing: bool,
    state: u8,
}

const DIRECTION_GROUP: usize = 4;

impl AniView {
    pub fn new(def: AniDef) -> Self {
        Self {
            def,
            cycle: 0,
            playing: false,
            state: 0,
        }
    }

    pub fn def(&self) -> &AniDef {
        &self.def
    }

    pub fn set_state(&mut self, state: u8) {
        self.state = state;
    }

    pub fn state(&self) -> u8 {
        self.state
    }

    pub fn reset(&mut self) {
        self.cycle = 0;
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Advance one animator tick. Only continuous anis cycle; stances hold
    /// their direction frame.
    pub fn tick(&mut self) {
        if self.playing && self.def.is_continuous() {
            self.cycle = self.cycle.wrapping_add(1);
        }
    }

    pub fn current_frame(&self) -> Option<&AniFrame> {
        let frames = &self.def.frames;
        if frames.is_empty() {
            return None;
        }
        if frames.len() >= DIRECTION_GROUP {
            let groups = frames.len() / DIRECTION_GROUP;
            let group = if self.def.is_continuous() {
                self.cycle % groups
            } else {
                0
            };
            frames
                .get(group * DIRECTION_GROUP + self.state as usize)
                .or_else(|| frames.first())
        } else {
            frames.get(self.cycle % frames.len())
        }
    }
}

/// Holds the loaded animation views and tracks which one is the active
/// avatar. All playing views advance each animator tick.
#[derive(Debug, Default)]
pub struct Animator {
    views: HashMap<String, AniView>,
    active: Option<String>,
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str, def: AniDef) {
        self.views.insert(name.to_string(), AniView::new(def));
    }

    pub fn has(&self, name: &str) -> bool {
        self.views.contains_key(name)
    }

    /// Swap the avatar to another ani: the old view stops, the new one is
    /// reset to the given facing and starts playing. Unknown names warn
    /// and leave the current avatar in place.
    pub fn set_active(&mut self, name: &str, state: u8) -> bool {
        if !self.views.contains_key(name) {
            warn!(ani = name, "unknown_ani");
            return false;
        }
        if let Some(previous) = self.active.as_ref().and_then(|n| self.views.get_mut(n.as_str())) {
            previous.stop();
            previous.reset();
        }
        if let Some(view) = self.views.get_mut(name) {
            view.set_state(state);
            view.reset();
            view.play();
        }
        self.active = Some(name.to_string());
        true
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn set_direction(&mut self, state: u8) {
        if let Some(view) = self.active.as_ref().and_then(|n| self.views.get_mut(n.as_str())) {
            view.set_state(state);
        }
    }

    pub fn tick(&mut self) {
        for view in self.views.values_mut() {
            view.tick();
        }
    }

    pub fn active_view(&self) -> Option<&AniView> {
        self.active.as_ref().and_then(|name| self.views.get(name))
    }

    pub fn active_frame(&self) -> Option<(&AniDef, &AniFrame)> {
        let view = self.active_view()?;
        Some((view.def(), view.current_frame()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::parse_ani;

    fn walk_def() -> AniDef {
        // Two 4-direction groups, continuous.
        parse_ani(
            "walk",
            "OPTS\nCONTINUOUS\nOPTSEND\nANI\n0 0 0\n\n0 0 1\n\n0 0 2\n\n0 0 3\n\n0 1 0\n\n0 1 1\n\n0 1 2\n\n0 1 3\nANIEND\n",
        )
    }

    fn idle_def() -> AniDef {
        parse_ani("idle", "ANI\n0 0 0\n\n0 0 1\n\n0 0 2\n\n0 0 3\nANIEND\n")
    }

    #[test]
    fn stance_holds_the_direction_frame() {
        let mut view = AniView::new(idle_def());
        view.set_state(2);
        view.play();
        view.tick();
        view.tick();
        let frame = view.current_frame().expect("frame");
        assert_eq!(frame.layers[0].placements[0].dy, 2);
    }

    #[test]
    fn continuous_ani_cycles_direction_groups() {
        let mut view = AniView::new(walk_def());
        view.set_state(1);
        view.play();
        assert_eq!(
            view.current_frame().expect("frame").layers[0].placements[0].dy,
            1
        );
        view.tick();
        let frame = view.current_frame().expect("frame");
        assert_eq!(frame.layers[0].placements[0].dx, 1);
        assert_eq!(frame.layers[0].placements[0].dy, 1);
    }

    #[test]
    fn animator_swaps_avatars_and_rejects_unknown_names() {
        let mut animator = Animator::new();
        animator.add("idle", idle_def());
        animator.add("walk", walk_def());

        assert!(animator.set_active("idle", 2));
        assert_eq!(animator.active_name(), Some("idle"));
        assert!(!animator.set_active("sword", 2));
        assert_eq!(animator.active_name(), Some("idle"));

        assert!(animator.set_active("walk", 3));
        let view = animator.active_view().expect("view");
        assert!(view.is_playing());
        assert_eq!(view.state(), 3);
    }
}
