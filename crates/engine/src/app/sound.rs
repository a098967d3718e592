use tracing::debug;

/// Seam for sound effect playback. Gameplay code emits effect keys
/// (`steps`, `steps2`, `sword`); what actually renders them is a
/// collaborator outside the engine core.
pub trait Soundboard {
    fn play(&mut self, name: &str, volume: f32);
}

/// Default board: logs each effect instead of playing it, so a session
/// without an audio backend still shows what would have sounded.
#[derive(Debug, Default)]
pub struct LogSoundboard;

impl Soundboard for LogSoundboard {
    fn play(&mut self, name: &str, volume: f32) {
        debug!(sound = name, volume, "sound_play");
    }
}
