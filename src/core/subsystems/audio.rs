//=========================================================================
// Audio Engine Boundary
//=========================================================================
//
// Contract between the host and the audio mixing engine.
//
// The engine is created once during bootstrap (its constructor is the
// subsystem's init) and shut down once after every stage has been freed.
// Named channel groups are mixing buses with an independent linear gain.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::path::{Path, PathBuf};

use thiserror::Error;

//=== Channel Groups ======================================================

/// Bus for sound effects.
pub const GAME_CHANNEL: &str = "Game";

/// Bus for music and ambience.
pub const MUSIC_CHANNEL: &str = "Music";

/// Channel groups created at bootstrap, with the option key holding each
/// group's persisted volume percentage in the `[Audio]` section.
pub const CHANNEL_GROUPS: [(&str, &str); 2] = [
    (GAME_CHANNEL, "GameVolume"),
    (MUSIC_CHANNEL, "MusicVolume"),
];

//=== Types ===============================================================

/// Handle to one started sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundId(pub u64);

/// Completion events delivered by [`AudioEngine::run_callbacks`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioEvent {
    /// A sound reached its end or was stopped.
    Finished { sound: SoundId, channel: String },
}

/// Audio engine failures.
#[derive(Debug, Error)]
pub enum AudioError {
    /// The output device or mixer could not be started.
    #[error("audio backend unavailable: {0}")]
    Backend(String),

    /// A channel group with this name already exists.
    #[error("channel group '{0}' already exists")]
    DuplicateChannel(String),

    /// No channel group with this name exists.
    #[error("unknown channel group '{0}'")]
    UnknownChannel(String),

    /// A sound file could not be decoded.
    #[error("failed to load sound {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },

    /// The mixer refused to start a sound.
    #[error("failed to play sound: {0}")]
    Playback(String),
}

//=== AudioEngine Trait ===================================================

/// Operations the host and stages use on the audio engine.
pub trait AudioEngine {
    /// Creates a named channel group at unity gain.
    fn create_channel_group(&mut self, name: &str) -> Result<(), AudioError>;

    /// Sets a channel group's linear gain. Values outside `[0, 1]` are
    /// clamped.
    fn set_channel_group_volume(&mut self, name: &str, gain: f32) -> Result<(), AudioError>;

    /// Current linear gain of a channel group.
    fn channel_group_volume(&self, name: &str) -> Option<f32>;

    /// Starts a sound file on a channel group.
    fn play(&mut self, channel: &str, path: &Path) -> Result<SoundId, AudioError>;

    /// Stops a sound. Its `Finished` event arrives on a later callback pump.
    fn stop(&mut self, sound: SoundId);

    /// Pumps the engine's callback queue, appending completion events.
    ///
    /// Called once per frame before stage dispatch. Must return promptly.
    fn run_callbacks(&mut self, events: &mut Vec<AudioEvent>);

    /// Releases the engine. Later calls do nothing.
    fn shutdown(&mut self);
}

//=== Gain Helpers ========================================================

/// Converts a persisted volume percentage to a linear gain.
pub fn percent_to_gain(percent: i64) -> f32 {
    percent.clamp(0, 100) as f32 / 100.0
}

/// Lowest level the mixer distinguishes from silence.
pub const SILENCE_DB: f32 = -60.0;

/// Converts a linear gain to decibels for mixers that work in dB.
pub fn gain_to_decibels(gain: f32) -> f32 {
    let gain = gain.clamp(0.0, 1.0);
    if gain <= 0.001 {
        SILENCE_DB
    } else {
        (20.0 * gain.log10()).max(SILENCE_DB)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
