//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use breach_engine::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// UI toolkit stages draw with
pub use egui;

// Engine core
pub use crate::engine::{Engine, EngineBuilder, ExitStatus};

// Stage system
pub use crate::core::frame_loop::{FrameContext, FrameEvents};
pub use crate::core::stage::{Stage, StageError, StageKey, StageState};

// Subsystems
pub use crate::core::subsystems::{
    AudioEngine, AudioEvent, Localization, OptionsStore, PlatformService, ServiceEvent, SoundId,
    Subsystems, GAME_CHANNEL, MUSIC_CHANNEL,
};

// Shipped stages
pub use crate::stages::{LauncherStage, PreloadStage, SplashStage};
