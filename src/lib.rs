//=========================================================================
// Breach Engine — Library Root
//
// Stage-driven bootstrap and frame-loop host for a desktop game.
//
// Responsibilities:
// - Expose the engine facade (`Engine`, `EngineBuilder`)
// - Expose the stage contract so games can register their own stages
// - Ship the desktop backend (`WinitBackend`) and the startup stages
//
// Typical usage:
// ```no_run
// use breach_engine::prelude::*;
// use breach_engine::WinitBackend;
//
// fn main() -> std::process::ExitCode {
//     EngineBuilder::new()
//         .with_stage(LauncherStage::new())
//         .with_stage(SplashStage::new())
//         .with_stage(PreloadStage::new("assets"))
//         .build()
//         .run(WinitBackend::new())
//         .into()
// }
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` holds the platform-independent host: stages, subsystems, the
// frame loop and the traits the platform backend implements.
//
// `stages` holds the shipped Launcher, Splash and Preload stages.
//
pub mod core;
pub mod prelude;
pub mod stages;

//--- Internal Modules ----------------------------------------------------
//
// `platform` holds the winit, wgpu and kira integrations. Only the types
// an application needs to pick a backend are re-exported.
//
mod engine;
mod platform;

//--- Public Exports ------------------------------------------------------

pub use engine::{
    Engine, EngineBuilder, ExitStatus, DEFAULT_LANGUAGE_DIR, DEFAULT_OPTIONS_FILE,
    MAX_EVENT_TIMEOUT,
};
pub use platform::{KiraAudioEngine, WgpuRenderer, WinitBackend, WinitWindow};
