//=========================================================================
// Shipped Stages
//=========================================================================
//
// The startup chain run before the game proper:
//
//   Launcher ──confirm──→ Splash ──timeout/skip──→ Preload ──done──→ MainMenu
//
// `MainMenu` and `Game` have no shipped stage; selecting them leaves the
// window presenting the clear colour.
//
//=========================================================================

//=== Module Declarations =================================================

mod launcher;
mod preload;
mod splash;

//=== Public API ==========================================================

pub use launcher::LauncherStage;
pub use preload::{PreloadFailure, PreloadStage, DEFAULT_FILES_PER_FRAME};
pub use splash::{SplashStage, DEFAULT_SPLASH_DURATION, SPLASH_ACHIEVEMENT};
