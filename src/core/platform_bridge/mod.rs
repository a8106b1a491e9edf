//=========================================================================
// Platform Bridge
//=========================================================================
//
// Bridges the platform layer (winit/wgpu) with core systems.
//
// Core code depends only on the traits defined here; `crate::platform`
// provides the shipped implementations.
//
//=========================================================================

//=== Module Declarations =================================================

mod interface;

//=== Public API ==========================================================

pub use interface::{
    FrameRenderer, PlatformBackend, PlatformError, UiDrawData, WindowConfig, WindowHost,
    DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH,
};
