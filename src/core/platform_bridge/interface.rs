//=========================================================================
// Platform Bridge Interface
//=========================================================================
//
// Contract between the frame loop and a windowing + GPU backend.
//
//   PlatformBackend ──create_window()──→ WindowHost
//                   ──create_renderer()→ FrameRenderer
//
// The frame loop only sees these traits, so backends can be swapped (or
// faked in tests) without touching core code.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

//=== WindowConfig ========================================================

/// Default window width in logical pixels.
pub const DEFAULT_WINDOW_WIDTH: u32 = 640;

/// Default window height in logical pixels.
pub const DEFAULT_WINDOW_HEIGHT: u32 = 410;

/// Window creation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
    /// PNG file used as the window icon. A missing or unreadable file is
    /// logged and ignored.
    pub icon_path: Option<PathBuf>,
    /// Upper bound on how long one event pump may wait. Zero never blocks.
    pub event_timeout: Duration,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: String::from("Breach Engine"),
            width: DEFAULT_WINDOW_WIDTH,
            height: DEFAULT_WINDOW_HEIGHT,
            resizable: false,
            icon_path: None,
            event_timeout: Duration::ZERO,
        }
    }
}

//=== UiDrawData ==========================================================

/// Finalized UI output for one frame.
#[derive(Default)]
pub struct UiDrawData {
    pub primitives: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
}

//=== PlatformError =======================================================

/// Window and GPU bring-up failures. All are fatal.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Event loop creation failed (OS-level issue).
    #[error("event loop creation failed: {0}")]
    EventLoopCreation(String),

    /// The window could not be created.
    #[error("window creation failed: {0}")]
    WindowCreation(String),

    /// The GPU context could not be created.
    #[error("graphics initialization failed: {0}")]
    Graphics(String),
}

//=== WindowHost ==========================================================

/// An open window and its input source.
pub trait WindowHost {
    /// Returns true once the user or OS asked the window to close.
    fn close_requested(&self) -> bool;

    /// Processes pending window events, waiting at most the configured
    /// timeout.
    fn pump_events(&mut self);

    /// Connects the UI context to this window's input.
    fn attach_ui(&mut self, ui: &egui::Context);

    /// Input gathered since the previous call, for the next UI pass.
    fn take_ui_input(&mut self) -> egui::RawInput;

    /// Applies UI side effects (cursor icon, clipboard, IME).
    fn handle_ui_output(&mut self, output: egui::PlatformOutput);

    /// Current drawable size in physical pixels.
    fn drawable_size(&self) -> (u32, u32);
}

//=== FrameRenderer =======================================================

/// GPU context bound to a window surface.
pub trait FrameRenderer {
    /// Matches the render target to the drawable size.
    fn set_viewport(&mut self, width: u32, height: u32);

    /// Starts the frame by clearing the colour buffer.
    fn clear(&mut self, color: [f32; 4]);

    /// Draws finalized UI output over the cleared frame.
    fn submit_ui(&mut self, draw: &UiDrawData);

    /// Presents the frame without waiting for vertical sync.
    fn present(&mut self);
}

//=== PlatformBackend =====================================================

/// Factory for a window and a renderer bound to it.
pub trait PlatformBackend {
    type Window: WindowHost;
    type Renderer: FrameRenderer;

    /// Opens the main window.
    fn create_window(&mut self, config: &WindowConfig) -> Result<Self::Window, PlatformError>;

    /// Creates the GPU context for `window`.
    fn create_renderer(&mut self, window: &Self::Window) -> Result<Self::Renderer, PlatformError>;
}

//=========================================================================
// Unit Tests
//=========================================================================
