//=========================================================================
// Platform Subsystem
//
// Shipped backend: a winit window driven by `pump_app_events`, a wgpu
// renderer with egui compositing, and a kira audio engine.
//
// Architecture:
// ```text
//  Main Thread (single)
//  ┌──────────────────────────────────────────────────┐
//  │  FrameLoop                                       │
//  │   ├─ pump_events() ─→ EventLoop::pump_app_events │
//  │   │                     └─ WindowHandler         │
//  │   │                          ├─ CloseRequested   │
//  │   │                          └─ InputBuffer      │
//  │   ├─ take_ui_input() ─→ drain InputBuffer        │
//  │   │                     → egui_winit::State      │
//  │   └─ WgpuRenderer (clear, egui pass, present)    │
//  └──────────────────────────────────────────────────┘
// ```
//
// Key Design Decisions:
// - **Pump, don't run**: the engine owns the loop, so winit is pumped
//   once per frame instead of taking over the thread with `run_app`
// - **Buffer until the UI pass**: events gathered during a pump are fed
//   to egui right before the pass that consumes them
// - **Main thread requirement**: winit mandates the main thread on
//   macOS, so `Engine::run` must be called from `main`
//
//=========================================================================

//=== Submodules ==========================================================

mod audio;
mod graphics;
mod input_buffer;

//=== External Crates =====================================================

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use log::*;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    window::{Icon, Window, WindowAttributes, WindowId},
};

//=== Internal Imports ====================================================

use crate::core::platform_bridge::{
    PlatformBackend, PlatformError, WindowConfig, WindowHost,
};
use input_buffer::InputBuffer;

//=== Public API ==========================================================

pub use audio::KiraAudioEngine;
pub use graphics::WgpuRenderer;

//=== WinitBackend ========================================================

/// Desktop backend built on winit and wgpu.
#[derive(Debug, Default)]
pub struct WinitBackend;

impl WinitBackend {
    pub fn new() -> Self {
        Self
    }
}

impl PlatformBackend for WinitBackend {
    type Window = WinitWindow;
    type Renderer = WgpuRenderer;

    fn create_window(&mut self, config: &WindowConfig) -> Result<WinitWindow, PlatformError> {
        WinitWindow::open(config)
    }

    fn create_renderer(&mut self, window: &WinitWindow) -> Result<WgpuRenderer, PlatformError> {
        WgpuRenderer::new(window.handle()).map_err(|e| {
            error!(target: "platform::graphics", "GPU context creation failed: {:#}", e);
            PlatformError::Graphics(format!("{:#}", e))
        })
    }
}

//=== WinitWindow =========================================================

/// The main window and its event loop.
///
/// # Fields
///
/// - `event_loop`: pumped once per frame
/// - `handler`: receives winit callbacks during a pump
/// - `egui_state`: translates buffered events into UI input
pub struct WinitWindow {
    event_loop: EventLoop<()>,
    handler: WindowHandler,
    window: Arc<Window>,
    egui_state: Option<egui_winit::State>,
    timeout: Duration,
}

impl WinitWindow {
    //--- Construction -----------------------------------------------------

    /// Upper bound on pumps spent waiting for the window to appear.
    const CREATE_ATTEMPTS: usize = 64;

    fn open(config: &WindowConfig) -> Result<Self, PlatformError> {
        debug!(target: "platform", "Creating winit event loop");

        let mut event_loop = EventLoop::new()
            .map_err(|e| PlatformError::EventLoopCreation(e.to_string()))?;

        let mut attributes = WindowAttributes::default()
            .with_title(config.title.clone())
            .with_inner_size(LogicalSize::new(config.width, config.height))
            .with_resizable(config.resizable);

        if let Some(path) = &config.icon_path {
            attributes = attributes.with_window_icon(load_icon(path));
        }

        let mut handler = WindowHandler::new(attributes);

        // The OS window only exists after the first `resumed` callback.
        for _ in 0..Self::CREATE_ATTEMPTS {
            pump(&mut event_loop, &mut handler, Duration::ZERO);

            if let Some(reason) = handler.creation_error.take() {
                return Err(PlatformError::WindowCreation(reason));
            }
            if let Some(window) = handler.window.clone() {
                return Ok(Self {
                    event_loop,
                    handler,
                    window,
                    egui_state: None,
                    timeout: config.event_timeout,
                });
            }
        }

        let reason = String::from("event loop never resumed");
        Err(PlatformError::WindowCreation(reason))
    }

    /// Shared handle for surface creation.
    pub(crate) fn handle(&self) -> Arc<Window> {
        self.window.clone()
    }
}

fn pump(event_loop: &mut EventLoop<()>, handler: &mut WindowHandler, timeout: Duration) {
    if let PumpStatus::Exit(code) = event_loop.pump_app_events(Some(timeout), handler) {
        info!(target: "platform", "Event loop exited with code {}", code);
        handler.close_requested = true;
    }
}

impl WindowHost for WinitWindow {
    fn close_requested(&self) -> bool {
        self.handler.close_requested
    }

    fn pump_events(&mut self) {
        pump(&mut self.event_loop, &mut self.handler, self.timeout);
    }

    fn attach_ui(&mut self, ui: &egui::Context) {
        let window = &self.window;
        self.egui_state = Some(egui_winit::State::new(
            ui.clone(),
            egui::ViewportId::ROOT,
            &**window,
            Some(window.scale_factor() as f32),
            None,
            None,
        ));
        debug!(target: "platform", "UI attached at {}x DPI", window.scale_factor());
    }

    fn take_ui_input(&mut self) -> egui::RawInput {
        let window = &self.window;
        let Some(state) = self.egui_state.as_mut() else {
            self.handler.buffer.drain().for_each(drop);
            return egui::RawInput::default();
        };

        if !self.handler.buffer.is_empty() {
            trace!(
                target: "platform::input",
                "Feeding {} buffered event(s) to UI",
                self.handler.buffer.len()
            );
        }
        for event in self.handler.buffer.drain() {
            let _ = state.on_window_event(window, &event);
        }

        state.take_egui_input(window)
    }

    fn handle_ui_output(&mut self, output: egui::PlatformOutput) {
        if let Some(state) = self.egui_state.as_mut() {
            state.handle_platform_output(&self.window, output);
        }
    }

    fn drawable_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }
}

//=== WindowHandler =======================================================

/// Receives winit callbacks while the event loop is pumped.
struct WindowHandler {
    attributes: WindowAttributes,
    window: Option<Arc<Window>>,
    creation_error: Option<String>,
    close_requested: bool,
    buffer: InputBuffer,
}

impl WindowHandler {
    fn new(attributes: WindowAttributes) -> Self {
        Self {
            attributes,
            window: None,
            creation_error: None,
            close_requested: false,
            buffer: InputBuffer::new(),
        }
    }
}

impl ApplicationHandler for WindowHandler {
    /// Creates the window on first resume.
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            debug!(target: "platform", "Window already exists (resume)");
            return;
        }

        match event_loop.create_window(self.attributes.clone()) {
            Ok(window) => {
                info!(
                    target: "platform",
                    "Window created: {}x{} @ {}x DPI",
                    window.inner_size().width,
                    window.inner_size().height,
                    window.scale_factor()
                );
                self.window = Some(Arc::new(window));
            }
            Err(e) => {
                error!(target: "platform", "Window creation failed: {}", e);
                self.creation_error = Some(e.to_string());
            }
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!(target: "platform", "Window close requested");
                self.close_requested = true;
            }

            WindowEvent::Destroyed => {
                warn!(target: "platform", "Window destroyed by the OS");
                self.close_requested = true;
            }

            // Frames are driven by the engine, not by redraw requests.
            WindowEvent::RedrawRequested => {}

            event => self.buffer.push(event),
        }
    }
}

//=== Icon Loading ========================================================

fn load_icon(path: &Path) -> Option<Icon> {
    let image = match image::open(path) {
        Ok(image) => image.into_rgba8(),
        Err(e) => {
            warn!(target: "platform", "Window icon {} not loaded: {}", path.display(), e);
            return None;
        }
    };

    let (width, height) = image.dimensions();
    match Icon::from_rgba(image.into_raw(), width, height) {
        Ok(icon) => Some(icon),
        Err(e) => {
            warn!(target: "platform", "Window icon {} rejected: {}", path.display(), e);
            None
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_icon_is_ignored() {
        assert!(load_icon(Path::new("does/not/exist.png")).is_none());
    }

    #[test]
    fn icon_loads_from_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("icon.png");
        image::RgbaImage::from_pixel(16, 16, image::Rgba([200, 0, 0, 255]))
            .save(&path)
            .unwrap();

        assert!(load_icon(&path).is_some());
    }

    #[test]
    fn shipped_icon_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/icon.png");
        assert!(load_icon(&path).is_some());
    }

    #[test]
    fn non_image_icon_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("icon.png");
        std::fs::write(&path, b"not a png").unwrap();

        assert!(load_icon(&path).is_none());
    }
}
