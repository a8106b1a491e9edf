//=========================================================================
// Breach Engine
//
// Main entry point and coordinator for the engine.
//
// Architecture:
// ```text
//     EngineBuilder  ──build()──>  Engine  ──run(backend)──>  ExitStatus
//         │                          │
//         ├─ with_title()            ├─ window + GPU context
//         ├─ with_options_path()     ├─ subsystems bootstrap
//         ├─ with_audio() ...        ├─ stage init (all, eagerly)
//         └─ with_stage()            ├─ frame loop (until close)
//                                    └─ reverse teardown
// ```
//
//=========================================================================

//=== External Dependencies ===============================================

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use log::{error, info, warn};

//=== Internal Dependencies ===============================================

use crate::core::frame_loop::FrameLoop;
use crate::core::platform_bridge::{PlatformBackend, WindowConfig, WindowHost};
use crate::core::stage::{Stage, StageKey, StageRegistry};
use crate::core::subsystems::{
    AudioEngine, AudioError, AudioFactory, Localization, LocalizationError,
    LocalizationFactory, OptionsStore, PlatformService, ServiceFactory, StringTable, Subsystems,
};
use crate::core::ui_layout::{self, UI_LAYOUT_FILE};
use crate::platform::KiraAudioEngine;

//=== Defaults ============================================================

/// Longest wait one event pump may take: one frame at 60 Hz.
pub const MAX_EVENT_TIMEOUT: Duration = Duration::from_micros(16_667);

/// Default persisted options file.
pub const DEFAULT_OPTIONS_FILE: &str = "options.toml";

/// Default directory holding `<language>.toml` string tables.
pub const DEFAULT_LANGUAGE_DIR: &str = "assets/lang";

//=== ExitStatus ==========================================================

/// Process outcome of [`Engine::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// The window was closed normally.
    Success,
    /// Window, GPU, subsystem or stage bring-up failed.
    Failure,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => ExitCode::SUCCESS,
            ExitStatus::Failure => ExitCode::FAILURE,
        }
    }
}

//=== EngineBuilder =======================================================

/// Builder for configuring and constructing an [`Engine`].
///
/// # Default Values
///
/// - **Window**: 640×410, not resizable, title "Breach Engine"
/// - **Event timeout**: zero (never block)
/// - **Options**: `options.toml`
/// - **String tables**: `assets/lang`
/// - **UI layout**: `uicfg.json`
/// - **Initial stage**: `Launcher`
/// - **Audio**: kira; **Localization**: TOML string tables; **Service**: none
///
/// # Examples
///
/// ```no_run
/// use breach_engine::prelude::*;
/// use breach_engine::WinitBackend;
///
/// let status = EngineBuilder::new()
///     .with_title("SCP - Containment Breach")
///     .with_icon("assets/icon.png")
///     .with_stage(LauncherStage::new())
///     .with_stage(SplashStage::new())
///     .with_stage(PreloadStage::new("assets"))
///     .build()
///     .run(WinitBackend::new());
/// ```
pub struct EngineBuilder {
    window: WindowConfig,
    options_path: PathBuf,
    language_dir: PathBuf,
    ui_layout_path: Option<PathBuf>,
    initial_stage: StageKey,
    show_fps: bool,
    clear_color: [f32; 4],
    audio: Option<AudioFactory>,
    localization: Option<LocalizationFactory>,
    service: Option<ServiceFactory>,
    stages: StageRegistry,
}

impl EngineBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            window: WindowConfig::default(),
            options_path: PathBuf::from(DEFAULT_OPTIONS_FILE),
            language_dir: PathBuf::from(DEFAULT_LANGUAGE_DIR),
            ui_layout_path: Some(PathBuf::from(UI_LAYOUT_FILE)),
            initial_stage: StageKey::default(),
            show_fps: true,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            audio: None,
            localization: None,
            service: None,
            stages: StageRegistry::new(),
        }
    }

    //--- Window -----------------------------------------------------------

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.window.title = title.into();
        self
    }

    /// Sets the window size in logical pixels.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        assert!(
            width > 0 && height > 0,
            "Window size must be positive, got {}x{}",
            width,
            height
        );
        self.window.width = width;
        self.window.height = height;
        self
    }

    /// Sets a PNG file as the window icon.
    pub fn with_icon(mut self, path: impl Into<PathBuf>) -> Self {
        self.window.icon_path = Some(path.into());
        self
    }

    /// Lets each event pump wait up to `timeout` for input.
    ///
    /// Default: zero (poll without blocking)
    ///
    /// # Panics
    ///
    /// Panics if `timeout` exceeds [`MAX_EVENT_TIMEOUT`].
    pub fn with_event_timeout(mut self, timeout: Duration) -> Self {
        assert!(
            timeout <= MAX_EVENT_TIMEOUT,
            "Event timeout must not exceed one frame, got {:?}",
            timeout
        );
        self.window.event_timeout = timeout;
        self
    }

    //--- Persistence ------------------------------------------------------

    pub fn with_options_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.options_path = path.into();
        self
    }

    pub fn with_language_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.language_dir = dir.into();
        self
    }

    pub fn with_ui_layout_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ui_layout_path = Some(path.into());
        self
    }

    /// Disables UI layout persistence.
    pub fn without_ui_layout(mut self) -> Self {
        self.ui_layout_path = None;
        self
    }

    //--- Frame Loop -------------------------------------------------------

    pub fn with_initial_stage(mut self, key: StageKey) -> Self {
        self.initial_stage = key;
        self
    }

    /// Toggles the debug-build FPS readout.
    pub fn with_fps_overlay(mut self, enabled: bool) -> Self {
        self.show_fps = enabled;
        self
    }

    pub fn with_clear_color(mut self, color: [f32; 4]) -> Self {
        self.clear_color = color;
        self
    }

    //--- Subsystems -------------------------------------------------------

    /// Replaces the audio engine factory.
    pub fn with_audio<F>(mut self, factory: F) -> Self
    where
        F: FnOnce() -> Result<Box<dyn AudioEngine>, AudioError> + 'static,
    {
        self.audio = Some(Box::new(factory));
        self
    }

    /// Replaces the localization factory.
    pub fn with_localization<F>(mut self, factory: F) -> Self
    where
        F: FnOnce(&OptionsStore) -> Result<Box<dyn Localization>, LocalizationError> + 'static,
    {
        self.localization = Some(Box::new(factory));
        self
    }

    /// Connects a platform service at bootstrap.
    pub fn with_platform_service<F>(mut self, factory: F) -> Self
    where
        F: FnOnce() -> Option<Box<dyn PlatformService>> + 'static,
    {
        self.service = Some(Box::new(factory));
        self
    }

    //--- Stages -----------------------------------------------------------

    /// Registers a stage. Stages are initialized in registration order.
    pub fn with_stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.register(Box::new(stage));
        self
    }

    /// Builds the engine instance.
    pub fn build(self) -> Engine {
        info!(
            "Building engine ({}x{}, {} stage(s), initial {})",
            self.window.width,
            self.window.height,
            self.stages.len(),
            self.initial_stage
        );

        let language_dir = self.language_dir;
        let audio = self.audio.unwrap_or_else(|| {
            Box::new(|| {
                KiraAudioEngine::new().map(|engine| Box::new(engine) as Box<dyn AudioEngine>)
            })
        });
        let localization = self.localization.unwrap_or_else(|| {
            Box::new(move |options: &OptionsStore| {
                StringTable::load(&language_dir, options.language())
                    .map(|table| Box::new(table) as Box<dyn Localization>)
            })
        });
        let service = self.service.unwrap_or_else(|| Box::new(|| None));

        Engine {
            window: self.window,
            options_path: self.options_path,
            ui_layout_path: self.ui_layout_path,
            initial_stage: self.initial_stage,
            show_fps: self.show_fps,
            clear_color: self.clear_color,
            audio,
            localization,
            service,
            stages: self.stages,
        }
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//=== Engine ==============================================================

/// Breach Engine runtime.
///
/// Create via [`EngineBuilder`]; [`Engine::run`] consumes the engine.
///
/// # Lifecycle
///
/// ```text
/// window → GPU context → UI → subsystems → stage init
///   → frame loop
///   → stage free (reverse) → subsystem teardown (reverse)
///   → GPU context → window → platform service
/// ```
pub struct Engine {
    window: WindowConfig,
    options_path: PathBuf,
    ui_layout_path: Option<PathBuf>,
    initial_stage: StageKey,
    show_fps: bool,
    clear_color: [f32; 4],
    audio: AudioFactory,
    localization: LocalizationFactory,
    service: ServiceFactory,
    stages: StageRegistry,
}

impl Engine {
    //--- Execution --------------------------------------------------------

    /// Runs the engine on `backend` and blocks until the window closes.
    ///
    /// Window or GPU failure returns [`ExitStatus::Failure`] before any
    /// subsystem or stage is touched. Subsystem or stage init failure
    /// unwinds whatever was already brought up, then returns failure.
    pub fn run<B: PlatformBackend>(self, mut backend: B) -> ExitStatus {
        let Engine {
            window: window_config,
            options_path,
            ui_layout_path,
            initial_stage,
            show_fps,
            clear_color,
            audio,
            localization,
            service,
            mut stages,
        } = self;

        info!("Starting engine runtime");

        //--- 1. Window and GPU context ------------------------------------
        let mut window = match backend.create_window(&window_config) {
            Ok(window) => window,
            Err(e) => {
                error!("Platform error: {}", e);
                return ExitStatus::Failure;
            }
        };

        let mut renderer = match backend.create_renderer(&window) {
            Ok(renderer) => renderer,
            Err(e) => {
                error!("Platform error: {}", e);
                drop(window);
                return ExitStatus::Failure;
            }
        };

        //--- 2. UI context -------------------------------------------------
        let ui = egui::Context::default();
        window.attach_ui(&ui);
        if let Some(path) = &ui_layout_path {
            ui_layout::load_layout(&ui, path);
        }

        //--- 3. Subsystems -------------------------------------------------
        let options = OptionsStore::load(&options_path);
        let mut subsystems = match Subsystems::bootstrap(options, audio, localization, service) {
            Ok(subsystems) => subsystems,
            Err(e) => {
                error!("Subsystem bootstrap failed: {}", e);
                drop(renderer);
                drop(window);
                return ExitStatus::Failure;
            }
        };

        //--- 4. Stages and frame loop --------------------------------------
        let status = match stages.init_all(&mut subsystems) {
            Ok(()) => {
                let mut frame_loop = FrameLoop::new(ui.clone(), initial_stage)
                    .with_clear_color(clear_color)
                    .with_fps_overlay(show_fps);
                frame_loop.run(&mut window, &mut renderer, &mut stages, &mut subsystems);
                ExitStatus::Success
            }
            Err(e) => {
                error!("Stage initialization failed: {}", e);
                ExitStatus::Failure
            }
        };

        //--- 5. Shutdown ---------------------------------------------------
        stages.free_all(&mut subsystems);

        if subsystems.options.is_dirty() {
            if let Err(e) = subsystems.options.save() {
                warn!("Options not saved: {}", e);
            }
        }
        subsystems.teardown();

        if status == ExitStatus::Success {
            if let Some(path) = &ui_layout_path {
                ui_layout::save_layout(&ui, path);
            }
        }

        info!("Destroying GPU context and window");
        drop(renderer);
        drop(window);

        subsystems.release_service();

        info!("Engine shutdown complete ({:?})", status);
        status
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
