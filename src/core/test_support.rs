//=========================================================================
// Test Support
//=========================================================================
//
// Recording fakes for every host boundary.
//
// Each fake appends "<component>:<call>" entries to a shared call log so
// tests can assert on cross-component ordering.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

//=== Internal Dependencies ===============================================

use crate::core::frame_loop::{FrameContext, FrameEvents};
use crate::core::platform_bridge::{
    FrameRenderer, PlatformBackend, PlatformError, UiDrawData, WindowConfig, WindowHost,
};
use crate::core::stage::{Stage, StageError, StageKey, StageState};
use crate::core::subsystems::{
    AudioEngine, AudioError, AudioEvent, AudioFactory, Localization, LocalizationError,
    LocalizationFactory, OptionsStore, PlatformService, ServiceEvent, ServiceFactory, SoundId,
    Subsystems,
};

//=== Call Log ============================================================

pub(crate) type CallLog = Rc<RefCell<Vec<String>>>;

pub(crate) fn call_log() -> CallLog {
    Rc::new(RefCell::new(Vec::new()))
}

pub(crate) fn entries(log: &CallLog) -> Vec<String> {
    log.borrow().clone()
}

pub(crate) fn clear(log: &CallLog) {
    log.borrow_mut().clear();
}

fn record(log: &CallLog, entry: impl Into<String>) {
    log.borrow_mut().push(entry.into());
}

//=== FakeAudio ===========================================================

pub(crate) struct FakeAudio {
    log: CallLog,
    volumes: HashMap<String, f32>,
    playing: HashMap<SoundId, String>,
    finished: Vec<AudioEvent>,
    next_id: u64,
    reject_channels: bool,
    shut_down: bool,
}

impl FakeAudio {
    pub(crate) fn new(log: &CallLog) -> Self {
        record(log, "audio:init");
        Self {
            log: log.clone(),
            volumes: HashMap::new(),
            playing: HashMap::new(),
            finished: Vec::new(),
            next_id: 1,
            reject_channels: false,
            shut_down: false,
        }
    }

    /// Every channel group creation fails.
    pub(crate) fn rejecting_channels(mut self) -> Self {
        self.reject_channels = true;
        self
    }
}

impl AudioEngine for FakeAudio {
    fn create_channel_group(&mut self, name: &str) -> Result<(), AudioError> {
        record(&self.log, format!("audio:create_channel:{name}"));
        if self.reject_channels {
            return Err(AudioError::Backend("channel groups disabled".into()));
        }
        if self.volumes.contains_key(name) {
            return Err(AudioError::DuplicateChannel(name.to_owned()));
        }
        self.volumes.insert(name.to_owned(), 1.0);
        Ok(())
    }

    fn set_channel_group_volume(&mut self, name: &str, gain: f32) -> Result<(), AudioError> {
        record(&self.log, format!("audio:volume:{name}"));
        let volume = self
            .volumes
            .get_mut(name)
            .ok_or_else(|| AudioError::UnknownChannel(name.to_owned()))?;
        *volume = gain.clamp(0.0, 1.0);
        Ok(())
    }

    fn channel_group_volume(&self, name: &str) -> Option<f32> {
        self.volumes.get(name).copied()
    }

    fn play(&mut self, channel: &str, path: &Path) -> Result<SoundId, AudioError> {
        let entry = format!("audio:play:{channel}:{}", path.display());
        record(&self.log, entry);
        if !self.volumes.contains_key(channel) {
            return Err(AudioError::UnknownChannel(channel.to_owned()));
        }
        let id = SoundId(self.next_id);
        self.next_id += 1;
        self.playing.insert(id, channel.to_owned());
        Ok(id)
    }

    fn stop(&mut self, sound: SoundId) {
        record(&self.log, format!("audio:stop:{}", sound.0));
        if let Some(channel) = self.playing.remove(&sound) {
            self.finished.push(AudioEvent::Finished { sound, channel });
        }
    }

    fn run_callbacks(&mut self, events: &mut Vec<AudioEvent>) {
        record(&self.log, "audio:callbacks");
        events.append(&mut self.finished);
    }

    fn shutdown(&mut self) {
        if !self.shut_down {
            self.shut_down = true;
            record(&self.log, "audio:shutdown");
        }
    }
}

//=== FakeLocalization ====================================================

pub(crate) struct FakeLocalization {
    log: CallLog,
    language: String,
    shut_down: bool,
}

impl FakeLocalization {
    pub(crate) fn new(log: &CallLog, language: &str) -> Self {
        record(log, "localization:init");
        Self {
            log: log.clone(),
            language: language.to_owned(),
            shut_down: false,
        }
    }
}

impl Localization for FakeLocalization {
    fn language(&self) -> &str {
        &self.language
    }

    fn text<'a>(&'a self, key: &'a str) -> &'a str {
        key
    }

    fn shutdown(&mut self) {
        if !self.shut_down {
            self.shut_down = true;
            record(&self.log, "localization:shutdown");
        }
    }
}

//=== FakeService =========================================================

pub(crate) struct FakeService {
    log: CallLog,
    pending: Vec<ServiceEvent>,
    shut_down: bool,
}

impl FakeService {
    pub(crate) fn new(log: &CallLog) -> Self {
        record(log, "service:init");
        Self {
            log: log.clone(),
            pending: Vec::new(),
            shut_down: false,
        }
    }
}

impl PlatformService for FakeService {
    fn name(&self) -> &str {
        "fake"
    }

    fn run_callbacks(&mut self, events: &mut Vec<ServiceEvent>) {
        record(&self.log, "service:callbacks");
        events.append(&mut self.pending);
    }

    fn unlock_achievement(&mut self, id: &str) {
        record(&self.log, format!("service:achievement:{id}"));
        self.pending
            .push(ServiceEvent::AchievementUnlocked(id.to_owned()));
    }

    fn shutdown(&mut self) {
        if !self.shut_down {
            self.shut_down = true;
            record(&self.log, "service:shutdown");
        }
    }
}

//=== Factories ===========================================================

pub(crate) fn audio_factory(log: &CallLog) -> AudioFactory {
    let log = log.clone();
    Box::new(move || {
        let audio: Box<dyn AudioEngine> = Box::new(FakeAudio::new(&log));
        Ok(audio)
    })
}

pub(crate) fn failing_audio_factory() -> AudioFactory {
    Box::new(|| Err(AudioError::Backend("no output device".into())))
}

pub(crate) fn localization_factory(log: &CallLog) -> LocalizationFactory {
    let log = log.clone();
    Box::new(move |options: &OptionsStore| {
        let table: Box<dyn Localization> =
            Box::new(FakeLocalization::new(&log, options.language()));
        Ok(table)
    })
}

pub(crate) fn failing_localization_factory() -> LocalizationFactory {
    Box::new(|_: &OptionsStore| {
        Err(LocalizationError::Read {
            path: PathBuf::from("assets/lang/xx.toml"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        })
    })
}

pub(crate) fn service_factory(log: &CallLog) -> ServiceFactory {
    let log = log.clone();
    Box::new(move || {
        let service: Box<dyn PlatformService> = Box::new(FakeService::new(&log));
        Some(service)
    })
}

pub(crate) fn no_service() -> ServiceFactory {
    Box::new(|| None)
}

//=== Subsystems ==========================================================

/// Subsystems with fake audio and localization, no platform service.
pub(crate) fn subsystems(log: &CallLog) -> Subsystems {
    subsystems_with_options(log, OptionsStore::in_memory())
}

pub(crate) fn subsystems_with_options(log: &CallLog, options: OptionsStore) -> Subsystems {
    Subsystems::bootstrap(
        options,
        audio_factory(log),
        localization_factory(log),
        no_service(),
    )
    .unwrap()
}

pub(crate) fn subsystems_with_service(log: &CallLog) -> Subsystems {
    Subsystems::bootstrap(
        OptionsStore::in_memory(),
        audio_factory(log),
        localization_factory(log),
        service_factory(log),
    )
    .unwrap()
}

/// A frame context outside of any frame loop.
pub(crate) fn frame_context<'a>(
    ui: &'a egui::Context,
    subsystems: &'a mut Subsystems,
    events: &'a FrameEvents,
) -> FrameContext<'a> {
    FrameContext {
        ui,
        subsystems,
        events,
        frame_index: 0,
        delta: Duration::from_millis(16),
        surface_size: (640, 410),
    }
}

//=== UI Passes ===========================================================

/// Renders `stage` inside one UI pass on `ui` and returns the pass output.
pub(crate) fn render_stage(
    ui: &egui::Context,
    stage: &mut dyn Stage,
    subsystems: &mut Subsystems,
    state: &mut StageState,
    input: egui::RawInput,
) -> egui::FullOutput {
    let events = FrameEvents::default();
    ui.begin_pass(input);
    {
        let mut frame = frame_context(ui, subsystems, &events);
        stage.render(&mut frame, state);
    }
    ui.end_pass()
}

/// UI input carrying `events` and nothing else.
pub(crate) fn ui_input(events: Vec<egui::Event>) -> egui::RawInput {
    egui::RawInput {
        events,
        ..Default::default()
    }
}

/// A key going down.
pub(crate) fn key_press(key: egui::Key) -> egui::Event {
    egui::Event::Key {
        key,
        physical_key: None,
        pressed: true,
        repeat: false,
        modifiers: egui::Modifiers::NONE,
    }
}

/// Primary button press (`true`) or release (`false`) at `pos`.
pub(crate) fn primary_button(pos: egui::Pos2, pressed: bool) -> egui::Event {
    egui::Event::PointerButton {
        pos,
        button: egui::PointerButton::Primary,
        pressed,
        modifiers: egui::Modifiers::NONE,
    }
}

/// Centre of the first painted text whose content is exactly `text`.
pub(crate) fn text_center(output: &egui::FullOutput, text: &str) -> Option<egui::Pos2> {
    output.shapes.iter().find_map(|clipped| match &clipped.shape {
        egui::Shape::Text(shape) if shape.galley.text() == text => {
            Some(shape.visual_bounding_rect().center())
        }
        _ => None,
    })
}

//=== FakeWindow ==========================================================

pub(crate) struct FakeWindow {
    log: CallLog,
    close_after: Option<usize>,
    pumps: usize,
    size: (u32, u32),
}

impl FakeWindow {
    pub(crate) fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            close_after: None,
            pumps: 0,
            size: (640, 410),
        }
    }

    /// Raises the close flag during the given event pump.
    pub(crate) fn closing_after(mut self, pumps: usize) -> Self {
        self.close_after = Some(pumps);
        self
    }

    pub(crate) fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }
}

impl WindowHost for FakeWindow {
    fn close_requested(&self) -> bool {
        self.close_after.is_some_and(|limit| self.pumps >= limit)
    }

    fn pump_events(&mut self) {
        record(&self.log, "window:pump");
        self.pumps += 1;
    }

    fn attach_ui(&mut self, _ui: &egui::Context) {
        record(&self.log, "window:attach_ui");
    }

    fn take_ui_input(&mut self) -> egui::RawInput {
        egui::RawInput {
            screen_rect: Some(egui::Rect::from_min_size(
                egui::Pos2::ZERO,
                egui::vec2(self.size.0 as f32, self.size.1 as f32),
            )),
            ..Default::default()
        }
    }

    fn handle_ui_output(&mut self, _output: egui::PlatformOutput) {}

    fn drawable_size(&self) -> (u32, u32) {
        self.size
    }
}

impl Drop for FakeWindow {
    fn drop(&mut self) {
        record(&self.log, "window:drop");
    }
}

//=== FakeRenderer ========================================================

pub(crate) struct FakeRenderer {
    log: CallLog,
}

impl FakeRenderer {
    pub(crate) fn new(log: &CallLog) -> Self {
        Self { log: log.clone() }
    }
}

impl FrameRenderer for FakeRenderer {
    fn set_viewport(&mut self, width: u32, height: u32) {
        record(&self.log, format!("renderer:viewport:{width}x{height}"));
    }

    fn clear(&mut self, _color: [f32; 4]) {
        record(&self.log, "renderer:clear");
    }

    fn submit_ui(&mut self, _draw: &UiDrawData) {
        record(&self.log, "renderer:submit");
    }

    fn present(&mut self) {
        record(&self.log, "renderer:present");
    }
}

impl Drop for FakeRenderer {
    fn drop(&mut self) {
        record(&self.log, "renderer:drop");
    }
}

//=== FakeBackend =========================================================

pub(crate) struct FakeBackend {
    log: CallLog,
    close_after: usize,
    fail_window: bool,
    fail_renderer: bool,
}

impl FakeBackend {
    /// Backend whose window closes during the given frame's event pump.
    pub(crate) fn new(log: &CallLog, close_after: usize) -> Self {
        Self {
            log: log.clone(),
            close_after,
            fail_window: false,
            fail_renderer: false,
        }
    }

    pub(crate) fn failing_window(mut self) -> Self {
        self.fail_window = true;
        self
    }

    pub(crate) fn failing_renderer(mut self) -> Self {
        self.fail_renderer = true;
        self
    }
}

impl PlatformBackend for FakeBackend {
    type Window = FakeWindow;
    type Renderer = FakeRenderer;

    fn create_window(&mut self, config: &WindowConfig) -> Result<FakeWindow, PlatformError> {
        record(&self.log, format!("window:create:{}", config.title));
        if self.fail_window {
            return Err(PlatformError::WindowCreation("display unavailable".into()));
        }
        let mut window = FakeWindow::new(&self.log).closing_after(self.close_after);
        window.resize(config.width, config.height);
        Ok(window)
    }

    fn create_renderer(&mut self, _window: &FakeWindow) -> Result<FakeRenderer, PlatformError> {
        record(&self.log, "renderer:create");
        if self.fail_renderer {
            return Err(PlatformError::Graphics("no adapter".into()));
        }
        Ok(FakeRenderer::new(&self.log))
    }
}

//=== RecordingStage ======================================================

pub(crate) struct RecordingStage {
    key: StageKey,
    log: CallLog,
    fail_init: bool,
    request: Option<StageKey>,
}

impl RecordingStage {
    pub(crate) fn new(key: StageKey, log: &CallLog) -> Self {
        Self {
            key,
            log: log.clone(),
            fail_init: false,
            request: None,
        }
    }

    pub(crate) fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    /// Requests `next` on every render.
    pub(crate) fn requesting(mut self, next: StageKey) -> Self {
        self.request = Some(next);
        self
    }
}

impl Stage for RecordingStage {
    fn key(&self) -> StageKey {
        self.key
    }

    fn init(&mut self, _subsystems: &mut Subsystems) -> Result<(), StageError> {
        record(&self.log, format!("init:{}", self.key));
        if self.fail_init {
            return Err(StageError::MissingAsset(PathBuf::from("missing.bin")));
        }
        Ok(())
    }

    fn render(&mut self, _frame: &mut FrameContext<'_>, state: &mut StageState) {
        record(&self.log, format!("render:{}", self.key));
        if let Some(next) = self.request {
            state.request(next);
        }
    }

    fn free(&mut self, _subsystems: &mut Subsystems) {
        record(&self.log, format!("free:{}", self.key));
    }
}
