//=========================================================================
// Frame Loop
//=========================================================================
//
// Single-threaded driver that owns the stage state and runs one fixed
// sequence of steps per frame until the window asks to close.
//
// Per frame:
//   1. platform service callbacks (if live)
//   2. audio callbacks
//   3. window events
//   4. UI pass begin
//   5. FPS overlay (debug builds)
//   6. dispatch active stage
//   7. UI pass end + tessellation
//   8. viewport ← drawable size
//   9. clear
//  10. submit UI
//  11. present
//   → clear frame events, commit stage transition
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use log::{info, trace};

//=== Internal Dependencies ===============================================

use crate::core::platform_bridge::{FrameRenderer, UiDrawData, WindowHost};
use crate::core::stage::{StageKey, StageRegistry, StageState};
use crate::core::subsystems::{AudioEvent, ServiceEvent, Subsystems};

//=== FrameEvents =========================================================

/// Callback events gathered before dispatch and cleared after present.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FrameEvents {
    pub audio: Vec<AudioEvent>,
    pub service: Vec<ServiceEvent>,
}

impl FrameEvents {
    pub fn clear(&mut self) {
        self.audio.clear();
        self.service.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.audio.is_empty() && self.service.is_empty()
    }
}

//=== FrameContext ========================================================

/// Everything the active stage may touch during its render call.
pub struct FrameContext<'a> {
    /// UI context, inside an open pass.
    pub ui: &'a egui::Context,
    pub subsystems: &'a mut Subsystems,
    /// Events pumped this frame.
    pub events: &'a FrameEvents,
    /// Zero-based index of this frame since the loop started.
    pub frame_index: u64,
    /// Time since the previous frame began. Zero on the first frame.
    pub delta: Duration,
    /// Drawable size as of the previous frame.
    pub surface_size: (u32, u32),
}

//=== FpsCounter ==========================================================

/// Rolling frame-rate average.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    samples: VecDeque<Duration>,
    capacity: usize,
    total: Duration,
}

impl FpsCounter {
    /// Creates a counter averaging over the last `capacity` frames.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "FPS sample window must be positive");
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            total: Duration::ZERO,
        }
    }

    /// Adds one frame time. Zero durations are ignored.
    pub fn record(&mut self, frame_time: Duration) {
        if frame_time.is_zero() {
            return;
        }
        if self.samples.len() == self.capacity {
            if let Some(oldest) = self.samples.pop_front() {
                self.total -= oldest;
            }
        }
        self.samples.push_back(frame_time);
        self.total += frame_time;
    }

    /// Average frames per second, or zero before the first sample.
    pub fn fps(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.len() as f32 / self.total.as_secs_f32()
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new(120)
    }
}

//=== FrameLoop ===========================================================

/// Owns the stage state and the UI context and drives frames.
pub struct FrameLoop {
    ui: egui::Context,
    state: StageState,
    events: FrameEvents,
    fps: FpsCounter,
    frame_index: u64,
    last_frame: Option<Instant>,
    surface_size: (u32, u32),
    clear_color: [f32; 4],
    #[cfg_attr(not(debug_assertions), allow(dead_code))]
    show_fps: bool,
}

impl FrameLoop {
    //--- Construction -----------------------------------------------------

    pub fn new(ui: egui::Context, initial: StageKey) -> Self {
        Self {
            ui,
            state: StageState::new(initial),
            events: FrameEvents::default(),
            fps: FpsCounter::default(),
            frame_index: 0,
            last_frame: None,
            surface_size: (0, 0),
            clear_color: [0.0, 0.0, 0.0, 1.0],
            show_fps: true,
        }
    }

    pub fn with_clear_color(mut self, color: [f32; 4]) -> Self {
        self.clear_color = color;
        self
    }

    /// Toggles the FPS readout. It is never drawn in release builds.
    pub fn with_fps_overlay(mut self, enabled: bool) -> Self {
        self.show_fps = enabled;
        self
    }

    //--- Accessors --------------------------------------------------------

    pub fn state(&self) -> &StageState {
        &self.state
    }

    /// Number of frames completed.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn fps(&self) -> f32 {
        self.fps.fps()
    }

    //--- Execution --------------------------------------------------------

    /// Runs frames until the window reports a close request.
    ///
    /// The close flag is checked once at the top of each iteration, so a
    /// frame that has started always completes. Returns the number of
    /// frames run.
    pub fn run<W, R>(
        &mut self,
        window: &mut W,
        renderer: &mut R,
        stages: &mut StageRegistry,
        subsystems: &mut Subsystems,
    ) -> u64
    where
        W: WindowHost,
        R: FrameRenderer,
    {
        info!("Entering frame loop at stage {}", self.state.current());
        self.surface_size = window.drawable_size();

        while !window.close_requested() {
            self.frame(window, renderer, stages, subsystems);
        }

        info!(
            "Frame loop finished after {} frame(s) in stage {}",
            self.frame_index,
            self.state.current()
        );
        self.frame_index
    }

    /// Runs exactly one frame.
    pub fn frame<W, R>(
        &mut self,
        window: &mut W,
        renderer: &mut R,
        stages: &mut StageRegistry,
        subsystems: &mut Subsystems,
    ) where
        W: WindowHost,
        R: FrameRenderer,
    {
        let now = Instant::now();
        let delta = self
            .last_frame
            .map(|last| now.duration_since(last))
            .unwrap_or_default();
        self.last_frame = Some(now);
        self.fps.record(delta);

        //--- 1-3. Pump callbacks and window events -------------------------
        if let Some(service) = subsystems.service.as_deref_mut() {
            service.run_callbacks(&mut self.events.service);
        }
        subsystems.audio.run_callbacks(&mut self.events.audio);
        window.pump_events();

        //--- 4-5. Open UI pass ---------------------------------------------
        self.ui.begin_pass(window.take_ui_input());

        #[cfg(debug_assertions)]
        if self.show_fps {
            self.draw_fps_overlay();
        }

        //--- 6. Dispatch ---------------------------------------------------
        let mut frame = FrameContext {
            ui: &self.ui,
            subsystems,
            events: &self.events,
            frame_index: self.frame_index,
            delta,
            surface_size: self.surface_size,
        };
        stages.dispatch(&mut frame, &mut self.state);

        //--- 7. Finalize UI ------------------------------------------------
        let output = self.ui.end_pass();
        window.handle_ui_output(output.platform_output);
        let draw = UiDrawData {
            primitives: self.ui.tessellate(output.shapes, output.pixels_per_point),
            textures_delta: output.textures_delta,
            pixels_per_point: output.pixels_per_point,
        };

        //--- 8-11. Render --------------------------------------------------
        let (width, height) = window.drawable_size();
        renderer.set_viewport(width, height);
        self.surface_size = (width, height);

        renderer.clear(self.clear_color);
        renderer.submit_ui(&draw);
        renderer.present();

        //--- Frame boundary ------------------------------------------------
        trace!(
            "Frame {} done: stage {}, {} primitive(s)",
            self.frame_index,
            self.state.current(),
            draw.primitives.len()
        );
        self.events.clear();
        self.state.commit();
        self.frame_index += 1;
    }

    //--- Internal Helpers -------------------------------------------------

    #[cfg(debug_assertions)]
    fn draw_fps_overlay(&self) {
        let painter = self.ui.layer_painter(egui::LayerId::new(
            egui::Order::Foreground,
            egui::Id::new("fps_overlay"),
        ));
        painter.text(
            egui::pos2(8.0, 8.0),
            egui::Align2::LEFT_TOP,
            format!("{:.0} FPS", self.fps.fps()),
            egui::FontId::monospace(12.0),
            egui::Color32::YELLOW,
        );
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
