//=========================================================================
// Splash Stage
//=========================================================================
//
// Fades the title in over a fixed duration while an optional intro sound
// plays on the music bus. Any click, Enter, Space or Escape skips it.
//
// Timeline:
//   first frame → start intro sound
//   each frame  → elapsed += delta, alpha = elapsed / fade
//   done        → achievement (if a service is present), stop sound,
//                 request Preload
//
//=========================================================================

//=== External Dependencies ===============================================

use std::path::PathBuf;
use std::time::Duration;

use log::{debug, info, warn};

//=== Internal Dependencies ===============================================

use crate::core::frame_loop::FrameContext;
use crate::core::stage::{Stage, StageError, StageKey, StageState};
use crate::core::subsystems::{AudioEvent, SoundId, Subsystems, MUSIC_CHANNEL};

//=== Constants ===========================================================

/// How long the splash stays up without input.
pub const DEFAULT_SPLASH_DURATION: Duration = Duration::from_secs(4);

/// Portion of the duration spent fading the title in.
const FADE_IN: Duration = Duration::from_millis(1500);

/// Achievement unlocked the first time the splash completes.
pub const SPLASH_ACHIEVEMENT: &str = "SPLASH_SEEN";

//=== SplashStage =========================================================

pub struct SplashStage {
    intro: Option<PathBuf>,
    duration: Duration,
    elapsed: Duration,
    sound: Option<SoundId>,
    started: bool,
    finished: bool,
}

impl SplashStage {
    pub fn new() -> Self {
        Self {
            intro: None,
            duration: DEFAULT_SPLASH_DURATION,
            elapsed: Duration::ZERO,
            sound: None,
            started: false,
            finished: false,
        }
    }

    /// Sound played on the music bus while the splash is up.
    pub fn with_intro(mut self, path: impl Into<PathBuf>) -> Self {
        self.intro = Some(path.into());
        self
    }

    /// # Panics
    ///
    /// Panics if `duration` is zero.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        assert!(!duration.is_zero(), "Splash duration must be positive");
        self.duration = duration;
        self
    }

    //--- Timeline ---------------------------------------------------------

    /// Advances the timeline. Returns true once the splash should end.
    pub fn advance(&mut self, delta: Duration, skip: bool) -> bool {
        self.elapsed = self.elapsed.saturating_add(delta);
        skip || self.elapsed >= self.duration
    }

    /// Title opacity in `[0, 1]`.
    pub fn alpha(&self) -> f32 {
        let fade = FADE_IN.min(self.duration);
        (self.elapsed.as_secs_f32() / fade.as_secs_f32()).min(1.0)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Ends the splash and requests `Preload`. Later calls do nothing.
    pub fn finish(&mut self, subsystems: &mut Subsystems, state: &mut StageState) {
        if self.finished {
            return;
        }
        self.finished = true;

        if let Some(service) = subsystems.service.as_mut() {
            service.unlock_achievement(SPLASH_ACHIEVEMENT);
        }
        self.stop_intro(subsystems);

        info!("Splash finished after {:?}", self.elapsed);
        state.request(StageKey::Preload);
    }

    //--- Intro Sound ------------------------------------------------------

    fn start_intro(&mut self, subsystems: &mut Subsystems) {
        self.started = true;
        let Some(path) = &self.intro else {
            return;
        };

        match subsystems.audio.play(MUSIC_CHANNEL, path) {
            Ok(sound) => self.sound = Some(sound),
            Err(e) => warn!("Intro sound not played: {}", e),
        }
    }

    fn stop_intro(&mut self, subsystems: &mut Subsystems) {
        if let Some(sound) = self.sound.take() {
            subsystems.audio.stop(sound);
        }
    }
}

impl Default for SplashStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for SplashStage {
    fn key(&self) -> StageKey {
        StageKey::Splash
    }

    fn init(&mut self, _subsystems: &mut Subsystems) -> Result<(), StageError> {
        if let Some(path) = &self.intro {
            if !path.is_file() {
                return Err(StageError::MissingAsset(path.clone()));
            }
        }
        debug!("Splash ready ({:?})", self.duration);
        Ok(())
    }

    fn render(&mut self, frame: &mut FrameContext<'_>, state: &mut StageState) {
        if !self.started {
            self.start_intro(frame.subsystems);
        }

        // The intro ending on its own is not a reason to leave the splash.
        for event in &frame.events.audio {
            let AudioEvent::Finished { sound, .. } = event;
            if self.sound == Some(*sound) {
                self.sound = None;
            }
        }

        let skip = frame.ui.input(|input| {
            input.pointer.any_click()
                || input.key_pressed(egui::Key::Enter)
                || input.key_pressed(egui::Key::Space)
                || input.key_pressed(egui::Key::Escape)
        });

        if self.advance(frame.delta, skip) {
            self.finish(frame.subsystems, state);
        }

        let title = frame.subsystems.text("splash.title").to_owned();
        let hint = frame.subsystems.text("splash.skip").to_owned();
        let color = egui::Color32::from_white_alpha((self.alpha() * 255.0) as u8);

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE.fill(egui::Color32::BLACK))
            .show(frame.ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(ui.available_height() * 0.4);
                    ui.label(egui::RichText::new(title).heading().size(32.0).color(color));
                    ui.add_space(8.0);
                    ui.label(egui::RichText::new(hint).small().weak());
                });
            });

        frame.ui.request_repaint();
    }

    fn free(&mut self, subsystems: &mut Subsystems) {
        self.stop_intro(subsystems);
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
