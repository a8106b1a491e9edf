//=========================================================================
// Launcher Stage
//=========================================================================
//
// First stage shown. Lets the player set channel volumes and the UI
// language before launching; confirming persists the options and hands
// over to the splash.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fs;
use std::path::PathBuf;

use log::{debug, info, warn};

//=== Internal Dependencies ===============================================

use crate::core::frame_loop::FrameContext;
use crate::core::stage::{Stage, StageError, StageKey, StageState};
use crate::core::subsystems::{
    is_language_code, percent_to_gain, OptionsError, Subsystems, AUDIO_SECTION, BUILTIN_LANGUAGE,
    CHANNEL_GROUPS, DEFAULT_VOLUME_PERCENT, GENERAL_SECTION, LANGUAGE_KEY,
};
use crate::engine::DEFAULT_LANGUAGE_DIR;

//=== LauncherStage =======================================================

/// Volume and language setup screen.
pub struct LauncherStage {
    language_dir: PathBuf,
    /// Volume percentages, parallel to `CHANNEL_GROUPS`.
    volumes: [i64; CHANNEL_GROUPS.len()],
    language: String,
    languages: Vec<String>,
}

impl LauncherStage {
    pub fn new() -> Self {
        Self {
            language_dir: PathBuf::from(DEFAULT_LANGUAGE_DIR),
            volumes: [DEFAULT_VOLUME_PERCENT; CHANNEL_GROUPS.len()],
            language: String::from(BUILTIN_LANGUAGE),
            languages: Vec::new(),
        }
    }

    /// Directory scanned for selectable `<code>.toml` string tables.
    pub fn with_language_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.language_dir = dir.into();
        self
    }

    /// Language codes offered in the selector, sorted.
    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    /// Sets a channel group's percentage and applies it immediately.
    pub fn set_volume(&mut self, subsystems: &mut Subsystems, channel: &str, percent: i64) {
        let Some(index) = CHANNEL_GROUPS.iter().position(|(name, _)| *name == channel) else {
            warn!("Launcher has no volume slider for channel '{}'", channel);
            return;
        };

        let percent = percent.clamp(0, 100);
        self.volumes[index] = percent;
        let gain = percent_to_gain(percent);
        if let Err(e) = subsystems.audio.set_channel_group_volume(channel, gain) {
            warn!("Failed to apply {} volume: {}", channel, e);
        }
    }

    /// Persists the chosen options and requests the splash.
    pub fn confirm(&mut self, subsystems: &mut Subsystems, state: &mut StageState) {
        let options = &mut subsystems.options;
        for ((_, key), percent) in CHANNEL_GROUPS.iter().zip(self.volumes) {
            options.write_int_option(AUDIO_SECTION, key, percent);
        }
        options.write_string_option(GENERAL_SECTION, LANGUAGE_KEY, &self.language);

        if options.is_dirty() {
            match options.save() {
                Ok(()) => {}
                Err(OptionsError::NoPath) => debug!("Options kept in memory only"),
                Err(e) => warn!("Failed to save options: {}", e),
            }
        }

        if self.language != subsystems.localization.language() {
            info!("Language '{}' takes effect on next start", self.language);
        }

        state.request(StageKey::Splash);
    }

    fn scan_languages(&mut self) {
        let mut languages = vec![BUILTIN_LANGUAGE.to_owned()];

        match fs::read_dir(&self.language_dir) {
            Ok(entries) => {
                for entry in entries.flatten() {
                    let path = entry.path();
                    if path.extension().is_some_and(|ext| ext == "toml") {
                        match path.file_stem().and_then(|stem| stem.to_str()) {
                            Some(code) if is_language_code(code) => languages.push(code.to_owned()),
                            _ => debug!("Ignoring string table {}", path.display()),
                        }
                    }
                }
            }
            Err(e) => debug!(
                "No language directory at {}: {}",
                self.language_dir.display(),
                e
            ),
        }

        if !languages.contains(&self.language) {
            languages.push(self.language.clone());
        }
        languages.sort();
        languages.dedup();
        self.languages = languages;
    }
}

impl Default for LauncherStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for LauncherStage {
    fn key(&self) -> StageKey {
        StageKey::Launcher
    }

    fn init(&mut self, subsystems: &mut Subsystems) -> Result<(), StageError> {
        for (index, (_, key)) in CHANNEL_GROUPS.iter().enumerate() {
            self.volumes[index] = subsystems.options.volume_percent(key);
        }
        self.language = subsystems.options.language().to_owned();
        self.scan_languages();

        debug!(
            "Launcher ready: volumes {:?}, language '{}' of {:?}",
            self.volumes, self.language, self.languages
        );
        Ok(())
    }

    fn render(&mut self, frame: &mut FrameContext<'_>, state: &mut StageState) {
        let text = |key: &str| frame.subsystems.text(key).to_owned();
        let title = text("launcher.title");
        let subtitle = text("launcher.subtitle");
        let labels = [text("launcher.game_volume"), text("launcher.music_volume")];
        let language_label = text("launcher.language");
        let launch_label = text("launcher.launch");

        let mut changed = Vec::new();
        let mut launch = false;

        egui::CentralPanel::default().show(frame.ui, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading(title.as_str());
                ui.label(subtitle.as_str());
            });
            ui.separator();

            for (index, label) in labels.iter().enumerate() {
                let mut percent = self.volumes[index];
                let slider = egui::Slider::new(&mut percent, 0..=100)
                    .suffix("%")
                    .text(label.as_str());
                if ui.add(slider).changed() {
                    changed.push((CHANNEL_GROUPS[index].0, percent));
                }
            }

            egui::ComboBox::from_label(language_label.as_str())
                .selected_text(self.language.as_str())
                .show_ui(ui, |ui| {
                    for code in &self.languages {
                        ui.selectable_value(&mut self.language, code.clone(), code.as_str());
                    }
                });

            ui.add_space(12.0);
            ui.vertical_centered(|ui| {
                launch = ui.button(launch_label.as_str()).clicked();
            });
        });

        for (channel, percent) in changed {
            self.set_volume(frame.subsystems, channel, percent);
        }
        if launch {
            self.confirm(frame.subsystems, state);
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
