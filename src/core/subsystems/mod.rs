//=========================================================================
// Subsystems
//=========================================================================
//
// Process-wide services shared by every stage through explicit borrows.
//
// Bring-up order:
//   audio engine → localization → platform service (optional)
//     → channel groups + persisted volumes
//
// Teardown runs after every stage has been freed:
//   localization → audio → (window/GPU, owned by the engine) → service
//
//=========================================================================

//=== External Dependencies ===============================================

use log::{info, warn};
use thiserror::Error;

//=== Module Declarations =================================================

mod audio;
mod localization;
mod options;
mod service;

//=== Public API ==========================================================

pub use audio::{
    gain_to_decibels, percent_to_gain, AudioEngine, AudioError, AudioEvent, SoundId,
    CHANNEL_GROUPS, GAME_CHANNEL, MUSIC_CHANNEL, SILENCE_DB,
};
pub use localization::{
    is_language_code, Localization, LocalizationError, StringTable, BUILTIN_LANGUAGE,
};
pub use options::{
    OptionsError, OptionsStore, AUDIO_SECTION, DEFAULT_LANGUAGE, DEFAULT_VOLUME_PERCENT,
    GENERAL_SECTION, LANGUAGE_KEY,
};
pub use service::{PlatformService, ServiceEvent};

//=== Factories ===========================================================

/// Creates the audio engine. Construction is the engine's init.
pub type AudioFactory = Box<dyn FnOnce() -> Result<Box<dyn AudioEngine>, AudioError>>;

/// Creates the localization table for the configured options.
pub type LocalizationFactory =
    Box<dyn FnOnce(&OptionsStore) -> Result<Box<dyn Localization>, LocalizationError>>;

/// Connects to the platform service. `None` means no service is available.
pub type ServiceFactory = Box<dyn FnOnce() -> Option<Box<dyn PlatformService>>>;

//=== BootstrapError ======================================================

/// Fatal subsystem bring-up failure.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("audio engine failed to start: {0}")]
    Audio(#[source] AudioError),

    #[error("localization failed to load: {0}")]
    Localization(#[source] LocalizationError),
}

//=== Subsystems ==========================================================

/// Live subsystem handles.
///
/// Built only by [`Subsystems::bootstrap`]. Stages borrow the fields they
/// need; none of them owns a subsystem.
pub struct Subsystems {
    pub audio: Box<dyn AudioEngine>,
    pub localization: Box<dyn Localization>,
    pub options: OptionsStore,
    pub service: Option<Box<dyn PlatformService>>,
    torn_down: bool,
}

impl Subsystems {
    //--- Bring-up ---------------------------------------------------------

    /// Brings every subsystem up in dependency order.
    ///
    /// Audio or localization failure releases whatever was already started
    /// and returns an error. A missing platform service is not an error.
    pub fn bootstrap(
        options: OptionsStore,
        audio: AudioFactory,
        localization: LocalizationFactory,
        service: ServiceFactory,
    ) -> Result<Self, BootstrapError> {
        info!("Starting audio engine");
        let mut audio = audio().map_err(BootstrapError::Audio)?;

        info!("Loading localization for '{}'", options.language());
        let localization = match localization(&options) {
            Ok(localization) => localization,
            Err(e) => {
                audio.shutdown();
                return Err(BootstrapError::Localization(e));
            }
        };

        let service = service();
        match &service {
            Some(client) => info!("Platform service '{}' connected", client.name()),
            None => info!("No platform service available"),
        }

        let mut subsystems = Self {
            audio,
            localization,
            options,
            service,
            torn_down: false,
        };

        if let Err(e) = subsystems.create_channel_groups() {
            subsystems.teardown();
            subsystems.release_service();
            return Err(BootstrapError::Audio(e));
        }

        Ok(subsystems)
    }

    fn create_channel_groups(&mut self) -> Result<(), AudioError> {
        for (name, _) in CHANNEL_GROUPS {
            self.audio.create_channel_group(name)?;
        }
        self.apply_channel_volumes()
    }

    /// Sets every channel group's gain from the persisted percentages.
    pub fn apply_channel_volumes(&mut self) -> Result<(), AudioError> {
        for (name, key) in CHANNEL_GROUPS {
            let percent = self.options.volume_percent(key);
            let gain = percent_to_gain(percent);
            self.audio.set_channel_group_volume(name, gain)?;
            info!(
                "Channel group '{}' volume {}% (gain {:.2})",
                name, percent, gain
            );
        }
        Ok(())
    }

    //--- Access -----------------------------------------------------------

    /// Localized text for `key`.
    pub fn text<'a>(&'a self, key: &'a str) -> &'a str {
        self.localization.text(key)
    }

    /// Returns true once [`Subsystems::teardown`] has run.
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    //--- Teardown ---------------------------------------------------------

    /// Releases localization, then audio.
    ///
    /// Runs once; later calls do nothing.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        info!("Releasing localization");
        self.localization.shutdown();

        info!("Shutting down audio engine");
        self.audio.shutdown();
    }

    /// Disconnects the platform service if one is live.
    pub fn release_service(&mut self) {
        if let Some(mut service) = self.service.take() {
            info!("Disconnecting platform service '{}'", service.name());
            service.shutdown();
        }
    }
}

impl Drop for Subsystems {
    fn drop(&mut self) {
        if !self.torn_down || self.service.is_some() {
            warn!("Subsystems dropped without explicit teardown");
        }
        self.teardown();
        self.release_service();
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
