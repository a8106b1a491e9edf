//=========================================================================
// Kira Audio Engine
//
// `AudioEngine` implementation on top of kira.
//
// Each channel group is a kira sub-track; its linear gain is converted to
// decibels when applied. Started sounds are tracked by id until kira
// reports them stopped, at which point a `Finished` event is emitted.
//
//=========================================================================

//=== Standard Library Imports ============================================
use std::collections::HashMap;
use std::path::Path;

//=== External Crates =====================================================
use kira::sound::static_sound::{StaticSoundData, StaticSoundHandle};
use kira::sound::PlaybackState;
use kira::track::{TrackBuilder, TrackHandle};
use kira::{AudioManager, AudioManagerSettings, Decibels, DefaultBackend, Tween};
use log::{debug, info, trace, warn};

//=== Internal Modules ====================================================
use crate::core::subsystems::{gain_to_decibels, AudioEngine, AudioError, AudioEvent, SoundId};

//=== KiraAudioEngine =====================================================

struct ChannelGroup {
    track: TrackHandle,
    gain: f32,
}

struct PlayingSound {
    handle: StaticSoundHandle,
    channel: String,
}

/// Audio engine backed by the default kira output device.
pub struct KiraAudioEngine {
    manager: Option<AudioManager<DefaultBackend>>,
    groups: HashMap<String, ChannelGroup>,
    sounds: HashMap<SoundId, PlayingSound>,
    next_id: u64,
}

impl KiraAudioEngine {
    //--- Construction -----------------------------------------------------
    //
    // Opens the default output device. Fails if no device is available.
    //
    pub fn new() -> Result<Self, AudioError> {
        let manager = AudioManager::<DefaultBackend>::new(AudioManagerSettings::default())
            .map_err(|e| AudioError::Backend(e.to_string()))?;

        info!(target: "platform::audio", "Audio output opened");

        Ok(Self {
            manager: Some(manager),
            groups: HashMap::new(),
            sounds: HashMap::new(),
            next_id: 1,
        })
    }

    fn manager(&mut self) -> Result<&mut AudioManager<DefaultBackend>, AudioError> {
        match self.manager.as_mut() {
            Some(manager) => Ok(manager),
            None => Err(AudioError::Backend("audio engine is shut down".into())),
        }
    }
}

impl AudioEngine for KiraAudioEngine {
    fn create_channel_group(&mut self, name: &str) -> Result<(), AudioError> {
        if self.groups.contains_key(name) {
            return Err(AudioError::DuplicateChannel(name.to_owned()));
        }

        let track = self
            .manager()?
            .add_sub_track(TrackBuilder::new())
            .map_err(|e| AudioError::Backend(e.to_string()))?;

        debug!(target: "platform::audio", "Channel group '{}' created", name);
        self.groups
            .insert(name.to_owned(), ChannelGroup { track, gain: 1.0 });
        Ok(())
    }

    fn set_channel_group_volume(&mut self, name: &str, gain: f32) -> Result<(), AudioError> {
        let group = self
            .groups
            .get_mut(name)
            .ok_or_else(|| AudioError::UnknownChannel(name.to_owned()))?;

        let gain = gain.clamp(0.0, 1.0);
        group
            .track
            .set_volume(Decibels(gain_to_decibels(gain)), Tween::default());
        group.gain = gain;
        Ok(())
    }

    fn channel_group_volume(&self, name: &str) -> Option<f32> {
        self.groups.get(name).map(|group| group.gain)
    }

    fn play(&mut self, channel: &str, path: &Path) -> Result<SoundId, AudioError> {
        let data = StaticSoundData::from_file(path).map_err(|e| AudioError::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let group = self
            .groups
            .get_mut(channel)
            .ok_or_else(|| AudioError::UnknownChannel(channel.to_owned()))?;

        let handle = group
            .track
            .play(data)
            .map_err(|e| AudioError::Playback(format!("{e:?}")))?;

        let id = SoundId(self.next_id);
        self.next_id += 1;
        self.sounds.insert(
            id,
            PlayingSound {
                handle,
                channel: channel.to_owned(),
            },
        );

        debug!(
            target: "platform::audio",
            "Playing {} on '{}' as {:?}",
            path.display(),
            channel,
            id
        );
        Ok(id)
    }

    fn stop(&mut self, sound: SoundId) {
        match self.sounds.get_mut(&sound) {
            Some(playing) => playing.handle.stop(Tween::default()),
            None => trace!(target: "platform::audio", "Stop for unknown sound {:?}", sound),
        }
    }

    fn run_callbacks(&mut self, events: &mut Vec<AudioEvent>) {
        self.sounds.retain(|&id, playing| {
            if playing.handle.state() == PlaybackState::Stopped {
                events.push(AudioEvent::Finished {
                    sound: id,
                    channel: playing.channel.clone(),
                });
                false
            } else {
                true
            }
        });
    }

    fn shutdown(&mut self) {
        if self.manager.is_none() {
            return;
        }
        if !self.sounds.is_empty() {
            warn!(
                target: "platform::audio",
                "{} sound(s) still playing at shutdown",
                self.sounds.len()
            );
        }
        self.sounds.clear();
        self.groups.clear();
        self.manager = None;
        info!(target: "platform::audio", "Audio output closed");
    }
}
