// Audio backend seam - voice loading and note playback
//
// The synthesis itself lives behind `VoiceLoader` / `Voice`. `VoiceBank`
// caches one voice per instrument for the session and drains the trigger
// queue into those voices.

use crate::audio::queue::{NoteTrigger, TriggerConsumer};
use crate::sequencer::instrument::{Instrument, InstrumentId};
use ringbuf::traits::Consumer;
use std::collections::HashMap;

/// Audio backend errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AudioError {
    #[error("Voice unavailable: {0}")]
    VoiceUnavailable(String),
}

/// A loaded, playable voice
pub trait Voice: Send {
    /// Fire-and-forget note-on; the voice owns the note's lifetime
    fn play(&mut self, trigger: &NoteTrigger);
}

/// Loads voices by name (e.g. "clavinet", "acoustic_grand_piano")
pub trait VoiceLoader {
    fn load_voice(&mut self, voice_name: &str) -> Result<Box<dyn Voice>, AudioError>;
}

/// Per-session voice cache plus the consuming end of the trigger queue
pub struct VoiceBank {
    loader: Box<dyn VoiceLoader>,
    voices: HashMap<InstrumentId, Box<dyn Voice>>,
    triggers: TriggerConsumer,
    played: u64,
}

impl VoiceBank {
    pub fn new(loader: Box<dyn VoiceLoader>, triggers: TriggerConsumer) -> Self {
        Self {
            loader,
            voices: HashMap::new(),
            triggers,
            played: 0,
        }
    }

    /// Load a voice for every instrument that does not have one yet
    ///
    /// Load failures are logged and skipped; the instrument stays silent.
    /// Returns the number of voices newly loaded.
    pub fn ensure_loaded(&mut self, instruments: &[Instrument]) -> usize {
        let mut loaded = 0;

        for instrument in instruments {
            if self.voices.contains_key(&instrument.id) {
                continue;
            }

            match self.loader.load_voice(instrument.voice_name()) {
                Ok(voice) => {
                    log::debug!(
                        "Loaded voice '{}' for instrument {}",
                        instrument.voice_name(),
                        instrument.id
                    );
                    self.voices.insert(instrument.id.clone(), voice);
                    loaded += 1;
                }
                Err(e) => {
                    log::warn!("Instrument {} has no voice: {}", instrument.id, e);
                }
            }
        }

        loaded
    }

    pub fn has_voice(&self, instrument_id: &str) -> bool {
        self.voices.contains_key(instrument_id)
    }

    /// Play every queued trigger; returns how many reached a voice
    pub fn drain(&mut self) -> usize {
        let mut played = 0;

        while let Some(trigger) = self.triggers.try_pop() {
            match self.voices.get_mut(&trigger.instrument_id) {
                Some(voice) => {
                    voice.play(&trigger);
                    played += 1;
                }
                None => {
                    log::debug!(
                        "Dropping trigger for {}: voice not loaded",
                        trigger.instrument_id
                    );
                }
            }
        }

        self.played += played as u64;
        played
    }

    /// Total triggers played this session
    pub fn played_count(&self) -> u64 {
        self.played
    }
}

/// Headless backend: every voice logs the notes it is asked to play
#[derive(Debug, Default)]
pub struct LogVoiceLoader;

struct LogVoice {
    voice_name: String,
}

impl Voice for LogVoice {
    fn play(&mut self, trigger: &NoteTrigger) {
        log::info!(
            "[beat {:>3}] {:<24} {:>5} ({:.2} Hz)",
            trigger.beat,
            self.voice_name,
            trigger.note,
            trigger.frequency
        );
    }
}

impl VoiceLoader for LogVoiceLoader {
    fn load_voice(&mut self, voice_name: &str) -> Result<Box<dyn Voice>, AudioError> {
        if voice_name.trim().is_empty() {
            return Err(AudioError::VoiceUnavailable("empty voice name".to_string()));
        }
        Ok(Box::new(LogVoice {
            voice_name: voice_name.to_string(),
        }))
    }
}
