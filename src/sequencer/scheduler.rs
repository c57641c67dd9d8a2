// Playback scheduler - one beat per tick, equation -> frequency -> trigger
//
// The scheduler never owns the store: the owner of the session passes it in
// on every call. Triggers are submitted to the bounded queue without
// blocking; the voice bank drains them on the audio side.

use crate::audio::backend::VoiceBank;
use crate::audio::pitch::{FrequencyBand, note_name};
use crate::audio::queue::{NoteTrigger, TriggerProducer};
use crate::equation::{EvalError, Evaluator};
use crate::sequencer::clip::ClipId;
use crate::sequencer::instrument::InstrumentId;
use crate::store::TimelineStore;
use ringbuf::traits::Producer;
use std::time::Duration;

/// Playback errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlaybackError {
    #[error("Tempo {0} BPM cannot drive playback")]
    InvalidTempo(f64),
}

/// Scheduler state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
}

/// An evaluation that was skipped during a tick
#[derive(Debug, Clone, PartialEq)]
pub struct StepFailure {
    pub instrument_id: InstrumentId,
    pub clip_id: ClipId,
    pub step_index: usize,
    pub error: EvalError,
}

/// What happened on one beat
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub beat: u32,
    /// Triggers accepted by the queue, in submission order
    pub triggered: Vec<NoteTrigger>,
    /// Steps skipped by the instrument's mute mask
    pub muted: usize,
    /// Instruments with active clips but no loaded voice
    pub silent: usize,
    /// Evaluation failures (the step was skipped)
    pub failures: Vec<StepFailure>,
    /// Triggers rejected because the queue was full
    pub dropped: usize,
}

impl TickReport {
    fn new(beat: u32) -> Self {
        Self {
            beat,
            ..Default::default()
        }
    }

    /// Frequencies triggered on this beat, in order
    pub fn frequencies(&self) -> Vec<f64> {
        self.triggered.iter().map(|t| t.frequency).collect()
    }
}

pub struct PlaybackScheduler {
    state: PlaybackState,
    armed_period: Option<Duration>,
    triggers: TriggerProducer,
    evaluator: Box<dyn Evaluator>,
    band: FrequencyBand,
}

impl PlaybackScheduler {
    pub fn new(triggers: TriggerProducer, evaluator: Box<dyn Evaluator>, band: FrequencyBand) -> Self {
        Self {
            state: PlaybackState::Stopped,
            armed_period: None,
            triggers,
            evaluator,
            band,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Tick period fixed at the last start
    ///
    /// A tempo change while playing does not re-arm; compare with
    /// `store.tempo().tick_period()` to detect a pending change.
    pub fn armed_period(&self) -> Option<Duration> {
        self.armed_period
    }

    /// Stopped -> Playing
    ///
    /// Loads missing voices and returns the period the tick clock must be
    /// armed with. The beat cursor keeps its last value.
    pub fn start(
        &mut self,
        store: &mut TimelineStore,
        voices: &mut VoiceBank,
    ) -> Result<Duration, PlaybackError> {
        if let (PlaybackState::Playing, Some(period)) = (self.state, self.armed_period) {
            return Ok(period);
        }

        let period = store
            .tempo()
            .tick_period()
            .ok_or(PlaybackError::InvalidTempo(store.bpm()))?;

        let loaded = voices.ensure_loaded(store.instruments());
        store.transport_mut().play();

        self.state = PlaybackState::Playing;
        self.armed_period = Some(period);

        log::info!(
            "Playback started at beat {} ({}, {} new voice(s))",
            store.transport().current_beat(),
            store.tempo(),
            loaded
        );
        Ok(period)
    }

    /// Playing -> Stopped; rewinds the cursor to 0
    pub fn stop(&mut self, store: &mut TimelineStore) {
        if self.state == PlaybackState::Playing {
            log::info!("Playback stopped at beat {}", store.transport().current_beat());
        }

        self.state = PlaybackState::Stopped;
        self.armed_period = None;
        store.transport_mut().stop();
    }

    /// Advance the cursor one beat and trigger everything active on it
    ///
    /// Returns None when stopped (a late tick after stop is ignored).
    pub fn tick(&mut self, store: &mut TimelineStore, voices: &VoiceBank) -> Option<TickReport> {
        if !self.is_playing() {
            return None;
        }

        let beat = store.transport_mut().advance();
        Some(self.trigger_beat(store, voices, beat))
    }

    /// Trigger every active, enabled step on `beat` without moving the cursor
    pub fn trigger_beat(&mut self, store: &TimelineStore, voices: &VoiceBank, beat: u32) -> TickReport {
        let mut report = TickReport::new(beat);

        for instrument in store.instruments() {
            let active: Vec<_> = store
                .clips(&instrument.id)
                .iter()
                .filter_map(|clip| clip.step_index(beat).map(|step| (clip, step)))
                .collect();

            if active.is_empty() {
                continue;
            }

            if !voices.has_voice(&instrument.id) {
                report.silent += 1;
                continue;
            }

            for (clip, step_index) in active {
                if !instrument.is_step_enabled(step_index) {
                    report.muted += 1;
                    continue;
                }

                let x = instrument.x_for_step(step_index);
                let raw = match self.evaluator.evaluate(&instrument.equation, x) {
                    Ok(value) => value,
                    Err(error) => {
                        log::warn!(
                            "Skipping step {} of clip {} ({}): {}",
                            step_index,
                            clip.id,
                            instrument.label(),
                            error
                        );
                        report.failures.push(StepFailure {
                            instrument_id: instrument.id.clone(),
                            clip_id: clip.id.clone(),
                            step_index,
                            error,
                        });
                        continue;
                    }
                };

                let frequency = self.band.shape(raw);
                let trigger = NoteTrigger {
                    instrument_id: instrument.id.clone(),
                    clip_id: clip.id.clone(),
                    beat,
                    step_index,
                    frequency,
                    note: note_name(frequency),
                };

                match self.triggers.try_push(trigger.clone()) {
                    Ok(()) => report.triggered.push(trigger),
                    Err(_) => {
                        log::warn!("Trigger queue full, dropping note for {}", instrument.id);
                        report.dropped += 1;
                    }
                }
            }
        }

        report
    }
}
