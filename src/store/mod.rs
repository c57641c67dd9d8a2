// Timeline store - authoritative instruments, clips and transport
//
// All mutation goes through this struct. Clip edits are checked against the
// lane collision resolver before they are applied, so two clips of the same
// instrument can never overlap in one lane whatever the call path.
//
// Every applied change bumps `revision`; the autosave layer watches it to
// decide when to persist.

use crate::config::SequencerConfig;
use crate::sequencer::clip::{Clip, ClipId, ClipSpan, generate_clip_id};
use crate::sequencer::collision::{find_free_lane, first_collision};
use crate::sequencer::instrument::{Instrument, InstrumentId, InstrumentUpdate};
use crate::sequencer::transport::{Tempo, Transport};
use std::collections::HashMap;

/// Result type for store edits
pub type EditResult<T> = Result<T, EditError>;

/// Reasons an edit was not applied
///
/// None of these leave the store modified.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EditError {
    #[error("Unknown instrument: {0}")]
    UnknownInstrument(InstrumentId),

    #[error("Unknown clip {clip_id} on instrument {instrument_id}")]
    UnknownClip {
        instrument_id: InstrumentId,
        clip_id: ClipId,
    },

    #[error("Clip would overlap {other} in lane {lane} (beats {start_beat}..{end_beat})")]
    Collision {
        other: ClipId,
        lane: u32,
        start_beat: u32,
        end_beat: u32,
    },

    #[error("Instrument {0} already exists")]
    DuplicateInstrument(InstrumentId),
}

/// Store tuning taken from the sequencer configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreSettings {
    pub default_clip_beats: u32,
    pub max_lane_search: u32,
    pub default_bpm: f64,
    pub total_beats: u32,
}

impl From<&SequencerConfig> for StoreSettings {
    fn from(config: &SequencerConfig) -> Self {
        Self {
            default_clip_beats: config.default_clip_beats.max(1),
            max_lane_search: config.max_lane_search,
            default_bpm: config.default_bpm,
            total_beats: config.total_beats,
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self::from(&SequencerConfig::default())
    }
}

/// Instruments, their clips, and the global transport
pub struct TimelineStore {
    settings: StoreSettings,
    project_name: String,
    tempo: Tempo,
    instruments: Vec<Instrument>,
    clips: HashMap<InstrumentId, Vec<Clip>>,
    transport: Transport,
    revision: u64,
}

impl TimelineStore {
    /// Create an empty store
    pub fn new(settings: StoreSettings) -> Self {
        Self {
            settings,
            project_name: String::new(),
            tempo: Tempo::new(settings.default_bpm),
            instruments: Vec::new(),
            clips: HashMap::new(),
            transport: Transport::new(settings.total_beats),
            revision: 0,
        }
    }

    /// Create an empty store from the sequencer configuration
    pub fn from_config(config: &SequencerConfig) -> Self {
        Self::new(StoreSettings::from(config))
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    /// Monotonic counter bumped by every applied change
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    // ----- Project fields -----

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn set_project_name(&mut self, name: impl Into<String>) {
        self.project_name = name.into();
        self.touch();
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    pub fn bpm(&self) -> f64 {
        self.tempo.bpm()
    }

    /// Set the tempo. Takes effect for playback on the next start.
    pub fn set_bpm(&mut self, bpm: f64) {
        self.tempo.set_bpm(bpm);
        self.touch();
    }

    // ----- Transport -----

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Cursor changes are not project edits and do not bump the revision
    pub fn transport_mut(&mut self) -> &mut Transport {
        &mut self.transport
    }

    // ----- Instruments -----

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    pub fn instrument(&self, instrument_id: &str) -> Option<&Instrument> {
        self.instruments.iter().find(|i| i.id == instrument_id)
    }

    /// Register an instrument; ids must be unique
    pub fn add_instrument(&mut self, instrument: Instrument) -> EditResult<()> {
        if self.instrument(&instrument.id).is_some() {
            return Err(EditError::DuplicateInstrument(instrument.id));
        }

        log::debug!("Adding instrument {} ({})", instrument.id, instrument.label());
        self.clips.entry(instrument.id.clone()).or_default();
        self.instruments.push(instrument);
        self.touch();
        Ok(())
    }

    /// Apply a partial update to an instrument
    ///
    /// Clips keep denormalized copies of the label and color, so those are
    /// refreshed when the update touches them.
    pub fn update_instrument(
        &mut self,
        instrument_id: &str,
        update: InstrumentUpdate,
    ) -> EditResult<()> {
        let refresh_clips = update.touches_clip_fields();
        let instrument = self
            .instruments
            .iter_mut()
            .find(|i| i.id == instrument_id)
            .ok_or_else(|| EditError::UnknownInstrument(instrument_id.to_string()))?;

        update.apply_to(instrument);

        if refresh_clips {
            let label = instrument.label().to_string();
            let color = instrument.color.clone();
            if let Some(clips) = self.clips.get_mut(instrument_id) {
                for clip in clips.iter_mut() {
                    clip.instrument_name = label.clone();
                    clip.color = color.clone();
                }
            }
        }

        self.touch();
        Ok(())
    }

    /// Delete an instrument together with all its clips
    pub fn remove_instrument(&mut self, instrument_id: &str) -> EditResult<Instrument> {
        let index = self
            .instruments
            .iter()
            .position(|i| i.id == instrument_id)
            .ok_or_else(|| EditError::UnknownInstrument(instrument_id.to_string()))?;

        let instrument = self.instruments.remove(index);
        let removed_clips = self.clips.remove(instrument_id).map_or(0, |c| c.len());
        log::debug!(
            "Removed instrument {} and {} clip(s)",
            instrument_id,
            removed_clips
        );

        self.touch();
        Ok(instrument)
    }

    /// Reset to an empty project (default tempo, blank name)
    pub fn clear_all(&mut self) {
        self.instruments.clear();
        self.clips.clear();
        self.project_name.clear();
        self.tempo = Tempo::new(self.settings.default_bpm);
        self.touch();
    }

    // ----- Clips -----

    /// Clips of an instrument, in insertion order (empty if unknown)
    pub fn clips(&self, instrument_id: &str) -> &[Clip] {
        self.clips
            .get(instrument_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn clip(&self, instrument_id: &str, clip_id: &str) -> Option<&Clip> {
        self.clips(instrument_id).iter().find(|c| c.id == clip_id)
    }

    /// Number of lanes shown for an instrument row (at least one)
    pub fn lane_count(&self, instrument_id: &str) -> u32 {
        self.clips(instrument_id)
            .iter()
            .map(|c| c.lane + 1)
            .max()
            .unwrap_or(1)
    }

    /// Place a clip of the default length at the first free lane
    pub fn add_clip(&mut self, instrument_id: &str, start_beat: u32) -> EditResult<ClipId> {
        let instrument = self
            .instrument(instrument_id)
            .ok_or_else(|| EditError::UnknownInstrument(instrument_id.to_string()))?;
        let label = instrument.label().to_string();
        let color = instrument.color.clone();

        let duration = self.settings.default_clip_beats;
        let existing = self.clips(instrument_id);
        // A free lane always exists within len + 1 lanes
        let bound = self
            .settings
            .max_lane_search
            .max(u32::try_from(existing.len()).unwrap_or(u32::MAX).saturating_add(1));
        let search = find_free_lane(existing, start_beat, duration, bound);
        if search.lane >= self.settings.max_lane_search {
            log::warn!(
                "Lane search for instrument {} at beat {} went past {} lanes",
                instrument_id,
                start_beat,
                self.settings.max_lane_search
            );
        }

        let clip_id = generate_clip_id();
        let clip = Clip::new(
            clip_id.clone(),
            ClipSpan::new(start_beat, duration, search.lane),
            label,
            color,
        );
        log::debug!(
            "Adding clip {} to {} at beat {} lane {}",
            clip_id,
            instrument_id,
            start_beat,
            search.lane
        );

        self.clips
            .entry(instrument_id.to_string())
            .or_default()
            .push(clip);
        self.touch();
        Ok(clip_id)
    }

    /// Move a clip to a new start beat and lane, keeping its length
    pub fn move_clip(
        &mut self,
        instrument_id: &str,
        clip_id: &str,
        new_start_beat: u32,
        new_lane: u32,
    ) -> EditResult<()> {
        let current = self.existing_span(instrument_id, clip_id)?;
        self.reshape_clip(
            instrument_id,
            clip_id,
            ClipSpan::new(new_start_beat, current.duration, new_lane),
        )
    }

    /// Change a clip's length, keeping its start; clamps to one beat
    pub fn resize_clip(
        &mut self,
        instrument_id: &str,
        clip_id: &str,
        new_duration: u32,
    ) -> EditResult<()> {
        let current = self.existing_span(instrument_id, clip_id)?;
        self.reshape_clip(
            instrument_id,
            clip_id,
            ClipSpan::new(current.start_beat, new_duration, current.lane),
        )
    }

    /// Overwrite start, length and lane of a clip in one step
    ///
    /// Rejected with `EditError::Collision` if the new span overlaps another
    /// clip of the same instrument in the target lane.
    pub fn reshape_clip(
        &mut self,
        instrument_id: &str,
        clip_id: &str,
        span: ClipSpan,
    ) -> EditResult<()> {
        let span = ClipSpan::new(span.start_beat, span.duration, span.lane);
        let clips = self
            .clips
            .get_mut(instrument_id)
            .ok_or_else(|| EditError::UnknownInstrument(instrument_id.to_string()))?;

        let index = clips
            .iter()
            .position(|c| c.id == clip_id)
            .ok_or_else(|| EditError::UnknownClip {
                instrument_id: instrument_id.to_string(),
                clip_id: clip_id.to_string(),
            })?;

        if clips[index].span() == span {
            return Ok(());
        }

        if let Some(other) = first_collision(&span, clips, Some(clip_id)) {
            return Err(EditError::Collision {
                other: other.id.clone(),
                lane: span.lane,
                start_beat: span.start_beat,
                end_beat: span.end_beat(),
            });
        }

        clips[index].set_span(span);
        self.touch();
        Ok(())
    }

    /// Remove a clip. Deleting an id that does not exist is a no-op.
    pub fn delete_clip(&mut self, instrument_id: &str, clip_id: &str) -> EditResult<Option<Clip>> {
        let clips = self
            .clips
            .get_mut(instrument_id)
            .ok_or_else(|| EditError::UnknownInstrument(instrument_id.to_string()))?;

        let Some(index) = clips.iter().position(|c| c.id == clip_id) else {
            return Ok(None);
        };

        let clip = clips.remove(index);
        self.touch();
        Ok(Some(clip))
    }

    fn existing_span(&self, instrument_id: &str, clip_id: &str) -> EditResult<ClipSpan> {
        if self.instrument(instrument_id).is_none() {
            return Err(EditError::UnknownInstrument(instrument_id.to_string()));
        }
        self.clip(instrument_id, clip_id)
            .map(Clip::span)
            .ok_or_else(|| EditError::UnknownClip {
                instrument_id: instrument_id.to_string(),
                clip_id: clip_id.to_string(),
            })
    }

    /// Replace the clip list of an instrument wholesale (used by import)
    pub(crate) fn replace_clips(&mut self, instrument_id: &str, clips: Vec<Clip>) {
        self.clips.insert(instrument_id.to_string(), clips);
        self.touch();
    }
}

impl Default for TimelineStore {
    fn default() -> Self {
        Self::new(StoreSettings::default())
    }
}
