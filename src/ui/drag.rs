// Timeline drag controller - pointer gestures -> clip edits
//
// Pointer deltas are snapped to whole beats and lanes relative to where the
// gesture started, so repeated move events never accumulate rounding error.
// Every candidate goes through `TimelineStore::reshape_clip`, which rejects
// placements overlapping another clip in the same lane; a rejected candidate
// simply leaves the clip where it was.

use crate::config::SequencerConfig;
use crate::sequencer::clip::{Clip, ClipId, ClipSpan};
use crate::sequencer::instrument::InstrumentId;
use crate::store::{EditError, TimelineStore};

/// Pixel size of one grid cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    /// Horizontal pixels per beat
    pub beat_width: f32,
    /// Vertical pixels per lane
    pub lane_height: f32,
    /// Width of the resize handle on each clip edge
    pub handle_width: f32,
}

impl GridGeometry {
    pub fn new(beat_width: f32, lane_height: f32) -> Self {
        Self {
            beat_width: beat_width.max(1.0),
            lane_height: lane_height.max(1.0),
            handle_width: 8.0,
        }
    }

    /// Whole beats covered by a horizontal pixel delta
    pub fn beat_delta(&self, dx: f32) -> i64 {
        (dx / self.beat_width).round() as i64
    }

    /// Whole lanes covered by a vertical pixel delta
    pub fn lane_delta(&self, dy: f32) -> i64 {
        (dy / self.lane_height).round() as i64
    }
}

impl From<&SequencerConfig> for GridGeometry {
    fn from(config: &SequencerConfig) -> Self {
        Self::new(config.beat_width, config.lane_height)
    }
}

impl Default for GridGeometry {
    fn default() -> Self {
        Self::from(&SequencerConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerPosition {
    pub x: f32,
    pub y: f32,
}

impl PointerPosition {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    Move,
    ResizeLeft,
    ResizeRight,
}

/// State captured when a gesture starts
#[derive(Debug, Clone, PartialEq)]
pub struct DragGesture {
    pub instrument_id: InstrumentId,
    pub clip_id: ClipId,
    pub kind: DragKind,
    pub origin: PointerPosition,
    pub start_span: ClipSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PressOutcome {
    /// A primary press on a clip started a gesture
    Started(DragKind),
    /// A secondary press deleted the clip
    Deleted(Clip),
    /// Nothing under the pointer (unknown instrument or clip)
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragUpdate {
    /// No gesture in progress
    Idle,
    /// The snapped candidate equals the current placement
    Unchanged,
    /// The clip now occupies this span
    Committed(ClipSpan),
    /// The candidate collided; the clip kept its previous placement
    Rejected,
    /// The clip disappeared mid-gesture (deleted or replaced by an import)
    Abandoned,
}

#[derive(Debug, Clone, Default)]
pub struct DragController {
    geometry: GridGeometry,
    gesture: Option<DragGesture>,
}

impl DragController {
    pub fn new(geometry: GridGeometry) -> Self {
        Self {
            geometry,
            gesture: None,
        }
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn is_dragging(&self) -> bool {
        self.gesture.is_some()
    }

    pub fn gesture(&self) -> Option<&DragGesture> {
        self.gesture.as_ref()
    }

    /// Gesture a press at `pointer_x` would start on this clip
    ///
    /// `pointer_x` is measured from the timeline origin; presses within
    /// `handle_width` of an edge resize, anything else moves.
    pub fn kind_at(&self, clip: &Clip, pointer_x: f32) -> DragKind {
        let left = clip.start_beat as f32 * self.geometry.beat_width;
        let right = clip.end_beat() as f32 * self.geometry.beat_width;
        let handle = self.geometry.handle_width.min((right - left) / 3.0);

        if pointer_x <= left + handle {
            DragKind::ResizeLeft
        } else if pointer_x >= right - handle {
            DragKind::ResizeRight
        } else {
            DragKind::Move
        }
    }

    /// Pointer pressed on a clip
    ///
    /// Secondary presses delete the clip immediately, whatever gesture is
    /// running. Primary presses start a gesture of the given kind.
    pub fn press(
        &mut self,
        store: &mut TimelineStore,
        instrument_id: &str,
        clip_id: &str,
        kind: DragKind,
        button: PointerButton,
        position: PointerPosition,
    ) -> PressOutcome {
        match button {
            PointerButton::Secondary => match store.delete_clip(instrument_id, clip_id) {
                Ok(Some(clip)) => {
                    log::debug!("Deleted clip {} from {}", clip.id, instrument_id);
                    PressOutcome::Deleted(clip)
                }
                Ok(None) | Err(_) => PressOutcome::Ignored,
            },
            PointerButton::Primary => {
                let Some(clip) = store.clip(instrument_id, clip_id) else {
                    return PressOutcome::Ignored;
                };

                self.gesture = Some(DragGesture {
                    instrument_id: instrument_id.to_string(),
                    clip_id: clip_id.to_string(),
                    kind,
                    origin: position,
                    start_span: clip.span(),
                });
                PressOutcome::Started(kind)
            }
        }
    }

    /// Pointer moved while (possibly) dragging
    pub fn pointer_moved(&mut self, store: &mut TimelineStore, position: PointerPosition) -> DragUpdate {
        let Some(gesture) = &self.gesture else {
            return DragUpdate::Idle;
        };

        let Some(current) = store.clip(&gesture.instrument_id, &gesture.clip_id).map(Clip::span) else {
            log::debug!("Clip {} vanished mid-gesture", gesture.clip_id);
            self.gesture = None;
            return DragUpdate::Abandoned;
        };

        let beats = self.geometry.beat_delta(position.x - gesture.origin.x);
        let lanes = self.geometry.lane_delta(position.y - gesture.origin.y);
        let start = gesture.start_span;

        let candidate = match gesture.kind {
            DragKind::Move => ClipSpan::new(
                offset(start.start_beat, beats),
                start.duration,
                offset(start.lane, lanes),
            ),
            DragKind::ResizeLeft => {
                let end = start.end_beat();
                let new_start = offset(start.start_beat, beats).min(end.saturating_sub(1));
                if new_start == current.start_beat {
                    return DragUpdate::Unchanged;
                }
                ClipSpan::new(new_start, end - new_start, start.lane)
            }
            DragKind::ResizeRight => ClipSpan::new(
                start.start_beat,
                offset(start.duration, beats).max(1),
                start.lane,
            ),
        };

        if candidate == current {
            return DragUpdate::Unchanged;
        }

        match store.reshape_clip(&gesture.instrument_id, &gesture.clip_id, candidate) {
            Ok(()) => DragUpdate::Committed(candidate),
            Err(EditError::Collision { other, .. }) => {
                log::debug!("Drag of {} blocked by {}", gesture.clip_id, other);
                DragUpdate::Rejected
            }
            Err(e) => {
                log::debug!("Drag of {} rejected: {}", gesture.clip_id, e);
                DragUpdate::Rejected
            }
        }
    }

    /// Pointer released; ends the gesture
    pub fn release(&mut self) -> Option<DragGesture> {
        self.gesture.take()
    }
}

/// `base + delta`, clamped to the u32 range
fn offset(base: u32, delta: i64) -> u32 {
    (base as i64 + delta).clamp(0, u32::MAX as i64) as u32
}
