// Lane collision resolver
// Pure placement checks for clips sharing an instrument row

use crate::sequencer::clip::{Clip, ClipSpan};

/// Default number of lanes scanned before giving up on a free lane
pub const DEFAULT_MAX_LANE_SEARCH: u32 = 100;

/// Outcome of a free-lane search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneSearch {
    /// Lane to use (0 when the search was exhausted)
    pub lane: u32,
    /// True when no free lane existed below the search bound
    pub exhausted: bool,
}

/// Check whether a candidate placement overlaps a clip in the same lane
///
/// Clips whose id equals `exclude_id` are ignored, so a clip being dragged
/// never collides with itself. Intervals are half-open: a clip ending on
/// beat 14 and another starting on beat 14 do not collide.
pub fn collides(candidate: &ClipSpan, existing: &[Clip], exclude_id: Option<&str>) -> bool {
    existing.iter().any(|other| {
        if other.lane != candidate.lane {
            return false;
        }
        if exclude_id.is_some_and(|id| other.id == id) {
            return false;
        }
        candidate.overlaps(&other.span())
    })
}

/// Find the clip a candidate would collide with, if any
pub fn first_collision<'a>(
    candidate: &ClipSpan,
    existing: &'a [Clip],
    exclude_id: Option<&str>,
) -> Option<&'a Clip> {
    existing.iter().find(|other| {
        other.lane == candidate.lane
            && !exclude_id.is_some_and(|id| other.id == id)
            && candidate.overlaps(&other.span())
    })
}

/// Find the lowest lane where `[start_beat, start_beat + duration)` is free
///
/// Lanes `0..max_lanes` are scanned in order. If every lane is taken the
/// search degrades to lane 0 and reports `exhausted`.
pub fn find_free_lane(
    existing: &[Clip],
    start_beat: u32,
    duration: u32,
    max_lanes: u32,
) -> LaneSearch {
    for lane in 0..max_lanes {
        let candidate = ClipSpan::new(start_beat, duration, lane);
        if !collides(&candidate, existing, None) {
            return LaneSearch {
                lane,
                exhausted: false,
            };
        }
    }

    LaneSearch {
        lane: 0,
        exhausted: true,
    }
}
