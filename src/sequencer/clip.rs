// Clip representation for the timeline
// A clip places an instrument's equation on a beat range inside one lane

use serde::{Deserialize, Serialize};

/// Unique identifier for clips (unique within the owning instrument)
pub type ClipId = String;

/// Generate a fresh clip identifier
pub fn generate_clip_id() -> ClipId {
    uuid::Uuid::new_v4().to_string()
}

/// Position and length of a clip, without identity
///
/// Used as the candidate placement handed to the collision resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClipSpan {
    /// First beat covered by the clip
    pub start_beat: u32,
    /// Length in beats (always >= 1)
    pub duration: u32,
    /// Sub-track inside the instrument row
    pub lane: u32,
}

impl ClipSpan {
    /// Create a span, clamping the duration to at least one beat
    pub fn new(start_beat: u32, duration: u32, lane: u32) -> Self {
        Self {
            start_beat,
            duration: duration.max(1),
            lane,
        }
    }

    /// First beat after the clip (exclusive end)
    pub fn end_beat(&self) -> u32 {
        self.start_beat.saturating_add(self.duration)
    }

    /// Half-open interval overlap test; touching endpoints do not overlap
    pub fn overlaps(&self, other: &ClipSpan) -> bool {
        self.start_beat < other.end_beat() && self.end_beat() > other.start_beat
    }

    /// Check if this span covers a given beat
    pub fn contains_beat(&self, beat: u32) -> bool {
        beat >= self.start_beat && beat < self.end_beat()
    }
}

/// A clip placed on an instrument's timeline row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    pub id: ClipId,

    /// Offset from the timeline origin, in beats
    pub start_beat: u32,

    /// Length in beats
    #[serde(default = "one_beat", deserialize_with = "deserialize_duration")]
    pub duration: u32,

    /// Owning instrument's display name (denormalized for rendering)
    #[serde(default)]
    pub instrument_name: String,

    /// Owning instrument's color (denormalized for rendering)
    #[serde(default)]
    pub color: String,

    #[serde(default)]
    pub lane: u32,
}

impl Clip {
    /// Create a new clip. A zero duration is clamped to one beat.
    pub fn new(
        id: ClipId,
        span: ClipSpan,
        instrument_name: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            id,
            start_beat: span.start_beat,
            duration: span.duration.max(1),
            instrument_name: instrument_name.into(),
            color: color.into(),
            lane: span.lane,
        }
    }

    /// Get the span (position, length, lane) of this clip
    pub fn span(&self) -> ClipSpan {
        ClipSpan::new(self.start_beat, self.duration, self.lane)
    }

    /// Overwrite position, length and lane
    pub fn set_span(&mut self, span: ClipSpan) {
        self.start_beat = span.start_beat;
        self.duration = span.duration.max(1);
        self.lane = span.lane;
    }

    /// First beat after the clip
    pub fn end_beat(&self) -> u32 {
        self.span().end_beat()
    }

    /// Check if the clip sounds on a given beat
    pub fn contains_beat(&self, beat: u32) -> bool {
        self.span().contains_beat(beat)
    }

    /// Position of `beat` inside the clip, if the clip covers it
    pub fn step_index(&self, beat: u32) -> Option<usize> {
        self.contains_beat(beat)
            .then(|| (beat - self.start_beat) as usize)
    }
}

// Clips compare by identity, not by placement
impl PartialEq for Clip {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Clip {}

fn one_beat() -> u32 {
    1
}

/// Whole beats of a serialized duration; missing, non-numeric and sub-beat
/// values all become one beat
fn duration_from_value(value: &serde_json::Value) -> u32 {
    match value.as_f64() {
        Some(duration) if duration.is_finite() && duration >= 1.0 => {
            duration.floor().min(u32::MAX as f64) as u32
        }
        _ => 1,
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(duration_from_value(&value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(id: &str, start: u32, duration: u32, lane: u32) -> Clip {
        Clip::new(id.to_string(), ClipSpan::new(start, duration, lane), "Piano", "#ef4444")
    }

    #[test]
    fn test_clip_end_beat() {
        let clip = clip("a", 10, 4, 0);
        assert_eq!(clip.end_beat(), 14);
    }

    #[test]
    fn test_zero_duration_clamped() {
        let clip = clip("a", 3, 0, 0);
        assert_eq!(clip.duration, 1);

        let span = ClipSpan::new(0, 0, 2);
        assert_eq!(span.duration, 1);
    }

    #[test]
    fn test_contains_beat() {
        let clip = clip("a", 4, 2, 0);

        assert!(!clip.contains_beat(3));
        assert!(clip.contains_beat(4));
        assert!(clip.contains_beat(5));
        assert!(!clip.contains_beat(6));
    }

    #[test]
    fn test_step_index() {
        let clip = clip("a", 8, 3, 1);

        assert_eq!(clip.step_index(7), None);
        assert_eq!(clip.step_index(8), Some(0));
        assert_eq!(clip.step_index(10), Some(2));
        assert_eq!(clip.step_index(11), None);
    }

    #[test]
    fn test_span_overlap_touching() {
        let a = ClipSpan::new(10, 4, 0);
        let touching = ClipSpan::new(14, 2, 0);
        let overlapping = ClipSpan::new(13, 2, 0);

        assert!(!a.overlaps(&touching));
        assert!(!touching.overlaps(&a));
        assert!(a.overlaps(&overlapping));
    }

    #[test]
    fn test_equality_by_id() {
        let a = clip("same", 0, 4, 0);
        let b = clip("same", 20, 1, 3);
        let c = clip("other", 0, 4, 0);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_deserialize_clamps_duration() {
        let json = r##"{"id":"c1","startBeat":2,"duration":0,"instrumentName":"Flute","color":"#fff","lane":1}"##;
        let clip: Clip = serde_json::from_str(json).unwrap();

        assert_eq!(clip.duration, 1);
        assert_eq!(clip.lane, 1);
        assert_eq!(clip.start_beat, 2);
    }

    #[test]
    fn test_deserialize_defaults_bad_or_missing_duration() {
        for duration in [r#","duration":"long""#, r#","duration":null"#, r#","duration":3.9"#, ""] {
            let json = format!(
                r##"{{"id":"c1","startBeat":0{duration},"instrumentName":"Flute","color":"#fff","lane":0}}"##
            );
            let clip: Clip = serde_json::from_str(&json).unwrap();
            let expected = if duration.contains("3.9") { 3 } else { 1 };
            assert_eq!(clip.duration, expected, "{json}");
        }
    }
}
