// Transport - Playback cursor and tempo
// Tracks the beat cursor over a fixed horizon and derives the tick period

use std::fmt;
use std::time::Duration;

/// Default number of beats before the cursor wraps
pub const DEFAULT_TOTAL_BEATS: u32 = 64;

/// Tempo in BPM (Beats Per Minute)
///
/// No range is enforced on assignment; an unusable value is reported
/// when a tick period is requested.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    bpm: f64,
}

impl Tempo {
    /// Creates a new tempo
    pub fn new(bpm: f64) -> Self {
        Self { bpm }
    }

    /// Get BPM value
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Set BPM value
    pub fn set_bpm(&mut self, bpm: f64) {
        self.bpm = bpm;
    }

    /// Whether the tempo can drive a timer
    pub fn is_playable(&self) -> bool {
        self.bpm.is_finite() && self.bpm > 0.0
    }

    /// Duration of one beat (one tick) in milliseconds: 60000 / bpm
    pub fn tick_period_ms(&self) -> f64 {
        60_000.0 / self.bpm
    }

    /// Duration of one beat, or None if the tempo is not playable
    pub fn tick_period(&self) -> Option<Duration> {
        if !self.is_playable() {
            return None;
        }
        Duration::try_from_secs_f64(self.tick_period_ms() / 1000.0).ok()
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self::new(120.0)
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} BPM", self.bpm)
    }
}

/// Transport state (play/stop)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
}

impl TransportState {
    pub fn is_playing(&self) -> bool {
        matches!(self, TransportState::Playing)
    }
}

/// Transport controller
/// Owns the beat cursor; the cursor always stays in `[0, total_beats)`
#[derive(Debug, Clone)]
pub struct Transport {
    state: TransportState,
    current_beat: u32,
    total_beats: u32,
}

impl Transport {
    /// Create new transport wrapping after `total_beats` (at least 1)
    pub fn new(total_beats: u32) -> Self {
        Self {
            state: TransportState::Stopped,
            current_beat: 0,
            total_beats: total_beats.max(1),
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    pub fn current_beat(&self) -> u32 {
        self.current_beat
    }

    pub fn total_beats(&self) -> u32 {
        self.total_beats
    }

    /// Move the cursor, wrapping into range
    pub fn set_current_beat(&mut self, beat: u32) {
        self.current_beat = beat % self.total_beats;
    }

    /// Play (cursor keeps its last value)
    pub fn play(&mut self) {
        self.state = TransportState::Playing;
    }

    /// Stop and rewind the cursor to 0
    pub fn stop(&mut self) {
        self.state = TransportState::Stopped;
        self.current_beat = 0;
    }

    /// Advance the cursor by one beat, wrapping at the horizon
    /// Returns the new beat
    pub fn advance(&mut self) -> u32 {
        self.current_beat = (self.current_beat + 1) % self.total_beats;
        self.current_beat
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new(DEFAULT_TOTAL_BEATS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tempo_tick_period() {
        let tempo = Tempo::new(120.0);
        assert_eq!(tempo.tick_period_ms(), 500.0);
        assert_eq!(tempo.tick_period(), Some(Duration::from_millis(500)));

        let tempo = Tempo::new(60.0);
        assert_eq!(tempo.tick_period(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_tempo_unplayable() {
        assert_eq!(Tempo::new(0.0).tick_period(), None);
        assert_eq!(Tempo::new(-10.0).tick_period(), None);
        assert_eq!(Tempo::new(f64::NAN).tick_period(), None);
        assert_eq!(Tempo::default().to_string(), "120.0 BPM");
    }

    #[test]
    fn test_transport_advance_wraps() {
        let mut transport = Transport::new(4);

        assert_eq!(transport.advance(), 1);
        assert_eq!(transport.advance(), 2);
        assert_eq!(transport.advance(), 3);
        assert_eq!(transport.advance(), 0);
    }

    #[test]
    fn test_play_keeps_cursor_stop_resets() {
        let mut transport = Transport::new(64);
        transport.set_current_beat(10);

        transport.play();
        assert!(transport.is_playing());
        assert_eq!(transport.current_beat(), 10);

        transport.stop();
        assert_eq!(transport.state(), TransportState::Stopped);
        assert_eq!(transport.current_beat(), 0);
    }

    #[test]
    fn test_zero_horizon_is_clamped() {
        let mut transport = Transport::new(0);
        assert_eq!(transport.total_beats(), 1);
        assert_eq!(transport.advance(), 0);
    }
}
