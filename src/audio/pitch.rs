// Pitch helpers - equation value -> playable frequency -> note name

/// Closed range of frequencies voices are asked to play
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyBand {
    pub min: f64,
    pub max: f64,
}

impl FrequencyBand {
    /// C0 .. B8
    pub const AUDIBLE: FrequencyBand = FrequencyBand {
        min: 16.35,
        max: 7902.13,
    };

    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, frequency: f64) -> f64 {
        frequency.max(self.min).min(self.max)
    }

    /// Shape a raw equation value into the band: ceil(|value|), then clamp
    pub fn shape(&self, raw: f64) -> f64 {
        self.clamp(raw.abs().ceil())
    }
}

impl Default for FrequencyBand {
    fn default() -> Self {
        Self::AUDIBLE
    }
}

/// Nearest MIDI note number for a frequency (A4 = 440 Hz = 69)
pub fn frequency_to_midi(frequency: f64) -> i32 {
    (12.0 * (frequency / 440.0).log2() + 69.0).round() as i32
}

/// Name of the nearest equal-tempered note, e.g. "A4", "Db5"
pub fn note_name(frequency: f64) -> String {
    const NOTE_NAMES: [&str; 12] = [
        "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
    ];

    let midi = frequency_to_midi(frequency);
    let octave = midi.div_euclid(12) - 1;
    let note_index = midi.rem_euclid(12) as usize;

    format!("{}{}", NOTE_NAMES[note_index], octave)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_clamps_low_values() {
        let band = FrequencyBand::AUDIBLE;

        assert_eq!(band.shape(2.0), 16.35);
        assert_eq!(band.shape(22.0), 22.0);
        assert_eq!(band.shape(-22.0), 22.0);
        assert_eq!(band.shape(21.2), 22.0);
        assert_eq!(band.shape(1e9), 7902.13);
        assert_eq!(band.shape(f64::INFINITY), 7902.13);
    }

    #[test]
    fn test_note_names() {
        assert_eq!(note_name(440.0), "A4");
        assert_eq!(note_name(261.63), "C4");
        assert_eq!(note_name(277.18), "Db4");
        assert_eq!(note_name(16.35), "C0");
        assert_eq!(note_name(7902.13), "B8");
    }

    #[test]
    fn test_frequency_to_midi() {
        assert_eq!(frequency_to_midi(440.0), 69);
        assert_eq!(frequency_to_midi(880.0), 81);
        assert_eq!(frequency_to_midi(22.0), 17);
    }
}
