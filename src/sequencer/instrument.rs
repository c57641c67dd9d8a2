// Instrument - an equation bound to a synthesized voice
// Maps a step index to an x value, and x to a frequency through the equation

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Unique identifier for instruments
pub type InstrumentId = String;

/// Domain walked by the editor preview (x = 1 ..= 500)
pub const PREVIEW_DOMAIN: RangeInclusive<f64> = 1.0..=500.0;

/// Palette used when an instrument is created without a color
pub const INSTRUMENT_COLORS: [&str; 8] = [
    "#ef4444", "#3b82f6", "#10b981", "#f59e0b", "#8b5cf6", "#ec4899", "#06b6d4", "#84cc16",
];

/// Instrument configuration as created in the editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub id: InstrumentId,

    /// Voice identifier (e.g. "clavinet")
    pub name: String,

    /// Label shown on the timeline row
    #[serde(default)]
    pub display_name: String,

    /// Expression in the free variable `x`
    pub equation: String,

    /// Increment of `x` per step
    #[serde(rename = "dX")]
    pub d_x: f64,

    /// Editor preview tick period in milliseconds
    #[serde(rename = "dT", default = "default_d_t")]
    pub d_t: u64,

    /// Name of the synthesized voice to load
    #[serde(default)]
    pub instrument_name: String,

    /// Soundfont family of the voice
    #[serde(default)]
    pub soundfont: String,

    #[serde(default)]
    pub color: String,

    /// Per-step mute mask; a missing entry means the step sounds
    #[serde(default)]
    pub enabled_ticks: Vec<bool>,
}

fn default_d_t() -> u64 {
    220
}

impl Instrument {
    /// Create an instrument whose voice and display name are both `name`
    pub fn new(
        id: InstrumentId,
        name: impl Into<String>,
        equation: impl Into<String>,
        d_x: f64,
    ) -> Self {
        let name = name.into();
        Self {
            id,
            display_name: name.clone(),
            instrument_name: name.clone(),
            name,
            equation: equation.into(),
            d_x,
            d_t: default_d_t(),
            soundfont: String::new(),
            color: INSTRUMENT_COLORS[0].to_string(),
            enabled_ticks: Vec::new(),
        }
    }

    /// Label for rendering: display name, or voice name when blank
    pub fn label(&self) -> &str {
        if self.display_name.trim().is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }

    /// Voice to load from the audio backend
    pub fn voice_name(&self) -> &str {
        if self.instrument_name.trim().is_empty() {
            &self.name
        } else {
            &self.instrument_name
        }
    }

    /// Whether a step sounds; steps past the end of the mask are enabled
    pub fn is_step_enabled(&self, step_index: usize) -> bool {
        self.enabled_ticks.get(step_index).copied().unwrap_or(true)
    }

    /// Equation input for a step inside a clip
    pub fn x_for_step(&self, step_index: usize) -> f64 {
        self.d_x * step_index as f64 + 1.0
    }

    /// Number of ticks the editor shows over a domain
    pub fn tick_count(&self, domain: &RangeInclusive<f64>) -> usize {
        if self.d_x <= 0.0 || !self.d_x.is_finite() {
            return 1;
        }
        ((domain.end() - domain.start()) / self.d_x).floor() as usize + 1
    }

    /// Resize the mute mask, keeping existing entries and enabling new ones
    pub fn fit_enabled_ticks(&mut self, count: usize) {
        self.enabled_ticks.resize(count, true);
    }

    /// Flip one step of the mute mask, growing it if needed
    pub fn toggle_tick(&mut self, step_index: usize) {
        if step_index >= self.enabled_ticks.len() {
            self.enabled_ticks.resize(step_index + 1, true);
        }
        self.enabled_ticks[step_index] = !self.enabled_ticks[step_index];
    }
}

/// Partial update applied by `TimelineStore::update_instrument`
#[derive(Debug, Clone, Default)]
pub struct InstrumentUpdate {
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub equation: Option<String>,
    pub d_x: Option<f64>,
    pub d_t: Option<u64>,
    pub instrument_name: Option<String>,
    pub soundfont: Option<String>,
    pub color: Option<String>,
    pub enabled_ticks: Option<Vec<bool>>,
}

impl InstrumentUpdate {
    /// Apply every present field to an instrument
    pub fn apply_to(self, instrument: &mut Instrument) {
        if let Some(name) = self.name {
            instrument.name = name;
        }
        if let Some(display_name) = self.display_name {
            instrument.display_name = display_name;
        }
        if let Some(equation) = self.equation {
            instrument.equation = equation;
        }
        if let Some(d_x) = self.d_x {
            instrument.d_x = d_x;
        }
        if let Some(d_t) = self.d_t {
            instrument.d_t = d_t;
        }
        if let Some(instrument_name) = self.instrument_name {
            instrument.instrument_name = instrument_name;
        }
        if let Some(soundfont) = self.soundfont {
            instrument.soundfont = soundfont;
        }
        if let Some(color) = self.color {
            instrument.color = color;
        }
        if let Some(enabled_ticks) = self.enabled_ticks {
            instrument.enabled_ticks = enabled_ticks;
        }
    }

    /// True if the update touches fields that clips copy
    pub fn touches_clip_fields(&self) -> bool {
        self.name.is_some() || self.display_name.is_some() || self.color.is_some()
    }
}
