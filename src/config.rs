// Sequencer configuration
// Loaded from a RON file; every field falls back to its default

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// Sequencer-wide constants and tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// Horizon the transport wraps around
    pub total_beats: u32,
    /// Length of a clip created with `add_clip`
    pub default_clip_beats: u32,
    /// Number of lanes scanned when placing a new clip
    pub max_lane_search: u32,
    /// Tempo of a fresh project
    pub default_bpm: f64,
    /// Horizontal pixels per beat
    pub beat_width: f32,
    /// Vertical pixels per lane
    pub lane_height: f32,
    /// Quiet window before a burst of edits is persisted
    pub autosave_debounce_ms: u64,
    /// Capacity of the scheduler -> audio trigger queue
    pub trigger_queue_capacity: usize,
    /// Lowest playable frequency (C0)
    pub frequency_min: f64,
    /// Highest playable frequency (B8)
    pub frequency_max: f64,
    /// Directory of the project store (platform data dir when unset)
    pub storage_dir: Option<PathBuf>,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            total_beats: 64,
            default_clip_beats: 4,
            max_lane_search: 100,
            default_bpm: 120.0,
            beat_width: 40.0,
            lane_height: 64.0,
            autosave_debounce_ms: 100,
            trigger_queue_capacity: 256,
            frequency_min: 16.35,
            frequency_max: 7902.13,
            storage_dir: None,
        }
    }
}

impl SequencerConfig {
    /// Load configuration from a RON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse configuration from RON text
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(content)?)
    }

    /// Directory used by the file-backed project store
    pub fn resolved_storage_dir(&self) -> PathBuf {
        self.storage_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("sinesth")
        })
    }
}
