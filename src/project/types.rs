// Types for the project export/import document

use serde::{Deserialize, Serialize};

use crate::sequencer::clip::Clip;
use crate::sequencer::instrument::{Instrument, InstrumentId};

/// Document version written by `export_project`
pub const PROJECT_FORMAT_VERSION: u32 = 1;

/// Exported project, as written to `<name>.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    /// Absent in documents written before versioning; treated as 1
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub name: String,

    /// Null or absent keeps the importing store's default tempo
    #[serde(default)]
    pub bpm: Option<f64>,

    pub instruments: Vec<Instrument>,

    #[serde(default)]
    pub timeline: Vec<TimelineRecord>,

    /// RFC 3339 timestamp of the export
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<String>,
}

fn default_version() -> u32 {
    PROJECT_FORMAT_VERSION
}

/// Clips of one instrument
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineRecord {
    pub instrument_id: InstrumentId,

    #[serde(default)]
    pub clips: Vec<Clip>,
}

/// What an import changed on the way in
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub instruments: usize,
    pub clips: usize,
    /// Clips whose duration was raised to one beat
    pub clamped_durations: usize,
    /// Clips moved to another lane because they overlapped an earlier one
    pub relaned_clips: usize,
    /// Timeline entries naming an instrument that is not in the document
    pub orphaned_entries: usize,
    /// Instruments skipped because their id was already used
    pub duplicate_instruments: usize,
}

impl ImportReport {
    /// True if the document was applied exactly as written
    pub fn is_clean(&self) -> bool {
        self.clamped_durations == 0
            && self.relaned_clips == 0
            && self.orphaned_entries == 0
            && self.duplicate_instruments == 0
    }
}
