// Project export/import - store <-> JSON document

use crate::project::types::*;
use crate::project::{ProjectError, ProjectResult};
use crate::sequencer::clip::{Clip, generate_clip_id};
use crate::sequencer::collision::{collides, find_free_lane};
use crate::sequencer::instrument::{Instrument, InstrumentId};
use crate::store::TimelineStore;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// File name for an exported project
///
/// `"My Song"` becomes `my-song.json`; a blank name falls back to a
/// timestamp (`sinesth-<unix millis>.json`).
pub fn export_filename(project_name: &str, now: DateTime<Utc>) -> String {
    let slug = project_name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase();

    if slug.is_empty() {
        format!("sinesth-{}.json", now.timestamp_millis())
    } else {
        format!("{}.json", slug)
    }
}

impl TimelineStore {
    /// Snapshot the project as an export document
    pub fn export_project(&self) -> ProjectFile {
        self.export_project_at(Utc::now())
    }

    pub fn export_project_at(&self, now: DateTime<Utc>) -> ProjectFile {
        let timeline = self
            .instruments()
            .iter()
            .map(|instrument| TimelineRecord {
                instrument_id: instrument.id.clone(),
                clips: self.clips(&instrument.id).to_vec(),
            })
            .collect();

        ProjectFile {
            version: PROJECT_FORMAT_VERSION,
            name: self.project_name().to_string(),
            bpm: Some(self.bpm()),
            instruments: self.instruments().to_vec(),
            timeline,
            exported_at: Some(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }

    pub fn export_json(&self) -> ProjectResult<String> {
        Ok(serde_json::to_string_pretty(&self.export_project())?)
    }

    pub fn export_to_file<P: AsRef<Path>>(&self, path: P) -> ProjectResult<()> {
        std::fs::write(path, self.export_json()?)?;
        Ok(())
    }

    /// Replace the whole store with a JSON export document
    ///
    /// The document is fully validated before anything is touched: on error
    /// the store is left exactly as it was.
    pub fn import_project(&mut self, json: &str) -> ProjectResult<ImportReport> {
        let value: Value = serde_json::from_str(json)?;
        self.import_value(value)
    }

    pub fn import_file<P: AsRef<Path>>(&mut self, path: P) -> ProjectResult<ImportReport> {
        let json = std::fs::read_to_string(path)?;
        self.import_project(&json)
    }

    pub fn import_value(&mut self, mut value: Value) -> ProjectResult<ImportReport> {
        let document = value
            .as_object_mut()
            .ok_or_else(|| ProjectError::InvalidProject("document is not an object".into()))?;

        match document.get("instruments") {
            Some(Value::Array(_)) => {}
            Some(_) => {
                return Err(ProjectError::InvalidProject(
                    "'instruments' is not an array".into(),
                ));
            }
            None => return Err(ProjectError::InvalidProject("'instruments' is missing".into())),
        }

        // Checked here so that integral floats ("version": 1.0) are accepted
        match document.remove("version") {
            None | Some(Value::Null) => {}
            Some(Value::Number(n)) => match n.as_f64() {
                Some(v) if v <= PROJECT_FORMAT_VERSION as f64 => {}
                Some(v) => return Err(ProjectError::UnsupportedVersion(v as u64)),
                None => return Err(ProjectError::InvalidProject("invalid 'version'".into())),
            },
            Some(_) => {
                return Err(ProjectError::InvalidProject("'version' is not a number".into()));
            }
        }

        let clamped_durations =
            count_short_clips(document.get("instruments"), document.get("timeline"));
        let file: ProjectFile = serde_json::from_value(value)?;

        let (instruments, clips, mut report) =
            repair_document(file.instruments, file.timeline, self.settings().max_lane_search);
        report.clamped_durations = clamped_durations;

        self.clear_all();
        self.set_project_name(file.name);
        // A null or zero tempo keeps the default
        if let Some(bpm) = file.bpm.filter(|bpm| *bpm != 0.0) {
            self.set_bpm(bpm);
        }
        for instrument in instruments {
            let id = instrument.id.clone();
            self.add_instrument(instrument)?;
            if let Some(clips) = clips.get(&id) {
                self.replace_clips(&id, clips.clone());
            }
        }

        log::info!(
            "Imported project '{}': {} instrument(s), {} clip(s)",
            self.project_name(),
            report.instruments,
            report.clips
        );
        if !report.is_clean() {
            log::warn!("Import repaired the document: {:?}", report);
        }

        Ok(report)
    }
}

/// Clips of known instruments whose `duration` deserializes to a forced
/// single beat. Entries of unknown instruments are dropped later and not
/// counted.
fn count_short_clips(instruments: Option<&Value>, timeline: Option<&Value>) -> usize {
    let (Some(Value::Array(instruments)), Some(Value::Array(records))) = (instruments, timeline)
    else {
        return 0;
    };

    let known: HashSet<&str> = instruments
        .iter()
        .filter_map(|instrument| instrument.get("id").and_then(Value::as_str))
        .collect();

    records
        .iter()
        .filter(|record| {
            record
                .get("instrumentId")
                .and_then(Value::as_str)
                .is_some_and(|id| known.contains(id))
        })
        .filter_map(|record| record.get("clips").and_then(Value::as_array))
        .flatten()
        .filter(|clip| {
            !clip
                .get("duration")
                .and_then(Value::as_f64)
                .is_some_and(|d| d.is_finite() && d >= 1.0)
        })
        .count()
}

/// Drop duplicates and orphans, and move overlapping clips to free lanes
fn repair_document(
    instruments: Vec<Instrument>,
    timeline: Vec<TimelineRecord>,
    max_lane_search: u32,
) -> (Vec<Instrument>, HashMap<InstrumentId, Vec<Clip>>, ImportReport) {
    let mut report = ImportReport::default();

    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(instruments.len());
    for instrument in instruments {
        if seen.insert(instrument.id.clone()) {
            kept.push(instrument);
        } else {
            log::warn!("Skipping duplicate instrument {}", instrument.id);
            report.duplicate_instruments += 1;
        }
    }

    let mut placed: HashMap<InstrumentId, Vec<Clip>> = HashMap::new();
    for record in timeline {
        if !seen.contains(&record.instrument_id) {
            log::warn!(
                "Dropping {} clip(s) of unknown instrument {}",
                record.clips.len(),
                record.instrument_id
            );
            report.orphaned_entries += 1;
            continue;
        }

        let lane_clips = placed.entry(record.instrument_id).or_default();
        for mut clip in record.clips {
            if lane_clips.iter().any(|c| c.id == clip.id) {
                clip.id = generate_clip_id();
            }

            if collides(&clip.span(), lane_clips, None) {
                // A free lane always exists within len + 1 lanes
                let bound = max_lane_search.max(lane_clips.len() as u32 + 1);
                let search = find_free_lane(lane_clips, clip.start_beat, clip.duration, bound);
                log::debug!(
                    "Clip {} overlaps in lane {}, moving to lane {}",
                    clip.id,
                    clip.lane,
                    search.lane
                );
                clip.lane = search.lane;
                report.relaned_clips += 1;
            }

            lane_clips.push(clip);
        }
    }

    report.instruments = kept.len();
    report.clips = placed.values().map(Vec::len).sum();
    (kept, placed, report)
}
