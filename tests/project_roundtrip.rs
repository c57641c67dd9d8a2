// Integration test for project export/import and autosave
// Tests the complete save/load cycle with realistic data

use sinesth::project::AUTOSAVE_KEY;
use sinesth::{
    AutoSave, FileStorage, Instrument, ProjectError, ProjectStorage, SequencerConfig,
    TimelineStore,
};
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn arrangement() -> TimelineStore {
    let mut store = TimelineStore::from_config(&SequencerConfig::default());
    store.set_project_name("Sine Study No. 2");
    store.set_bpm(132.5);

    let mut lead = Instrument::new("lead".into(), "clavinet", "(sin(x/30)*500) + 200", 12.5);
    lead.display_name = "Lead".into();
    lead.soundfont = "FluidR3_GM".into();
    lead.color = "#ef4444".into();
    lead.enabled_ticks = vec![true, true, false, true];
    store.add_instrument(lead).unwrap();

    let mut bass = Instrument::new("bass".into(), "electric_bass_finger", "x/4 + 40", 4.0);
    bass.d_t = 440;
    store.add_instrument(bass).unwrap();

    // Instruments without clips must survive the round trip too
    store
        .add_instrument(Instrument::new("idle".into(), "celesta", "x", 1.0))
        .unwrap();

    store.add_clip("lead", 0).unwrap();
    store.add_clip("lead", 2).unwrap();
    let long = store.add_clip("lead", 8).unwrap();
    store.resize_clip("lead", &long, 12).unwrap();
    store.add_clip("bass", 0).unwrap();
    store
}

fn assert_same_project(a: &TimelineStore, b: &TimelineStore) {
    assert_eq!(a.project_name(), b.project_name());
    assert_eq!(a.bpm(), b.bpm());
    assert_eq!(a.instruments(), b.instruments());

    let placements = |store: &TimelineStore, id: &str| -> Vec<_> {
        store
            .clips(id)
            .iter()
            .map(|c| (c.id.clone(), c.span(), c.instrument_name.clone(), c.color.clone()))
            .collect()
    };

    for instrument in a.instruments() {
        assert_eq!(
            placements(a, &instrument.id),
            placements(b, &instrument.id),
            "clips of {}",
            instrument.id
        );
    }
}

#[test]
fn test_export_import_roundtrip() {
    let original = arrangement();
    let json = original.export_json().unwrap();

    let mut restored = TimelineStore::default();
    let report = restored.import_project(&json).unwrap();

    assert!(report.is_clean());
    assert_eq!(report.instruments, 3);
    assert_eq!(report.clips, 4);
    assert_same_project(&original, &restored);
}

#[test]
fn test_import_replaces_previous_state() {
    let mut store = arrangement();
    let other = {
        let mut s = TimelineStore::default();
        s.set_project_name("Other");
        s.add_instrument(Instrument::new("solo".into(), "oboe", "x", 1.0))
            .unwrap();
        s.export_json().unwrap()
    };

    store.import_project(&other).unwrap();

    assert_eq!(store.project_name(), "Other");
    assert_eq!(store.instruments().len(), 1);
    assert!(store.instrument("lead").is_none());
    assert!(store.clips("lead").is_empty());
}

#[test]
fn test_invalid_import_keeps_state() {
    let mut store = arrangement();
    let before = store.export_json().unwrap();

    let result = store.import_project(r#"{"name": "Broken", "instruments": "nope"}"#);

    assert!(matches!(result, Err(ProjectError::InvalidProject(_))));
    let mut reloaded = TimelineStore::default();
    reloaded.import_project(&before).unwrap();
    assert_same_project(&store, &reloaded);
}

#[test]
fn test_file_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sine-study-no.-2.json");
    let original = arrangement();

    original.export_to_file(&path).unwrap();

    let mut restored = TimelineStore::default();
    restored.import_file(&path).unwrap();
    assert_same_project(&original, &restored);

    let missing = restored.import_file(dir.path().join("nope.json"));
    assert!(matches!(missing, Err(ProjectError::Io(_))));
}

#[test]
fn test_autosave_survives_restart() {
    let dir = TempDir::new().unwrap();
    let debounce = Duration::from_millis(100);
    let t0 = Instant::now();
    let original = arrangement();

    // First session: edit, wait out the debounce, write
    {
        let mut store = TimelineStore::default();
        let mut autosave = AutoSave::new(FileStorage::new(dir.path()), debounce);
        assert!(autosave.hydrate(&mut store).unwrap().is_none());

        store.import_project(&original.export_json().unwrap()).unwrap();
        assert!(!autosave.flush_if_due(&store, t0).unwrap());
        assert!(autosave.flush_if_due(&store, t0 + debounce).unwrap());
    }

    // Second session: hydrate without writing back
    let storage = FileStorage::new(dir.path());
    assert!(storage.get(AUTOSAVE_KEY).unwrap().is_some());

    let mut store = TimelineStore::default();
    let mut autosave = AutoSave::new(storage, debounce);
    autosave.hydrate(&mut store).unwrap();

    assert_same_project(&original, &store);
    assert!(!autosave.flush_if_due(&store, t0 + Duration::from_secs(5)).unwrap());
    assert_eq!(autosave.writes(), 0);
}
