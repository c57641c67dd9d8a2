// Integration tests for the timeline store
// Lane disjointness under arbitrary edit sequences, plus the boundary cases

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sinesth::sequencer::collision::{collides, find_free_lane};
use sinesth::{Clip, ClipSpan, EditError, Instrument, StoreSettings, TimelineStore};

fn assert_lanes_disjoint(store: &TimelineStore) {
    for instrument in store.instruments() {
        let clips = store.clips(&instrument.id);
        for (i, a) in clips.iter().enumerate() {
            for b in &clips[i + 1..] {
                if a.lane == b.lane {
                    assert!(
                        a.end_beat() <= b.start_beat || b.end_beat() <= a.start_beat,
                        "clips {} [{}, {}) and {} [{}, {}) overlap in lane {}",
                        a.id,
                        a.start_beat,
                        a.end_beat(),
                        b.id,
                        b.start_beat,
                        b.end_beat(),
                        a.lane
                    );
                }
            }
        }
    }
}

#[test]
fn test_random_edits_keep_lanes_disjoint() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let settings = StoreSettings {
        max_lane_search: 4,
        ..StoreSettings::default()
    };
    let mut store = TimelineStore::new(settings);
    for id in ["a", "b"] {
        store
            .add_instrument(Instrument::new(id.into(), "flute", "x", 1.0))
            .unwrap();
    }

    for _ in 0..2_000 {
        let instrument = if rng.gen_bool(0.5) { "a" } else { "b" };
        let clip_ids: Vec<String> = store.clips(instrument).iter().map(|c| c.id.clone()).collect();
        let target = if clip_ids.is_empty() {
            None
        } else {
            Some(clip_ids[rng.gen_range(0..clip_ids.len())].clone())
        };

        match (rng.gen_range(0..5), target) {
            (0, _) | (_, None) => {
                let _ = store.add_clip(instrument, rng.gen_range(0..48));
            }
            (1, Some(id)) => {
                let _ = store.move_clip(instrument, &id, rng.gen_range(0..48), rng.gen_range(0..5));
            }
            (2, Some(id)) => {
                let _ = store.resize_clip(instrument, &id, rng.gen_range(0..12));
            }
            (3, Some(id)) => {
                let span = ClipSpan::new(rng.gen_range(0..48), rng.gen_range(0..8), rng.gen_range(0..5));
                let _ = store.reshape_clip(instrument, &id, span);
            }
            (_, Some(id)) => {
                let _ = store.delete_clip(instrument, &id);
            }
        }

        assert_lanes_disjoint(&store);
    }
}

#[test]
fn test_touching_boundary_scenario() {
    let mut store = TimelineStore::default();
    store
        .add_instrument(Instrument::new("i".into(), "flute", "x", 1.0))
        .unwrap();
    let a = store.add_clip("i", 10).unwrap();
    let b = store.add_clip("i", 20).unwrap();

    // [10, 14) and [14, 16) touch without overlapping
    store.move_clip("i", &b, 14, 0).unwrap();
    store.resize_clip("i", &b, 2).unwrap();
    assert_eq!(store.clip("i", &b).unwrap().span(), ClipSpan::new(14, 2, 0));

    // [13, 15) overlaps [10, 14)
    let result = store.move_clip("i", &b, 13, 0);
    assert!(matches!(result, Err(EditError::Collision { ref other, .. }) if *other == a));
    assert_eq!(store.clip("i", &b).unwrap().start_beat, 14);
}

#[test]
fn test_colliding_move_leaves_both_clips() {
    let mut store = TimelineStore::default();
    store
        .add_instrument(Instrument::new("i".into(), "flute", "x", 1.0))
        .unwrap();
    let a = store.add_clip("i", 0).unwrap();
    let b = store.add_clip("i", 8).unwrap();
    let before: Vec<ClipSpan> = store.clips("i").iter().map(Clip::span).collect();
    let revision = store.revision();

    assert!(store.move_clip("i", &a, 9, 0).is_err());

    let after: Vec<ClipSpan> = store.clips("i").iter().map(Clip::span).collect();
    assert_eq!(before, after);
    assert_eq!(store.revision(), revision);
    assert!(store.clip("i", &b).is_some());
}

#[test]
fn test_clips_of_different_instruments_never_collide() {
    let mut store = TimelineStore::default();
    for id in ["a", "b"] {
        store
            .add_instrument(Instrument::new(id.into(), "flute", "x", 1.0))
            .unwrap();
    }

    let a = store.add_clip("a", 0).unwrap();
    let b = store.add_clip("b", 0).unwrap();

    assert_eq!(store.clip("a", &a).unwrap().lane, 0);
    assert_eq!(store.clip("b", &b).unwrap().lane, 0);
}

#[test]
fn test_unknown_references_are_reported_not_applied() {
    let mut store = TimelineStore::default();
    store
        .add_instrument(Instrument::new("i".into(), "flute", "x", 1.0))
        .unwrap();
    let revision = store.revision();

    assert!(matches!(store.add_clip("ghost", 0), Err(EditError::UnknownInstrument(_))));
    assert!(matches!(store.move_clip("i", "nope", 1, 0), Err(EditError::UnknownClip { .. })));
    assert!(matches!(store.resize_clip("ghost", "nope", 2), Err(EditError::UnknownInstrument(_))));
    assert_eq!(store.delete_clip("i", "nope"), Ok(None));
    assert_eq!(store.revision(), revision);
}

#[test]
fn test_find_free_lane_is_deterministic() {
    let clips: Vec<Clip> = (0..6)
        .map(|i| Clip::new(format!("c{i}"), ClipSpan::new(i * 2, 4, i % 3), "Flute", "#fff"))
        .collect();

    let first = find_free_lane(&clips, 3, 4, 100);
    for _ in 0..10 {
        assert_eq!(find_free_lane(&clips, 3, 4, 100), first);
    }

    let mut reversed = clips.clone();
    reversed.reverse();
    assert_eq!(find_free_lane(&reversed, 3, 4, 100), first);
    assert!(!collides(&ClipSpan::new(3, 4, first.lane), &clips, None));
}
