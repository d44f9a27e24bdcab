//! Persisted placement progress across reloads.

use timewalk::game::{CompletionSet, PlacementOutcome, TimelineGame};
use timewalk::storage::KvStore;

#[test]
fn test_correct_placement_persists_across_reload() {
    let dir = tempfile::tempdir().unwrap();

    // Session one: solve a placement and persist.
    {
        let store = KvStore::open(dir.path()).unwrap();
        let mut progress = store.get_or("completed", CompletionSet::default());
        assert!(!progress.is_completed("schloss"));

        let mut round = TimelineGame::begin("schloss", &progress);
        assert_eq!(
            round.tap("schloss", &mut progress),
            PlacementOutcome::Correct
        );
        store.put("completed", &progress).unwrap();
    }

    // Session two: the placement is still solved, and solving it again is
    // not possible.
    {
        let store = KvStore::open(dir.path()).unwrap();
        let mut progress = store.get_or("completed", CompletionSet::default());
        assert!(progress.is_completed("schloss"));

        let mut round = TimelineGame::begin("schloss", &progress);
        assert!(round.solved());
        assert_eq!(
            round.tap("schloss", &mut progress),
            PlacementOutcome::AlreadySolved
        );
    }
}

#[test]
fn test_reset_clears_persisted_progress() {
    let dir = tempfile::tempdir().unwrap();
    let store = KvStore::open(dir.path()).unwrap();

    let mut progress = CompletionSet::default();
    progress.mark_completed("schloss");
    progress.mark_completed("altstadt");
    store.put("completed", &progress).unwrap();

    progress.reset();
    store.put("completed", &progress).unwrap();

    let reloaded = store.get_or("completed", CompletionSet::default());
    assert!(reloaded.is_empty());
    assert!(!reloaded.is_completed("schloss"));
}

#[test]
fn test_incorrect_taps_leave_persisted_state_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let store = KvStore::open(dir.path()).unwrap();

    let mut progress = store.get_or("completed", CompletionSet::default());
    let mut round = TimelineGame::begin("schloss", &progress);

    // A volley of wrong answers with the rejection cue finishing between
    // each: input always comes back, progress never moves.
    for _ in 0..4 {
        assert_eq!(
            round.tap("pompejanum", &mut progress),
            PlacementOutcome::Incorrect
        );
        assert_eq!(
            round.tap("schloss", &mut progress),
            PlacementOutcome::InputLocked
        );
        round.rejection_finished();
        assert!(!round.input_locked());
    }

    store.put("completed", &progress).unwrap();
    let reloaded = store.get_or("completed", CompletionSet::default());
    assert!(reloaded.is_empty());

    // Input re-enabled: the correct slot still works afterwards.
    assert_eq!(
        round.tap("schloss", &mut progress),
        PlacementOutcome::Correct
    );
}

#[test]
fn test_malformed_save_degrades_to_empty_progress() {
    let dir = tempfile::tempdir().unwrap();
    let store = KvStore::open(dir.path()).unwrap();

    std::fs::write(dir.path().join("completed.json"), "][ not json").unwrap();

    let progress = store.get_or("completed", CompletionSet::default());
    assert!(progress.is_empty());
}
