#![cfg(feature = "sqlite")]

use phaseplan::{PersistenceError, Phase, PhaseDraft, PhaseStore, Schedule, SqlitePhaseStore};
use tempfile::NamedTempFile;

fn draft(number: &str, hours: i64) -> PhaseDraft {
    PhaseDraft::new(number, format!("Phase {number}"), hours)
}

#[test]
fn phases_load_in_number_order_with_predecessors() {
    let file = NamedTempFile::new().unwrap();
    let store = SqlitePhaseStore::new(file.path()).unwrap();

    let c = store.save_phase(1, None, &draft("3", 2)).unwrap();
    let a = store.save_phase(1, None, &draft("1", 3)).unwrap();
    let b = store.save_phase(1, None, &draft("2", 5)).unwrap();
    store
        .save_phase(1, Some(c.id), &draft("3", 2).with_predecessors([a.id, b.id]))
        .unwrap();

    // Reopen to make sure everything was committed.
    drop(store);
    let store = SqlitePhaseStore::new(file.path()).unwrap();
    let phases = store.load_phases(1).unwrap();

    let numbers: Vec<&str> = phases.iter().map(|p| p.number.as_str()).collect();
    assert_eq!(numbers, vec!["1", "2", "3"]);
    assert_eq!(phases[2].predecessors, vec![a.id, b.id]);

    let run = Schedule::default().compute(&phases);
    let merge = run.item(c.id).unwrap();
    assert_eq!((merge.start_offset, merge.end_offset), (5, 7));
    assert_eq!(run.item(a.id).unwrap().slack, 2);
}

#[test]
fn projects_are_isolated() {
    let store = SqlitePhaseStore::in_memory().unwrap();
    store.save_phase(1, None, &draft("1", 1)).unwrap();
    store.save_phase(2, None, &draft("1", 1)).unwrap();
    store.save_phase(2, None, &draft("2", 1)).unwrap();

    assert_eq!(store.load_phases(1).unwrap().len(), 1);
    assert_eq!(store.load_phases(2).unwrap().len(), 2);
    assert!(store.load_phases(3).unwrap().is_empty());
}

#[test]
fn duplicate_number_in_project_is_rejected() {
    let store = SqlitePhaseStore::in_memory().unwrap();
    store.save_phase(1, None, &draft("1", 1)).unwrap();
    let other = store.save_phase(1, None, &draft("2", 1)).unwrap();

    let err = store.save_phase(1, None, &draft("1", 4)).unwrap_err();
    assert!(matches!(err, PersistenceError::DuplicateNumber { .. }), "{err}");

    let err = store.save_phase(1, Some(other.id), &draft("1", 4)).unwrap_err();
    assert!(matches!(err, PersistenceError::DuplicateNumber { .. }), "{err}");
}

#[test]
fn non_positive_hours_are_rejected() {
    let store = SqlitePhaseStore::in_memory().unwrap();
    let err = store.save_phase(1, None, &draft("1", 0)).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(_)));
    assert!(store.load_phases(1).unwrap().is_empty());
}

#[test]
fn self_and_repeated_predecessors_are_normalized() {
    let store = SqlitePhaseStore::in_memory().unwrap();
    let a = store.save_phase(1, None, &draft("1", 1)).unwrap();
    let b = store.save_phase(1, None, &draft("2", 1)).unwrap();

    let saved = store
        .save_phase(
            1,
            Some(b.id),
            &draft("2", 1).with_predecessors([b.id, a.id, a.id]),
        )
        .unwrap();
    assert_eq!(saved.predecessors, vec![a.id]);

    let phases = store.load_phases(1).unwrap();
    assert_eq!(phases[1].predecessors, vec![a.id]);
}

#[test]
fn predecessor_from_another_project_is_rejected() {
    let store = SqlitePhaseStore::in_memory().unwrap();
    let foreign = store.save_phase(2, None, &draft("1", 1)).unwrap();
    let local = store.save_phase(1, None, &draft("1", 1)).unwrap();

    let err = store
        .save_phase(1, Some(local.id), &draft("1", 1).with_predecessors([foreign.id]))
        .unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(_)));
    assert!(store.load_phases(1).unwrap()[0].predecessors.is_empty());
}

#[test]
fn deleting_a_phase_removes_edges_that_point_at_it() {
    let store = SqlitePhaseStore::in_memory().unwrap();
    let a = store.save_phase(1, None, &draft("1", 1)).unwrap();
    let b = store.save_phase(1, None, &draft("2", 1)).unwrap();
    store
        .save_phase(1, None, &draft("3", 1).with_predecessors([a.id, b.id]))
        .unwrap();

    store.delete_phase(a.id).unwrap();

    let phases = store.load_phases(1).unwrap();
    assert_eq!(phases.len(), 2);
    assert_eq!(phases[1].predecessors, vec![b.id]);
}

#[test]
fn unknown_phase_is_not_found() {
    let store = SqlitePhaseStore::in_memory().unwrap();
    assert!(matches!(
        store.delete_phase(42),
        Err(PersistenceError::NotFound(42))
    ));
    assert!(matches!(
        store.save_phase(1, Some(42), &draft("1", 1)),
        Err(PersistenceError::NotFound(42))
    ));
}

#[test]
fn import_remaps_ids_and_drops_outside_predecessors() {
    let store = SqlitePhaseStore::in_memory().unwrap();
    store.save_phase(1, None, &draft("0", 1)).unwrap();

    let phases = vec![
        Phase::new(100, "1", "First", 3),
        Phase::new(200, "2", "Second", 2).with_predecessors([100, 999, 200]),
    ];
    let stored = store.import_phases(1, &phases).unwrap();

    assert_eq!(stored.len(), 2);
    assert_eq!(stored[1].predecessors, vec![stored[0].id]);
    let loaded = store.load_phases(1).unwrap();
    assert_eq!(loaded.len(), 3);
    assert_eq!(loaded[2].predecessors, vec![stored[0].id]);
}

#[test]
fn failed_import_rolls_back_every_phase() {
    let store = SqlitePhaseStore::in_memory().unwrap();
    store.save_phase(1, None, &draft("2", 1)).unwrap();

    let phases = vec![
        Phase::new(1, "1", "New", 1),
        Phase::new(2, "2", "Clash", 1).with_predecessors([1]),
    ];
    let err = store.import_phases(1, &phases).unwrap_err();
    assert!(matches!(err, PersistenceError::DuplicateNumber { .. }), "{err}");

    let numbers: Vec<String> = store
        .load_phases(1)
        .unwrap()
        .into_iter()
        .map(|p| p.number)
        .collect();
    assert_eq!(numbers, vec!["2".to_string()]);
}
