use proptest::prelude::*;
use phaseplan::{Phase, Schedule};
use std::collections::HashSet;

// Acyclic phase sets: phase i may only depend on phases 0..i.
// Numbers are shuffled so display order differs from dependency order.
fn acyclic_phases(max_phases: usize) -> impl Strategy<Value = Vec<Phase>> {
    (1..=max_phases).prop_flat_map(|count| {
        (
            proptest::collection::vec(1i64..40, count),
            proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..4), count),
            Just((0..count).collect::<Vec<usize>>()).prop_shuffle(),
        )
            .prop_map(|(durations, raw_deps, numbering)| {
                durations
                    .into_iter()
                    .zip(raw_deps)
                    .enumerate()
                    .map(|(i, (duration, deps))| {
                        let predecessors: HashSet<i32> = if i == 0 {
                            HashSet::new()
                        } else {
                            deps.into_iter().map(|d| (d % i) as i32).collect()
                        };
                        let mut predecessors: Vec<i32> = predecessors.into_iter().collect();
                        predecessors.sort_unstable();
                        Phase::new(i as i32, format!("{:03}", numbering[i]), format!("P{i}"), duration)
                            .with_predecessors(predecessors)
                    })
                    .collect()
            })
    })
}

// Arbitrary predecessor lists, including cycles, self loops and dangling ids.
fn arbitrary_phases(max_phases: usize) -> impl Strategy<Value = Vec<Phase>> {
    (1..=max_phases).prop_flat_map(|count| {
        proptest::collection::vec(
            (1i64..20, proptest::collection::vec(0..(count as i32 + 2), 0..4)),
            count,
        )
        .prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (duration, predecessors))| {
                    Phase::new(i as i32, format!("{i:03}"), format!("P{i}"), duration)
                        .with_predecessors(predecessors)
                })
                .collect()
        })
    })
}

proptest! {
    #[test]
    fn every_predecessor_finishes_before_its_successor_starts(phases in acyclic_phases(24)) {
        let run = Schedule::default().compute(&phases);
        prop_assert!(!run.is_degraded());
        for phase in &phases {
            let item = run.item(phase.id).unwrap();
            for pred in &phase.predecessors {
                let pred_item = run.item(*pred).unwrap();
                prop_assert!(item.start_offset >= pred_item.start_offset + pred_item.duration);
            }
        }
    }

    #[test]
    fn every_phase_appears_exactly_once(phases in arbitrary_phases(24)) {
        let run = Schedule::default().compute(&phases);
        prop_assert_eq!(run.items.len(), phases.len());
        let ids: HashSet<i32> = run.items.iter().map(|item| item.phase_id).collect();
        prop_assert_eq!(ids.len(), phases.len());
    }

    #[test]
    fn repeated_runs_are_identical(phases in arbitrary_phases(24)) {
        let first = Schedule::default().compute(&phases);
        let second = Schedule::default().compute(&phases);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn input_order_does_not_change_the_layout(phases in arbitrary_phases(16)) {
        let mut reversed = phases.clone();
        reversed.reverse();
        let forward = Schedule::default().compute(&phases);
        let backward = Schedule::default().compute(&reversed);
        prop_assert_eq!(forward.items, backward.items);
    }

    #[test]
    fn offsets_and_slack_are_never_negative(phases in arbitrary_phases(24)) {
        let run = Schedule::default().compute(&phases);
        for item in &run.items {
            prop_assert!(item.start_offset >= 0);
            prop_assert!(item.duration >= 1);
            prop_assert_eq!(item.end_offset, item.start_offset + item.duration);
            prop_assert!(item.slack >= 0);
        }
    }

    #[test]
    fn items_are_sorted_by_number(phases in arbitrary_phases(24)) {
        let run = Schedule::default().compute(&phases);
        let numbers: Vec<&str> = run.items.iter().map(|item| item.number.as_str()).collect();
        let mut sorted = numbers.clone();
        sorted.sort_unstable();
        prop_assert_eq!(numbers, sorted);
    }
}
