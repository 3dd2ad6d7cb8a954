#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Property tests for the rollback prefix rule

use proptest::prelude::*;
use smartfwd_core::commands::{Command, Phase, RestoreOutcome, Step, StepLabel, UpdateCommand};
use smartfwd_core::flow::{run_steps, RunOutcome};
use smartfwd_core::Result;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
    Process(usize),
    Restore(usize),
}

type Journal = Arc<Mutex<Vec<Entry>>>;

struct Recorder {
    index: usize,
    phase: Phase,
    succeeds: bool,
    journal: Journal,
}

impl Command for Recorder {
    fn label(&self) -> StepLabel {
        StepLabel::new(self.phase, self.index)
    }

    fn process(&mut self) -> Result<bool> {
        self.journal.lock().unwrap().push(Entry::Process(self.index));
        Ok(self.succeeds)
    }
}

impl UpdateCommand for Recorder {
    fn on_restore(&mut self) -> Result<RestoreOutcome> {
        self.journal.lock().unwrap().push(Entry::Restore(self.index));
        Ok(RestoreOutcome::Restored)
    }
}

fn build(updates: &[bool], fail_at: Option<usize>, journal: &Journal) -> Vec<Step> {
    updates
        .iter()
        .enumerate()
        .map(|(index, &is_update)| {
            let phase = if is_update {
                Phase::UpdateCallWaiting
            } else {
                Phase::QueryCallWaiting
            };
            let cmd = Recorder {
                index,
                phase,
                succeeds: fail_at != Some(index),
                journal: journal.clone(),
            };
            if is_update {
                Step::update(cmd)
            } else {
                Step::query(cmd)
            }
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_failure_restores_exactly_the_update_prefix_in_reverse(
        (updates, fail_at) in prop::collection::vec(any::<bool>(), 1..16)
            .prop_flat_map(|updates| {
                let len = updates.len();
                (Just(updates), 0..len)
            })
    ) {
        let journal = Journal::default();
        let mut steps = build(&updates, Some(fail_at), &journal);

        let outcome = run_steps(&mut steps);

        let expected_restores: Vec<usize> =
            (0..fail_at).rev().filter(|&i| updates[i]).collect();
        match outcome {
            RunOutcome::Failed { index, rollback } => {
                prop_assert_eq!(index, fail_at);
                prop_assert_eq!(rollback.restored, expected_restores.len());
            }
            RunOutcome::Completed { .. } => prop_assert!(false, "run should have failed"),
        }

        let mut expected: Vec<Entry> = (0..=fail_at).map(Entry::Process).collect();
        expected.extend(expected_restores.into_iter().map(Entry::Restore));
        prop_assert_eq!(journal.lock().unwrap().clone(), expected);
    }

    #[test]
    fn prop_success_never_restores(updates in prop::collection::vec(any::<bool>(), 0..16)) {
        let journal = Journal::default();
        let mut steps = build(&updates, None, &journal);

        let outcome = run_steps(&mut steps);

        prop_assert_eq!(outcome, RunOutcome::Completed { steps: updates.len() });
        let entries = journal.lock().unwrap().clone();
        prop_assert!(entries.iter().all(|e| matches!(e, Entry::Process(_))));
        prop_assert_eq!(entries.len(), updates.len());
    }
}
