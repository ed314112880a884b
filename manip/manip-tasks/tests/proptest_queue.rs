//! Property-based tests for queue ordering and gating.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::{Duration, Instant};

use manip_tasks::{
    AbortReason, ManualClock, PromptLevel, PromptPolicy, QueueOutcome, QueueState, Scheduler,
    Task, TaskQueue, TickStatus,
};
use proptest::prelude::*;

type Log = Vec<usize>;

// ===== Strategies =====

#[derive(Debug, Clone, Copy)]
enum Step {
    Action,
    Gate(PromptLevel),
    Wait,
    Delay,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => Just(Step::Action),
        1 => Just(Step::Gate(PromptLevel::Optional)),
        1 => Just(Step::Gate(PromptLevel::Required)),
        1 => Just(Step::Wait),
        1 => Just(Step::Delay),
    ]
}

fn task(index: usize, step: Step) -> Task<Log, String> {
    match step {
        Step::Action => Task::action(format!("action {index}"), move |log: &mut Log| {
            log.push(index);
            Ok(())
        }),
        Step::Gate(level) => Task::confirm(format!("gate {index}?"), level),
        Step::Wait => Task::wait_until(format!("wait {index}"), |_: &mut Log| true),
        Step::Delay => Task::delay(format!("delay {index}"), Duration::ZERO),
    }
}

fn action_indices(steps: &[Step]) -> Vec<usize> {
    steps
        .iter()
        .enumerate()
        .filter(|(_, s)| matches!(s, Step::Action))
        .map(|(i, _)| i)
        .collect()
}

// ===== Properties =====

proptest! {
    /// With every gate disabled and every wait satisfied, one tick drains
    /// the queue in insertion order.
    #[test]
    fn unattended_queue_completes_in_one_tick(steps in prop::collection::vec(step(), 0..24)) {
        let mut queue = TaskQueue::new(PromptPolicy::unattended());
        queue.extend(steps.iter().enumerate().map(|(i, s)| task(i, *s))).unwrap();
        let mut log = Log::new();

        let status = queue.tick(&mut log, Instant::now());

        prop_assert_eq!(status, TickStatus::Finished(QueueState::Completed));
        prop_assert_eq!(log, action_indices(&steps));
        prop_assert_eq!(queue.completed().len(), steps.len());
    }

    /// Nesting tasks into sequences does not change execution order.
    #[test]
    fn sequences_preserve_order(
        steps in prop::collection::vec(step(), 1..24),
        split in 0usize..24,
    ) {
        let split = split.min(steps.len());
        let mut tasks: Vec<_> = steps.iter().enumerate().map(|(i, s)| task(i, *s)).collect();
        let tail = tasks.split_off(split);

        let mut queue = TaskQueue::new(PromptPolicy::unattended());
        queue.push(Task::sequence("head", tasks)).unwrap();
        queue.push(Task::sequence("tail", vec![Task::sequence("nested", tail)])).unwrap();
        let mut log = Log::new();
        queue.tick(&mut log, Instant::now());

        prop_assert_eq!(queue.state(), QueueState::Completed);
        prop_assert_eq!(log, action_indices(&steps));
    }

    /// Declining the n-th enabled gate runs exactly the actions before it.
    #[test]
    fn declined_gate_stops_at_its_position(
        steps in prop::collection::vec(step(), 1..24),
        decline_at in 0usize..8,
    ) {
        let gates: Vec<usize> = steps
            .iter()
            .enumerate()
            .filter(|(_, s)| matches!(s, Step::Gate(_)))
            .map(|(i, _)| i)
            .collect();

        let mut queue = TaskQueue::new(PromptPolicy::all());
        queue.extend(steps.iter().enumerate().map(|(i, s)| task(i, *s))).unwrap();
        let mut asked = 0usize;
        let mut confirm = |_: &str| {
            asked += 1;
            asked <= decline_at
        };
        let mut log = Log::new();
        let state = Scheduler::new(ManualClock::default()).run(&mut queue, &mut log, &mut confirm);

        match gates.get(decline_at) {
            Some(&gate) => {
                prop_assert_eq!(state, QueueState::Aborted);
                let expected: Vec<usize> =
                    action_indices(&steps).into_iter().filter(|&i| i < gate).collect();
                prop_assert_eq!(log, expected);
                let declined = matches!(
                    queue.outcome(),
                    Some(QueueOutcome::Aborted(AbortReason::UserDeclined { prompt }))
                        if *prompt == format!("gate {gate}?")
                );
                prop_assert!(declined);
            }
            None => {
                prop_assert_eq!(state, QueueState::Completed);
                prop_assert_eq!(log, action_indices(&steps));
            }
        }
    }
}
