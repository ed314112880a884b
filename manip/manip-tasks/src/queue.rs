//! Single-use task queue.
//!
//! # State machine
//!
//! ```text
//! Idle --tick--> Running --+--> Completed   (queue drained)
//!                          +--> Aborted     (gate declined, stop requested)
//!                          +--> Failed      (action returned an error)
//! ```
//!
//! Tasks can only be appended while `Idle`. A finished queue stays finished;
//! running the same work again needs a fresh queue.
//!
//! # Ticks
//!
//! [`TaskQueue::tick`] advances the queue as far as it can without waiting:
//! actions run back to back, and the tick returns at the first gate, wait or
//! delay that is not yet satisfied. A stop request is honored at the start of
//! a tick and whenever the queue is about to suspend, never in the middle of
//! an action.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::{OrchestratorError, Result};
use crate::policy::PromptPolicy;
use crate::task::{Task, TaskKind};

/// Lifecycle state of a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QueueState {
    /// Accepting tasks, not started.
    #[default]
    Idle,
    /// Started and not finished.
    Running,
    /// Every task ran.
    Completed,
    /// Stopped by the operator.
    Aborted,
    /// Stopped by a task error.
    Failed,
}

impl QueueState {
    /// Lowercase identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
            Self::Failed => "failed",
        }
    }

    /// Returns `true` for `Completed`, `Aborted` and `Failed`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted | Self::Failed)
    }
}

impl fmt::Display for QueueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a queue was aborted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// The operator answered "no" to a gate.
    UserDeclined {
        /// The declined prompt.
        prompt: String,
    },
    /// A stop was requested through a [`StopHandle`].
    StopRequested,
}

/// Final result of a queue.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueOutcome<E> {
    /// Every task ran.
    Completed,
    /// The queue was stopped deliberately.
    Aborted(AbortReason),
    /// A task returned an error.
    Failed {
        /// Name of the failing task.
        task: String,
        /// The error it returned.
        error: E,
    },
}

impl<E> QueueOutcome<E> {
    /// Terminal state for this outcome.
    #[must_use]
    pub const fn state(&self) -> QueueState {
        match self {
            Self::Completed => QueueState::Completed,
            Self::Aborted(_) => QueueState::Aborted,
            Self::Failed { .. } => QueueState::Failed,
        }
    }

    /// Returns `true` if the queue completed.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Where a running queue is waiting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suspension {
    /// A gate waits for [`TaskQueue::answer`].
    Confirmation {
        /// Question for the operator.
        prompt: String,
    },
    /// A predicate is not yet true.
    Waiting {
        /// Task name.
        task: String,
    },
    /// A delay has time left.
    Delay {
        /// Task name.
        task: String,
        /// Time left.
        remaining: Duration,
    },
}

/// Result of one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickStatus {
    /// The queue is waiting.
    Suspended(Suspension),
    /// The queue reached a terminal state.
    Finished(QueueState),
}

/// Cloneable handle that requests a queue to stop.
///
/// # Example
///
/// ```
/// use manip_tasks::{AbortReason, QueueOutcome, Task, TaskQueue};
/// use std::time::Instant;
///
/// let mut queue: TaskQueue<(), ()> = TaskQueue::default();
/// queue.push(Task::wait_until("never", |_: &mut ()| false)).unwrap();
///
/// let stop = queue.stop_handle();
/// queue.tick(&mut (), Instant::now());
/// stop.request_stop();
/// queue.tick(&mut (), Instant::now());
///
/// assert_eq!(queue.outcome(), Some(&QueueOutcome::Aborted(AbortReason::StopRequested)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Requests the queue to stop at its next suspension point.
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once a stop was requested.
    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// An ordered, single-use queue of tasks over a context `C`.
///
/// `E` is the error type returned by actions.
pub struct TaskQueue<C, E> {
    pending: VecDeque<Task<C, E>>,
    policy: PromptPolicy,
    state: QueueState,
    stop: StopHandle,
    delay_started: Option<Instant>,
    awaiting_prompt: Option<String>,
    answer: Option<bool>,
    completed: Vec<String>,
    outcome: Option<QueueOutcome<E>>,
}

impl<C, E> Default for TaskQueue<C, E> {
    fn default() -> Self {
        Self::new(PromptPolicy::default())
    }
}

impl<C, E> fmt::Debug for TaskQueue<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue")
            .field("state", &self.state)
            .field("pending", &self.pending)
            .field("completed", &self.completed.len())
            .finish_non_exhaustive()
    }
}

impl<C, E> TaskQueue<C, E> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new(policy: PromptPolicy) -> Self {
        Self {
            pending: VecDeque::new(),
            policy,
            state: QueueState::Idle,
            stop: StopHandle::default(),
            delay_started: None,
            awaiting_prompt: None,
            answer: None,
            completed: Vec::new(),
            outcome: None,
        }
    }

    /// Appends a task.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::NotIdle`] once the queue has started.
    pub fn push(&mut self, task: Task<C, E>) -> Result<()> {
        if self.state != QueueState::Idle {
            return Err(OrchestratorError::NotIdle { state: self.state });
        }
        self.pending.push_back(task);
        Ok(())
    }

    /// Appends several tasks in order.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::NotIdle`] once the queue has started.
    pub fn extend(&mut self, tasks: impl IntoIterator<Item = Task<C, E>>) -> Result<()> {
        for task in tasks {
            self.push(task)?;
        }
        Ok(())
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> QueueState {
        self.state
    }

    /// Gate policy.
    #[must_use]
    pub const fn policy(&self) -> &PromptPolicy {
        &self.policy
    }

    /// A handle that stops this queue.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Number of tasks not yet started. Sequences count as one.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Names of the tasks that ran to completion, in order. Sequences are
    /// not listed, their children are.
    #[must_use]
    pub fn completed(&self) -> &[String] {
        &self.completed
    }

    /// The prompt of the gate the queue is waiting on, if any.
    #[must_use]
    pub fn pending_prompt(&self) -> Option<&str> {
        self.awaiting_prompt.as_deref()
    }

    /// The final result once finished.
    #[must_use]
    pub const fn outcome(&self) -> Option<&QueueOutcome<E>> {
        self.outcome.as_ref()
    }

    /// Consumes the queue and returns its final result.
    #[must_use]
    pub fn into_outcome(self) -> Option<QueueOutcome<E>> {
        self.outcome
    }

    /// Answers the gate the queue is waiting on. Takes effect on the next
    /// tick.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::AlreadyFinished`] once the queue has
    /// finished, and [`OrchestratorError::NoPendingConfirmation`] if no gate
    /// is waiting.
    pub fn answer(&mut self, yes: bool) -> Result<()> {
        if self.state.is_terminal() {
            return Err(OrchestratorError::AlreadyFinished { state: self.state });
        }
        if self.awaiting_prompt.is_none() {
            return Err(OrchestratorError::NoPendingConfirmation);
        }
        self.answer = Some(yes);
        Ok(())
    }

    /// Advances the queue until it suspends or finishes.
    ///
    /// The first tick starts an idle queue. Ticking a finished queue has no
    /// effect.
    pub fn tick(&mut self, ctx: &mut C, now: Instant) -> TickStatus {
        match self.state {
            QueueState::Idle => {
                info!(tasks = self.pending.len(), "Queue started");
                self.state = QueueState::Running;
            }
            QueueState::Running => {}
            terminal => return TickStatus::Finished(terminal),
        }

        if self.stop.is_stop_requested() {
            return self.finish(QueueOutcome::Aborted(AbortReason::StopRequested));
        }

        loop {
            let Some(task) = self.pending.pop_front() else {
                return self.finish(QueueOutcome::Completed);
            };
            let (name, kind) = task.into_parts();

            let suspension = match kind {
                TaskKind::Action(mut action) => {
                    debug!(task = %name, "Running action");
                    if let Err(error) = action(ctx) {
                        warn!(task = %name, "Action failed");
                        return self.finish(QueueOutcome::Failed { task: name, error });
                    }
                    self.completed.push(name);
                    continue;
                }
                TaskKind::Sequence(tasks) => {
                    debug!(sequence = %name, tasks = tasks.len(), "Expanding sequence");
                    self.splice_front(tasks);
                    continue;
                }
                TaskKind::Expand(mut expand) => match expand(ctx) {
                    Ok(tasks) => {
                        debug!(task = %name, tasks = tasks.len(), "Expanded task");
                        self.completed.push(name);
                        self.splice_front(tasks);
                        continue;
                    }
                    Err(error) => {
                        warn!(task = %name, "Expansion failed");
                        return self.finish(QueueOutcome::Failed { task: name, error });
                    }
                },
                TaskKind::Confirm { prompt, level } => {
                    if !self.policy.is_enabled(level) {
                        debug!(prompt = %prompt, level = level.as_str(), "Gate disabled");
                        self.completed.push(name);
                        continue;
                    }
                    match self.answer.take() {
                        Some(true) => {
                            self.awaiting_prompt = None;
                            self.completed.push(name);
                            continue;
                        }
                        Some(false) => {
                            self.awaiting_prompt = None;
                            warn!(prompt = %prompt, "Operator declined");
                            return self
                                .finish(QueueOutcome::Aborted(AbortReason::UserDeclined { prompt }));
                        }
                        None => {
                            self.awaiting_prompt = Some(prompt.clone());
                            let suspension = Suspension::Confirmation {
                                prompt: prompt.clone(),
                            };
                            self.pending
                                .push_front(Task::new(name, TaskKind::Confirm { prompt, level }));
                            suspension
                        }
                    }
                }
                TaskKind::WaitUntil(mut predicate) => {
                    if predicate(ctx) {
                        self.completed.push(name);
                        continue;
                    }
                    let suspension = Suspension::Waiting { task: name.clone() };
                    self.pending
                        .push_front(Task::new(name, TaskKind::WaitUntil(predicate)));
                    suspension
                }
                TaskKind::Delay(duration) => {
                    let started = *self.delay_started.get_or_insert(now);
                    let elapsed = now.saturating_duration_since(started);
                    if elapsed >= duration {
                        self.delay_started = None;
                        self.completed.push(name);
                        continue;
                    }
                    let suspension = Suspension::Delay {
                        task: name.clone(),
                        remaining: duration - elapsed,
                    };
                    self.pending.push_front(Task::new(name, TaskKind::Delay(duration)));
                    suspension
                }
            };

            if self.stop.is_stop_requested() {
                return self.finish(QueueOutcome::Aborted(AbortReason::StopRequested));
            }
            debug!(?suspension, "Queue suspended");
            return TickStatus::Suspended(suspension);
        }
    }

    fn splice_front(&mut self, tasks: Vec<Task<C, E>>) {
        for task in tasks.into_iter().rev() {
            self.pending.push_front(task);
        }
    }

    fn finish(&mut self, outcome: QueueOutcome<E>) -> TickStatus {
        let state = outcome.state();
        self.state = state;
        self.outcome = Some(outcome);
        self.awaiting_prompt = None;
        self.answer = None;
        info!(
            state = %state,
            completed = self.completed.len(),
            skipped = self.pending.len(),
            "Queue finished"
        );
        TickStatus::Finished(state)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::policy::PromptLevel;

    type Log = Vec<&'static str>;

    fn record(name: &'static str) -> Task<Log, String> {
        Task::action(name, move |log: &mut Log| {
            log.push(name);
            Ok(())
        })
    }

    #[test]
    fn test_actions_run_in_order_in_one_tick() {
        let mut queue = TaskQueue::new(PromptPolicy::unattended());
        queue
            .extend([record("a"), record("b"), record("c")])
            .unwrap();
        let mut log = Log::new();

        let status = queue.tick(&mut log, Instant::now());

        assert_eq!(status, TickStatus::Finished(QueueState::Completed));
        assert_eq!(log, ["a", "b", "c"]);
        assert_eq!(queue.completed(), ["a", "b", "c"]);
    }

    #[test]
    fn test_failed_action_halts_queue() {
        let mut queue = TaskQueue::default();
        queue.push(record("a")).unwrap();
        queue
            .push(Task::action("boom", |_: &mut Log| Err("solver failed".to_string())))
            .unwrap();
        queue.push(record("never")).unwrap();
        let mut log = Log::new();

        queue.tick(&mut log, Instant::now());

        assert_eq!(queue.state(), QueueState::Failed);
        assert_eq!(log, ["a"]);
        assert_eq!(
            queue.outcome(),
            Some(&QueueOutcome::Failed {
                task: "boom".into(),
                error: "solver failed".into()
            })
        );
        assert_eq!(queue.pending_len(), 1);
    }

    #[test]
    fn test_declined_gate_aborts() {
        let mut queue = TaskQueue::new(PromptPolicy::all());
        queue.push(record("before")).unwrap();
        queue.push(Task::confirm("Walk?", PromptLevel::Required)).unwrap();
        queue.push(record("after")).unwrap();
        let mut log = Log::new();

        let status = queue.tick(&mut log, Instant::now());
        assert_eq!(
            status,
            TickStatus::Suspended(Suspension::Confirmation {
                prompt: "Walk?".into()
            })
        );
        assert_eq!(queue.pending_prompt(), Some("Walk?"));

        queue.answer(false).unwrap();
        let status = queue.tick(&mut log, Instant::now());

        assert_eq!(status, TickStatus::Finished(QueueState::Aborted));
        assert_eq!(log, ["before"]);
        assert!(matches!(
            queue.outcome(),
            Some(QueueOutcome::Aborted(AbortReason::UserDeclined { prompt })) if prompt == "Walk?"
        ));
    }

    #[test]
    fn test_accepted_gate_resumes() {
        let mut queue = TaskQueue::default();
        queue.push(Task::confirm("Go?", PromptLevel::Required)).unwrap();
        queue.push(record("after")).unwrap();
        let mut log = Log::new();

        queue.tick(&mut log, Instant::now());
        // Ticking again without an answer stays suspended.
        assert!(matches!(queue.tick(&mut log, Instant::now()), TickStatus::Suspended(_)));
        queue.answer(true).unwrap();
        queue.tick(&mut log, Instant::now());

        assert_eq!(queue.state(), QueueState::Completed);
        assert_eq!(log, ["after"]);
    }

    #[test]
    fn test_disabled_gate_passes_through() {
        let mut queue = TaskQueue::new(PromptPolicy::default());
        queue.push(Task::confirm("Optional?", PromptLevel::Optional)).unwrap();
        queue.push(record("after")).unwrap();
        let mut log = Log::new();

        assert_eq!(
            queue.tick(&mut log, Instant::now()),
            TickStatus::Finished(QueueState::Completed)
        );
    }

    #[test]
    fn test_answer_without_gate_is_rejected() {
        let mut queue: TaskQueue<Log, String> = TaskQueue::default();
        assert_eq!(queue.answer(true), Err(OrchestratorError::NoPendingConfirmation));
    }

    #[test]
    fn test_delay_measured_from_first_evaluation() {
        let mut queue = TaskQueue::default();
        queue.push(Task::delay("settle", Duration::from_secs(2))).unwrap();
        queue.push(record("after")).unwrap();
        let mut log = Log::new();
        let t0 = Instant::now();

        let status = queue.tick(&mut log, t0);
        assert_eq!(
            status,
            TickStatus::Suspended(Suspension::Delay {
                task: "settle".into(),
                remaining: Duration::from_secs(2)
            })
        );
        assert!(matches!(
            queue.tick(&mut log, t0 + Duration::from_secs(1)),
            TickStatus::Suspended(Suspension::Delay { remaining, .. }) if remaining == Duration::from_secs(1)
        ));
        assert_eq!(
            queue.tick(&mut log, t0 + Duration::from_secs(2)),
            TickStatus::Finished(QueueState::Completed)
        );
        assert_eq!(log, ["after"]);
    }

    #[test]
    fn test_wait_polls_each_tick() {
        let mut queue: TaskQueue<Log, String> = TaskQueue::default();
        queue
            .push(Task::wait_until("three entries", |log: &mut Log| log.len() >= 3))
            .unwrap();
        let mut log = Log::new();

        for _ in 0..3 {
            assert!(matches!(
                queue.tick(&mut log, Instant::now()),
                TickStatus::Suspended(Suspension::Waiting { .. })
            ));
            log.push("tick");
        }
        assert_eq!(
            queue.tick(&mut log, Instant::now()),
            TickStatus::Finished(QueueState::Completed)
        );
    }

    #[test]
    fn test_sequence_expands_in_place() {
        let mut queue = TaskQueue::default();
        queue.push(record("a")).unwrap();
        queue
            .push(Task::sequence("inner", vec![record("b"), record("c")]))
            .unwrap();
        queue.push(record("d")).unwrap();
        let mut log = Log::new();

        queue.tick(&mut log, Instant::now());
        assert_eq!(log, ["a", "b", "c", "d"]);
    }

    #[test]
    fn test_expand_runs_returned_tasks_next() {
        let mut queue = TaskQueue::default();
        queue
            .push(Task::expand("decide", |log: &mut Log| {
                log.push("decide");
                Ok(vec![record("b"), Task::delay("pause", Duration::from_secs(1))])
            }))
            .unwrap();
        queue.push(record("c")).unwrap();
        let mut log = Log::new();
        let t0 = Instant::now();

        assert!(matches!(
            queue.tick(&mut log, t0),
            TickStatus::Suspended(Suspension::Delay { .. })
        ));
        assert_eq!(log, ["decide", "b"]);
        queue.tick(&mut log, t0 + Duration::from_secs(1));
        assert_eq!(log, ["decide", "b", "c"]);
        assert_eq!(queue.completed(), ["decide", "b", "pause", "c"]);
    }

    #[test]
    fn test_failed_expansion_halts_queue() {
        let mut queue = TaskQueue::default();
        queue
            .push(Task::expand("decide", |_: &mut Log| Err("no plan".to_string())))
            .unwrap();
        queue.push(record("never")).unwrap();
        let mut log = Log::new();

        queue.tick(&mut log, Instant::now());

        assert_eq!(queue.state(), QueueState::Failed);
        assert!(log.is_empty());
    }

    #[test]
    fn test_push_after_start_is_rejected() {
        let mut queue = TaskQueue::default();
        queue.push(Task::wait_until("never", |_: &mut Log| false)).unwrap();
        queue.tick(&mut Log::new(), Instant::now());

        let err = queue.push(record("late")).unwrap_err();
        assert!(err.is_not_idle());
    }

    #[test]
    fn test_finished_queue_stays_finished() {
        let mut queue = TaskQueue::default();
        queue.push(record("a")).unwrap();
        let mut log = Log::new();
        queue.tick(&mut log, Instant::now());
        queue.tick(&mut log, Instant::now());

        assert_eq!(log, ["a"]);
        assert!(queue.push(record("b")).is_err());
        assert_eq!(
            queue.answer(true),
            Err(OrchestratorError::AlreadyFinished {
                state: QueueState::Completed
            })
        );
    }

    #[test]
    fn test_stop_before_first_tick_runs_nothing() {
        let mut queue = TaskQueue::default();
        queue.push(record("a")).unwrap();
        queue.stop_handle().request_stop();
        let mut log = Log::new();

        assert_eq!(
            queue.tick(&mut log, Instant::now()),
            TickStatus::Finished(QueueState::Aborted)
        );
        assert!(log.is_empty());
    }

    #[test]
    fn test_stop_from_action_takes_effect_at_suspension() {
        let mut queue: TaskQueue<Log, String> = TaskQueue::default();
        let stop = queue.stop_handle();
        queue
            .push(Task::action("stop", move |_: &mut Log| {
                stop.request_stop();
                Ok(())
            }))
            .unwrap();
        queue.push(record("still runs")).unwrap();
        queue.push(Task::wait_until("never", |_: &mut Log| false)).unwrap();
        queue.push(record("never")).unwrap();
        let mut log = Log::new();

        queue.tick(&mut log, Instant::now());

        assert_eq!(log, ["still runs"]);
        assert_eq!(
            queue.outcome(),
            Some(&QueueOutcome::Aborted(AbortReason::StopRequested))
        );
    }
}
