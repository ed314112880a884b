//! Scheduler that owns the resumption loop.
//!
//! [`Scheduler::run`] ticks a queue until it finishes. Between ticks it
//! yields through a [`Clock`]: the system clock sleeps the thread for one
//! tick interval, a [`ManualClock`] just advances simulated time. Gates are
//! answered through a [`Confirm`] implementation.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::queue::{QueueState, Suspension, TaskQueue, TickStatus};

/// Human-in-the-loop decision for confirmation gates.
pub trait Confirm {
    /// Returns `true` to continue, `false` to abort the queue.
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Time source and yield point between ticks.
pub trait Clock {
    /// Current time.
    fn now(&self) -> Instant;

    /// Yields for up to `duration`.
    fn sleep(&mut self, duration: Duration);
}

/// Wall-clock time; sleeping blocks the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Simulated time that advances only when slept.
#[derive(Debug, Clone, Copy)]
pub struct ManualClock {
    now: Instant,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

impl ManualClock {
    /// Starts at `now`.
    #[must_use]
    pub const fn new(now: Instant) -> Self {
        Self { now }
    }

    /// Advances simulated time.
    pub fn advance(&mut self, duration: Duration) {
        self.now += duration;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now
    }

    fn sleep(&mut self, duration: Duration) {
        self.advance(duration);
    }
}

/// Drives queues to completion.
///
/// # Example
///
/// ```
/// use manip_tasks::{ManualClock, PromptLevel, PromptPolicy, QueueState, Scheduler, Task, TaskQueue};
/// use std::time::Duration;
///
/// let mut queue: TaskQueue<Vec<&str>, String> = TaskQueue::new(PromptPolicy::all());
/// queue.push(Task::confirm("Start?", PromptLevel::Required)).unwrap();
/// queue.push(Task::delay("settle", Duration::from_secs(1))).unwrap();
/// queue.push(Task::action("done", |log: &mut Vec<&str>| {
///     log.push("done");
///     Ok(())
/// })).unwrap();
///
/// let mut log = Vec::new();
/// let mut scheduler = Scheduler::new(ManualClock::default());
/// let state = scheduler.run(&mut queue, &mut log, &mut |_: &str| true);
///
/// assert_eq!(state, QueueState::Completed);
/// assert_eq!(log, ["done"]);
/// ```
#[derive(Debug, Clone)]
pub struct Scheduler<K> {
    clock: K,
    tick_interval: Duration,
}

impl<K: Clock> Scheduler<K> {
    /// Default time between ticks.
    pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

    /// Creates a scheduler with the default tick interval.
    #[must_use]
    pub const fn new(clock: K) -> Self {
        Self {
            clock,
            tick_interval: Self::DEFAULT_TICK_INTERVAL,
        }
    }

    /// Sets the time between ticks.
    #[must_use]
    pub const fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// The clock.
    #[must_use]
    pub const fn clock(&self) -> &K {
        &self.clock
    }

    /// Advances `queue` by one tick, answering a pending gate inline.
    ///
    /// Returns the status after the tick.
    pub fn step<C, E>(
        &mut self,
        queue: &mut TaskQueue<C, E>,
        ctx: &mut C,
        confirm: &mut dyn Confirm,
    ) -> TickStatus {
        let status = queue.tick(ctx, self.clock.now());
        if let TickStatus::Suspended(Suspension::Confirmation { prompt }) = &status {
            let yes = confirm.confirm(prompt);
            debug!(prompt = %prompt, yes, "Gate answered");
            // The queue is suspended on this gate, so an answer is accepted.
            if queue.answer(yes).is_ok() {
                return queue.tick(ctx, self.clock.now());
            }
        }
        status
    }

    /// Ticks `queue` until it finishes and returns the terminal state. The
    /// details are in [`TaskQueue::outcome`].
    ///
    /// There is no overall timeout: a predicate that never holds or a gate
    /// that is never answered keeps the loop running.
    pub fn run<C, E>(
        &mut self,
        queue: &mut TaskQueue<C, E>,
        ctx: &mut C,
        confirm: &mut dyn Confirm,
    ) -> QueueState {
        loop {
            match self.step(queue, ctx, confirm) {
                TickStatus::Finished(state) => return state,
                TickStatus::Suspended(Suspension::Delay { remaining, .. }) => {
                    self.clock.sleep(remaining.min(self.tick_interval));
                }
                TickStatus::Suspended(_) => self.clock.sleep(self.tick_interval),
            }
        }
    }
}

impl Default for Scheduler<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}
