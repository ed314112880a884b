//! Cooperative task orchestration for human-supervised robot sequences.
//!
//! A [`TaskQueue`] holds an ordered list of [`Task`]s over a context owned
//! by the caller. Ticking the queue runs actions back to back until a
//! confirmation gate, a polling wait or a delay asks it to suspend. Nothing
//! here blocks: the [`Scheduler`] decides how long to yield between ticks,
//! and gate answers come in through [`TaskQueue::answer`] or a [`Confirm`]
//! implementation.
//!
//! Gates carry a [`PromptLevel`]. The session-wide [`PromptPolicy`] decides
//! which levels actually ask; disabled gates pass straight through.
//!
//! # Example
//!
//! ```
//! use std::time::Instant;
//! use manip_tasks::{PromptLevel, PromptPolicy, QueueState, Suspension, Task, TaskQueue, TickStatus};
//!
//! let mut queue: TaskQueue<u32, String> = TaskQueue::new(PromptPolicy::all());
//! queue.push(Task::confirm("Proceed?", PromptLevel::Required)).unwrap();
//! queue.push(Task::action("bump", |n: &mut u32| {
//!     *n += 1;
//!     Ok(())
//! })).unwrap();
//!
//! let mut n = 0;
//! let status = queue.tick(&mut n, Instant::now());
//! assert!(matches!(status, TickStatus::Suspended(Suspension::Confirmation { .. })));
//!
//! queue.answer(true).unwrap();
//! queue.tick(&mut n, Instant::now());
//! assert_eq!(queue.state(), QueueState::Completed);
//! assert_eq!(n, 1);
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod error;
pub mod policy;
pub mod queue;
pub mod scheduler;
pub mod task;

pub use error::{OrchestratorError, Result};
pub use policy::{parse_answer, PromptLevel, PromptPolicy};
pub use queue::{AbortReason, QueueOutcome, QueueState, StopHandle, Suspension, TaskQueue, TickStatus};
pub use scheduler::{Clock, Confirm, ManualClock, Scheduler, SystemClock};
pub use task::{ActionFn, ExpandFn, PredicateFn, Task, TaskKind};
