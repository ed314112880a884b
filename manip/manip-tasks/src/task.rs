//! Task definitions.
//!
//! A [`Task`] is a named unit of work over a caller-owned context `C`.
//! Actions run to completion; gates, waits and delays are the only tasks
//! that can suspend a queue.

use std::fmt;
use std::time::Duration;

use crate::policy::PromptLevel;

/// Boxed action over the context.
pub type ActionFn<C, E> = Box<dyn FnMut(&mut C) -> Result<(), E>>;

/// Boxed predicate over the context.
pub type PredicateFn<C> = Box<dyn FnMut(&mut C) -> bool>;

/// Boxed action that decides its follow-up tasks when it runs.
pub type ExpandFn<C, E> = Box<dyn FnMut(&mut C) -> Result<Vec<Task<C, E>>, E>>;

/// What a task does when it reaches the head of the queue.
pub enum TaskKind<C, E> {
    /// Runs once; an error fails the queue.
    Action(ActionFn<C, E>),
    /// Suspends until an operator answers; "no" aborts the queue.
    Confirm {
        /// Question shown to the operator.
        prompt: String,
        /// Gate importance, checked against the session policy.
        level: PromptLevel,
    },
    /// Suspends until the predicate holds, re-evaluated once per tick.
    WaitUntil(PredicateFn<C>),
    /// Suspends for a duration measured from first evaluation.
    Delay(Duration),
    /// Runs the contained tasks in order, in place of this one.
    Sequence(Vec<Task<C, E>>),
    /// Runs once like an action, then runs the tasks it returned in place
    /// of itself.
    Expand(ExpandFn<C, E>),
}

impl<C, E> TaskKind<C, E> {
    /// Short label for logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Action(_) => "action",
            Self::Confirm { .. } => "confirm",
            Self::WaitUntil(_) => "wait",
            Self::Delay(_) => "delay",
            Self::Sequence(_) => "sequence",
            Self::Expand(_) => "expand",
        }
    }

    /// Returns `true` if the task may suspend the queue.
    #[must_use]
    pub const fn can_suspend(&self) -> bool {
        matches!(self, Self::Confirm { .. } | Self::WaitUntil(_) | Self::Delay(_))
    }
}

/// A named unit of work.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use manip_tasks::{PromptLevel, Task};
///
/// let tasks: Vec<Task<u32, String>> = vec![
///     Task::action("increment", |n: &mut u32| {
///         *n += 1;
///         Ok(())
///     }),
///     Task::confirm("Continue?", PromptLevel::Required),
///     Task::delay("settle", Duration::from_millis(10)),
///     Task::wait_until("counter positive", |n: &mut u32| *n > 0),
/// ];
/// assert_eq!(tasks[1].name(), "Continue?");
/// ```
pub struct Task<C, E> {
    name: String,
    kind: TaskKind<C, E>,
}

impl<C, E> Task<C, E> {
    /// Creates a task from a name and kind.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: TaskKind<C, E>) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Immediate action.
    #[must_use]
    pub fn action<F>(name: impl Into<String>, action: F) -> Self
    where
        F: FnMut(&mut C) -> Result<(), E> + 'static,
    {
        Self::new(name, TaskKind::Action(Box::new(action)))
    }

    /// Confirmation gate, named after its prompt.
    #[must_use]
    pub fn confirm(prompt: impl Into<String>, level: PromptLevel) -> Self {
        let prompt = prompt.into();
        Self::new(prompt.clone(), TaskKind::Confirm { prompt, level })
    }

    /// Polling wait.
    #[must_use]
    pub fn wait_until<P>(name: impl Into<String>, predicate: P) -> Self
    where
        P: FnMut(&mut C) -> bool + 'static,
    {
        Self::new(name, TaskKind::WaitUntil(Box::new(predicate)))
    }

    /// Fixed-duration delay.
    #[must_use]
    pub fn delay(name: impl Into<String>, duration: Duration) -> Self {
        Self::new(name, TaskKind::Delay(duration))
    }

    /// Composite sub-sequence.
    #[must_use]
    pub fn sequence(name: impl Into<String>, tasks: Vec<Self>) -> Self {
        Self::new(name, TaskKind::Sequence(tasks))
    }

    /// Action whose returned tasks run next.
    ///
    /// Used when the follow-up depends on state that only exists at run
    /// time, such as the duration of a plan produced by an earlier task.
    #[must_use]
    pub fn expand<F>(name: impl Into<String>, expand: F) -> Self
    where
        F: FnMut(&mut C) -> Result<Vec<Self>, E> + 'static,
    {
        Self::new(name, TaskKind::Expand(Box::new(expand)))
    }

    /// Task name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Task kind.
    #[must_use]
    pub const fn kind(&self) -> &TaskKind<C, E> {
        &self.kind
    }

    pub(crate) fn into_parts(self) -> (String, TaskKind<C, E>) {
        (self.name, self.kind)
    }
}

impl<C, E> fmt::Debug for Task<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("kind", &self.kind.label())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suspending_kinds() {
        let action: Task<(), ()> = Task::action("a", |_: &mut ()| Ok(()));
        let gate: Task<(), ()> = Task::confirm("ok?", PromptLevel::Optional);
        let seq: Task<(), ()> = Task::sequence("s", vec![]);

        assert!(!action.kind().can_suspend());
        assert!(gate.kind().can_suspend());
        assert!(!seq.kind().can_suspend());
        assert_eq!(format!("{gate:?}"), r#"Task { name: "ok?", kind: "confirm" }"#);
    }
}
