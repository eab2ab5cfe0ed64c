use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

use crate::error::{Result, TaskError};

/// Typed handle to the result of a task inside a sequence.
///
/// Handed out by [`Sequence`](super::Sequence) when a task is appended, and
/// used by later input bindings to read that task's result.
pub struct TaskRef<T> {
    index: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> TaskRef<T> {
    pub(crate) fn new(index: usize) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    /// Position of the task in its sequence
    pub fn index(&self) -> usize {
        self.index
    }
}

impl<T> Clone for TaskRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TaskRef<T> {}

impl<T> fmt::Debug for TaskRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRef").field("index", &self.index).finish()
    }
}

/// What a task produced once it reached `Ok`.
///
/// Failure travels as `Err(TaskError)` next to this, which gives callers the
/// three cases: completed, skipped, failed.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome<T> {
    Completed(T),
    Skipped,
}

impl<T> TaskOutcome<T> {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Skipped => None,
        }
    }

}

pub(crate) enum Slot {
    Completed(Box<dyn Any + Send + Sync>),
    Skipped,
    Taken,
}

/// Results of the tasks that already ran in a sequence, in order.
#[derive(Default)]
pub struct TaskResults {
    slots: Vec<Slot>,
}

impl fmt::Debug for TaskResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskResults")
            .field("len", &self.slots.len())
            .finish()
    }
}

impl TaskResults {
    /// Number of tasks that reached a terminal state
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn push(&mut self, slot: Slot) {
        self.slots.push(slot);
    }

    /// Outcome of an earlier task
    pub fn outcome<T: 'static>(&self, task: TaskRef<T>) -> Result<TaskOutcome<&T>> {
        match self.slots.get(task.index) {
            None => Err(unavailable(task.index, "task has not run yet")),
            Some(Slot::Taken) => Err(unavailable(task.index, "result was already taken")),
            Some(Slot::Skipped) => Ok(TaskOutcome::Skipped),
            Some(Slot::Completed(value)) => value
                .downcast_ref::<T>()
                .map(TaskOutcome::Completed)
                .ok_or_else(|| unavailable(task.index, "result has a different type")),
        }
    }

    /// Completed result of an earlier task; a skipped task is an error here
    pub fn get<T: 'static>(&self, task: TaskRef<T>) -> Result<&T> {
        match self.outcome(task)? {
            TaskOutcome::Completed(value) => Ok(value),
            TaskOutcome::Skipped => Err(unavailable(task.index, "task was skipped")),
        }
    }

    /// Move a result out; later reads of the same task fail
    pub fn take<T: 'static>(&mut self, task: TaskRef<T>) -> Result<TaskOutcome<T>> {
        let slot = self
            .slots
            .get_mut(task.index)
            .ok_or_else(|| unavailable(task.index, "task has not run yet"))?;

        match std::mem::replace(slot, Slot::Taken) {
            Slot::Taken => Err(unavailable(task.index, "result was already taken")),
            Slot::Skipped => {
                *slot = Slot::Skipped;
                Ok(TaskOutcome::Skipped)
            }
            Slot::Completed(value) => match value.downcast::<T>() {
                Ok(value) => Ok(TaskOutcome::Completed(*value)),
                Err(value) => {
                    *slot = Slot::Completed(value);
                    Err(unavailable(task.index, "result has a different type"))
                }
            },
        }
    }
}

fn unavailable(index: usize, reason: &str) -> TaskError {
    TaskError::ResultUnavailable {
        index,
        reason: reason.to_string(),
    }
}
