//! # Task Execution
//!
//! Tasks are small units of authorization-aware database work. A
//! [`TaskNode`] wraps a task with its input, skip flag and lifecycle status;
//! a [`Sequence`] chains nodes so later inputs can be bound to earlier
//! results; the [`TaskRunner`] decides transaction scope.

pub mod results;
pub mod runner;
pub mod sequence;
pub mod status;
pub mod task;

pub use results::{TaskOutcome, TaskRef, TaskResults};
pub use runner::TaskRunner;
pub use sequence::{Sequence, SequenceResults};
pub use status::TaskStatus;
pub use task::{Task, TaskNode};
