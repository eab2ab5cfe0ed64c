//! Task trait and the node that drives a task through its lifecycle.

use async_trait::async_trait;
use sqlx::SqliteConnection;
use tracing::Instrument;

use super::results::{TaskOutcome, TaskResults};
use super::status::TaskStatus;
use crate::error::{Result, TaskError};
use crate::logging::log_task_transition;

/// A single authorization-aware unit of database work.
///
/// Implementations capture their actor and collaborators at construction and
/// receive their input and the caller's connection at run time. They never
/// open connections or transactions of their own.
#[async_trait]
pub trait Task: Send + Sync {
    /// The input this task accepts.
    type Input: Send + 'static;

    /// The result this task produces.
    type Output: Send + Sync + 'static;

    /// Short stable name for logging.
    fn name(&self) -> &'static str;

    /// Human-readable description of this particular instance.
    fn message(&self) -> String {
        self.name().to_string()
    }

    /// Execute the task logic on the given connection.
    async fn run(&self, input: Self::Input, conn: &mut SqliteConnection) -> Result<Self::Output>;
}

type InputBinding<I> = Box<dyn FnOnce(&TaskResults) -> Result<I> + Send>;

enum TaskInput<I> {
    Given(I),
    Bound(InputBinding<I>),
    Consumed,
}

/// A task plus everything the runner needs to execute it once: its input
/// (given up front or bound to earlier results), the skip flag, and status.
pub struct TaskNode<T: Task> {
    task: T,
    input: TaskInput<T::Input>,
    skip: bool,
    status: TaskStatus,
}

impl<T: Task> TaskNode<T> {
    /// Node with a fixed input.
    pub fn new(task: T, input: T::Input) -> Self {
        Self {
            task,
            input: TaskInput::Given(input),
            skip: false,
            status: TaskStatus::New,
        }
    }

    /// Node whose input is computed from earlier results right before it runs.
    ///
    /// The binding is evaluated at most once and never for a skipped node.
    pub fn bound<F>(task: T, binding: F) -> Self
    where
        F: FnOnce(&TaskResults) -> Result<T::Input> + Send + 'static,
    {
        Self {
            task,
            input: TaskInput::Bound(Box::new(binding)),
            skip: false,
            status: TaskStatus::New,
        }
    }

    /// Mark the node as skipped (or not).
    pub fn skip(mut self, skip: bool) -> Self {
        self.skip = skip;
        self
    }

    pub fn is_skipped(&self) -> bool {
        self.skip
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn task(&self) -> &T {
        &self.task
    }

    fn transition(&mut self, next: TaskStatus, message: &str, details: Option<&str>) {
        debug_assert!(self.status.can_transition_to(next));
        self.status = next;
        log_task_transition(self.task.name(), message, next, details);
    }

    /// Run the node once against `conn`.
    ///
    /// `results` holds the outcomes of tasks that ran earlier in the same
    /// sequence and is only read by the input binding.
    pub async fn run(
        &mut self,
        results: &TaskResults,
        conn: &mut SqliteConnection,
    ) -> Result<TaskOutcome<T::Output>> {
        let name = self.task.name();
        if self.status != TaskStatus::New {
            return Err(TaskError::AlreadyExecuted(name));
        }

        let message = self.task.message();
        if self.skip {
            self.transition(TaskStatus::Ok, &message, Some("skipped"));
            return Ok(TaskOutcome::Skipped);
        }

        self.transition(TaskStatus::Running, &message, None);

        let input = match std::mem::replace(&mut self.input, TaskInput::Consumed) {
            TaskInput::Given(input) => Ok(input),
            TaskInput::Bound(binding) => binding(results),
            TaskInput::Consumed => Err(TaskError::AlreadyExecuted(name)),
        };

        let span = tracing::debug_span!("task", task = name, message = %message);
        let result = match input {
            Ok(input) => self.task.run(input, conn).instrument(span).await,
            Err(error) => Err(error),
        };

        match result {
            Ok(output) => {
                self.transition(TaskStatus::Ok, &message, None);
                Ok(TaskOutcome::Completed(output))
            }
            Err(error) => {
                self.transition(TaskStatus::Fail, &message, Some(&error.to_string()));
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::results::{Slot, TaskRef};
    use sqlx::Connection;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Double {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Task for Double {
        type Input = u32;
        type Output = u32;

        fn name(&self) -> &'static str {
            "double"
        }

        async fn run(&self, input: u32, _conn: &mut SqliteConnection) -> Result<u32> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(input * 2)
        }
    }

    struct Fails;

    #[async_trait]
    impl Task for Fails {
        type Input = ();
        type Output = ();

        fn name(&self) -> &'static str {
            "fails"
        }

        async fn run(&self, _input: (), _conn: &mut SqliteConnection) -> Result<()> {
            Err(TaskError::forbidden("nope"))
        }
    }

    async fn connection() -> SqliteConnection {
        SqliteConnection::connect("sqlite::memory:").await.unwrap()
    }

    fn double() -> (Double, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Double {
                calls: calls.clone(),
            },
            calls,
        )
    }

    #[test]
    fn test_given_input_runs_once() {
        tokio_test::block_on(async {
            let mut conn = connection().await;
            let (task, calls) = double();
            let mut node = TaskNode::new(task, 21);
            let results = TaskResults::default();

            let outcome = node.run(&results, &mut conn).await.unwrap();
            assert_eq!(outcome, TaskOutcome::Completed(42));
            assert_eq!(node.status(), TaskStatus::Ok);

            let again = node.run(&results, &mut conn).await;
            assert!(matches!(again, Err(TaskError::AlreadyExecuted("double"))));
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        });
    }

    #[tokio::test]
    async fn test_bound_input_reads_earlier_result() {
        let mut conn = connection().await;
        let mut results = TaskResults::default();
        results.push(Slot::Completed(Box::new(5u32)));
        let earlier = TaskRef::<u32>::new(0);

        let (task, _) = double();
        let mut node = TaskNode::bound(task, move |r| Ok(*r.get(earlier)? + 1));

        let outcome = node.run(&results, &mut conn).await.unwrap();
        assert_eq!(outcome, TaskOutcome::Completed(12));
    }

    #[tokio::test]
    async fn test_skipped_node_never_evaluates_binding() {
        let mut conn = connection().await;
        let (task, calls) = double();
        let mut node = TaskNode::bound(task, |_| panic!("binding must not run")).skip(true);

        let outcome = node.run(&TaskResults::default(), &mut conn).await.unwrap();
        assert!(outcome.is_skipped());
        assert_eq!(node.status(), TaskStatus::Ok);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failing_binding_fails_the_node() {
        let mut conn = connection().await;
        let (task, calls) = double();
        let missing = TaskRef::<u32>::new(0);
        let mut node = TaskNode::bound(task, move |r| r.get(missing).copied());

        let result = node.run(&TaskResults::default(), &mut conn).await;
        assert!(matches!(result, Err(TaskError::ResultUnavailable { .. })));
        assert_eq!(node.status(), TaskStatus::Fail);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_error_propagates_unmodified() {
        let mut conn = connection().await;
        let mut node = TaskNode::new(Fails, ());

        let result = node.run(&TaskResults::default(), &mut conn).await;
        assert_eq!(result, Err(TaskError::Forbidden("nope".to_string())));
        assert_eq!(node.status(), TaskStatus::Fail);
    }
}
