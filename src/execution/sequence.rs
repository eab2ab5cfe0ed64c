//! Ordered task sequences that share one transaction.

use async_trait::async_trait;
use sqlx::SqliteConnection;
use std::fmt;
use std::marker::PhantomData;

use super::results::{Slot, TaskOutcome, TaskRef, TaskResults};
use super::status::TaskStatus;
use super::task::{Task, TaskNode};
use crate::error::Result;

/// Object-safe view of a [`TaskNode`] so nodes of different task types can
/// live in one sequence.
#[async_trait]
pub(crate) trait ErasedTask: Send {
    fn name(&self) -> &'static str;

    fn status(&self) -> TaskStatus;

    async fn run_erased(
        &mut self,
        results: &TaskResults,
        conn: &mut SqliteConnection,
    ) -> Result<Slot>;
}

#[async_trait]
impl<T: Task + 'static> ErasedTask for TaskNode<T> {
    fn name(&self) -> &'static str {
        self.task().name()
    }

    fn status(&self) -> TaskStatus {
        TaskNode::status(self)
    }

    async fn run_erased(
        &mut self,
        results: &TaskResults,
        conn: &mut SqliteConnection,
    ) -> Result<Slot> {
        Ok(match self.run(results, conn).await? {
            TaskOutcome::Completed(output) => Slot::Completed(Box::new(output)),
            TaskOutcome::Skipped => Slot::Skipped,
        })
    }
}

/// A non-empty list of task nodes whose last task produces `O`.
///
/// Built with [`Sequence::start`] and [`Sequence::then`]; each step returns a
/// sequence typed by the newly appended task, so the sequence's result type is
/// always that of its last task.
pub struct Sequence<O> {
    tasks: Vec<Box<dyn ErasedTask>>,
    _output: PhantomData<fn() -> O>,
}

impl<O> fmt::Debug for Sequence<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequence")
            .field("tasks", &self.task_names())
            .finish()
    }
}

impl<O> Sequence<O> {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn task_names(&self) -> Vec<&'static str> {
        self.tasks.iter().map(|task| task.name()).collect()
    }
}

impl<O: Send + Sync + 'static> Sequence<O> {
    pub fn start<T>(node: TaskNode<T>) -> Self
    where
        T: Task<Output = O> + 'static,
    {
        Self {
            tasks: vec![Box::new(node)],
            _output: PhantomData,
        }
    }

    /// Append a node; it runs after every task already in the sequence.
    pub fn then<T: Task + 'static>(mut self, node: TaskNode<T>) -> Sequence<T::Output> {
        self.tasks.push(Box::new(node));
        Sequence {
            tasks: self.tasks,
            _output: PhantomData,
        }
    }

    /// Append `task` with its input derived from the current last result.
    ///
    /// A skipped last task makes the binding fail, which fails the sequence.
    pub fn pipe<T, F>(self, task: T, binding: F) -> Sequence<T::Output>
    where
        T: Task + 'static,
        F: FnOnce(&O) -> Result<T::Input> + Send + 'static,
    {
        let last = self.last();
        self.then(TaskNode::bound(task, move |results| {
            binding(results.get(last)?)
        }))
    }

    /// Handle to the result of the current last task.
    pub fn last(&self) -> TaskRef<O> {
        TaskRef::new(self.tasks.len() - 1)
    }

    /// Run every node in order on `conn`, stopping at the first failure.
    ///
    /// Transaction handling belongs to the caller.
    pub(crate) async fn execute(self, conn: &mut SqliteConnection) -> Result<SequenceResults<O>> {
        let last = self.last();
        let mut results = TaskResults::default();

        for mut task in self.tasks {
            let slot = task.run_erased(&results, conn).await?;
            debug_assert!(task.status().is_terminal());
            results.push(slot);
        }

        Ok(SequenceResults { results, last })
    }
}

/// Every outcome of a successfully executed sequence.
#[derive(Debug)]
pub struct SequenceResults<O> {
    results: TaskResults,
    last: TaskRef<O>,
}

impl<O: 'static> SequenceResults<O> {
    /// Outcome of the last task
    pub fn last(&self) -> Result<TaskOutcome<&O>> {
        self.results.outcome(self.last)
    }

    pub fn into_last(mut self) -> Result<TaskOutcome<O>> {
        self.results.take(self.last)
    }

    /// Outcome of any task in the sequence
    pub fn get<T: 'static>(&self, task: TaskRef<T>) -> Result<TaskOutcome<&T>> {
        self.results.outcome(task)
    }

    pub fn take<T: 'static>(&mut self, task: TaskRef<T>) -> Result<TaskOutcome<T>> {
        self.results.take(task)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;
    use sqlx::Connection;

    struct Parse;

    #[async_trait]
    impl Task for Parse {
        type Input = String;
        type Output = u32;

        fn name(&self) -> &'static str {
            "parse"
        }

        async fn run(&self, input: String, _conn: &mut SqliteConnection) -> Result<u32> {
            input
                .parse()
                .map_err(|_| TaskError::forbidden(format!("not a number: {input}")))
        }
    }

    struct Describe;

    #[async_trait]
    impl Task for Describe {
        type Input = u32;
        type Output = String;

        fn name(&self) -> &'static str {
            "describe"
        }

        async fn run(&self, input: u32, _conn: &mut SqliteConnection) -> Result<String> {
            Ok(format!("#{input}"))
        }
    }

    async fn connection() -> SqliteConnection {
        SqliteConnection::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_pipe_feeds_previous_result() {
        let mut conn = connection().await;
        let sequence = Sequence::start(TaskNode::new(Parse, "41".to_string()))
            .pipe(Describe, |n| Ok(n + 1));

        assert_eq!(sequence.task_names(), vec!["parse", "describe"]);
        assert_eq!(
            format!("{sequence:?}"),
            r#"Sequence { tasks: ["parse", "describe"] }"#
        );

        let results = sequence.execute(&mut conn).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results.get(TaskRef::<u32>::new(0)).unwrap(), TaskOutcome::Completed(&41));
        assert_eq!(results.into_last().unwrap(), TaskOutcome::Completed("#42".to_string()));
    }

    #[tokio::test]
    async fn test_failure_short_circuits() {
        let mut conn = connection().await;
        let sequence = Sequence::start(TaskNode::new(Parse, "x".to_string()))
            .pipe(Describe, |_| panic!("later task must not run"));

        let result = sequence.execute(&mut conn).await;
        assert!(matches!(result, Err(TaskError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_skipped_last_task_keeps_earlier_results() {
        let mut conn = connection().await;
        let first = Sequence::start(TaskNode::new(Parse, "7".to_string()));
        let parsed = first.last();
        let sequence = first.then(
            TaskNode::bound(Describe, move |r| r.get(parsed).copied()).skip(true),
        );

        let mut results = sequence.execute(&mut conn).await.unwrap();
        assert!(results.last().unwrap().is_skipped());
        assert_eq!(results.take(parsed).unwrap(), TaskOutcome::Completed(7));
    }
}
