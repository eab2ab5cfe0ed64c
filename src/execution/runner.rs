//! # Task Runner
//!
//! Owns transaction scope for tasks. A single node or a sequence runs on one
//! transaction that commits when every task reached `Ok` and rolls back on the
//! first failure. Batches give each entry its own transaction and turn
//! failures into absent entries instead of failing the whole batch.
//!
//! Transactions start with `BEGIN IMMEDIATE`. A sequence that reads before it
//! writes then holds the write lock from its first statement, so concurrent
//! sequences queue on the busy timeout instead of failing a lock upgrade.

use futures::stream::{self, StreamExt};
use sqlx::SqlitePool;
use tracing::{debug, error, warn};

use super::results::TaskOutcome;
use super::sequence::{Sequence, SequenceResults};
use super::task::{Task, TaskNode};
use crate::config::PublicItemsConfig;
use crate::error::Result;

const DEFAULT_BATCH_CONCURRENCY: usize = 8;
const BEGIN_IMMEDIATE: &str = "BEGIN IMMEDIATE";

#[derive(Debug, Clone)]
pub struct TaskRunner {
    pool: SqlitePool,
    batch_concurrency: usize,
}

impl TaskRunner {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
        }
    }

    pub fn from_config(pool: SqlitePool, config: &PublicItemsConfig) -> Self {
        Self::new(pool).with_batch_concurrency(config.batch_concurrency)
    }

    /// Upper bound on batch entries in flight at once (at least 1)
    pub fn with_batch_concurrency(mut self, batch_concurrency: usize) -> Self {
        self.batch_concurrency = batch_concurrency.max(1);
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn batch_concurrency(&self) -> usize {
        self.batch_concurrency
    }

    /// Run one node on a fresh transaction.
    pub async fn run_single<T: Task + 'static>(
        &self,
        node: TaskNode<T>,
    ) -> Result<TaskOutcome<T::Output>> {
        self.run_single_sequence(Sequence::start(node)).await
    }

    /// Run a sequence on one transaction and return the last task's outcome.
    pub async fn run_single_sequence<O: Send + Sync + 'static>(
        &self,
        sequence: Sequence<O>,
    ) -> Result<TaskOutcome<O>> {
        self.run_sequence(sequence).await?.into_last()
    }

    /// Run a sequence on one transaction and return every task's outcome.
    pub async fn run_sequence<O: Send + Sync + 'static>(
        &self,
        sequence: Sequence<O>,
    ) -> Result<SequenceResults<O>> {
        let tasks = sequence.task_names();
        debug!(tasks = ?tasks, "Running task sequence");

        let mut tx = self.pool.begin_with(BEGIN_IMMEDIATE).await?;
        match sequence.execute(&mut *tx).await {
            Ok(results) => {
                tx.commit().await?;
                debug!(tasks = ?tasks, "Task sequence committed");
                Ok(results)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    error!(
                        tasks = ?tasks,
                        error = %rollback_err,
                        "Failed to roll back task sequence"
                    );
                }
                debug!(tasks = ?tasks, error = %err, "Task sequence rolled back");
                Err(err)
            }
        }
    }

    /// Run independent nodes, each on its own transaction.
    ///
    /// The output is in input order. Failed and skipped nodes are `None`.
    pub async fn run_multiple<T: Task + 'static>(
        &self,
        nodes: Vec<TaskNode<T>>,
    ) -> Vec<Option<T::Output>> {
        stream::iter(nodes)
            .map(|node| async move {
                let name = node.task().name();
                match self.run_single(node).await {
                    Ok(TaskOutcome::Completed(output)) => Some(output),
                    Ok(TaskOutcome::Skipped) => {
                        warn!(task = name, "Dropping skipped batch entry");
                        None
                    }
                    Err(err) => {
                        warn!(task = name, error = %err, "Dropping failed batch entry");
                        None
                    }
                }
            })
            .buffered(self.batch_concurrency)
            .collect()
            .await
    }

    /// Run independent sequences, each on its own transaction.
    ///
    /// A failed sequence is `None`; a successful one yields all its outcomes
    /// so the caller can decide what a skipped last task means.
    pub async fn run_multiple_sequences<O: Send + Sync + 'static>(
        &self,
        sequences: Vec<Sequence<O>>,
    ) -> Vec<Option<SequenceResults<O>>> {
        stream::iter(sequences)
            .map(|sequence| async move {
                let tasks = sequence.task_names();
                match self.run_sequence(sequence).await {
                    Ok(results) => Some(results),
                    Err(err) => {
                        warn!(tasks = ?tasks, error = %err, "Dropping failed batch sequence");
                        None
                    }
                }
            })
            .buffered(self.batch_concurrency)
            .collect()
            .await
    }
}
