use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use rayon::prelude::*;
use tracing::warn;

use crate::error::Result;

/// Result of one task: its value, or why it failed.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome<T> {
    Done { index: usize, value: T },
    Failed(TaskFailure),
}

/// A task that returned an error or panicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    /// Position of the task's input in the submitted list.
    pub index: usize,
    pub reason: String,
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task {}: {}", self.index, self.reason)
    }
}

/// Outcomes of a whole stage, split into successes and failures.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskReport<T> {
    /// Successful results with their input index, in input order.
    pub done: Vec<(usize, T)>,
    /// Failed tasks, in input order.
    pub failures: Vec<TaskFailure>,
}

impl<T> TaskReport<T> {
    /// Successful values in input order.
    #[must_use]
    pub fn into_values(self) -> Vec<T> {
        self.done.into_iter().map(|(_, value)| value).collect()
    }
}

/// Runs independent tasks and collects their outcomes.
///
/// Each task is a pure function of its input. An error or panic inside one
/// task becomes a [`TaskFailure`] for that index only; sibling tasks always
/// run to completion. `run` returns once every task has finished.
#[derive(Debug, Clone, Copy)]
pub struct TaskQueue {
    label: &'static str,
    parallel: bool,
}

impl TaskQueue {
    /// Creates a queue that dispatches onto the rayon thread pool.
    #[must_use]
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            parallel: true,
        }
    }

    /// Runs tasks on the calling thread instead of the pool.
    #[must_use]
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Runs `task` once per input and returns every outcome in input order.
    pub fn run<I, O, F>(&self, inputs: &[I], task: F) -> TaskReport<O>
    where
        I: Sync,
        O: Send,
        F: Fn(usize, &I) -> Result<O> + Sync,
    {
        let run_one = |(index, input): (usize, &I)| -> TaskOutcome<O> {
            match catch_unwind(AssertUnwindSafe(|| task(index, input))) {
                Ok(Ok(value)) => TaskOutcome::Done { index, value },
                Ok(Err(err)) => TaskOutcome::Failed(TaskFailure {
                    index,
                    reason: err.to_string(),
                }),
                Err(payload) => TaskOutcome::Failed(TaskFailure {
                    index,
                    reason: panic_message(payload.as_ref()),
                }),
            }
        };

        let outcomes: Vec<TaskOutcome<O>> = if self.parallel {
            inputs.par_iter().enumerate().map(run_one).collect()
        } else {
            inputs.iter().enumerate().map(run_one).collect()
        };

        let mut report = TaskReport {
            done: Vec::with_capacity(outcomes.len()),
            failures: Vec::new(),
        };
        for outcome in outcomes {
            match outcome {
                TaskOutcome::Done { index, value } => report.done.push((index, value)),
                TaskOutcome::Failed(failure) => {
                    warn!(stage = self.label, index = failure.index, reason = %failure.reason, "task failed");
                    report.failures.push(failure);
                }
            }
        }
        report
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_owned()
    }
}
