//! Pool Orchestrator - concurrent, independently cancellable duration waits
//!
//! Every entry runs as its own spawned task; results come back in input
//! order. A skipped, cancelled, failed or panicked task yields `None` and
//! never affects its siblings.

use futures::future::join_all;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{WaitEngine, WaitError, WaitOptions, WaitOutcome};
use crate::types::WaitRequest;

/// Shared "skip this task" predicate, checked once when a task starts.
pub type CancelPredicate = Arc<dyn Fn() -> bool + Send + Sync>;

/// One pool entry.
#[derive(Clone)]
pub struct PoolTask {
    pub duration: f64,
    pub options: WaitOptions,
    pub cancel_if: Option<CancelPredicate>,
}

impl PoolTask {
    pub fn new(duration: f64, options: WaitOptions) -> Self {
        Self {
            duration,
            options,
            cancel_if: None,
        }
    }

    pub fn with_cancel_if(mut self, cancel_if: CancelPredicate) -> Self {
        self.cancel_if = Some(cancel_if);
        self
    }

    /// Token that cancels only this task.
    ///
    /// Created on demand as a child of the task's current token, so a
    /// pool-wide cancel still reaches it.
    pub fn cancel_token(&mut self) -> CancellationToken {
        let token = match &self.options.cancel {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };
        self.options.cancel = Some(token.clone());
        token
    }

    async fn run(self, engine: WaitEngine, index: usize) -> Option<WaitOutcome> {
        if self.cancel_if.as_ref().is_some_and(|cancel_if| cancel_if()) {
            debug!(task = index, "Pool task skipped by cancel predicate");
            return None;
        }

        match engine
            .wait(WaitRequest::Duration(self.duration), &self.options)
            .await
        {
            Ok(outcome) => Some(outcome),
            Err(WaitError::Interrupted { elapsed, .. }) => {
                debug!(task = index, elapsed = ?elapsed, "Pool task cancelled");
                None
            }
            Err(e) => {
                warn!(task = index, duration = self.duration, error = %e, "Pool task failed");
                None
            }
        }
    }
}

impl std::fmt::Debug for PoolTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolTask")
            .field("duration", &self.duration)
            .field("options", &self.options)
            .field("cancel_if", &self.cancel_if.is_some())
            .finish()
    }
}

impl WaitEngine {
    /// Run one duration wait per entry concurrently.
    ///
    /// Each task gets a child of `options.cancel` (when set), so cancelling
    /// the parent stops the whole pool.
    pub async fn wait_pool(
        &self,
        durations: &[f64],
        options: &WaitOptions,
        cancel_if: Option<CancelPredicate>,
    ) -> Vec<Option<WaitOutcome>> {
        let tasks = durations
            .iter()
            .map(|&duration| {
                let mut task_options = options.clone();
                task_options.cancel = options.cancel.as_ref().map(CancellationToken::child_token);
                PoolTask {
                    duration,
                    options: task_options,
                    cancel_if: cancel_if.clone(),
                }
            })
            .collect();
        self.run_pool(tasks).await
    }

    /// Run prepared tasks concurrently; results follow input order.
    pub async fn run_pool(&self, tasks: Vec<PoolTask>) -> Vec<Option<WaitOutcome>> {
        let count = tasks.len();
        let handles: Vec<_> = tasks
            .into_iter()
            .enumerate()
            .map(|(index, task)| tokio::spawn(task.run(self.clone(), index)))
            .collect();

        let results: Vec<Option<WaitOutcome>> = join_all(handles)
            .await
            .into_iter()
            .enumerate()
            .map(|(index, joined)| match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(task = index, error = %e, "Pool task aborted");
                    None
                }
            })
            .collect();

        debug!(
            tasks = count,
            completed = results.iter().filter(|r| r.is_some()).count(),
            "Wait pool finished"
        );
        results
    }

    /// Synchronous wrapper around [`WaitEngine::wait_pool`] on a
    /// multi-thread runtime. Must not be called from inside an async context.
    pub fn wait_pool_blocking(
        &self,
        durations: &[f64],
        options: &WaitOptions,
        cancel_if: Option<CancelPredicate>,
    ) -> Result<Vec<Option<WaitOutcome>>, WaitError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_time()
            .build()?;
        Ok(runtime.block_on(self.wait_pool(durations, options, cancel_if)))
    }
}
