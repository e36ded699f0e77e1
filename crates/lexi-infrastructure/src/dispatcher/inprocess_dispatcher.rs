use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use dashmap::DashMap;
use lexi_domain::error::{Error, Result};
use lexi_domain::ports::services::{TaskDispatcher, TaskExecutor, TaskPayload};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// In-process [`TaskDispatcher`]: spawns a tokio task per dispatched
/// payload and tracks it by a locally-generated task id, so `revoke` can
/// abort it. Chords are implemented by spawning every member task plus a
/// join task that awaits all of them before invoking the callback.
///
/// The `lexi` binary wires this adapter at startup in place of a real
/// message broker (spec.md's dispatcher is deliberately broker-agnostic);
/// swapping in a Redis/RabbitMQ-backed dispatcher later only requires a
/// new impl of this trait, not orchestrator changes.
///
/// The executor is bound after construction via [`Self::set_executor`]:
/// the executor itself routes to the Job Orchestrator, which holds this
/// dispatcher, so the two can't be built in one pass.
pub struct InProcessDispatcher {
    executor: OnceLock<Arc<dyn TaskExecutor>>,
    handles: DashMap<String, JoinHandle<()>>,
}

impl InProcessDispatcher {
    /// Build a dispatcher with no bound executor yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            executor: OnceLock::new(),
            handles: DashMap::new(),
        }
    }

    /// Bind the executor that will run every dispatched task. Must be
    /// called before the first dispatch; the composition root calls it
    /// immediately after constructing the executor.
    pub fn set_executor(&self, executor: Arc<dyn TaskExecutor>) {
        let _ = self.executor.set(executor);
    }

    fn executor(&self) -> Result<Arc<dyn TaskExecutor>> {
        self.executor
            .get()
            .cloned()
            .ok_or_else(|| Error::internal("dispatcher used before an executor was bound"))
    }

    fn new_task_id(prefix: &str) -> String {
        format!("{prefix}-{}", uuid::Uuid::new_v4())
    }
}

impl Default for InProcessDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskDispatcher for InProcessDispatcher {
    async fn dispatch_single(&self, payload: TaskPayload) -> Result<String> {
        let task_id = Self::new_task_id("task");
        let executor = self.executor()?;
        let handle = tokio::spawn(async move {
            let _ = executor.execute(&payload).await;
        });
        self.handles.insert(task_id.clone(), handle);
        Ok(task_id)
    }

    async fn dispatch_group_with_callback(
        &self,
        tasks: Vec<TaskPayload>,
        callback: TaskPayload,
    ) -> Result<String> {
        let group_id = Self::new_task_id("group");
        let executor = self.executor()?;
        let barrier = Arc::new(Notify::new());
        let remaining = Arc::new(std::sync::atomic::AtomicUsize::new(tasks.len().max(1)));

        if tasks.is_empty() {
            let exec = Arc::clone(&executor);
            tokio::spawn(async move {
                let _ = exec.execute(&callback).await;
            });
            return Ok(group_id);
        }

        for task in tasks {
            let exec = Arc::clone(&executor);
            let remaining = Arc::clone(&remaining);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                let _ = exec.execute(&task).await;
                if remaining.fetch_sub(1, std::sync::atomic::Ordering::SeqCst) == 1 {
                    barrier.notify_one();
                }
            });
        }

        let join_handle = tokio::spawn(async move {
            barrier.notified().await;
            let _ = executor.execute(&callback).await;
        });
        self.handles.insert(group_id.clone(), join_handle);
        Ok(group_id)
    }

    async fn revoke(&self, task_id: &str, terminate: bool) -> Result<()> {
        if let Some((_, handle)) = self.handles.remove(task_id) {
            if terminate {
                handle.abort();
            }
        }
        Ok(())
    }
}
