use tokio::task::JoinHandle;
use std::collections::HashMap;
use crate::error::{Error, Result};
use tracing::{info, error};

/// Tracks the feeder's background tasks (updater loop, report publisher).
///
/// Tasks report their own `Result`. A task that panics or is aborted surfaces
/// as `Error::TaskError` when joined.
pub struct TaskSupervisor {
    tasks: HashMap<String, JoinHandle<Result<()>>>,
}

impl TaskSupervisor {
    pub fn new() -> Self {
        TaskSupervisor {
            tasks: HashMap::new(),
        }
    }

    pub fn spawn<F>(&mut self, name: impl Into<String>, future: F) -> &mut Self
    where
        F: std::future::Future<Output = Result<()>> + Send + 'static,
    {
        let name = name.into();
        let handle = tokio::spawn(future);

        info!("Spawned background task: {}", name);
        self.tasks.insert(name, handle);
        self
    }

    /// Names of tasks that have already stopped, in lexical order.
    pub fn finished_tasks(&self) -> Vec<String> {
        let mut finished: Vec<String> = self.tasks.iter()
            .filter(|(_, handle)| handle.is_finished())
            .map(|(name, _)| name.clone())
            .collect();
        finished.sort();
        finished
    }

    pub fn active_task_count(&self) -> usize {
        self.tasks.values().filter(|handle| !handle.is_finished()).count()
    }

    pub async fn shutdown_all(&mut self) {
        info!("Shutting down {} background tasks", self.tasks.len());

        for (name, handle) in self.tasks.drain() {
            handle.abort();
            info!("Aborted task: {}", name);
        }
    }

    /// Waits for `name` to finish and returns its outcome.
    pub async fn wait_for_task(&mut self, name: &str) -> Result<()> {
        let handle = self.tasks
            .remove(name)
            .ok_or_else(|| Error::TaskError(format!("Task {} not found", name)))?;

        match handle.await {
            Ok(Ok(())) => {
                info!("Task {} completed", name);
                Ok(())
            }
            Ok(Err(e)) => {
                error!("Task {} failed: {}", name, e);
                Err(e)
            }
            Err(e) => {
                error!("Task {} did not complete: {}", name, e);
                Err(Error::TaskError(format!("Task {} did not complete: {}", name, e)))
            }
        }
    }
}

impl Default for TaskSupervisor {
    fn default() -> Self {
        Self::new()
    }
}
