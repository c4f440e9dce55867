use tokio::task::JoinSet;

use crate::error::{Error, Result};

/// Runs indexed jobs concurrently and hands results back in index order,
/// whatever order they finished in.
pub struct TaskManager<R: Send + 'static> {
    tasks: JoinSet<Result<(usize, R)>>,
}

impl<R: Send + 'static> Default for TaskManager<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Send + 'static> TaskManager<R> {
    pub fn new() -> Self {
        Self {
            tasks: JoinSet::new(),
        }
    }

    pub fn spawn<F>(&mut self, index: usize, future: F)
    where
        F: std::future::Future<Output = Result<R>> + Send + 'static,
    {
        self.tasks
            .spawn(async move { future.await.map(|result| (index, result)) });
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Waits for every task. The first failure is returned and the remaining
    /// tasks are aborted when `self` is dropped.
    pub async fn wait(mut self) -> Result<Vec<R>> {
        let mut results = Vec::with_capacity(self.tasks.len());
        while let Some(joined) = self.tasks.join_next().await {
            let indexed = joined.map_err(|e| Error::Task(e.to_string()))??;
            results.push(indexed);
        }
        results.sort_by_key(|(index, _)| *index);
        Ok(results.into_iter().map(|(_, result)| result).collect())
    }
}
