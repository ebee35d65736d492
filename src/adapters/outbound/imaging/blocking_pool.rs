use std::{num::NonZeroUsize, sync::Arc};
use tokio::sync::Semaphore;

use crate::domain::errors::{ImageError, ImageResult};

/// Bounded pool for CPU-heavy work. At most `size` jobs run on the blocking threads at
/// once; the rest wait for a permit.
#[derive(Debug, Clone)]
pub struct BlockingPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl BlockingPool {
    pub fn new(workers: usize) -> Self {
        let size = workers.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    /// One worker per available core
    pub fn with_available_parallelism() -> Self {
        let workers = std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        Self::new(workers)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub async fn run<F, T>(&self, job: F) -> ImageResult<T>
    where
        F: FnOnce() -> ImageResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| ImageError::Worker(e.to_string()))?;

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job()
        })
        .await
        .map_err(|e| ImageError::Worker(e.to_string()))?
    }
}
