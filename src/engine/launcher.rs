// src/engine/launcher.rs

//! Spawn boundary for background runs.
//!
//! Every accepted run becomes its own Tokio task. By default there is no cap
//! on how many execute at once; with a limit, tasks queue on a semaphore and
//! stay `running` until they obtain a permit.
//!
//! A launched task also waits for its [`StartSignal`], which the caller
//! fires (or drops) once the accepted response has been handed back. Until
//! then the run reads as `running` regardless of how many worker threads the
//! runtime has.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Semaphore, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::types::RunId;

/// Releases a launched task. Firing and dropping have the same effect.
#[derive(Debug)]
pub struct StartSignal(Option<oneshot::Sender<()>>);

impl StartSignal {
    pub fn fire(&mut self) {
        if let Some(tx) = self.0.take() {
            let _ = tx.send(());
        }
    }

    pub fn is_fired(&self) -> bool {
        self.0.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunLauncher {
    limit: Option<Arc<Semaphore>>,
}

impl RunLauncher {
    pub fn unbounded() -> Self {
        Self { limit: None }
    }

    /// At most `max` runs execute concurrently. `max == 0` is treated as 1.
    pub fn bounded(max: usize) -> Self {
        Self {
            limit: Some(Arc::new(Semaphore::new(max.max(1)))),
        }
    }

    pub fn from_limit(limit: Option<usize>) -> Self {
        match limit {
            Some(max) => Self::bounded(max),
            None => Self::unbounded(),
        }
    }

    pub fn is_bounded(&self) -> bool {
        self.limit.is_some()
    }

    /// Spawn `job` as a detached background task.
    ///
    /// `job` is not polled until the returned [`StartSignal`] has been fired
    /// or dropped and a permit is held, so whatever it does first happens
    /// only once the run may actually execute. Must be called from within a
    /// Tokio runtime.
    pub fn launch<F>(&self, run_id: RunId, job: F) -> (StartSignal, JoinHandle<()>)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let limit = self.limit.clone();
        let (tx, rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            // Err means the signal was dropped unfired, which also releases.
            let _ = rx.await;

            let _permit = match limit {
                Some(semaphore) => match semaphore.acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(e) => {
                        warn!(run_id = %run_id, error = %e, "run limiter closed; executing unthrottled");
                        None
                    }
                },
                None => None,
            };

            debug!(run_id = %run_id, "launching run");
            job.await;
        });

        (StartSignal(Some(tx)), handle)
    }
}
