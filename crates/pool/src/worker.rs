use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::dispatcher::{self, Dispatch};
use tracing::{debug, error, trace, warn};

use crate::{AcquireError, BoxError, Pool, PoolConfig, ResourceFactory, WorkError};

/// Runs blocking actions against pooled resources on tokio's blocking threads.
///
/// Every call to [`with_resource`](PoolWorker::with_resource) is a work item:
/// it is moved to a blocking thread, acquires a resource there, runs the
/// action and releases the resource before its future resolves. The awaiting
/// task resumes on the runtime that polled it, so with a current-thread
/// runtime the result lands back on the control thread.
///
/// When the pool is busy the work item is handed back and re-queued after a
/// [`yield_now`](tokio::task::yield_now), at most `max_attempts` times in
/// total, then it fails with [`WorkError::NoConnectionsInPool`]. There is no
/// delay between attempts, so a saturated pool keeps the blocking threads
/// spinning until the bound is reached.
pub struct PoolWorker<F: ResourceFactory> {
    pool: Arc<Pool<F>>,
    max_attempts: usize,
}

enum Outcome<T, A> {
    Finished(Result<T, WorkError>),
    /// The pool was busy; the action comes back untouched for the next attempt.
    Busy(A),
}

impl<F: ResourceFactory> PoolWorker<F> {
    pub fn new(config: &PoolConfig, factory: F) -> Self {
        Self::with_pool(Arc::new(Pool::new(config, factory)), config.max_attempts)
    }

    pub fn with_pool(pool: Arc<Pool<F>>, max_attempts: usize) -> Self {
        Self { pool, max_attempts: max_attempts.max(1) }
    }

    pub fn pool(&self) -> &Arc<Pool<F>> {
        &self.pool
    }

    pub async fn with_resource<T, E, A>(&self, action: A) -> Result<T, WorkError>
    where
        A: FnOnce(&mut F::Resource) -> Result<T, E> + Send + 'static,
        E: Into<BoxError>,
        T: Send + 'static,
    {
        let mut action = action;

        for attempt in 1..=self.max_attempts {
            let pool = Arc::clone(&self.pool);
            let dispatch = dispatcher::get_default(Dispatch::clone);
            let work = move || dispatcher::with_default(&dispatch, || run(&pool, action));

            match tokio::task::spawn_blocking(work).await {
                Ok(Outcome::Finished(result)) => return result,
                Ok(Outcome::Busy(returned)) => {
                    trace!(pool = self.pool.name(), attempt, "pool busy, retry");
                    action = returned;
                    tokio::task::yield_now().await;
                }
                Err(e) if e.is_panic() => {
                    error!(pool = self.pool.name(), "pool worker panicked outside the action");
                    return Err(WorkError::Panicked { message: panic_message(&*e.into_panic()) });
                }
                Err(_) => return Err(WorkError::Canceled),
            }
        }

        warn!(pool = self.pool.name(), attempts = self.max_attempts, "no free resource in pool");
        Err(WorkError::NoConnectionsInPool { pool: self.pool.name().to_string(), attempts: self.max_attempts })
    }
}

impl<F: ResourceFactory> Clone for PoolWorker<F> {
    fn clone(&self) -> Self {
        Self { pool: Arc::clone(&self.pool), max_attempts: self.max_attempts }
    }
}

impl<F: ResourceFactory> fmt::Debug for PoolWorker<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolWorker").field("pool", &self.pool).field("max_attempts", &self.max_attempts).finish()
    }
}

/// One attempt of a work item, on a blocking thread.
fn run<F, T, E, A>(pool: &Pool<F>, action: A) -> Outcome<T, A>
where
    F: ResourceFactory,
    A: FnOnce(&mut F::Resource) -> Result<T, E>,
    E: Into<BoxError>,
{
    let mut lease = match pool.acquire() {
        Ok(lease) => lease,
        Err(AcquireError::Busy { .. }) => return Outcome::Busy(action),
        Err(e) => return Outcome::Finished(Err(e.into())),
    };

    // the lease is dropped, and the resource released, before the result is sent back
    let result = match panic::catch_unwind(AssertUnwindSafe(|| action(&mut *lease))) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            lease.mark_failed();
            let source = e.into();
            debug!(pool = pool.name(), cause = %source, "pooled action failed");
            Err(WorkError::Action { source })
        }
        Err(panic) => {
            lease.mark_failed();
            let message = panic_message(&*panic);
            error!(pool = pool.name(), message = %message, "pooled action panicked");
            Err(WorkError::Panicked { message })
        }
    };

    drop(lease);
    Outcome::Finished(result)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct Counter {
        next: AtomicUsize,
    }

    impl ResourceFactory for Counter {
        type Resource = usize;
        type Error = BoxError;

        fn create(&self) -> Result<usize, BoxError> {
            Ok(self.next.fetch_add(1, Ordering::SeqCst))
        }
    }

    fn worker(max_size: usize) -> PoolWorker<Counter> {
        PoolWorker::new(&PoolConfig::new("test").max_size(max_size), Counter::default())
    }

    async fn wait_outstanding(worker: &PoolWorker<Counter>, outstanding: usize) {
        while worker.pool().stats().outstanding != outstanding {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    #[tokio::test]
    async fn returns_action_value() {
        let worker = worker(2);

        let value = worker.with_resource(|id: &mut usize| Ok::<_, BoxError>(*id + 40)).await.unwrap();

        assert_eq!(value, 40);
        assert_eq!(worker.pool().stats().outstanding, 0);
    }

    #[tokio::test]
    async fn action_error_releases_resource() {
        let worker = worker(1);

        let result = worker.with_resource(|_: &mut usize| Err::<(), _>("no such table: users")).await;

        assert!(matches!(result, Err(WorkError::Action { source }) if source.to_string() == "no such table: users"));
        let stats = worker.pool().stats();
        assert_eq!(stats.outstanding, 0);
        assert_eq!(stats.idle, 1);
    }

    #[tokio::test]
    async fn panic_is_an_error_value() {
        let worker = worker(1);

        let result = worker.with_resource(|_: &mut usize| -> Result<(), BoxError> { panic!("boom") }).await;

        assert!(matches!(result, Err(WorkError::Panicked { message }) if message == "boom"));
        assert_eq!(worker.pool().stats().outstanding, 0);

        let value = worker.with_resource(|id: &mut usize| Ok::<_, BoxError>(*id)).await.unwrap();
        assert_eq!(value, 0);
    }

    #[tokio::test]
    async fn saturated_pool_gives_up_after_max_attempts() {
        let worker = worker(2);
        let (release, gate) = mpsc::channel::<()>();
        let gate = Arc::new(std::sync::Mutex::new(gate));

        let holders = (0..2)
            .map(|_| {
                let (worker, gate) = (worker.clone(), Arc::clone(&gate));
                tokio::spawn(async move {
                    worker
                        .with_resource(move |id: &mut usize| {
                            let _ = gate.lock().map(|gate| gate.recv());
                            Ok::<_, BoxError>(*id)
                        })
                        .await
                })
            })
            .collect::<Vec<_>>();

        // the holders take turns on the gate: one waits inside recv, the other on the lock
        wait_outstanding(&worker, 2).await;

        let result = worker.with_resource(|_: &mut usize| Ok::<_, BoxError>(())).await;
        assert!(matches!(result, Err(WorkError::NoConnectionsInPool { attempts: 16, .. })));
        assert_eq!(worker.pool().stats().rejected, 16);

        release.send(()).unwrap();
        release.send(()).unwrap();
        for holder in holders {
            assert!(holder.await.unwrap().is_ok());
        }
        assert_eq!(worker.pool().stats().outstanding, 0);
    }

    #[tokio::test]
    async fn retries_until_a_resource_is_free() {
        let worker = worker(1);
        let (release, gate) = mpsc::channel::<()>();

        let holder = {
            let worker = worker.clone();
            tokio::spawn(async move {
                worker
                    .with_resource(move |_: &mut usize| {
                        let _ = gate.recv_timeout(Duration::from_secs(5));
                        Ok::<_, BoxError>(())
                    })
                    .await
            })
        };
        wait_outstanding(&worker, 1).await;

        let waiter = {
            let worker = PoolWorker::with_pool(Arc::clone(worker.pool()), usize::MAX);
            tokio::spawn(async move { worker.with_resource(|id: &mut usize| Ok::<_, BoxError>(*id)).await })
        };
        while worker.pool().stats().rejected == 0 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        release.send(()).unwrap();

        assert!(holder.await.unwrap().is_ok());
        assert_eq!(waiter.await.unwrap().unwrap(), 0);
    }
}
