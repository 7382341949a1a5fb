//! Bounded pool of interchangeable resources.
//!
//! Resources are created lazily, up to `max_size` handed out at once, and
//! kept in a free list once released. [`Pool::acquire`] never blocks: when
//! every resource is out it fails with [`AcquireError::Busy`] and the caller
//! decides whether to try again.
//!
//! The mutex guards bookkeeping only. Creating a resource and using it happen
//! outside the lock.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace, warn};

use crate::{AcquireError, BoxError, PoolConfig};

/// Creates the resources of a [`Pool`].
pub trait ResourceFactory: Send + Sync + 'static {
    type Resource: Send + 'static;
    type Error: Into<BoxError>;

    fn create(&self) -> Result<Self::Resource, Self::Error>;

    /// Decides whether a released resource goes back to the free list.
    ///
    /// `failed` is set when the action using it returned an error or
    /// panicked. The default keeps every resource.
    fn recycle(&self, resource: &Self::Resource, failed: bool) -> bool {
        let _ = (resource, failed);
        true
    }
}

/// [`ResourceFactory`] from a closure.
#[derive(Debug, Clone)]
pub struct FnFactory<F> {
    f: F,
}

pub fn factory_fn<F, R, E>(f: F) -> FnFactory<F>
where
    F: Fn() -> Result<R, E>,
{
    FnFactory { f }
}

impl<F, R, E> ResourceFactory for FnFactory<F>
where
    F: Fn() -> Result<R, E> + Send + Sync + 'static,
    R: Send + 'static,
    E: Into<BoxError>,
{
    type Resource = R;
    type Error = E;

    fn create(&self) -> Result<R, E> {
        (self.f)()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Resources currently handed out.
    pub outstanding: usize,
    /// Resources waiting in the free list.
    pub idle: usize,
    pub created: u64,
    /// Acquire calls answered with busy.
    pub rejected: u64,
    /// Resources dropped instead of recycled.
    pub discarded: u64,
}

struct PoolState<R> {
    free: Vec<R>,
    outstanding: usize,
    created: u64,
    rejected: u64,
    discarded: u64,
}

pub struct Pool<F: ResourceFactory> {
    name: String,
    max_size: usize,
    factory: F,
    state: Mutex<PoolState<F::Resource>>,
}

impl<F: ResourceFactory> Pool<F> {
    pub fn new(config: &PoolConfig, factory: F) -> Self {
        Self {
            name: config.name.clone(),
            max_size: config.max_size,
            factory,
            state: Mutex::new(PoolState {
                free: Vec::with_capacity(config.max_size),
                outstanding: 0,
                created: 0,
                rejected: 0,
                discarded: 0,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    // a panic while holding the lock can't leave the counters half updated
    fn lock(&self) -> MutexGuard<'_, PoolState<F::Resource>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hands out a free resource, or creates one while fewer than `max_size`
    /// are out.
    ///
    /// The resource returns to the pool when the [`Lease`] is dropped.
    pub fn acquire(&self) -> Result<Lease<'_, F>, AcquireError> {
        let reused = {
            let mut state = self.lock();
            if let Some(resource) = state.free.pop() {
                state.outstanding += 1;
                Some(resource)
            } else if state.outstanding < self.max_size {
                // reserve the slot, the resource is created outside the lock
                state.outstanding += 1;
                state.created += 1;
                None
            } else {
                state.rejected += 1;
                debug!(pool = %self.name, outstanding = state.outstanding, "pool busy");
                return Err(AcquireError::Busy { pool: self.name.clone(), max_size: self.max_size });
            }
        };

        let resource = match reused {
            Some(resource) => resource,
            None => self.factory.create().map_err(|e| {
                let mut state = self.lock();
                state.outstanding -= 1;
                state.created -= 1;
                let source = e.into();
                warn!(pool = %self.name, cause = %source, "create resource error");
                AcquireError::Create { pool: self.name.clone(), source }
            })?,
        };

        trace!(pool = %self.name, "resource acquired");
        Ok(Lease { pool: self, resource: Some(resource), failed: false })
    }

    fn release(&self, resource: F::Resource, failed: bool) {
        let keep = self.factory.recycle(&resource, failed);

        let mut state = self.lock();
        state.outstanding -= 1;
        trace!(pool = %self.name, outstanding = state.outstanding, failed, keep, "resource released");
        if keep {
            state.free.push(resource);
        } else {
            state.discarded += 1;
            drop(state);
            drop(resource);
        }
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.lock();
        PoolStats {
            outstanding: state.outstanding,
            idle: state.free.len(),
            created: state.created,
            rejected: state.rejected,
            discarded: state.discarded,
        }
    }
}

impl<F: ResourceFactory> fmt::Debug for Pool<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool").field("name", &self.name).field("max_size", &self.max_size).field("stats", &self.stats()).finish()
    }
}

/// Exclusive use of one pooled resource.
pub struct Lease<'a, F: ResourceFactory> {
    pool: &'a Pool<F>,
    /// Always `Some` until the lease is dropped.
    resource: Option<F::Resource>,
    failed: bool,
}

impl<F: ResourceFactory> Lease<'_, F> {
    /// Reports the resource as failed to [`ResourceFactory::recycle`] on release.
    pub fn mark_failed(&mut self) {
        self.failed = true;
    }
}

impl<F: ResourceFactory> Deref for Lease<'_, F> {
    type Target = F::Resource;

    fn deref(&self) -> &F::Resource {
        self.resource.as_ref().unwrap_or_else(|| unreachable!("resource taken before drop"))
    }
}

impl<F: ResourceFactory> DerefMut for Lease<'_, F> {
    fn deref_mut(&mut self) -> &mut F::Resource {
        self.resource.as_mut().unwrap_or_else(|| unreachable!("resource taken before drop"))
    }
}

impl<F: ResourceFactory> Drop for Lease<'_, F> {
    fn drop(&mut self) {
        if let Some(resource) = self.resource.take() {
            self.pool.release(resource, self.failed);
        }
    }
}

impl<F: ResourceFactory> fmt::Debug for Lease<'_, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lease").field("pool", &self.pool.name).field("failed", &self.failed).finish_non_exhaustive()
    }
}
