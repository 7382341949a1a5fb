//! Bounded resource pool and the worker running blocking actions against it.
//!
//! A [`Pool`] holds interchangeable resources, for example database
//! connections, created lazily by a [`ResourceFactory`] up to a configured
//! maximum. A [`PoolWorker`] moves a blocking action to tokio's blocking
//! threads, runs it with a pooled resource and hands the result back as a
//! future, so the control thread never blocks on the resource.
//!
//! ```no_run
//! use relay_pool::{factory_fn, BoxError, PoolConfig, PoolWorker, WorkError};
//!
//! # async fn demo() -> Result<(), WorkError> {
//! let config = PoolConfig::new("kv").max_size(4);
//! let worker = PoolWorker::new(&config, factory_fn(|| Ok::<_, BoxError>(Vec::<String>::new())));
//!
//! let len = worker
//!     .with_resource(|store: &mut Vec<String>| {
//!         store.push("value".to_string());
//!         Ok::<_, BoxError>(store.len())
//!     })
//!     .await?;
//! # let _ = len;
//! # Ok(())
//! # }
//! ```

mod config;
pub use config::PoolConfig;

mod error;
pub use error::AcquireError;
pub use error::BoxError;
pub use error::WorkError;

mod pool;
pub use pool::factory_fn;
pub use pool::FnFactory;
pub use pool::Lease;
pub use pool::Pool;
pub use pool::PoolStats;
pub use pool::ResourceFactory;

mod worker;
pub use worker::PoolWorker;
