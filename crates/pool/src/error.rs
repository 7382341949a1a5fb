use std::error::Error;
use thiserror::Error;

pub type BoxError = Box<dyn Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum AcquireError {
    #[error("pool {pool} is busy, all {max_size} resources are in use")]
    Busy { pool: String, max_size: usize },

    #[error("can't create resource for pool {pool}: {source}")]
    Create { pool: String, source: BoxError },
}

/// Outcome of a pooled action that did not produce a value.
#[derive(Error, Debug)]
pub enum WorkError {
    #[error("no free resource in pool {pool} after {attempts} attempts")]
    NoConnectionsInPool { pool: String, attempts: usize },

    #[error("can't create resource for pool {pool}: {source}")]
    Create { pool: String, source: BoxError },

    #[error("pooled action failed: {source}")]
    Action { source: BoxError },

    #[error("pooled action panicked: {message}")]
    Panicked { message: String },

    #[error("pooled action was canceled")]
    Canceled,
}

impl WorkError {
    pub fn is_pool_busy(&self) -> bool {
        matches!(self, Self::NoConnectionsInPool { .. })
    }
}

impl From<AcquireError> for WorkError {
    fn from(e: AcquireError) -> Self {
        match e {
            AcquireError::Busy { pool, .. } => Self::NoConnectionsInPool { pool, attempts: 1 },
            AcquireError::Create { pool, source } => Self::Create { pool, source },
        }
    }
}
