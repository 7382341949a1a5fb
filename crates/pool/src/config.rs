use serde::Deserialize;

/// Settings of one resource pool.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Name used in logs and errors, for example the database file.
    pub name: String,
    /// Most resources handed out at the same time.
    pub max_size: usize,
    /// Acquire attempts made by [`PoolWorker`](crate::PoolWorker) before it
    /// gives up with [`WorkError::NoConnectionsInPool`](crate::WorkError::NoConnectionsInPool).
    pub max_attempts: usize,
}

impl PoolConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { name: "pool".into(), max_size: 64, max_attempts: 16 }
    }
}
