use crate::error::Result;

/// Supplies the worker id of this process.
///
/// Implementations must never hand the same id to two allocators that run at
/// the same time anywhere in the deployment. Ids are range-checked by the
/// allocator, not by the assigner.
pub trait WorkerIdAssigner {
    fn assign_worker_id(&self) -> Result<u64>;
}

/// Hands out a fixed, externally configured worker id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticWorkerIdAssigner {
    worker_id: u64,
}

impl StaticWorkerIdAssigner {
    pub fn new(worker_id: u64) -> Self {
        Self { worker_id }
    }
}

impl WorkerIdAssigner for StaticWorkerIdAssigner {
    fn assign_worker_id(&self) -> Result<u64> {
        Ok(self.worker_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_assigner_returns_configured_id() {
        let assigner = StaticWorkerIdAssigner::new(17);
        assert_eq!(assigner.assign_worker_id(), Ok(17));
    }
}
