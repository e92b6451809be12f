use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{OperationKind, WorkflowError};

/// Marks one request of a kind as pending; dropping it clears the mark.
pub(crate) struct InFlight<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlight<'a> {
    pub(crate) fn try_acquire(flag: &'a AtomicBool, kind: OperationKind) -> Result<Self, WorkflowError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self { flag })
            .map_err(|_| WorkflowError::InFlight(kind))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
