//! Single-occupancy guards, one per operation class.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::domain::{Operation, TryOnError};

/// At most one holder at a time. A second `try_acquire` while held fails fast.
#[derive(Debug, Clone)]
pub struct OperationSlot {
    operation: Operation,
    busy: Arc<AtomicBool>,
}

/// Releases the slot on drop, including when the owning future is dropped.
#[derive(Debug)]
pub struct SlotGuard {
    busy: Arc<AtomicBool>,
}

impl OperationSlot {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn try_acquire(&self) -> Result<SlotGuard, TryOnError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| TryOnError::OperationInProgress(self.operation))?;
        Ok(SlotGuard {
            busy: Arc::clone(&self.busy),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
