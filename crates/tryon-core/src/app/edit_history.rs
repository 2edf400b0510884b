//! EditHistory - the ordered image versions produced during customization.
//!
//! Index 0 is the original composite and is never removed; the last element
//! is the current image. Versions are shared `Arc`s, so snapshots are cheap.
//!
//! Only one edit may be in flight. Undo and reset stay available while it
//! runs; they bump a revision counter, and an edit whose starting revision no
//! longer matches is discarded on arrival instead of being stacked on a
//! different head.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use crate::app::slot::OperationSlot;
use crate::domain::{EncodedImage, Operation, TryOnError};
use crate::ports::GenerationGateway;

struct Versions {
    images: Vec<Arc<EncodedImage>>,
    revision: u64,
}

/// Cloning yields another handle onto the same history.
#[derive(Clone)]
pub struct EditHistory {
    versions: Arc<Mutex<Versions>>,
    slot: OperationSlot,
}

impl EditHistory {
    pub fn new(original: EncodedImage) -> Self {
        Self {
            versions: Arc::new(Mutex::new(Versions {
                images: vec![Arc::new(original)],
                revision: 0,
            })),
            slot: OperationSlot::new(Operation::Edit),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Versions> {
        self.versions.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn current(&self) -> Arc<EncodedImage> {
        let versions = self.lock();
        Arc::clone(&versions.images[versions.images.len() - 1])
    }

    pub fn original(&self) -> Arc<EncodedImage> {
        Arc::clone(&self.lock().images[0])
    }

    pub fn len(&self) -> usize {
        self.lock().images.len()
    }

    /// Always false: the original is never removed.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn can_undo(&self) -> bool {
        self.len() > 1
    }

    pub fn is_busy(&self) -> bool {
        self.slot.is_busy()
    }

    /// Send the current image and `instruction` to the gateway and append the result.
    ///
    /// On failure the history is unchanged. Fails fast with
    /// `OperationInProgress` while another edit runs, and with `Superseded`
    /// when undo/reset happened before the result arrived.
    pub async fn apply_edit(
        &self,
        gateway: &dyn GenerationGateway,
        instruction: &str,
    ) -> Result<Arc<EncodedImage>, TryOnError> {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(TryOnError::invalid_input("edit instruction is empty"));
        }
        let _guard = self.slot.try_acquire()?;

        let (head, revision) = {
            let versions = self.lock();
            (
                Arc::clone(&versions.images[versions.images.len() - 1]),
                versions.revision,
            )
        };
        debug!(revision, instruction, "applying edit");

        let edited = gateway.apply_edit(&head, instruction).await?;

        let mut versions = self.lock();
        if versions.revision != revision {
            debug!(
                started = revision,
                now = versions.revision,
                "history changed during edit, discarding result"
            );
            return Err(TryOnError::Superseded);
        }
        let edited = Arc::new(edited);
        versions.images.push(Arc::clone(&edited));
        versions.revision += 1;
        info!(versions = versions.images.len(), "edit applied");
        Ok(edited)
    }

    /// Drop the newest version. No-op (returns false) at the original.
    pub fn undo(&self) -> bool {
        let mut versions = self.lock();
        if versions.images.len() <= 1 {
            return false;
        }
        versions.images.pop();
        versions.revision += 1;
        true
    }

    /// Back to the original only.
    pub fn reset(&self) {
        let mut versions = self.lock();
        versions.images.truncate(1);
        versions.revision += 1;
    }
}
