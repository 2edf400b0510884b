//! Errors and their operational classification.

use thiserror::Error;

use super::ids::GarmentId;
use super::step::{Operation, StepKind};

/// ErrorKind classifies a failure by how the engine reacts to it.
///
/// - Validation: reported at the point of entry, state never changes.
/// - Gateway: surfaced as a dismissible message; the machine falls back to the
///   nearest prior interactive step.
/// - Persistence: degraded (empty on read, fire-and-forget on write).
/// - Internal: misuse of the engine (wrong step, busy slot, stale result).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Gateway,
    Persistence,
    Internal,
}

/// Failure reported by the generation service.
///
/// The service gives no structured code, only a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct GatewayError {
    message: String,
}

impl GatewayError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TryOnError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("cannot {action} during the {step} step")]
    InvalidTransition { step: StepKind, action: &'static str },

    #[error("{0} already in progress")]
    OperationInProgress(Operation),

    #[error("edit result discarded: history changed while the edit was running")]
    Superseded,

    #[error("unknown garment {0}")]
    UnknownGarment(GarmentId),

    #[error("generation failed: {0}")]
    Gateway(#[from] GatewayError),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("config error: {0}")]
    Config(String),
}

impl TryOnError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        TryOnError::InvalidInput(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TryOnError::InvalidInput(_) | TryOnError::UnknownGarment(_) => ErrorKind::Validation,
            TryOnError::Gateway(_) => ErrorKind::Gateway,
            TryOnError::Storage(_) => ErrorKind::Persistence,
            TryOnError::InvalidTransition { .. }
            | TryOnError::OperationInProgress(_)
            | TryOnError::Superseded
            | TryOnError::Config(_) => ErrorKind::Internal,
        }
    }
}
