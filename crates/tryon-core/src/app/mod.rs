//! App - the engine, built from the ports.
//!
//! - **StudioBuilder**: wiring and session bootstrap
//! - **Workflow**: the step machine and every user-facing action
//! - **PreviewScheduler**: debounced live preview during selection
//! - **EditHistory**: versions produced while customizing
//! - **ArtifactStore** / **SavedCollection**: saved looks and measurements

pub mod builder;
pub mod edit_history;
pub mod preview;
pub mod slot;
pub mod store;
pub mod workflow;

pub use self::builder::StudioBuilder;
pub use self::edit_history::EditHistory;
pub use self::preview::{PreviewImage, PreviewScheduler, PreviewState};
pub use self::slot::{OperationSlot, SlotGuard};
pub use self::store::{ArtifactStore, SavedCollection, SavedLooks, SavedMeasurements};
pub use self::workflow::{ExportedImage, GarmentDraft, Session, Step, Workflow, WorkflowStatus};
