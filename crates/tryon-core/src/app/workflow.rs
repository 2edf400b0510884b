//! Workflow - the try-on step machine.
//!
//! `Step` carries only the data valid in each step, so a photo-less `Select`
//! or a history-less `Customize` cannot be represented. Every action checks
//! the current step first and fails with `InvalidTransition` otherwise,
//! leaving the state untouched.
//!
//! Blocking gateway calls (fit analysis, composition, garment creation) run
//! inside `&mut self` methods. The step is only replaced once the call has
//! resolved, so dropping the future leaves the machine in the step that issued
//! the call. While a call is outstanding its operation is published on the
//! status channel: `Measure` is the step shown while analyzing, `Generate`
//! while composing. A failed or dropped call restores the issuing step.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::app::edit_history::EditHistory;
use crate::app::preview::{PreviewScheduler, PreviewState};
use crate::app::slot::OperationSlot;
use crate::app::store::{SavedLooks, SavedMeasurements};
use crate::domain::image::JPEG;
use crate::domain::{
    Catalog, CustomizationPreset, EncodedImage, FitAnalysis, GarmentCategory, GarmentId,
    GarmentItem, GatewayError, Height, LookId, MeasurementId, Operation, OutfitSelection,
    SavedLook, SavedMeasurement, StepKind, TryOnError, UserPhoto, presets_for,
};
use crate::ports::{GenerationGateway, IdGenerator};

/// Created garment names longer than this are shortened.
const MAX_GARMENT_NAME: usize = 20;

/// What the user has committed to so far: photo, height and outfit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub photo: UserPhoto,
    pub height: Height,
    pub outfit: OutfitSelection,
}

#[derive(Clone)]
pub enum Step {
    Capture,
    Height {
        photo: UserPhoto,
        /// Kept when coming back from `Select`.
        outfit: OutfitSelection,
        height: Option<Height>,
    },
    Select(Session),
    Measure {
        session: Session,
        analysis: FitAnalysis,
        saved: Option<MeasurementId>,
    },
    Customize {
        session: Session,
        history: EditHistory,
    },
    Result {
        session: Session,
        image: Arc<EncodedImage>,
        saved: Option<LookId>,
    },
}

impl Step {
    pub fn kind(&self) -> StepKind {
        match self {
            Step::Capture => StepKind::Capture,
            Step::Height { .. } => StepKind::Height,
            Step::Select(_) => StepKind::Select,
            Step::Measure { .. } => StepKind::Measure,
            Step::Customize { .. } => StepKind::Customize,
            Step::Result { .. } => StepKind::Result,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            Step::Select(session)
            | Step::Measure { session, .. }
            | Step::Customize { session, .. }
            | Step::Result { session, .. } => Some(session),
            Step::Capture | Step::Height { .. } => None,
        }
    }
}

/// Current step plus the blocking operation in flight, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowStatus {
    pub step: StepKind,
    pub pending: Option<Operation>,
}

/// An in-progress garment creation, open while in `Select`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GarmentDraft {
    pub category: GarmentCategory,
    /// The prompt `image` was generated from.
    pub prompt: String,
    pub image: Option<EncodedImage>,
    pub error: Option<String>,
}

/// A finished look ready to be written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedImage {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Restores the issuing step on the status channel unless a transition
/// already replaced it.
struct PendingCall {
    status: Arc<watch::Sender<WorkflowStatus>>,
    origin: StepKind,
    operation: Operation,
}

impl Drop for PendingCall {
    fn drop(&mut self) {
        let (origin, operation) = (self.origin, self.operation);
        self.status.send_if_modified(|s| {
            if s.pending != Some(operation) {
                return false;
            }
            *s = WorkflowStatus {
                step: origin,
                pending: None,
            };
            true
        });
    }
}

fn invalid(step: StepKind, action: &'static str) -> TryOnError {
    TryOnError::InvalidTransition { step, action }
}

/// The prompt itself, or its first 18 characters and an ellipsis when long.
fn garment_name(prompt: &str) -> String {
    if prompt.chars().count() <= MAX_GARMENT_NAME {
        prompt.to_string()
    } else {
        let head: String = prompt.chars().take(MAX_GARMENT_NAME - 2).collect();
        format!("{head}...")
    }
}

pub struct Workflow {
    gateway: Arc<dyn GenerationGateway>,
    ids: Arc<dyn IdGenerator>,
    catalog: Catalog,
    looks: SavedLooks,
    measurements: SavedMeasurements,
    preview: PreviewScheduler,
    step: Step,
    draft: Option<GarmentDraft>,
    last_error: Option<String>,
    status: Arc<watch::Sender<WorkflowStatus>>,
    analyze_slot: OperationSlot,
    compose_slot: OperationSlot,
    create_slot: OperationSlot,
    export_file_name: String,
}

impl Workflow {
    pub(crate) fn new(
        gateway: Arc<dyn GenerationGateway>,
        ids: Arc<dyn IdGenerator>,
        catalog: Catalog,
        looks: SavedLooks,
        measurements: SavedMeasurements,
        settle_delay: Duration,
        export_file_name: String,
    ) -> Self {
        let (status, _) = watch::channel(WorkflowStatus {
            step: StepKind::Capture,
            pending: None,
        });
        Self {
            preview: PreviewScheduler::new(Arc::clone(&gateway), settle_delay),
            gateway,
            ids,
            catalog,
            looks,
            measurements,
            step: Step::Capture,
            draft: None,
            last_error: None,
            status: Arc::new(status),
            analyze_slot: OperationSlot::new(Operation::Analyze),
            compose_slot: OperationSlot::new(Operation::Compose),
            create_slot: OperationSlot::new(Operation::CreateGarment),
            export_file_name,
        }
    }

    // ========================================
    // Accessors
    // ========================================

    pub fn step(&self) -> &Step {
        &self.step
    }

    pub fn step_kind(&self) -> StepKind {
        self.step.kind()
    }

    pub fn status(&self) -> WorkflowStatus {
        *self.status.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<WorkflowStatus> {
        self.status.subscribe()
    }

    pub fn preview(&self) -> PreviewState {
        self.preview.snapshot()
    }

    pub fn subscribe_preview(&self) -> watch::Receiver<PreviewState> {
        self.preview.subscribe()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn saved_looks(&self) -> &[SavedLook] {
        self.looks.items()
    }

    pub fn saved_measurements(&self) -> &[SavedMeasurement] {
        self.measurements.items()
    }

    pub fn photo(&self) -> Option<&UserPhoto> {
        match &self.step {
            Step::Capture => None,
            Step::Height { photo, .. } => Some(photo),
            step => step.session().map(|s| &s.photo),
        }
    }

    pub fn height(&self) -> Option<Height> {
        match &self.step {
            Step::Height { height, .. } => *height,
            step => step.session().map(|s| s.height),
        }
    }

    pub fn outfit(&self) -> Option<&OutfitSelection> {
        match &self.step {
            Step::Height { outfit, .. } => Some(outfit),
            step => step.session().map(|s| &s.outfit),
        }
    }

    pub fn analysis(&self) -> Option<&FitAnalysis> {
        match &self.step {
            Step::Measure { analysis, .. } => Some(analysis),
            _ => None,
        }
    }

    /// A handle onto the edit history while customizing.
    pub fn history(&self) -> Option<EditHistory> {
        match &self.step {
            Step::Customize { history, .. } => Some(history.clone()),
            _ => None,
        }
    }

    /// The history head while customizing, the final image in `Result`.
    pub fn current_image(&self) -> Option<Arc<EncodedImage>> {
        match &self.step {
            Step::Customize { history, .. } => Some(history.current()),
            Step::Result { image, .. } => Some(Arc::clone(image)),
            _ => None,
        }
    }

    pub fn draft(&self) -> Option<&GarmentDraft> {
        self.draft.as_ref()
    }

    pub fn is_measurement_saved(&self) -> bool {
        matches!(&self.step, Step::Measure { saved: Some(_), .. })
    }

    pub fn is_look_saved(&self) -> bool {
        matches!(&self.step, Step::Result { saved: Some(_), .. })
    }

    /// Canned instructions for the selected top and pants. Empty outside `Customize`.
    pub fn customization_presets(&self) -> Vec<CustomizationPreset> {
        match &self.step {
            Step::Customize { session, .. } => presets_for(&session.outfit),
            _ => Vec::new(),
        }
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    // ========================================
    // Capture / Height
    // ========================================

    pub fn capture_photo(&mut self, data_url: &str) -> Result<(), TryOnError> {
        self.require_capture("capture a photo")?;
        let photo = UserPhoto::from_data_url(data_url)?;
        self.photo_taken(photo);
        Ok(())
    }

    pub fn upload_photo(&mut self, bytes: &[u8], mime_type: &str) -> Result<(), TryOnError> {
        self.require_capture("upload a photo")?;
        let photo = UserPhoto::from_upload(bytes, mime_type)?;
        self.photo_taken(photo);
        Ok(())
    }

    fn require_capture(&self, action: &'static str) -> Result<(), TryOnError> {
        match self.step {
            Step::Capture => Ok(()),
            _ => Err(invalid(self.step.kind(), action)),
        }
    }

    fn photo_taken(&mut self, photo: UserPhoto) {
        self.set_step(Step::Height {
            photo,
            outfit: OutfitSelection::new(),
            height: None,
        });
    }

    /// Validate the two form fields, then continue as `submit_height`.
    pub fn submit_height_fields(&mut self, feet: &str, inches: &str) -> Result<(), TryOnError> {
        let kind = self.step.kind();
        if kind != StepKind::Height {
            return Err(invalid(kind, "submit a height"));
        }
        self.submit_height(Height::parse(feet, inches)?)
    }

    pub fn submit_height(&mut self, height: Height) -> Result<(), TryOnError> {
        match std::mem::replace(&mut self.step, Step::Capture) {
            Step::Height { photo, outfit, .. } => {
                self.preview.seed(&photo);
                if !outfit.is_empty() {
                    self.preview.selection_changed(&photo, &outfit);
                }
                self.set_step(Step::Select(Session {
                    photo,
                    height,
                    outfit,
                }));
                Ok(())
            }
            other => {
                self.step = other;
                Err(invalid(self.step.kind(), "submit a height"))
            }
        }
    }

    // ========================================
    // Select
    // ========================================

    /// Toggle a catalog garment. Returns whether it is now selected.
    pub fn toggle_garment(&mut self, id: GarmentId) -> Result<bool, TryOnError> {
        let kind = self.step.kind();
        let Step::Select(session) = &mut self.step else {
            return Err(invalid(kind, "toggle a garment"));
        };
        let item = self
            .catalog
            .get(id)
            .cloned()
            .ok_or(TryOnError::UnknownGarment(id))?;

        let selected = session.outfit.toggle(item);
        self.preview.selection_changed(&session.photo, &session.outfit);
        Ok(selected)
    }

    pub fn open_garment_creation(&mut self, category: GarmentCategory) -> Result<(), TryOnError> {
        let kind = self.step.kind();
        if kind != StepKind::Select {
            return Err(invalid(kind, "create a garment"));
        }
        self.draft = Some(GarmentDraft {
            category,
            prompt: String::new(),
            image: None,
            error: None,
        });
        Ok(())
    }

    pub fn set_creation_category(&mut self, category: GarmentCategory) -> Result<(), TryOnError> {
        let kind = self.step.kind();
        let draft = self
            .draft
            .as_mut()
            .ok_or(invalid(kind, "change the category of a garment draft"))?;
        draft.category = category;
        Ok(())
    }

    /// Generate an image for the open draft.
    ///
    /// A gateway failure is recorded on the draft, which stays open.
    pub async fn submit_creation_prompt(&mut self, prompt: &str) -> Result<EncodedImage, TryOnError> {
        let kind = self.step.kind();
        if kind != StepKind::Select || self.draft.is_none() {
            return Err(invalid(kind, "describe a garment"));
        }
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(TryOnError::invalid_input("describe the garment to create"));
        }

        let _slot = self.create_slot.try_acquire()?;
        let _pending = self.announce(StepKind::Select, Operation::CreateGarment);
        info!(prompt, "creating garment");
        let result = self.gateway.create_garment(prompt).await;

        let draft = self
            .draft
            .as_mut()
            .ok_or(invalid(kind, "describe a garment"))?;
        match result {
            Ok(image) => {
                draft.prompt = prompt.to_string();
                draft.image = Some(image.clone());
                draft.error = None;
                Ok(image)
            }
            Err(e) => {
                warn!(error = %e, "garment creation failed");
                draft.error = Some(e.message().to_string());
                Err(e.into())
            }
        }
    }

    /// Add the generated garment to the catalog and select it.
    pub fn use_created_garment(&mut self) -> Result<GarmentItem, TryOnError> {
        let kind = self.step.kind();
        let Step::Select(session) = &mut self.step else {
            return Err(invalid(kind, "use a created garment"));
        };
        let Some(GarmentDraft {
            category,
            prompt,
            image: Some(image),
            ..
        }) = &self.draft
        else {
            return Err(TryOnError::invalid_input("no garment has been generated yet"));
        };

        let item = GarmentItem::new(
            self.ids.generate_garment_id(),
            garment_name(prompt),
            *category,
            EncodedImage::new(image.base64.clone(), JPEG).to_data_url(),
            prompt.clone(),
        );
        info!(id = %item.id, name = %item.name, "garment created");

        self.catalog.prepend(item.clone());
        session.outfit.toggle(item.clone());
        self.preview.selection_changed(&session.photo, &session.outfit);
        self.draft = None;
        Ok(item)
    }

    pub fn cancel_garment_creation(&mut self) {
        self.draft = None;
    }

    /// Analyze fit for the current selection and move to `Measure`.
    ///
    /// On failure the error is recorded and the machine stays in `Select`.
    pub async fn proceed_to_measure(&mut self) -> Result<(), TryOnError> {
        let kind = self.step.kind();
        let Step::Select(session) = &self.step else {
            return Err(invalid(kind, "analyze fit"));
        };
        if session.outfit.is_empty() {
            return Err(TryOnError::invalid_input("select at least one garment"));
        }
        let (photo, items, height) = (session.photo.clone(), session.outfit.items(), session.height);

        let _slot = self.analyze_slot.try_acquire()?;
        let _pending = self.announce(StepKind::Measure, Operation::Analyze);
        info!(items = items.len(), "analyzing fit");
        let result = self.gateway.analyze_fit(&photo, &items, Some(&height)).await;

        match result {
            Ok(analysis) => {
                let session = self.take_session().ok_or(invalid(kind, "analyze fit"))?;
                self.leave_select();
                self.last_error = None;
                self.set_step(Step::Measure {
                    session,
                    analysis,
                    saved: None,
                });
                Ok(())
            }
            Err(e) => Err(self.gateway_failed("fit analysis", e)),
        }
    }

    // ========================================
    // Measure
    // ========================================

    /// Save the analysis once. Repeated calls return the same id until that
    /// entry is deleted.
    pub async fn save_measurement(&mut self) -> Result<MeasurementId, TryOnError> {
        let kind = self.step.kind();
        let Step::Measure {
            session,
            analysis,
            saved,
        } = &mut self.step
        else {
            return Err(invalid(kind, "save a measurement"));
        };
        if let Some(id) = *saved {
            if self.measurements.contains(id) {
                return Ok(id);
            }
        }

        let id = self.ids.generate_measurement_id();
        *saved = Some(id);
        let entry = SavedMeasurement {
            id,
            fit_analysis: analysis.clone(),
            user_image: session.photo.clone(),
            selected_outfit: session.outfit.clone(),
        };
        self.measurements.save(entry).await;
        info!(%id, "measurement saved");
        Ok(id)
    }

    /// Compose the final image, from `Measure` or straight from `Select`.
    ///
    /// Success seeds the edit history and moves to `Customize`. Failure
    /// records the error and returns to `Select`.
    pub async fn proceed_to_generate(&mut self) -> Result<(), TryOnError> {
        let kind = self.step.kind();
        let (photo, items) = match &self.step {
            Step::Select(session) | Step::Measure { session, .. } => {
                (session.photo.clone(), session.outfit.items())
            }
            _ => return Err(invalid(kind, "generate the outfit")),
        };
        if items.is_empty() {
            return Err(TryOnError::invalid_input("select at least one garment"));
        }

        let _slot = self.compose_slot.try_acquire()?;
        let _pending = self.announce(StepKind::Generate, Operation::Compose);
        info!(items = items.len(), "composing outfit");
        let result = self.gateway.compose_preview(&photo, &items).await;

        match result {
            Ok(image) => {
                let session = self.take_session().ok_or(invalid(kind, "generate the outfit"))?;
                if kind == StepKind::Select {
                    self.leave_select();
                }
                self.last_error = None;
                self.set_step(Step::Customize {
                    session,
                    history: EditHistory::new(image),
                });
                Ok(())
            }
            Err(e) => {
                let err = self.gateway_failed("composition", e);
                if kind == StepKind::Measure {
                    if let Some(session) = self.take_session() {
                        self.return_to_select(session);
                    }
                }
                Err(err)
            }
        }
    }

    // ========================================
    // Customize
    // ========================================

    pub async fn apply_edit(&mut self, instruction: &str) -> Result<Arc<EncodedImage>, TryOnError> {
        let kind = self.step.kind();
        let Step::Customize { history, .. } = &self.step else {
            return Err(invalid(kind, "edit the image"));
        };
        let history = history.clone();

        let _pending = self.announce(StepKind::Customize, Operation::Edit);
        match history.apply_edit(self.gateway.as_ref(), instruction).await {
            Ok(image) => {
                self.last_error = None;
                Ok(image)
            }
            Err(TryOnError::Gateway(e)) => Err(self.gateway_failed("edit", e)),
            Err(e) => Err(e),
        }
    }

    /// Returns false when only the original is left.
    pub fn undo(&mut self) -> Result<bool, TryOnError> {
        match &self.step {
            Step::Customize { history, .. } => Ok(history.undo()),
            step => Err(invalid(step.kind(), "undo")),
        }
    }

    pub fn reset(&mut self) -> Result<(), TryOnError> {
        match &self.step {
            Step::Customize { history, .. } => {
                history.reset();
                Ok(())
            }
            step => Err(invalid(step.kind(), "reset edits")),
        }
    }

    /// Take the current history head as the final image.
    pub fn finalize(&mut self) -> Result<(), TryOnError> {
        let kind = self.step.kind();
        let Step::Customize { history, .. } = &self.step else {
            return Err(invalid(kind, "finalize"));
        };
        if history.is_busy() {
            return Err(TryOnError::OperationInProgress(Operation::Edit));
        }
        let image = history.current();
        let session = self.take_session().ok_or(invalid(kind, "finalize"))?;
        self.set_step(Step::Result {
            session,
            image,
            saved: None,
        });
        Ok(())
    }

    // ========================================
    // Result
    // ========================================

    /// Save the final look once. Repeated calls return the same id until that
    /// entry is deleted.
    pub async fn save_look(&mut self) -> Result<LookId, TryOnError> {
        let kind = self.step.kind();
        let Step::Result {
            session,
            image,
            saved,
        } = &mut self.step
        else {
            return Err(invalid(kind, "save a look"));
        };
        if let Some(id) = *saved {
            if self.looks.contains(id) {
                return Ok(id);
            }
        }

        let id = self.ids.generate_look_id();
        *saved = Some(id);
        let look = SavedLook {
            id,
            final_image: (**image).clone(),
            original_image: session.photo.clone(),
            selected_outfit: session.outfit.clone(),
        };
        self.looks.save(look).await;
        info!(%id, "look saved");
        Ok(id)
    }

    /// The final image as raw bytes with a suggested file name.
    pub fn download(&self) -> Result<ExportedImage, TryOnError> {
        let Step::Result { image, .. } = &self.step else {
            return Err(invalid(self.step.kind(), "download"));
        };
        Ok(ExportedImage {
            file_name: self.export_file_name.clone(),
            mime_type: image.mime_type.clone(),
            bytes: image.decode()?,
        })
    }

    // ========================================
    // Anywhere
    // ========================================

    /// Drop the session and return to `Capture`.
    pub fn start_over(&mut self) {
        self.preview.reset();
        self.draft = None;
        self.last_error = None;
        self.set_step(Step::Capture);
    }

    /// Height -> Capture, Select -> Height, Measure/Customize -> Select.
    pub fn back(&mut self) -> Result<(), TryOnError> {
        let kind = self.step.kind();
        match kind {
            StepKind::Height => {
                self.start_over();
                Ok(())
            }
            StepKind::Select => {
                let session = self.take_session().ok_or(invalid(kind, "go back"))?;
                self.leave_select();
                self.set_step(Step::Height {
                    photo: session.photo,
                    outfit: session.outfit,
                    height: Some(session.height),
                });
                Ok(())
            }
            StepKind::Measure | StepKind::Customize => {
                let session = self.take_session().ok_or(invalid(kind, "go back"))?;
                self.return_to_select(session);
                Ok(())
            }
            _ => Err(invalid(kind, "go back")),
        }
    }

    /// Returns whether an entry was removed. Clears the saved flag if it
    /// pointed at this look.
    pub async fn delete_look(&mut self, id: LookId) -> bool {
        let removed = self.looks.delete(id).await;
        if let Step::Result { saved, .. } = &mut self.step {
            if *saved == Some(id) {
                *saved = None;
            }
        }
        removed
    }

    pub async fn delete_measurement(&mut self, id: MeasurementId) -> bool {
        let removed = self.measurements.delete(id).await;
        if let Step::Measure { saved, .. } = &mut self.step {
            if *saved == Some(id) {
                *saved = None;
            }
        }
        removed
    }

    // ========================================
    // Internals
    // ========================================

    fn set_step(&mut self, next: Step) {
        let from = self.step.kind();
        let to = next.kind();
        self.step = next;
        if from != to {
            info!(%from, %to, "step changed");
        }
        self.status.send_replace(WorkflowStatus {
            step: to,
            pending: None,
        });
    }

    fn announce(&self, shown: StepKind, operation: Operation) -> PendingCall {
        self.status.send_replace(WorkflowStatus {
            step: shown,
            pending: Some(operation),
        });
        PendingCall {
            status: Arc::clone(&self.status),
            origin: self.step.kind(),
            operation,
        }
    }

    /// Move the session out of the step, leaving `Capture` behind. Steps
    /// without a session are left as they were.
    fn take_session(&mut self) -> Option<Session> {
        match std::mem::replace(&mut self.step, Step::Capture) {
            Step::Select(session)
            | Step::Measure { session, .. }
            | Step::Customize { session, .. }
            | Step::Result { session, .. } => Some(session),
            other => {
                self.step = other;
                None
            }
        }
    }

    fn leave_select(&mut self) {
        self.preview.deactivate();
        self.draft = None;
    }

    /// Re-enter `Select` from a later step and bring the preview back up to date.
    fn return_to_select(&mut self, session: Session) {
        self.preview.selection_changed(&session.photo, &session.outfit);
        self.set_step(Step::Select(session));
    }

    fn gateway_failed(&mut self, what: &str, e: GatewayError) -> TryOnError {
        warn!(error = %e, "{what} failed");
        self.last_error = Some(e.message().to_string());
        e.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::builder::StudioBuilder;
    use crate::domain::image::PNG;
    use crate::impls::{GatewayCall, InMemoryKeyValueStore, ScriptedGateway};
    use crate::ports::{FixedClock, TimestampIdGenerator};
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    const PHOTO: &str = "data:image/jpeg;base64,UEhPVE8=";
    const TEE: GarmentId = GarmentId::new(1);
    const JEANS: GarmentId = GarmentId::new(3);

    fn g(name: &str) -> EncodedImage {
        EncodedImage::png(name)
    }

    fn analysis() -> FitAnalysis {
        serde_json::from_value(serde_json::json!({
            "personMeasurements": {
                "measurements": [{ "name": "Chest", "value": "38" }],
                "notes": ""
            },
            "clothingFit": [{
                "itemName": "White Tee",
                "itemType": "Top",
                "fitDescription": "Relaxed",
                "garmentMeasurements": []
            }]
        }))
        .unwrap()
    }

    struct Harness {
        gateway: Arc<ScriptedGateway>,
        store: InMemoryKeyValueStore,
        workflow: Workflow,
    }

    async fn harness() -> Harness {
        let gateway = Arc::new(ScriptedGateway::new());
        let store = InMemoryKeyValueStore::new();
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 6, 10, 8, 0, 0).unwrap());
        let workflow = StudioBuilder::new(gateway.clone())
            .store(Arc::new(store.clone()))
            .id_generator(Arc::new(TimestampIdGenerator::new(clock)))
            .build()
            .await
            .unwrap();
        Harness {
            gateway,
            store,
            workflow,
        }
    }

    /// Photo taken, 5'9", tee selected.
    async fn in_select() -> Harness {
        let mut h = harness().await;
        h.workflow.capture_photo(PHOTO).unwrap();
        h.workflow.submit_height_fields("5", "9").unwrap();
        h.workflow.toggle_garment(TEE).unwrap();
        h
    }

    async fn in_measure() -> Harness {
        let mut h = in_select().await;
        h.gateway.push_analyze(Duration::ZERO, Ok(analysis()));
        h.workflow.proceed_to_measure().await.unwrap();
        h
    }

    async fn in_result() -> Harness {
        let mut h = in_measure().await;
        h.gateway.push_compose(Duration::ZERO, Ok(g("RklOQUw=")));
        h.workflow.proceed_to_generate().await.unwrap();
        h.workflow.finalize().unwrap();
        h
    }

    #[tokio::test]
    async fn end_to_end_edit_then_undo_keeps_original_composite() {
        let mut h = harness().await;
        h.gateway.push_analyze(Duration::ZERO, Ok(analysis()));
        h.gateway.push_compose(Duration::ZERO, Ok(g("G0")));
        h.gateway.push_edit(Duration::ZERO, Ok(g("G1")));

        h.workflow.capture_photo(PHOTO).unwrap();
        h.workflow.submit_height(Height::new(5, 9).unwrap()).unwrap();
        assert!(h.workflow.toggle_garment(TEE).unwrap());

        h.workflow.proceed_to_measure().await.unwrap();
        assert_eq!(h.workflow.step_kind(), StepKind::Measure);
        assert_eq!(h.workflow.analysis(), Some(&analysis()));

        h.workflow.proceed_to_generate().await.unwrap();
        assert_eq!(h.workflow.step_kind(), StepKind::Customize);

        h.workflow.apply_edit("make it black").await.unwrap();
        assert_eq!(*h.workflow.current_image().unwrap(), g("G1"));
        assert!(h.workflow.undo().unwrap());
        assert_eq!(*h.workflow.current_image().unwrap(), g("G0"));

        h.workflow.finalize().unwrap();
        assert_eq!(h.workflow.step_kind(), StepKind::Result);
        assert_eq!(*h.workflow.current_image().unwrap(), g("G0"));
        assert_eq!(h.workflow.photo().unwrap().url, PHOTO);

        assert_eq!(
            h.gateway.calls()[..2],
            [
                GatewayCall::AnalyzeFit {
                    item_ids: vec![TEE],
                    height: Some(Height::new(5, 9).unwrap()),
                },
                GatewayCall::ComposePreview {
                    item_ids: vec![TEE]
                },
            ]
        );
    }

    #[rstest]
    #[case::typical("5", "9", true)]
    #[case::too_short("2", "5", false)]
    #[case::twelve_inches("5", "12", false)]
    #[tokio::test]
    async fn height_guard(#[case] feet: &str, #[case] inches: &str, #[case] accepted: bool) {
        let mut h = harness().await;
        h.workflow.capture_photo(PHOTO).unwrap();

        let result = h.workflow.submit_height_fields(feet, inches);

        assert_eq!(result.is_ok(), accepted);
        let expected = if accepted {
            StepKind::Select
        } else {
            StepKind::Height
        };
        assert_eq!(h.workflow.step_kind(), expected);
    }

    #[tokio::test]
    async fn select_guard_requires_one_garment() {
        let mut h = harness().await;
        h.workflow.capture_photo(PHOTO).unwrap();
        h.workflow.submit_height_fields("5", "9").unwrap();

        let err = h.workflow.proceed_to_measure().await.unwrap_err();
        assert!(matches!(err, TryOnError::InvalidInput(_)));
        assert!(h.workflow.proceed_to_generate().await.is_err());
        assert_eq!(h.workflow.step_kind(), StepKind::Select);
        assert!(h.gateway.calls().is_empty());

        h.workflow.toggle_garment(TEE).unwrap();
        h.workflow.proceed_to_measure().await.unwrap();
        assert_eq!(h.workflow.step_kind(), StepKind::Measure);
    }

    #[tokio::test]
    async fn actions_outside_their_step_leave_state_unchanged() {
        let mut h = harness().await;

        assert!(matches!(
            h.workflow.toggle_garment(TEE),
            Err(TryOnError::InvalidTransition {
                step: StepKind::Capture,
                ..
            })
        ));
        assert!(h.workflow.finalize().is_err());
        assert!(h.workflow.back().is_err());
        assert!(h.workflow.save_look().await.is_err());
        assert_eq!(h.workflow.step_kind(), StepKind::Capture);

        h.workflow.capture_photo(PHOTO).unwrap();
        assert!(h.workflow.capture_photo(PHOTO).is_err());
        assert_eq!(h.workflow.step_kind(), StepKind::Height);
    }

    #[tokio::test]
    async fn unknown_garment_is_rejected() {
        let mut h = in_select().await;
        assert_eq!(
            h.workflow.toggle_garment(GarmentId::new(999)).unwrap_err(),
            TryOnError::UnknownGarment(GarmentId::new(999))
        );
    }

    #[tokio::test]
    async fn analyze_failure_stays_in_select_with_selection() {
        let mut h = in_select().await;
        h.gateway
            .push_analyze(Duration::ZERO, Err(GatewayError::new("quota exceeded")));

        let err = h.workflow.proceed_to_measure().await.unwrap_err();

        assert_eq!(err.kind(), crate::domain::ErrorKind::Gateway);
        assert_eq!(h.workflow.step_kind(), StepKind::Select);
        assert!(h.workflow.outfit().unwrap().slot(GarmentCategory::Top).is_some());
        assert_eq!(h.workflow.last_error(), Some("quota exceeded"));
        assert_eq!(h.workflow.status().pending, None);

        h.workflow.dismiss_error();
        assert_eq!(h.workflow.last_error(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn status_shows_measure_while_analyzing() {
        let mut h = in_select().await;
        h.gateway.push_analyze(Duration::from_secs(3), Ok(analysis()));
        let rx = h.workflow.subscribe_status();

        let (result, seen) = tokio::join!(h.workflow.proceed_to_measure(), async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            *rx.borrow()
        });

        result.unwrap();
        assert_eq!(
            seen,
            WorkflowStatus {
                step: StepKind::Measure,
                pending: Some(Operation::Analyze)
            }
        );
        assert_eq!(h.workflow.status().step, StepKind::Measure);
    }

    #[tokio::test]
    async fn select_guard_is_rechecked_after_a_failed_analysis() {
        let mut h = in_select().await;
        h.gateway
            .push_analyze(Duration::ZERO, Err(GatewayError::new("quota exceeded")));
        assert!(h.workflow.proceed_to_measure().await.is_err());
        assert_eq!(h.workflow.status().step, StepKind::Select);

        assert!(!h.workflow.toggle_garment(TEE).unwrap());
        let err = h.workflow.proceed_to_measure().await.unwrap_err();

        assert!(matches!(err, TryOnError::InvalidInput(_)));
        assert_eq!(h.gateway.analyze_count(), 1);
        assert_eq!(h.workflow.step_kind(), StepKind::Select);
    }

    #[tokio::test(start_paused = true)]
    async fn start_over_cancels_a_pending_preview() {
        let mut h = in_select().await;
        tokio::time::sleep(Duration::from_millis(300)).await;

        h.workflow.start_over();
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(h.gateway.compose_count(), 0);
        assert_eq!(h.workflow.step_kind(), StepKind::Capture);
        assert!(h.workflow.preview().image.is_none());
        assert!(!h.workflow.preview().loading);
    }

    #[tokio::test]
    async fn compose_failure_from_measure_returns_to_select() {
        let mut h = in_measure().await;
        h.gateway
            .push_compose(Duration::ZERO, Err(GatewayError::new("safety block")));

        assert!(h.workflow.proceed_to_generate().await.is_err());

        assert_eq!(h.workflow.step_kind(), StepKind::Select);
        assert_eq!(h.workflow.outfit().unwrap().count(), 1);
        assert_eq!(h.workflow.last_error(), Some("safety block"));
        assert_eq!(
            h.workflow.status(),
            WorkflowStatus {
                step: StepKind::Select,
                pending: None
            }
        );
    }

    #[tokio::test]
    async fn generate_directly_from_select() {
        let mut h = in_select().await;
        h.workflow.proceed_to_generate().await.unwrap();
        assert_eq!(h.workflow.step_kind(), StepKind::Customize);
        assert_eq!(h.gateway.analyze_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn status_shows_generate_while_composing() {
        let mut h = in_measure().await;
        h.gateway.push_compose(Duration::from_secs(3), Ok(g("G0")));
        let rx = h.workflow.subscribe_status();

        let (result, seen) = tokio::join!(h.workflow.proceed_to_generate(), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            *rx.borrow()
        });

        result.unwrap();
        assert_eq!(
            seen,
            WorkflowStatus {
                step: StepKind::Generate,
                pending: Some(Operation::Compose)
            }
        );
        assert_eq!(h.workflow.status().step, StepKind::Customize);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_compose_leaves_machine_in_measure() {
        let mut h = in_measure().await;
        h.gateway.push_compose(Duration::from_secs(10), Ok(g("G0")));

        let timed_out =
            tokio::time::timeout(Duration::from_secs(1), h.workflow.proceed_to_generate()).await;

        assert!(timed_out.is_err());
        assert_eq!(h.workflow.step_kind(), StepKind::Measure);
        assert_eq!(
            h.workflow.status(),
            WorkflowStatus {
                step: StepKind::Measure,
                pending: None
            }
        );
        // the slot was released with the dropped future
        h.workflow.proceed_to_generate().await.unwrap();
        assert_eq!(h.workflow.step_kind(), StepKind::Customize);
    }

    #[tokio::test]
    async fn saving_a_measurement_twice_stores_one_entry() {
        let mut h = in_measure().await;

        let first = h.workflow.save_measurement().await.unwrap();
        let second = h.workflow.save_measurement().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(h.workflow.saved_measurements().len(), 1);
        assert!(h.workflow.is_measurement_saved());
    }

    #[tokio::test]
    async fn save_after_delete_creates_a_new_look() {
        let mut h = in_result().await;

        let first = h.workflow.save_look().await.unwrap();
        assert_eq!(h.workflow.save_look().await.unwrap(), first);
        assert_eq!(h.workflow.saved_looks().len(), 1);

        assert!(h.workflow.delete_look(first).await);
        assert!(!h.workflow.is_look_saved());
        assert!(h.workflow.saved_looks().is_empty());

        let second = h.workflow.save_look().await.unwrap();
        assert_ne!(first, second);
        assert_eq!(h.workflow.saved_looks().len(), 1);
        assert!(h.store.get("looks").unwrap().contains(&second.value().to_string()));
    }

    #[tokio::test]
    async fn deleting_a_measurement_clears_the_flag() {
        let mut h = in_measure().await;
        let id = h.workflow.save_measurement().await.unwrap();

        assert!(h.workflow.delete_measurement(id).await);
        assert!(!h.workflow.is_measurement_saved());
        assert_ne!(h.workflow.save_measurement().await.unwrap(), id);
    }

    #[tokio::test]
    async fn start_over_from_result_clears_everything() {
        let mut h = in_result().await;
        h.workflow.save_look().await.unwrap();

        h.workflow.start_over();

        assert_eq!(h.workflow.step_kind(), StepKind::Capture);
        assert!(h.workflow.photo().is_none());
        assert!(h.workflow.outfit().is_none());
        assert!(h.workflow.current_image().is_none());
        assert!(h.workflow.preview().image.is_none());
        // saved collections outlive the session
        assert_eq!(h.workflow.saved_looks().len(), 1);
    }

    #[tokio::test]
    async fn download_exports_final_bytes() {
        let h = in_result().await;
        let export = h.workflow.download().unwrap();
        assert_eq!(export.file_name, "look.png");
        assert_eq!(export.mime_type, PNG);
        assert_eq!(export.bytes, b"FINAL");
    }

    #[tokio::test]
    async fn back_navigation_keeps_photo_and_selection() {
        let mut h = in_measure().await;

        h.workflow.back().unwrap();
        assert_eq!(h.workflow.step_kind(), StepKind::Select);

        h.workflow.back().unwrap();
        assert_eq!(h.workflow.step_kind(), StepKind::Height);
        assert_eq!(h.workflow.height(), Some(Height::new(5, 9).unwrap()));
        assert_eq!(h.workflow.outfit().unwrap().count(), 1);

        h.workflow.submit_height_fields("6", "0").unwrap();
        assert_eq!(h.workflow.outfit().unwrap().count(), 1);

        h.workflow.back().unwrap();
        h.workflow.back().unwrap();
        assert_eq!(h.workflow.step_kind(), StepKind::Capture);
    }

    #[tokio::test]
    async fn customize_back_returns_to_select_with_selection() {
        let mut h = in_select().await;
        h.workflow.toggle_garment(JEANS).unwrap();
        h.workflow.proceed_to_generate().await.unwrap();

        h.workflow.back().unwrap();

        assert_eq!(h.workflow.step_kind(), StepKind::Select);
        assert_eq!(h.workflow.outfit().unwrap().count(), 2);
    }

    #[tokio::test]
    async fn presets_follow_the_selection() {
        let mut h = in_select().await;
        assert!(h.workflow.customization_presets().is_empty());
        h.workflow.proceed_to_generate().await.unwrap();

        let presets = h.workflow.customization_presets();
        assert_eq!(presets.len(), 10);

        h.workflow
            .apply_edit(&presets[5].instruction)
            .await
            .unwrap();
        assert_eq!(
            h.gateway.calls().last(),
            Some(&GatewayCall::ApplyEdit {
                instruction: "Make the top short-sleeved".to_string()
            })
        );
    }

    #[tokio::test]
    async fn edit_failure_is_surfaced_and_history_unchanged() {
        let mut h = in_select().await;
        h.workflow.proceed_to_generate().await.unwrap();
        h.gateway
            .push_edit(Duration::ZERO, Err(GatewayError::new("cannot edit")));

        assert!(h.workflow.apply_edit("make it black").await.is_err());
        assert_eq!(h.workflow.history().unwrap().len(), 1);
        assert_eq!(h.workflow.last_error(), Some("cannot edit"));
        assert_eq!(h.workflow.step_kind(), StepKind::Customize);
    }

    #[tokio::test]
    async fn created_garment_is_prepended_and_selected() {
        let mut h = in_select().await;
        let before = h.workflow.catalog().len();

        h.workflow
            .open_garment_creation(GarmentCategory::Top)
            .unwrap();
        h.workflow
            .set_creation_category(GarmentCategory::Accessory)
            .unwrap();
        assert!(matches!(
            h.workflow.submit_creation_prompt("  ").await,
            Err(TryOnError::InvalidInput(_))
        ));
        assert!(h.workflow.use_created_garment().is_err());

        h.workflow
            .submit_creation_prompt("A red wool scarf with tassels")
            .await
            .unwrap();
        let item = h.workflow.use_created_garment().unwrap();

        assert_eq!(item.name, "A red wool scarf w...");
        assert_eq!(item.description, "A red wool scarf with tassels");
        assert_eq!(item.category, GarmentCategory::Accessory);
        assert!(item.image_url.starts_with("data:image/jpeg;base64,"));
        assert_eq!(h.workflow.catalog().len(), before + 1);
        assert_eq!(h.workflow.catalog().items()[0], item);
        assert_eq!(
            h.workflow.outfit().unwrap().slot(GarmentCategory::Accessory),
            Some(&item)
        );
        assert!(h.workflow.draft().is_none());
    }

    #[tokio::test]
    async fn garment_creation_failure_keeps_the_draft_open() {
        let mut h = in_select().await;
        h.gateway
            .push_create(Duration::ZERO, Err(GatewayError::new("blocked prompt")));
        h.workflow
            .open_garment_creation(GarmentCategory::Shoes)
            .unwrap();

        assert!(h.workflow.submit_creation_prompt("boots").await.is_err());

        let draft = h.workflow.draft().unwrap();
        assert_eq!(draft.error.as_deref(), Some("blocked prompt"));
        assert!(draft.image.is_none());
    }

    #[tokio::test]
    async fn leaving_select_discards_the_draft() {
        let mut h = in_select().await;
        h.workflow
            .open_garment_creation(GarmentCategory::Top)
            .unwrap();
        h.workflow.back().unwrap();
        assert!(h.workflow.draft().is_none());
    }

    #[rstest]
    #[case::short("Red scarf", "Red scarf")]
    #[case::exactly_twenty("abcdefghijklmnopqrst", "abcdefghijklmnopqrst")]
    #[case::long("abcdefghijklmnopqrstu", "abcdefghijklmnopqr...")]
    fn created_garment_names(#[case] prompt: &str, #[case] expected: &str) {
        assert_eq!(garment_name(prompt), expected);
    }
}
