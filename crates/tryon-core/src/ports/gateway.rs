//! GenerationGateway port - the remote image/text generation service.
//!
//! Every engine operation that needs the model goes through this trait:
//! preview composition, fit analysis, conversational edits and garment
//! creation. Implementations report failures as a `GatewayError` carrying the
//! service's human-readable message.
//!
//! # Implementations
//! - `GeminiGateway`: HTTP client for the hosted model
//! - `ScriptedGateway`: queued responses and a call log, for tests and demos

use async_trait::async_trait;

use crate::domain::{EncodedImage, FitAnalysis, GarmentItem, GatewayError, Height, UserPhoto};

#[async_trait]
pub trait GenerationGateway: Send + Sync {
    /// Dress the person in `photo` in `items`. Returns a PNG.
    ///
    /// `items` is never empty; callers short-circuit the empty selection.
    async fn compose_preview(
        &self,
        photo: &UserPhoto,
        items: &[GarmentItem],
    ) -> Result<EncodedImage, GatewayError>;

    /// Estimate body measurements and describe how each item fits.
    async fn analyze_fit(
        &self,
        photo: &UserPhoto,
        items: &[GarmentItem],
        height: Option<&Height>,
    ) -> Result<FitAnalysis, GatewayError>;

    /// Apply a free-text instruction to `image`. Returns a PNG.
    async fn apply_edit(
        &self,
        image: &EncodedImage,
        instruction: &str,
    ) -> Result<EncodedImage, GatewayError>;

    /// Render a garment from a description. Returns a JPEG.
    async fn create_garment(&self, prompt: &str) -> Result<EncodedImage, GatewayError>;
}
