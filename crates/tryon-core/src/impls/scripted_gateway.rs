//! ScriptedGateway - an in-process `GenerationGateway` for tests and offline demos.
//!
//! Responses are queued per operation, each with an optional latency. When a
//! queue is empty the gateway answers with a deterministic result derived
//! from its inputs, so unscripted calls still succeed. Every call is logged.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::image::{JPEG, PNG};
use crate::domain::{
    EncodedImage, FitAnalysis, GarmentFit, GarmentId, GarmentItem, GatewayError, Height,
    Measurement, PersonMeasurements, UserPhoto,
};
use crate::ports::GenerationGateway;

/// One recorded gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    ComposePreview { item_ids: Vec<GarmentId> },
    AnalyzeFit { item_ids: Vec<GarmentId>, height: Option<Height> },
    ApplyEdit { instruction: String },
    CreateGarment { prompt: String },
}

struct Scripted<T> {
    latency: Duration,
    result: Result<T, GatewayError>,
}

#[derive(Default)]
struct Script {
    compose: VecDeque<Scripted<EncodedImage>>,
    analyze: VecDeque<Scripted<FitAnalysis>>,
    edit: VecDeque<Scripted<EncodedImage>>,
    create: VecDeque<Scripted<EncodedImage>>,
    calls: Vec<GatewayCall>,
}

#[derive(Default)]
pub struct ScriptedGateway {
    script: Mutex<Script>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_compose(&self, latency: Duration, result: Result<EncodedImage, GatewayError>) {
        self.with_script(|s| s.compose.push_back(Scripted { latency, result }));
    }

    pub fn push_analyze(&self, latency: Duration, result: Result<FitAnalysis, GatewayError>) {
        self.with_script(|s| s.analyze.push_back(Scripted { latency, result }));
    }

    pub fn push_edit(&self, latency: Duration, result: Result<EncodedImage, GatewayError>) {
        self.with_script(|s| s.edit.push_back(Scripted { latency, result }));
    }

    pub fn push_create(&self, latency: Duration, result: Result<EncodedImage, GatewayError>) {
        self.with_script(|s| s.create.push_back(Scripted { latency, result }));
    }

    /// All calls so far, oldest first.
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.with_script(|s| s.calls.clone())
    }

    pub fn compose_count(&self) -> usize {
        self.count(|c| matches!(c, GatewayCall::ComposePreview { .. }))
    }

    pub fn analyze_count(&self) -> usize {
        self.count(|c| matches!(c, GatewayCall::AnalyzeFit { .. }))
    }

    pub fn edit_count(&self) -> usize {
        self.count(|c| matches!(c, GatewayCall::ApplyEdit { .. }))
    }

    pub fn create_count(&self) -> usize {
        self.count(|c| matches!(c, GatewayCall::CreateGarment { .. }))
    }

    fn count(&self, pred: impl Fn(&GatewayCall) -> bool) -> usize {
        self.with_script(|s| s.calls.iter().filter(|&c| pred(c)).count())
    }

    fn with_script<R>(&self, f: impl FnOnce(&mut Script) -> R) -> R {
        let mut script = self.script.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut script)
    }
}

async fn play<T>(
    scripted: Option<Scripted<T>>,
    fallback: impl FnOnce() -> T,
) -> Result<T, GatewayError> {
    match scripted {
        Some(Scripted { latency, result }) => {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            result
        }
        None => Ok(fallback()),
    }
}

fn ids(items: &[GarmentItem]) -> Vec<GarmentId> {
    items.iter().map(|item| item.id).collect()
}

/// `composite:<id>,<id>` as a PNG payload.
pub fn fallback_composite(items: &[GarmentItem]) -> EncodedImage {
    let ids = items
        .iter()
        .map(|item| item.id.value().to_string())
        .collect::<Vec<_>>()
        .join(",");
    EncodedImage::from_bytes(format!("composite:{ids}").as_bytes(), PNG)
}

fn fallback_analysis(items: &[GarmentItem], height: Option<&Height>) -> FitAnalysis {
    let mut measurements = Vec::new();
    if let Some(height) = height {
        measurements.push(Measurement::new("Height", height.total_inches().to_string()));
    }
    FitAnalysis {
        person_measurements: PersonMeasurements {
            measurements,
            notes: String::new(),
        },
        clothing_fit: items
            .iter()
            .map(|item| GarmentFit {
                item_name: item.name.clone(),
                item_type: item.category,
                fit_description: "True to size".to_string(),
                garment_measurements: Vec::new(),
            })
            .collect(),
    }
}

fn fallback_edit(image: &EncodedImage, instruction: &str) -> EncodedImage {
    let mut bytes = image
        .decode()
        .unwrap_or_else(|_| image.base64.clone().into_bytes());
    bytes.extend_from_slice(format!(" | {instruction}").as_bytes());
    EncodedImage::from_bytes(&bytes, PNG)
}

#[async_trait]
impl GenerationGateway for ScriptedGateway {
    async fn compose_preview(
        &self,
        _photo: &UserPhoto,
        items: &[GarmentItem],
    ) -> Result<EncodedImage, GatewayError> {
        let next = self.with_script(|s| {
            s.calls.push(GatewayCall::ComposePreview { item_ids: ids(items) });
            s.compose.pop_front()
        });
        play(next, || fallback_composite(items)).await
    }

    async fn analyze_fit(
        &self,
        _photo: &UserPhoto,
        items: &[GarmentItem],
        height: Option<&Height>,
    ) -> Result<FitAnalysis, GatewayError> {
        let next = self.with_script(|s| {
            s.calls.push(GatewayCall::AnalyzeFit {
                item_ids: ids(items),
                height: height.copied(),
            });
            s.analyze.pop_front()
        });
        play(next, || fallback_analysis(items, height)).await
    }

    async fn apply_edit(
        &self,
        image: &EncodedImage,
        instruction: &str,
    ) -> Result<EncodedImage, GatewayError> {
        let next = self.with_script(|s| {
            s.calls.push(GatewayCall::ApplyEdit {
                instruction: instruction.to_string(),
            });
            s.edit.pop_front()
        });
        play(next, || fallback_edit(image, instruction)).await
    }

    async fn create_garment(&self, prompt: &str) -> Result<EncodedImage, GatewayError> {
        let next = self.with_script(|s| {
            s.calls.push(GatewayCall::CreateGarment {
                prompt: prompt.to_string(),
            });
            s.create.pop_front()
        });
        play(next, || {
            EncodedImage::from_bytes(format!("garment:{prompt}").as_bytes(), JPEG)
        })
        .await
    }
}
