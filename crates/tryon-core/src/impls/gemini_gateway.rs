//! GeminiGateway - `GenerationGateway` over the Generative Language REST API.
//!
//! Image operations go to the image model and take back the first inline
//! image of the first candidate. Fit analysis goes to the text model in JSON
//! mode. Every failure (transport, status, shape) becomes a `GatewayError`
//! and is logged at `error`.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, error};

use crate::config::GatewayConfig;
use crate::domain::image::{JPEG, PNG};
use crate::domain::{
    EncodedImage, FitAnalysis, GarmentItem, GatewayError, Height, TryOnError, UserPhoto,
};
use crate::ports::GenerationGateway;

const MAX_ERROR_BODY: usize = 1024;

pub struct GeminiGateway {
    client: Client,
    config: GatewayConfig,
    api_key: String,
}

impl GeminiGateway {
    pub fn new(config: GatewayConfig, api_key: impl Into<String>) -> Result<Self, TryOnError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| TryOnError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            config,
            api_key: api_key.into(),
        })
    }

    /// Read the API key from the environment variable named in `config`.
    pub fn from_env(config: GatewayConfig) -> Result<Self, TryOnError> {
        let api_key = config.api_key()?;
        Self::new(config, api_key)
    }

    async fn generate(&self, model: &str, body: Value) -> Result<Value, GatewayError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        );
        debug!(model, "calling generation service");

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let msg = if e.is_timeout() {
                    format!(
                        "request to {model} timed out after {}s",
                        self.config.timeout_secs
                    )
                } else {
                    format!("request to {model} failed: {e}")
                };
                error!("{}", msg);
                GatewayError::new(msg)
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            let msg = format!("failed to read response from {model}: {e}");
            error!("{}", msg);
            GatewayError::new(msg)
        })?;

        if !status.is_success() {
            let msg = format!("{model} returned {status}: {}", service_error_message(&text));
            error!("{}", msg);
            return Err(GatewayError::new(msg));
        }

        serde_json::from_str(&text).map_err(|e| {
            let msg = format!("malformed response from {model}: {e}");
            error!("{}", msg);
            GatewayError::new(msg)
        })
    }

    async fn generate_image(&self, parts: Vec<Value>) -> Result<EncodedImage, GatewayError> {
        let body = json!({
            "contents": [{ "parts": parts }],
            "generationConfig": { "responseModalities": ["IMAGE", "TEXT"] },
        });
        let response = self.generate(&self.config.image_model, body).await?;
        first_inline_image(&response).inspect_err(|e| error!("{}", e))
    }
}

#[async_trait]
impl GenerationGateway for GeminiGateway {
    async fn compose_preview(
        &self,
        photo: &UserPhoto,
        items: &[GarmentItem],
    ) -> Result<EncodedImage, GatewayError> {
        let mut parts = vec![inline_part(&photo.image)];
        parts.extend(items.iter().filter_map(garment_image_part));
        parts.push(json!({ "text": compose_prompt(items) }));
        self.generate_image(parts).await
    }

    async fn analyze_fit(
        &self,
        photo: &UserPhoto,
        items: &[GarmentItem],
        height: Option<&Height>,
    ) -> Result<FitAnalysis, GatewayError> {
        let body = json!({
            "contents": [{
                "parts": [
                    inline_part(&photo.image),
                    { "text": analysis_prompt(items, height) },
                ]
            }],
            "generationConfig": { "responseMimeType": "application/json" },
        });
        let response = self.generate(&self.config.text_model, body).await?;
        let text = first_text(&response).inspect_err(|e| error!("{}", e))?;
        parse_fit_analysis(&text).inspect_err(|e| error!("{}", e))
    }

    async fn apply_edit(
        &self,
        image: &EncodedImage,
        instruction: &str,
    ) -> Result<EncodedImage, GatewayError> {
        let prompt = format!(
            "Edit this photo: {instruction}. Keep the person, pose, face and background \
             unchanged. Return only the edited image."
        );
        self.generate_image(vec![inline_part(image), json!({ "text": prompt })])
            .await
    }

    async fn create_garment(&self, prompt: &str) -> Result<EncodedImage, GatewayError> {
        let prompt = format!(
            "A product photo of a single clothing item on a plain white background, \
             no person: {prompt}"
        );
        let image = self.generate_image(vec![json!({ "text": prompt })]).await?;
        // Created garments are stored as JPEG data URLs regardless of what came back.
        Ok(EncodedImage::new(image.base64, JPEG))
    }
}

fn inline_part(image: &EncodedImage) -> Value {
    json!({
        "inlineData": { "mimeType": image.mime_type, "data": image.base64 }
    })
}

/// Only generated garments carry their pixels; catalog items are described in text.
fn garment_image_part(item: &GarmentItem) -> Option<Value> {
    EncodedImage::from_data_url(&item.image_url)
        .ok()
        .map(|image| inline_part(&image))
}

fn describe_items(items: &[GarmentItem]) -> String {
    items
        .iter()
        .map(|item| format!("- {} ({}): {}", item.name, item.category, item.description))
        .collect::<Vec<_>>()
        .join("\n")
}

fn compose_prompt(items: &[GarmentItem]) -> String {
    format!(
        "Dress the person in the first image in the following garments, replacing what \
         they wear in those categories. Keep their face, body shape, pose and the \
         background unchanged. Return a single photorealistic image.\n{}",
        describe_items(items)
    )
}

fn analysis_prompt(items: &[GarmentItem], height: Option<&Height>) -> String {
    let height = height
        .map(|h| format!("The person is {h} tall. "))
        .unwrap_or_default();
    format!(
        "{height}Estimate this person's body measurements in inches and describe how each \
         garment below would fit them. Respond with JSON of the form \
         {{\"personMeasurements\": {{\"measurements\": [{{\"name\": string, \"value\": string}}], \
         \"notes\": string}}, \"clothingFit\": [{{\"itemName\": string, \"itemType\": \
         \"Top\"|\"Pants\"|\"Shoes\"|\"Accessory\", \"fitDescription\": string, \
         \"garmentMeasurements\": [{{\"name\": string, \"value\": string}}]}}]}}.\n{}",
        describe_items(items)
    )
}

fn candidate_parts(response: &Value) -> Result<&Vec<Value>, GatewayError> {
    response["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| GatewayError::new("response contained no candidates"))
}

fn first_inline_image(response: &Value) -> Result<EncodedImage, GatewayError> {
    candidate_parts(response)?
        .iter()
        .find_map(|part| {
            let inline = &part["inlineData"];
            let data = inline["data"].as_str()?;
            let mime = inline["mimeType"].as_str().unwrap_or(PNG);
            Some(EncodedImage::new(data, mime))
        })
        .ok_or_else(|| GatewayError::new("response contained no image"))
}

fn first_text(response: &Value) -> Result<String, GatewayError> {
    let text: String = candidate_parts(response)?
        .iter()
        .filter_map(|part| part["text"].as_str())
        .collect();
    if text.trim().is_empty() {
        return Err(GatewayError::new("response contained no text"));
    }
    Ok(text)
}

fn parse_fit_analysis(text: &str) -> Result<FitAnalysis, GatewayError> {
    serde_json::from_str(&strip_markdown_json(text))
        .map_err(|e| GatewayError::new(format!("fit analysis was not valid JSON: {e}")))
}

/// Strip a ```json ... ``` fence if the model wrapped its answer in one.
fn strip_markdown_json(text: &str) -> String {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body).trim_end();
    body.strip_suffix("```").unwrap_or(body).trim().to_string()
}

/// The service's own message when the body is its error envelope, else the
/// body truncated.
fn service_error_message(body: &str) -> String {
    if let Some(message) = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
    {
        return message;
    }
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GarmentCategory, GarmentId};
    use rstest::rstest;

    #[rstest]
    #[case::plain("{\"a\":1}", "{\"a\":1}")]
    #[case::fenced("```json\n{\"a\":1}\n```", "{\"a\":1}")]
    #[case::bare_fence("```\n{\"a\":1}\n```", "{\"a\":1}")]
    #[case::unterminated("```json\n{\"a\":1}", "{\"a\":1}")]
    fn strips_markdown_fences(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(strip_markdown_json(input), expected);
    }

    #[test]
    fn takes_first_inline_image_of_first_candidate() {
        let response = json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "here you go" },
                    { "inlineData": { "mimeType": "image/png", "data": "R0" } },
                    { "inlineData": { "mimeType": "image/png", "data": "R1" } },
                ]}
            }]
        });
        assert_eq!(first_inline_image(&response).unwrap(), EncodedImage::png("R0"));
    }

    #[test]
    fn text_only_response_is_an_error() {
        let response = json!({
            "candidates": [{ "content": { "parts": [{ "text": "I can't do that" }] } }]
        });
        let err = first_inline_image(&response).unwrap_err();
        assert_eq!(err.message(), "response contained no image");
        assert!(first_inline_image(&json!({})).is_err());
    }

    #[test]
    fn parses_fenced_fit_analysis() {
        let text = r#"```json
{
  "personMeasurements": {
    "measurements": [{ "name": "Chest", "value": "38" }],
    "notes": "athletic build"
  },
  "clothingFit": [{
    "itemName": "Tee",
    "itemType": "Top",
    "fitDescription": "relaxed",
    "garmentMeasurements": [{ "name": "Length", "value": "28" }]
  }]
}
```"#;
        let analysis = parse_fit_analysis(text).unwrap();
        assert_eq!(analysis.person_measurements.measurements[0].name, "Chest");
        assert_eq!(analysis.clothing_fit[0].item_type, GarmentCategory::Top);
    }

    #[test]
    fn invalid_analysis_json_is_a_gateway_error() {
        assert!(parse_fit_analysis("not json").is_err());
    }

    #[test]
    fn error_envelope_message_is_extracted() {
        let body = r#"{"error":{"code":429,"message":"Resource has been exhausted"}}"#;
        assert_eq!(service_error_message(body), "Resource has been exhausted");
        assert_eq!(service_error_message("bad gateway"), "bad gateway");
    }

    #[test]
    fn only_generated_garments_are_sent_as_images() {
        let catalog = GarmentItem::new(
            GarmentId::new(1),
            "Tee",
            GarmentCategory::Top,
            "catalog/tee.png",
            "white tee",
        );
        let generated = GarmentItem::new(
            GarmentId::new(2),
            "Red scarf",
            GarmentCategory::Accessory,
            "data:image/jpeg;base64,QUJD",
            "Red scarf",
        );
        assert!(garment_image_part(&catalog).is_none());
        assert_eq!(
            garment_image_part(&generated).unwrap()["inlineData"]["mimeType"],
            "image/jpeg"
        );
    }

    #[test]
    fn analysis_prompt_mentions_height_when_known() {
        let height = Height::new(5, 9).unwrap();
        assert!(analysis_prompt(&[], Some(&height)).starts_with("The person is 5'9\" tall."));
        assert!(!analysis_prompt(&[], None).contains("tall"));
    }
}
