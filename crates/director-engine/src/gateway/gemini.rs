use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{json, Value};

use super::{send, ImageBytes, ImageCall, InferenceProvider, TextCall};
use crate::error::GatewayFailure;
use crate::frame::Frame;

/// Gemini `generateContent`: text, vision and image edits.
pub struct GeminiProvider {
    api_base: String,
    http: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(http: reqwest::Client, api_base: &str) -> Self {
        Self {
            api_base: api_base.trim().trim_end_matches('/').to_string(),
            http,
        }
    }

    fn endpoint_for_model(&self, model: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }

    fn build_contents(text: &str, image: Option<&Frame>) -> Value {
        let mut parts = Vec::new();
        if let Some(frame) = image {
            parts.push(frame.inline_part());
        }
        parts.push(json!({ "text": text }));
        json!([{ "role": "user", "parts": parts }])
    }

    async fn post(&self, api_key: &str, model: &str, payload: &Value) -> Result<Value, GatewayFailure> {
        let request = self
            .http
            .post(self.endpoint_for_model(model))
            .query(&[("key", api_key)])
            .json(payload);
        send("Gemini", request).await
    }

    fn candidate_parts(payload: &Value) -> Vec<Value> {
        payload
            .get("candidates")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|candidate| {
                candidate
                    .get("content")
                    .and_then(|content| content.get("parts"))
                    .and_then(Value::as_array)
            })
            .flatten()
            .cloned()
            .collect()
    }

    fn extract_text(payload: &Value) -> Option<String> {
        let text: String = Self::candidate_parts(payload)
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect();
        Some(text).filter(|text| !text.trim().is_empty())
    }

    fn extract_image(payload: &Value) -> Result<Option<ImageBytes>, GatewayFailure> {
        for part in Self::candidate_parts(payload) {
            let Some(inline) = part
                .get("inlineData")
                .or_else(|| part.get("inline_data"))
                .and_then(Value::as_object)
            else {
                continue;
            };
            let data = inline
                .get("data")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if data.is_empty() {
                continue;
            }
            let bytes = BASE64.decode(data.as_bytes()).map_err(|err| {
                GatewayFailure::malformed(format!("Gemini image base64 decode failed: {err}"))
            })?;
            let mime_type = inline
                .get("mimeType")
                .or_else(|| inline.get("mime_type"))
                .and_then(Value::as_str)
                .map(str::to_string);
            return Ok(Some(ImageBytes { bytes, mime_type }));
        }
        Ok(None)
    }
}

#[async_trait]
impl InferenceProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate_text(
        &self,
        api_key: &str,
        call: &TextCall<'_>,
    ) -> Result<String, GatewayFailure> {
        let payload = json!({
            "contents": Self::build_contents(call.instruction, call.image),
        });
        let response = self.post(api_key, call.model, &payload).await?;
        Self::extract_text(&response)
            .ok_or_else(|| GatewayFailure::malformed("Gemini returned no text"))
    }

    async fn generate_image(
        &self,
        api_key: &str,
        call: &ImageCall<'_>,
    ) -> Result<ImageBytes, GatewayFailure> {
        let payload = json!({
            "contents": Self::build_contents(call.prompt, call.image),
            "generationConfig": {
                "responseModalities": ["TEXT", "IMAGE"],
            },
        });
        let response = self.post(api_key, call.model, &payload).await?;
        Self::extract_image(&response)?
            .ok_or_else(|| GatewayFailure::malformed("Gemini returned no image"))
    }
}
