use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{json, Map, Value};

use super::{send, ImageBytes, ImageCall, InferenceProvider, TextCall};
use crate::error::GatewayFailure;

/// Imagen `:predict`, used for effect overlays.
pub struct ImagenProvider {
    api_base: String,
    http: reqwest::Client,
}

impl ImagenProvider {
    pub fn new(http: reqwest::Client, api_base: &str) -> Self {
        Self {
            api_base: api_base.trim().trim_end_matches('/').to_string(),
            http,
        }
    }

    fn resolve_model_name(raw_model: &str) -> String {
        raw_model
            .trim()
            .trim_start_matches("models/")
            .to_string()
    }

    fn endpoint_for_model(&self, model: &str) -> String {
        format!(
            "{}/models/{}:predict",
            self.api_base,
            Self::resolve_model_name(model)
        )
    }

    fn extract_prediction(payload: &Value) -> Result<Option<ImageBytes>, GatewayFailure> {
        let predictions = payload
            .get("predictions")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for row in predictions {
            let Some(obj) = row.as_object() else {
                continue;
            };
            let source = obj
                .get("image")
                .or_else(|| obj.get("generatedImage"))
                .and_then(Value::as_object)
                .unwrap_or(obj);
            let Some(encoded) = source
                .get("bytesBase64Encoded")
                .or_else(|| source.get("imageBytes"))
                .or_else(|| source.get("bytes_base64_encoded"))
                .and_then(Value::as_str)
            else {
                continue;
            };
            let bytes = BASE64.decode(encoded.as_bytes()).map_err(|err| {
                GatewayFailure::malformed(format!("Imagen image base64 decode failed: {err}"))
            })?;
            return Ok(Some(ImageBytes {
                bytes,
                mime_type: mime_of(source),
            }));
        }
        Ok(None)
    }
}

fn mime_of(source: &Map<String, Value>) -> Option<String> {
    source
        .get("mimeType")
        .or_else(|| source.get("mime_type"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[async_trait]
impl InferenceProvider for ImagenProvider {
    fn name(&self) -> &str {
        "imagen"
    }

    async fn generate_text(
        &self,
        _api_key: &str,
        call: &TextCall<'_>,
    ) -> Result<String, GatewayFailure> {
        Err(GatewayFailure::invalid_input(format!(
            "model '{}' does not produce text",
            call.model
        )))
    }

    async fn generate_image(
        &self,
        api_key: &str,
        call: &ImageCall<'_>,
    ) -> Result<ImageBytes, GatewayFailure> {
        let mut instance = Map::new();
        instance.insert("prompt".to_string(), Value::String(call.prompt.to_string()));
        if let Some(frame) = call.image {
            instance.insert("image".to_string(), frame.imagen_input());
        }
        let payload = json!({
            "instances": [Value::Object(instance)],
            "parameters": { "sampleCount": 1 },
        });
        let request = self
            .http
            .post(self.endpoint_for_model(call.model))
            .query(&[("key", api_key)])
            .json(&payload);
        let response = send("Imagen", request).await?;
        Self::extract_prediction(&response)?
            .ok_or_else(|| GatewayFailure::malformed("Imagen returned no images"))
    }
}
