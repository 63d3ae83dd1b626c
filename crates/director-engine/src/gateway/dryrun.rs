use async_trait::async_trait;
use image::{DynamicImage, Rgb, RgbImage};
use sha2::{Digest, Sha256};

use super::{ImageBytes, ImageCall, InferenceProvider, TextCall};
use crate::error::GatewayFailure;
use crate::frame::encode_png;

const DRYRUN_MAX_DIM: u32 = 512;

/// Offline placeholder renderer. Solid colour derived from the prompt,
/// sized like the source frame when one is given.
pub struct DryrunProvider;

#[async_trait]
impl InferenceProvider for DryrunProvider {
    fn name(&self) -> &str {
        "dryrun"
    }

    fn requires_credentials(&self) -> bool {
        false
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
        _api_key: &str,
        call: &ImageCall<'_>,
    ) -> Result<ImageBytes, GatewayFailure> {
        let (width, height) = call
            .image
            .map(|frame| frame.dimensions())
            .map(|(w, h)| (w.clamp(1, DRYRUN_MAX_DIM), h.clamp(1, DRYRUN_MAX_DIM)))
            .unwrap_or((DRYRUN_MAX_DIM, DRYRUN_MAX_DIM));
        let (r, g, b) = color_from_prompt(call.prompt);
        let image = RgbImage::from_pixel(width, height, Rgb([r, g, b]));
        let bytes = encode_png(&DynamicImage::ImageRgb8(image)).map_err(|err| {
            GatewayFailure::unavailable(format!("dryrun placeholder encode failed: {err}"))
        })?;
        Ok(ImageBytes {
            bytes,
            mime_type: Some("image/png".to_string()),
        })
    }
}

fn color_from_prompt(prompt: &str) -> (u8, u8, u8) {
    let digest = Sha256::digest(prompt.as_bytes());
    (digest[0], digest[1], digest[2])
}
