use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::error::GuidanceError;

/// Longest edge of the copy sent to vision models.
pub const VISION_MAX_DIM: u32 = 1024;

/// A camera frame known to decode as a raster image.
#[derive(Debug, Clone)]
pub struct Frame {
    bytes: Vec<u8>,
    image: DynamicImage,
}

impl Frame {
    pub fn decode(bytes: impl Into<Vec<u8>>) -> Result<Self, GuidanceError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(GuidanceError::InvalidInput("frame is empty".to_string()));
        }
        let image = image::load_from_memory(&bytes).map_err(|err| {
            GuidanceError::InvalidInput(format!("frame is not a decodable image: {err}"))
        })?;
        Ok(Self { bytes, image })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn fingerprint(&self) -> [u8; 32] {
        let digest = Sha256::digest(&self.bytes);
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        out
    }

    /// JPEG copy bounded to `max_dim`, transparent pixels flattened onto white.
    /// Falls back to the original bytes if re-encoding fails.
    pub fn vision_jpeg(&self, max_dim: u32) -> (Vec<u8>, &'static str) {
        let dim = max_dim.max(128);
        let rgba = self.image.to_rgba8();
        let mut flattened = RgbaImage::new(rgba.width(), rgba.height());
        for (x, y, pixel) in rgba.enumerate_pixels() {
            let alpha = u16::from(pixel[3]);
            let blend = |channel: u8| -> u8 {
                (((u16::from(channel) * alpha) + (255 * (255 - alpha))) / 255) as u8
            };
            flattened.put_pixel(
                x,
                y,
                Rgba([blend(pixel[0]), blend(pixel[1]), blend(pixel[2]), 255]),
            );
        }
        let (width, height) = self.dimensions();
        let flattened = DynamicImage::ImageRgba8(flattened);
        let resized = if width > dim || height > dim {
            flattened.resize(dim, dim, FilterType::Triangle)
        } else {
            flattened
        };
        let mut bytes = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut bytes, 90);
        match encoder.encode_image(&DynamicImage::ImageRgb8(resized.to_rgb8())) {
            Ok(()) => (bytes, "image/jpeg"),
            Err(err) => {
                tracing::debug!(error = %err, "jpeg re-encode failed; sending original frame");
                (self.bytes.clone(), self.original_mime())
            }
        }
    }

    /// `inlineData` part for a generateContent request.
    pub fn inline_part(&self) -> Value {
        let (bytes, mime) = self.vision_jpeg(VISION_MAX_DIM);
        json!({
            "inlineData": {
                "mimeType": mime,
                "data": BASE64.encode(bytes),
            }
        })
    }

    /// `image` object for an Imagen predict instance.
    pub fn imagen_input(&self) -> Value {
        json!({
            "bytesBase64Encoded": BASE64.encode(&self.bytes),
            "mimeType": self.original_mime(),
        })
    }

    fn original_mime(&self) -> &'static str {
        match image::guess_format(&self.bytes) {
            Ok(ImageFormat::Jpeg) => "image/jpeg",
            Ok(ImageFormat::WebP) => "image/webp",
            Ok(ImageFormat::Gif) => "image/gif",
            _ => "image/png",
        }
    }
}

/// Encodes an image as PNG bytes.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}
