//! Image formats handled by the codec strategies, plus the decode/encode
//! helpers the strategies share.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};

use super::CodecError;

/// Formats a strategy can read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    Jpeg,
    #[serde(rename = "webp")]
    WebP,
}

impl OutputFormat {
    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Sniff the format of an encoded image from its magic bytes.
    pub fn detect(input: &[u8]) -> Result<Self, CodecError> {
        match image::guess_format(input) {
            Ok(ImageFormat::Png) => Ok(Self::Png),
            Ok(ImageFormat::Jpeg) => Ok(Self::Jpeg),
            Ok(ImageFormat::WebP) => Ok(Self::WebP),
            Ok(other) => Err(CodecError::UnsupportedInput(format!("{other:?}"))),
            Err(_) => Err(CodecError::UnsupportedInput("unrecognized data".into())),
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
            Self::WebP => ImageFormat::WebP,
        }
    }
}

/// Decode `input`, which has already been sniffed as `format`.
pub(crate) fn decode(input: &[u8], format: OutputFormat) -> Result<DynamicImage, CodecError> {
    Ok(image::load_from_memory_with_format(input, format.image_format())?)
}

pub(crate) fn encode_png(
    img: &DynamicImage,
    compression: CompressionType,
    filter: FilterType,
) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::new();
    img.write_with_encoder(PngEncoder::new_with_quality(&mut buf, compression, filter))?;
    Ok(buf)
}

/// JPEG has no alpha channel, so the image is flattened to RGB first.
pub(crate) fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::new();
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))?;
    Ok(buf)
}

/// The bundled WebP encoder is lossless only; quality does not apply.
pub(crate) fn encode_webp_lossless(img: &DynamicImage) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::new();
    let normalized = if img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    };
    normalized.write_with_encoder(WebPEncoder::new_lossless(&mut buf))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::codec::test_images::{jpeg_bytes, png_bytes};

    #[test]
    fn detects_png_and_jpeg() {
        assert_eq!(OutputFormat::detect(&png_bytes(8, 8)).unwrap(), OutputFormat::Png);
        assert_eq!(OutputFormat::detect(&jpeg_bytes(8, 8)).unwrap(), OutputFormat::Jpeg);
    }

    #[test]
    fn rejects_non_images() {
        assert_matches!(
            OutputFormat::detect(b"definitely not an image"),
            Err(CodecError::UnsupportedInput(_))
        );
    }

    #[test]
    fn extension_and_mime() {
        assert_eq!(OutputFormat::Jpeg.extension(), "jpg");
        assert_eq!(OutputFormat::WebP.mime_type(), "image/webp");
        assert_eq!(serde_json::to_string(&OutputFormat::WebP).unwrap(), "\"webp\"");
    }

    #[test]
    fn jpeg_encoding_flattens_alpha() {
        let img = DynamicImage::new_rgba8(4, 4);
        let bytes = encode_jpeg(&img, 60).unwrap();
        assert_eq!(OutputFormat::detect(&bytes).unwrap(), OutputFormat::Jpeg);
    }
}
