//! Default strategy: keep the source format and squeeze it as hard as the
//! format allows.

use image::codecs::png::{CompressionType, FilterType};

use super::format::{decode, encode_jpeg, encode_png, encode_webp_lossless};
use super::{Capabilities, CodecError, CompressOptions, Encoded, ImageCodec, OutputFormat};
use crate::strategy::Tagged;

/// PNG at best compression with adaptive filtering, JPEG at the requested
/// quality, WebP on request.
pub struct StandardCodec;

impl Tagged for StandardCodec {
    fn tag(&self) -> &'static str {
        "standard"
    }
}

impl ImageCodec for StandardCodec {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            quality: true,
            format_conversion: true,
        }
    }

    fn compress(&self, input: &[u8], options: &CompressOptions) -> Result<Encoded, CodecError> {
        let source = OutputFormat::detect(input)?;
        let img = decode(input, source)?;

        let target = if options.convert_to_webp {
            OutputFormat::WebP
        } else {
            source
        };

        let bytes = match target {
            OutputFormat::Png => encode_png(&img, CompressionType::Best, FilterType::Adaptive)?,
            OutputFormat::Jpeg => encode_jpeg(&img, options.quality)?,
            OutputFormat::WebP => encode_webp_lossless(&img)?,
        };

        Ok(Encoded {
            bytes,
            format: target,
        })
    }
}
