//! Quick re-encode in the source format. Cannot change the format.

use image::codecs::png::{CompressionType, FilterType};

use super::format::{decode, encode_jpeg, encode_png, encode_webp_lossless};
use super::{Capabilities, CodecError, CompressOptions, Encoded, ImageCodec, OutputFormat};
use crate::strategy::Tagged;

pub struct FastCodec;

impl Tagged for FastCodec {
    fn tag(&self) -> &'static str {
        "fast"
    }
}

impl ImageCodec for FastCodec {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            quality: true,
            format_conversion: false,
        }
    }

    fn compress(&self, input: &[u8], options: &CompressOptions) -> Result<Encoded, CodecError> {
        let format = OutputFormat::detect(input)?;
        let img = decode(input, format)?;

        let bytes = match format {
            OutputFormat::Png => encode_png(&img, CompressionType::Fast, FilterType::Sub)?,
            OutputFormat::Jpeg => encode_jpeg(&img, options.quality)?,
            OutputFormat::WebP => encode_webp_lossless(&img)?,
        };

        Ok(Encoded { bytes, format })
    }
}
