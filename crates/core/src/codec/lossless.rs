//! Lossless-only strategy. Output is PNG (or WebP lossless on request),
//! whatever the input was, so quality has no meaning here.

use image::codecs::png::{CompressionType, FilterType};

use super::format::{decode, encode_png, encode_webp_lossless};
use super::{Capabilities, CodecError, CompressOptions, Encoded, ImageCodec, OutputFormat};
use crate::strategy::Tagged;

pub struct LosslessCodec;

impl Tagged for LosslessCodec {
    fn tag(&self) -> &'static str {
        "lossless"
    }
}

impl ImageCodec for LosslessCodec {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            quality: false,
            format_conversion: true,
        }
    }

    fn compress(&self, input: &[u8], options: &CompressOptions) -> Result<Encoded, CodecError> {
        let img = decode(input, OutputFormat::detect(input)?)?;

        if options.convert_to_webp {
            return Ok(Encoded {
                bytes: encode_webp_lossless(&img)?,
                format: OutputFormat::WebP,
            });
        }

        Ok(Encoded {
            bytes: encode_png(&img, CompressionType::Best, FilterType::Adaptive)?,
            format: OutputFormat::Png,
        })
    }
}
