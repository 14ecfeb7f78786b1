//! Image compression strategies.
//!
//! Each strategy implements [`ImageCodec`] and declares its
//! [`Capabilities`] so the dispatcher can reject unsupported options
//! before running it. All work is synchronous and CPU bound; callers run
//! it on a blocking thread.

pub mod fast;
pub mod format;
pub mod lossless;
pub mod standard;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use format::OutputFormat;

use crate::error::CoreError;
use crate::strategy::{ResolutionMode, StrategyRegistry, Tagged};

/// Quality used when a client does not pick one.
pub const DEFAULT_QUALITY: u8 = 75;

/// Options a strategy may honor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Honors an explicit `quality` setting.
    pub quality: bool,
    /// Can convert the output to WebP.
    pub format_conversion: bool,
}

/// Fully resolved options handed to a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressOptions {
    pub quality: u8,
    pub convert_to_webp: bool,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            convert_to_webp: false,
        }
    }
}

/// Bytes produced by a strategy, with the format they are encoded in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Unsupported input format: {0}")]
    UnsupportedInput(String),

    #[error("Image codec error: {0}")]
    Image(#[from] image::ImageError),
}

impl From<CodecError> for CoreError {
    fn from(err: CodecError) -> Self {
        CoreError::StrategyExecution(err.to_string())
    }
}

/// A compression backend selectable by tag.
pub trait ImageCodec: Tagged + Send + Sync {
    fn capabilities(&self) -> Capabilities;

    /// Compress one encoded image.
    fn compress(&self, input: &[u8], options: &CompressOptions) -> Result<Encoded, CodecError>;
}

pub type CodecRegistry = StrategyRegistry<dyn ImageCodec>;

/// Registry with every built-in strategy; `standard` is the default.
pub fn default_registry(mode: ResolutionMode) -> CodecRegistry {
    StrategyRegistry::new(Arc::new(standard::StandardCodec) as Arc<dyn ImageCodec>, mode)
        .with(Arc::new(fast::FastCodec))
        .with(Arc::new(lossless::LosslessCodec))
}
