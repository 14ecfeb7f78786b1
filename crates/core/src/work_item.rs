//! Client-submitted units of work and their per-item configuration.

use serde::{Deserialize, Serialize};

use crate::codec::{Capabilities, CompressOptions, DEFAULT_QUALITY};
use crate::error::CoreError;
use crate::types::{ItemId, Sequence};

/// Valid range for an explicit quality setting.
pub const QUALITY_RANGE: std::ops::RangeInclusive<u8> = 1..=100;

/// Per-item strategy selection as sent by the client.
///
/// `Default` is the configuration used when an item carries none; it is a
/// fresh value every time, never a shared global.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Strategy tag. `None` selects the registry default.
    #[serde(default, alias = "compressor", skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    /// Explicit quality (1-100). `None` uses [`DEFAULT_QUALITY`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,
    /// Convert the output to WebP.
    #[serde(default)]
    pub webp: bool,
}

impl StrategyConfig {
    /// Check the options against what the chosen strategy supports and
    /// produce the options the strategy will actually run with.
    pub fn resolve_options(
        &self,
        strategy_tag: &str,
        capabilities: Capabilities,
    ) -> Result<CompressOptions, CoreError> {
        if let Some(quality) = self.quality {
            if !capabilities.quality {
                return Err(CoreError::UnsupportedOption {
                    strategy: strategy_tag.to_string(),
                    option: "quality",
                });
            }
            if !QUALITY_RANGE.contains(&quality) {
                return Err(CoreError::Validation(format!(
                    "quality must be between {} and {}, got {quality}",
                    QUALITY_RANGE.start(),
                    QUALITY_RANGE.end(),
                )));
            }
        }

        if self.webp && !capabilities.format_conversion {
            return Err(CoreError::UnsupportedOption {
                strategy: strategy_tag.to_string(),
                option: "webp",
            });
        }

        Ok(CompressOptions {
            quality: self.quality.unwrap_or(DEFAULT_QUALITY),
            convert_to_webp: self.webp,
        })
    }

    /// Apply a partial update.
    pub fn apply(&mut self, patch: &ConfigPatch) {
        if let Some(strategy) = &patch.strategy {
            self.strategy = strategy.clone();
        }
        if let Some(quality) = patch.quality {
            self.quality = quality;
        }
        if let Some(webp) = patch.webp {
            self.webp = webp;
        }
    }
}

/// Partial configuration change for one tracked item.
///
/// Outer `None` leaves a field untouched; `Some(None)` clears it back to
/// the default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigPatch {
    pub strategy: Option<Option<String>>,
    pub quality: Option<Option<u8>>,
    pub webp: Option<bool>,
}

impl ConfigPatch {
    pub fn quality(quality: u8) -> Self {
        Self {
            quality: Some(Some(quality)),
            ..Self::default()
        }
    }

    pub fn strategy(tag: impl Into<String>) -> Self {
        Self {
            strategy: Some(Some(tag.into())),
            ..Self::default()
        }
    }

    pub fn webp(webp: bool) -> Self {
        Self {
            webp: Some(webp),
            ..Self::default()
        }
    }
}

/// One unit of work: identity, payload and configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub identity: ItemId,
    /// Original file name, if the upload carried one.
    pub name: Option<String>,
    pub payload: Vec<u8>,
    /// `None` means "use the default configuration".
    pub config: Option<StrategyConfig>,
    /// Submission sequence for this identity, echoed back in the outcome.
    pub sequence: Option<Sequence>,
}

impl WorkItem {
    pub fn new(identity: impl Into<ItemId>, payload: Vec<u8>) -> Self {
        Self {
            identity: identity.into(),
            name: None,
            payload,
            config: None,
            sequence: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_config(mut self, config: StrategyConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_sequence(mut self, sequence: Sequence) -> Self {
        self.sequence = Some(sequence);
        self
    }

    /// Configuration in effect, falling back to a fresh default.
    pub fn effective_config(&self) -> StrategyConfig {
        self.config.clone().unwrap_or_default()
    }
}
